use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::SecurityLevel;

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub height: u64,
    pub consensus: String,
    pub pending_transactions: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_block_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_transactions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validators: Option<u64>,
}

/// A transaction as the service reports it. The client only counts these and
/// pulls a few display fields out when they are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(pub serde_json::Value);

impl Transaction {
    fn str_field(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(serde_json::Value::as_str)
    }

    pub fn hash(&self) -> Option<&str> {
        self.str_field("hash")
    }

    pub fn kind(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn sender(&self) -> Option<&str> {
        self.str_field("sender")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub hash: String,
    pub height: u64,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_address: Option<String>,
    /// Seconds since the unix epoch, as produced by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl Block {
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        let ts = self.timestamp.filter(|ts| ts.is_finite())?;
        let secs = ts.trunc() as i64;
        let nanos = ((ts - ts.trunc()) * 1_000_000_000.0) as u32;
        DateTime::from_timestamp(secs, nanos)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: f64,
    pub private_key: String,
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("amount", &self.amount)
            .field("private_key", &REDACTED)
            .finish()
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoteRequest {
    pub sender: String,
    pub target: String,
    pub level: SecurityLevel,
    pub private_key: String,
}

impl fmt::Debug for PromoteRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromoteRequest")
            .field("sender", &self.sender)
            .field("target", &self.target)
            .field("level", &self.level)
            .field("private_key", &REDACTED)
            .finish()
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDataRequest {
    pub sender: String,
    pub data_id: String,
    pub content: String,
    pub security_level: SecurityLevel,
    pub private_key: String,
}

impl fmt::Debug for StoreDataRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreDataRequest")
            .field("sender", &self.sender)
            .field("data_id", &self.data_id)
            .field("content_len", &self.content.len())
            .field("security_level", &self.security_level)
            .field("private_key", &REDACTED)
            .finish()
    }
}

/// Acknowledgement body of a write endpoint. Each endpoint fills a different
/// subset of these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl CommandAck {
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(status) = &self.status {
            parts.push(status.clone());
        }
        if let Some(message) = &self.message {
            parts.push(message.clone());
        }
        if let Some(hash) = &self.hash {
            parts.push(format!("hash={hash}"));
        }
        if let Some(id) = &self.id {
            parts.push(format!("id={id}"));
        }
        if let Some(height) = self.block_height {
            parts.push(format!("block_height={height}"));
        }
        if let Some(count) = self.tx_count {
            parts.push(format!("tx_count={count}"));
        }
        if let Some(reason) = &self.reason {
            parts.push(format!("reason={reason}"));
        }
        if parts.is_empty() {
            "ok".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLevel {
    pub address: String,
    #[serde(default)]
    pub level: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataAccess {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content: serde_json::Value,
}
