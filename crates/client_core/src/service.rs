use std::{error::Error as _, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    error::ServiceErrorBody,
    protocol::{
        Block, ChainInfo, CommandAck, DataAccess, PromoteRequest, StoreDataRequest,
        TransferRequest, UserLevel,
    },
};
use tracing::debug;
use url::Url;

use crate::error::{ServiceError, ServiceSetupError};

/// Remote ledger operations. The HTTP implementation is [`HttpLedgerService`];
/// tests swap in in-memory fakes.
#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn chain_info(&self) -> Result<ChainInfo, ServiceError>;
    async fn recent_blocks(&self) -> Result<Vec<Block>, ServiceError>;
    async fn transfer(&self, request: &TransferRequest) -> Result<CommandAck, ServiceError>;
    async fn promote(&self, request: &PromoteRequest) -> Result<CommandAck, ServiceError>;
    async fn store_data(&self, request: &StoreDataRequest) -> Result<CommandAck, ServiceError>;
    async fn mine(&self) -> Result<CommandAck, ServiceError>;
    async fn user_level(&self, address: &str) -> Result<UserLevel, ServiceError>;
    async fn access_data(
        &self,
        data_id: &str,
        user_address: &str,
    ) -> Result<DataAccess, ServiceError>;
}

pub struct HttpLedgerService {
    http: Client,
    base_url: Url,
    blocks_limit: Option<u32>,
}

impl HttpLedgerService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceSetupError> {
        let parsed = Url::parse(base_url).map_err(|source| ServiceSetupError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ServiceSetupError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: parsed,
            blocks_limit: None,
        })
    }

    pub fn with_blocks_limit(mut self, limit: Option<u32>) -> Self {
        self.blocks_limit = limit;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ServiceError::Transport(format!("service url {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let response = checked(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| ServiceError::Transport(format!("invalid response body: {}", describe(&err))))
    }

    /// Acks are informational; a 2xx with an unexpected body still counts as
    /// accepted by the service.
    async fn acknowledge(&self, request: RequestBuilder) -> Result<CommandAck, ServiceError> {
        let response = checked(request).await?;
        let body = response
            .bytes()
            .await
            .map_err(|err| ServiceError::Transport(describe(&err)))?;
        match serde_json::from_slice::<CommandAck>(&body) {
            Ok(ack) => Ok(ack),
            Err(err) => {
                debug!(error = %err, "service: ack body not understood, treating as plain ack");
                Ok(CommandAck::default())
            }
        }
    }
}

async fn checked(request: RequestBuilder) -> Result<Response, ServiceError> {
    let response = request
        .send()
        .await
        .map_err(|err| ServiceError::Transport(describe(&err)))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ServiceErrorBody>(&body)
            .ok()
            .and_then(|body| body.detail_message()),
        Err(_) => None,
    }
    .unwrap_or_else(|| format!("HTTP {status}"));
    Err(ServiceError::Remote {
        status: status.as_u16(),
        detail,
    })
}

/// reqwest hides the interesting part (refused, dns, timed out) in the source chain.
fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

#[async_trait]
impl LedgerService for HttpLedgerService {
    async fn chain_info(&self) -> Result<ChainInfo, ServiceError> {
        let url = self.endpoint(&["chain", "info"])?;
        self.fetch(self.http.get(url)).await
    }

    async fn recent_blocks(&self) -> Result<Vec<Block>, ServiceError> {
        let url = self.endpoint(&["chain", "blocks"])?;
        let mut request = self.http.get(url);
        if let Some(limit) = self.blocks_limit {
            request = request.query(&[("limit", limit)]);
        }
        self.fetch(request).await
    }

    async fn transfer(&self, request: &TransferRequest) -> Result<CommandAck, ServiceError> {
        let url = self.endpoint(&["transaction", "transfer"])?;
        self.acknowledge(self.http.post(url).json(request)).await
    }

    async fn promote(&self, request: &PromoteRequest) -> Result<CommandAck, ServiceError> {
        let url = self.endpoint(&["permissions", "promote"])?;
        self.acknowledge(self.http.post(url).json(request)).await
    }

    async fn store_data(&self, request: &StoreDataRequest) -> Result<CommandAck, ServiceError> {
        let url = self.endpoint(&["data", "store"])?;
        self.acknowledge(self.http.post(url).json(request)).await
    }

    async fn mine(&self) -> Result<CommandAck, ServiceError> {
        let url = self.endpoint(&["mine"])?;
        self.acknowledge(self.http.post(url)).await
    }

    async fn user_level(&self, address: &str) -> Result<UserLevel, ServiceError> {
        let url = self.endpoint(&["permissions", "user", address])?;
        self.fetch(self.http.get(url)).await
    }

    async fn access_data(
        &self,
        data_id: &str,
        user_address: &str,
    ) -> Result<DataAccess, ServiceError> {
        let url = self.endpoint(&["data", "access", data_id])?;
        self.fetch(self.http.get(url).query(&[("user_address", user_address)]))
            .await
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
