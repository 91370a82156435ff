use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const MIN_SECURITY_LEVEL: u8 = 1;
pub const MAX_SECURITY_LEVEL: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Transfer,
    Promote,
    StoreData,
    Mine,
}

impl CommandKind {
    pub const ALL: [CommandKind; 4] = [
        CommandKind::Transfer,
        CommandKind::Promote,
        CommandKind::StoreData,
        CommandKind::Mine,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Transfer => "transfer",
            CommandKind::Promote => "promote",
            CommandKind::StoreData => "store_data",
            CommandKind::Mine => "mine",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification tier in `[1, 5]`. Higher is stricter; the service defines
/// what each tier permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SecurityLevel(u8);

impl SecurityLevel {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SecurityLevel {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (i64::from(MIN_SECURITY_LEVEL)..=i64::from(MAX_SECURITY_LEVEL)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(DomainError::SecurityLevelOutOfRange(value))
        }
    }
}

impl From<SecurityLevel> for i64 {
    fn from(value: SecurityLevel) -> Self {
        i64::from(value.0)
    }
}

impl FromStr for SecurityLevel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = s
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::InvalidSecurityLevel(s.to_string()))?;
        Self::try_from(parsed)
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
