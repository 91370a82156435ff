use std::fmt;

use thiserror::Error;

/// Failure talking to the ledger service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service rejected request (HTTP {status}): {detail}")]
    Remote { status: u16, detail: String },
}

#[derive(Debug, Error)]
pub enum ServiceSetupError {
    #[error("invalid service url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("service url must use http or https, got {0:?}")]
    UnsupportedScheme(String),
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandErrorKind {
    Validation,
    Transport,
    Remote,
}

impl fmt::Display for CommandErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CommandErrorKind::Validation => "validation error",
            CommandErrorKind::Transport => "transport error",
            CommandErrorKind::Remote => "remote error",
        })
    }
}

/// Terminal outcome of a rejected command. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("remote error: {detail}")]
    Remote { status: u16, detail: String },
}

impl CommandError {
    pub fn kind(&self) -> CommandErrorKind {
        match self {
            CommandError::Validation(_) => CommandErrorKind::Validation,
            CommandError::Transport(_) => CommandErrorKind::Transport,
            CommandError::Remote { .. } => CommandErrorKind::Remote,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CommandError::Validation(message) | CommandError::Transport(message) => message,
            CommandError::Remote { detail, .. } => detail,
        }
    }
}

impl From<ServiceError> for CommandError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::Transport(message) => CommandError::Transport(message),
            ServiceError::Remote { status, detail } => CommandError::Remote { status, detail },
        }
    }
}
