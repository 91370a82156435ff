use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("security level must be an integer, got {0:?}")]
    InvalidSecurityLevel(String),
    #[error("security level must be between 1 and 5, got {0}")]
    SecurityLevelOutOfRange(i64),
}

/// Error body returned by the ledger service. `detail` is usually a string but
/// request-validation failures carry a list of field errors instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ServiceErrorBody {
    pub fn detail_message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(detail) => Some(detail.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_detail_is_returned_verbatim() {
        let body: ServiceErrorBody =
            serde_json::from_str(r#"{"detail":"insufficient permission"}"#).expect("body");
        assert_eq!(body.detail_message().as_deref(), Some("insufficient permission"));
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let body: ServiceErrorBody =
            serde_json::from_str(r#"{"detail":[{"loc":["body","amount"]}]}"#).expect("body");
        assert_eq!(
            body.detail_message().as_deref(),
            Some(r#"[{"loc":["body","amount"]}]"#)
        );
    }

    #[test]
    fn missing_detail_yields_none() {
        let body: ServiceErrorBody = serde_json::from_str("{}").expect("body");
        assert!(body.detail_message().is_none());
    }
}
