//! Request/response types for the management API.

use serde::{Deserialize, Serialize};

/// `?testMode=true` on the send endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendQuery {
    #[serde(default)]
    pub test_mode: Option<String>,
}

impl SendQuery {
    pub fn is_test_mode(&self) -> bool {
        self.test_mode.as_deref() == Some("true")
    }
}

/// Optional JSON body on the send endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub test_mode: bool,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub phone: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnsubscribeResponse {
    pub phone: String,
}

/// Error body: human-readable `error` plus a stable machine `code`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: &str) -> Self {
        Self {
            error: error.into(),
            code: code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_flag_must_be_literal_true() {
        let q: SendQuery = serde_json::from_str(r#"{"testMode":"true"}"#).unwrap();
        assert!(q.is_test_mode());
        let q: SendQuery = serde_json::from_str(r#"{"testMode":"1"}"#).unwrap();
        assert!(!q.is_test_mode());
        assert!(!SendQuery::default().is_test_mode());
    }
}
