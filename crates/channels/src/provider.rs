use async_trait::async_trait;
use thiserror::Error;

/// What the provider said about one send attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    /// Whether the provider accepted the message.
    pub accepted: bool,
    /// Raw response body, stored (truncated) on the message row.
    pub body: String,
}

impl DeliveryResponse {
    pub fn accepted(body: impl Into<String>) -> Self {
        Self {
            accepted: true,
            body: body.into(),
        }
    }

    pub fn rejected(body: impl Into<String>) -> Self {
        Self {
            accepted: false,
            body: body.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Network failure, timeout, or an unreadable response.
    #[error("{0}")]
    Transport(String),

    #[error("provider configuration error: {0}")]
    Config(String),
}

/// Capability to hand one rendered message to an external SMS provider.
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    async fn send(&self, to: &str, text: &str) -> Result<DeliveryResponse, DeliveryError>;
}
