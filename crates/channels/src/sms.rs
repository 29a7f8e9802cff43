//! HTTP SMS provider — posts `{to, message}` JSON to a configured endpoint
//! with a bearer credential.

use crate::provider::{DeliveryError, DeliveryProvider, DeliveryResponse};
use async_trait::async_trait;
use campaign_core::config::ProviderConfig;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    message: &'a str,
}

/// SMS provider reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSmsProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpSmsProvider {
    /// Build a provider from configuration. Fails if the endpoint or the
    /// credential is missing.
    pub fn new(config: &ProviderConfig) -> Result<Self, DeliveryError> {
        let (url, api_key) = config.credentials().ok_or_else(|| {
            DeliveryError::Config("SMS provider configuration missing".to_string())
        })?;

        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| DeliveryError::Config(format!("invalid API key header value: {e}")))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| DeliveryError::Config(format!("failed to build HTTP client: {e}")))?;

        info!(url = %url, "HTTP SMS provider initialized");

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl DeliveryProvider for HttpSmsProvider {
    async fn send(&self, to: &str, text: &str) -> Result<DeliveryResponse, DeliveryError> {
        let response = self
            .client
            .post(&self.url)
            .json(&SendRequest { to, message: text })
            .send()
            .await
            .map_err(|e| {
                metrics::counter!("sms.provider_requests", "outcome" => "transport_error")
                    .increment(1);
                DeliveryError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        debug!(to = %to, status = %status, "SMS provider responded");

        let outcome = if status.is_success() { "accepted" } else { "rejected" };
        metrics::counter!("sms.provider_requests", "outcome" => outcome).increment(1);

        Ok(DeliveryResponse {
            accepted: status.is_success(),
            body,
        })
    }
}
