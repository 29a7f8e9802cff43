use serde::Deserialize;
use std::time::Duration;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CAMPAIGN_SMS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Expected value of the `x-api-key` header. Protected routes refuse to
    /// serve while this is unset.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Outbound SMS provider endpoint. Both `url` and `api_key` are required for
/// live sends; test-mode runs never read them.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// Maximum number of messages in flight per run.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Pause a worker takes after each accepted send.
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_max_error_len")]
    pub max_error_len: usize,
    #[serde(default = "default_max_response_len")]
    pub max_response_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default functions
fn default_node_id() -> String {
    "node-01".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    4000
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_concurrency() -> usize {
    10
}
fn default_pacing_ms() -> u64 {
    100
}
fn default_max_error_len() -> usize {
    500
}
fn default_max_response_len() -> usize {
    1000
}
fn default_metrics_port() -> u16 {
    9091
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            api_key: None,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    /// Endpoint and credential, if both are configured and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.url.as_deref(), self.api_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some((url, key)),
            _ => None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            pacing_ms: default_pacing_ms(),
            max_error_len: default_max_error_len(),
            max_response_len: default_max_response_len(),
        }
    }
}

impl DispatchConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            port: default_metrics_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            api: ApiConfig::default(),
            provider: ProviderConfig::default(),
            dispatch: DispatchConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CAMPAIGN_SMS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.dispatch.concurrency, 10);
        assert_eq!(cfg.dispatch.pacing(), Duration::from_millis(100));
        assert_eq!(cfg.dispatch.max_error_len, 500);
        assert_eq!(cfg.dispatch.max_response_len, 1000);
    }

    #[test]
    fn test_provider_credentials_require_both() {
        let mut provider = ProviderConfig::default();
        assert!(provider.credentials().is_none());

        provider.url = Some("https://sms.example.com/send".into());
        assert!(provider.credentials().is_none());

        provider.api_key = Some(String::new());
        assert!(provider.credentials().is_none());

        provider.api_key = Some("secret".into());
        assert_eq!(
            provider.credentials(),
            Some(("https://sms.example.com/send", "secret"))
        );
    }

    #[test]
    fn test_deserialize_partial_config() {
        let cfg: AppConfig = serde_json::from_value(serde_json::json!({
            "dispatch": {"concurrency": 4},
            "api": {"api_key": "k"}
        }))
        .unwrap();
        assert_eq!(cfg.dispatch.concurrency, 4);
        assert_eq!(cfg.dispatch.pacing_ms, 100);
        assert_eq!(cfg.api.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.api.http_port, 4000);
    }
}
