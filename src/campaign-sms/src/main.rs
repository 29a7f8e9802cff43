//! Campaign SMS — bulk SMS campaign dispatch server.
//!
//! Main entry point that wires the store, unsubscribe registry, SMS provider
//! and dispatch engine together and starts the management API.

use campaign_channels::sms::HttpSmsProvider;
use campaign_core::config::AppConfig;
use campaign_dispatch::{DispatchSettings, Dispatcher};
use campaign_intelligent_delivery::UnsubscribeList;
use campaign_management::{management_router, InMemoryStore, ManagementState};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "campaign-sms")]
#[command(about = "Bulk SMS campaign dispatch server")]
#[command(version)]
struct Cli {
    /// Node identifier (overrides config)
    #[arg(long, env = "CAMPAIGN_SMS__NODE_ID")]
    node_id: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long, env = "CAMPAIGN_SMS__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Maximum concurrent sends per run (overrides config)
    #[arg(long, env = "CAMPAIGN_SMS__DISPATCH__CONCURRENCY")]
    concurrency: Option<usize>,

    /// Create a demo campaign on startup
    #[arg(long, default_value_t = false)]
    seed_demo: bool,

    /// Skip the Prometheus exporter
    #[arg(long, default_value_t = false)]
    no_metrics: bool,
}

fn start_metrics(config: &AppConfig) -> anyhow::Result<()> {
    let addr = SocketAddr::new(config.api.host.parse()?, config.metrics.port);
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!(port = config.metrics.port, "Metrics exporter started");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "campaign_sms=info,campaign_dispatch=info,tower_http=info".into()
            }),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("Campaign SMS starting up");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    }
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(concurrency) = cli.concurrency {
        config.dispatch.concurrency = concurrency;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        concurrency = config.dispatch.concurrency,
        pacing_ms = config.dispatch.pacing_ms,
        "Configuration loaded"
    );

    if config.api.api_key.is_none() {
        warn!("No API key configured, protected routes will refuse requests");
    }

    let store = Arc::new(InMemoryStore::new());
    let registry = Arc::new(UnsubscribeList::new());

    if cli.seed_demo {
        store.seed_demo_data().await?;
    }

    let mut dispatcher = Dispatcher::new(
        store.clone(),
        registry.clone(),
        DispatchSettings::from(&config.dispatch),
    );
    match HttpSmsProvider::new(&config.provider) {
        Ok(provider) => {
            info!(url = provider.url(), "SMS provider configured");
            dispatcher = dispatcher.with_provider(Arc::new(provider));
        }
        Err(e) => warn!(error = %e, "Live sends disabled, only test mode is available"),
    }

    if !cli.no_metrics {
        if let Err(e) = start_metrics(&config) {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    let state = ManagementState {
        store,
        registry,
        dispatcher: Arc::new(dispatcher),
        api_key: config.api.api_key.clone(),
    };
    let app = management_router(state);

    let addr = SocketAddr::new(config.api.host.parse()?, config.api.http_port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Campaign SMS is ready to serve traffic");
    axum::serve(listener, app).await?;

    Ok(())
}
