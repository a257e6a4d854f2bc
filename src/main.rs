//! stickyd - sticky message daemon
//!
//! Keeps a designated message pinned to the bottom of chat channels by
//! reposting it whenever user traffic pushes it up.

mod config;
mod error;
mod handlers;
mod http;
mod metrics;
mod network;
mod platform;
mod state;
mod sticky;
mod store;

use crate::config::{Config, LogFormat, validate};
use crate::handlers::EventHandler;
use crate::network::GatewayClient;
use crate::platform::{DiscordRest, Platform};
use crate::sticky::StickyService;
use crate::store::StickyStore;
use std::sync::Arc;
use stickyd_proto::MessageCreate;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Inbound events buffered between the gateway and the dispatcher.
const EVENT_CHANNEL_SIZE: usize = 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let loaded = Config::load(&config_path);

    // Initialize tracing
    let format = loaded
        .as_ref()
        .map(|c| c.logging.format)
        .unwrap_or_default();
    init_tracing(format);

    let config = loaded.map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }
    let theme = config.theme.resolve()?;

    info!(
        prefix = %config.bot.prefix,
        store = %config.store.path,
        admins = config.bot.admin_users.len(),
        admin_roles = config.bot.admin_roles.len(),
        "Starting stickyd"
    );

    // Prometheus metrics are optional; metrics_port = 0 disables the endpoint.
    if config.metrics_port != 0 {
        metrics::init();
        info!("Metrics initialized");
    }

    let store = Arc::new(StickyStore::open(&config.store.path));
    let platform: Arc<dyn Platform> = Arc::new(DiscordRest::new(&config.api, &config.bot.token)?);
    let service = Arc::new(StickyService::new(
        Arc::clone(&store),
        Arc::clone(&platform),
        theme,
    ));
    let handler = Arc::new(EventHandler::new(
        service,
        platform,
        config.bot.clone(),
        theme,
    ));

    if config.metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        let port = config.metrics_port;
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            http::run_http_server(port, store).await;
        });
        info!(port, "Prometheus HTTP server started");
    }

    // Each event runs on its own task so refreshes of different channels interleave.
    let (events_tx, mut events_rx) = mpsc::channel::<MessageCreate>(EVENT_CHANNEL_SIZE);
    let dispatcher = tokio::spawn(async move {
        while let Some(message) = events_rx.recv().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                handler.handle(message).await;
            });
        }
    });

    let gateway = GatewayClient::new(config.gateway.clone(), config.bot.token.clone(), events_tx);

    tokio::select! {
        result = gateway.run() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    dispatcher.abort();
    info!(stickies = store.len(), "stickyd stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}
