//! Headless Opswatch sync client.
//!
//! Connects to the configured dashboard backend with the configured
//! token, keeps the snapshot in sync and logs connectivity and snapshot
//! summaries until interrupted.

use std::sync::Arc;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use opswatch_sync::adapters::http::HttpSnapshotLoader;
use opswatch_sync::adapters::session::InMemorySession;
use opswatch_sync::adapters::websocket::TungsteniteTransport;
use opswatch_sync::application::SyncService;
use opswatch_sync::config::{AppConfig, LogFormat, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_logging(&config.server);
    config.validate()?;

    let session = Arc::new(match config.session.token.clone() {
        Some(token) if config.session.has_token() => InMemorySession::authenticated(token),
        _ => {
            tracing::warn!("No session token configured; staying disconnected");
            InMemorySession::new()
        }
    });

    let transport = Arc::new(TungsteniteTransport::new(config.connection.channel_capacity));
    let loader = Arc::new(HttpSnapshotLoader::from_config(&config.server, &config.http));
    let sync = SyncService::new(transport, session, &config)?.with_loader(loader);

    tracing::info!(
        base_url = %config.server.base_url,
        reconnect_delay_ms = config.connection.reconnect_delay_ms,
        "Starting sync"
    );
    sync.start().await;

    let mut states = sync.watch_connection();
    let mut snapshots = sync.watch_snapshot();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted; shutting down");
                break;
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                tracing::info!(state = %state, "Connection state");
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                tracing::info!(
                    nodes = snapshot.entities().len(),
                    tracked = snapshot.detail_by_entity().len(),
                    events = snapshot.event_log().len(),
                    running = ?snapshot.stats().map(|s| s.running_processes),
                    alerts = ?snapshot.alerts().map(|a| a.total),
                    "Snapshot updated"
                );
            }
        }
    }

    sync.shutdown().await;
    Ok(())
}

fn init_logging(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let layer = match server.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}
