//! Order Gate Binary
//!
//! Starts the pre-trade risk gate: loads configuration, validates it,
//! builds the store and broker adapter, probes broker connectivity, then
//! idles until terminated. Order intake is an embedding surface; callers
//! submit through [`order_gate::ExecutionCoordinator`].
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin order-gate
//! ```
//!
//! # Environment Variables
//!
//! - `TRADING_MODE`: PAPER | LIVE (default: PAPER)
//! - `DHAN_CLIENT_ID`: Broker client id (required for LIVE)
//! - `DHAN_ACCESS_TOKEN`: Broker access token (required for LIVE)
//! - `DATABASE_URL`: Postgres URL (optional; in-memory store when absent)
//! - `ORDER_GATE_CONFIG`: Config file path (default: `config.yaml`)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use anyhow::Context;
use order_gate::config::{GateConfig, load_config, load_config_from_string, validate_startup};
use order_gate::store::{GateStore, InMemoryGateStore, PgGateStore};
use order_gate::{BrokerAdapter, ExecutionCoordinator, build_broker, telemetry};
use tokio::signal;

/// Config file consulted when `ORDER_GATE_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Fallback configuration when no config file exists. Routes the documented
/// environment variables through the same interpolation as a real file.
/// Values that may interpolate to empty are quoted so they stay strings.
const FALLBACK_CONFIG: &str = r#"
trading:
  mode: "${TRADING_MODE:-PAPER}"
broker:
  dhan:
    client_id: "${DHAN_CLIENT_ID:-}"
    access_token: "${DHAN_ACCESS_TOKEN:-}"
database:
  url: "${DATABASE_URL:-}"
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();
    telemetry::init_tracing();

    tracing::info!("Starting order gate");

    let config = resolve_config().context("failed to load configuration")?;
    log_config(&config);

    let validation = validate_startup(&config).context("startup validation failed")?;
    for warning in &validation.warnings {
        tracing::warn!("{warning}");
    }

    let store = build_store(&config).await?;
    let broker = build_broker(&config).context("failed to build broker adapter")?;
    probe_connectivity(broker.as_ref()).await;

    // Held for the process lifetime; embedding callers submit through it.
    let _gate = ExecutionCoordinator::new(store, broker)
        .with_placement_timeout(config.execution.placement_timeout());

    tracing::info!("Order gate ready");

    shutdown_signal().await;

    tracing::info!("Order gate stopped");
    Ok(())
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Load configuration from `ORDER_GATE_CONFIG`, the default path, or the
/// embedded fallback when no file exists.
fn resolve_config() -> anyhow::Result<GateConfig> {
    if let Ok(path) = std::env::var("ORDER_GATE_CONFIG") {
        return Ok(load_config(Some(path.as_str()))?);
    }

    if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() {
        return Ok(load_config(Some(DEFAULT_CONFIG_PATH))?);
    }

    tracing::info!("No config file found, using environment defaults");
    Ok(load_config_from_string(FALLBACK_CONFIG)?)
}

/// Log the effective configuration.
fn log_config(config: &GateConfig) {
    tracing::info!(
        mode = %config.trading.mode,
        database = config.database.configured_url().is_some(),
        placement_timeout_secs = config.execution.placement_timeout_secs,
        "Configuration loaded"
    );
}

/// Select the store implementation: Postgres when a database URL is
/// configured, in-memory otherwise.
async fn build_store(config: &GateConfig) -> anyhow::Result<Arc<dyn GateStore>> {
    match config.database.configured_url() {
        Some(url) => {
            let store = PgGateStore::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            tracing::info!("Postgres store connected");
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("Using in-memory store");
            Ok(Arc::new(InMemoryGateStore::new()))
        }
    }
}

/// Probe broker connectivity once at startup and log the result.
async fn probe_connectivity(broker: &dyn BrokerAdapter) {
    let report = broker.check_connectivity().await;
    if report.connected {
        tracing::info!(
            broker = broker.name(),
            available_margin = ?report.available_margin,
            utilized_margin = ?report.utilized_margin,
            "Broker connectivity verified"
        );
    } else {
        tracing::warn!(
            broker = broker.name(),
            "Broker unreachable at startup, placements will be rejected until it recovers"
        );
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed; the process must be able
/// to respond to termination signals.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
