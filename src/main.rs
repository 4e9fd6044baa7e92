//! HugMood gateway: real-time WebSocket front door for the HugMood backends.
//!
//! Main entry point that wires all crates together and starts the server.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use hugmood_api::{AppState, build_app};
use hugmood_core::config::AppConfig;
use hugmood_core::error::AppError;
use hugmood_realtime::GatewayEngine;
use hugmood_services::Backends;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "hugmood-gateway", version, about = "HugMood real-time gateway")]
struct Cli {
    /// Configuration environment; selects `config/<env>.toml`.
    #[arg(long, env = "HUGMOOD_ENV", default_value = "development")]
    env: String,

    /// Directory holding the configuration files.
    #[arg(long, env = "HUGMOOD_CONFIG_DIR", default_value = "config")]
    config_dir: String,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(&cli.config_dir, &cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!(env = %cli.env, config_dir = %cli.config_dir, "Configuration loaded");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting HugMood gateway v{}", env!("CARGO_PKG_VERSION"));

    let backends = Backends::graphql(&config.services)?;
    tracing::info!(
        auth = %config.services.auth_url,
        user = %config.services.user_url,
        mood = %config.services.mood_url,
        hug = %config.services.hug_url,
        "Downstream services configured"
    );

    let engine = GatewayEngine::new(config.realtime.clone(), backends);
    let sweeper = tokio::spawn(engine.sweeper().run(engine.shutdown_signal()));

    let addr = config.server.bind_addr();
    let ws_path = config.server.ws_path.clone();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let app = build_app(AppState::new(config, engine.clone()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(addr = %addr, ws_path = %ws_path, "HugMood gateway listening");

    let shutdown_engine = engine.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, closing connections...");
            shutdown_engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    if tokio::time::timeout(grace, sweeper).await.is_err() {
        tracing::warn!("Sweeper did not stop within the shutdown grace period");
    }

    tracing::info!("HugMood gateway shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
