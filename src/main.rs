use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier::cli::{run_command, Cli};
use atelier::config::Config;
use atelier::db::SiteSettings;
use atelier::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.command.is_some() {
        // Client commands only log problems unless asked otherwise
        init_logging(cli.log_level.as_deref().unwrap_or("warn"));
        return run_command(&cli).await;
    }

    // Load configuration
    let config = Config::load(&cli.config)?;

    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_logging(&log_level);

    tracing::info!("Starting Atelier v{}", env!("CARGO_PKG_VERSION"));

    // Ensure data and upload directories exist
    atelier::utils::ensure_dir(&config.server.data_dir)?;
    atelier::utils::ensure_dir(&config.server.uploads_dir)?;

    // Initialize database
    let db = atelier::db::init(&config.server.data_dir).await?;
    let settings = SiteSettings::load(&db)
        .await
        .context("Failed to load site settings")?;

    let mut state = AppState::new(config.clone(), db, settings);
    if config.metrics.enabled {
        let handle = atelier::api::metrics::init_metrics()?;
        state = state.with_metrics(handle);
        tracing::info!("Metrics exposed at /metrics");
    }
    let state = Arc::new(state);

    if config.rate_limit.enabled {
        atelier::api::rate_limit::spawn_cleanup_task(
            state.rate_limiter.clone(),
            config.rate_limit.cleanup_interval,
        );
    }

    if config.chat.upstream_url.is_none() {
        tracing::warn!("No chat upstream configured, /api/chat will answer 503");
    }

    let app = atelier::api::create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Site listening on http://{}", addr);
    tracing::info!("Dashboard at http://{}/dashboard", addr);
    tracing::info!("Admin token: {}", config.auth.admin_token);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
