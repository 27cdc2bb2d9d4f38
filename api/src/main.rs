use anyhow::Result;
use std::net::SocketAddr;

mod handlers;
mod routes;
mod state;
mod templates;

use common::config::Settings;
use common::db::repositories::AgentRepository;
use common::db::DbPool;
use common::telemetry;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Settings::load()?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    telemetry::init_logging(
        &config.observability.log_level,
        config.observability.log_format,
    )?;
    tracing::info!(
        host = %config.server.host,
        port = %config.server.port,
        environment = %config.environment,
        "Configuration loaded"
    );

    let metrics_handle = telemetry::init_metrics()?;

    // Initialize database connection pool (creates the schema)
    let db_pool = DbPool::new(&config.database).await?;
    tracing::info!("Database connection pool established");

    if config.database.seed_sample_agents {
        AgentRepository::new(db_pool.clone())
            .seed_samples_if_empty(config.rotation.anchor)
            .await?;
    }

    // Create application state
    let state = AppState::new(db_pool.clone(), config.clone(), metrics_handle)?;
    tracing::info!(
        anchor = %state.anchor(),
        cycle_length = state.rotation.cycle().len(),
        groups = state.rotation.groups().len(),
        "Rotation loaded"
    );

    // Create router
    let app = routes::create_router(state);

    // Start server
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));
    tracing::info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db_pool.close().await;
    tracing::info!("API server stopped");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }

    tracing::info!("Initiating graceful shutdown");
}
