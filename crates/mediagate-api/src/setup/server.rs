//! Listener startup and signal-driven drain

use anyhow::Result;
use axum::Router;
use mediagate_core::Config;

/// Bind the event listener and serve until SIGINT or SIGTERM.
///
/// In-flight notifications finish their pipeline before the process exits.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        environment = %config.environment,
        storage_backend = %config.storage_backend,
        destination_bucket = %config.destination_bucket,
        state_tracker = %config.state_tracker_endpoint,
        transcode_endpoint = %config.transcode_endpoint,
        clamav_address = %format!("{}:{}", config.clamav_host, config.clamav_port),
        page_render_concurrency = config.page_render_concurrency,
        "Listening for object-created events"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let signal = termination_signal().await;
            tracing::info!(signal, "Draining in-flight events before exit");
        })
        .await?;

    tracing::info!("Event listener stopped");
    Ok(())
}

/// Resolve with the name of the first termination signal received.
///
/// # Panics
/// Panics if a signal handler cannot be installed.
async fn termination_signal() -> &'static str {
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
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
