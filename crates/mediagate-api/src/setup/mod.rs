//! Application setup and initialization

pub mod routes;
pub mod server;

use anyhow::Context;
use axum::Router;
use mediagate_core::Config;
use mediagate_services::{
    create_storage, ClamAVScanner, Collaborators, Dispatcher, FfprobeProbe, HttpStateTracker,
    HttpTranscodeEngine, PopplerRasterizer, VideoSettings,
};
use std::sync::Arc;

use crate::state::AppState;

/// Build every collaborator from configuration and return the application router.
pub async fn initialize_app(config: &Config) -> Result<Router, anyhow::Error> {
    tracing::info!(
        environment = %config.environment,
        destination_bucket = %config.destination_bucket,
        storage_backend = %config.storage_backend,
        "Initializing Mediagate"
    );

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let state_tracker = HttpStateTracker::new(
        config.state_tracker_endpoint.clone(),
        config.state_tracker_timeout(),
    )?;
    let transcoder = HttpTranscodeEngine::new(
        config.transcode_endpoint.clone(),
        config.transcode_timeout(),
    )?;
    let scanner = ClamAVScanner::new(
        config.clamav_host.clone(),
        config.clamav_port,
        config.clamav_timeout_secs,
    );
    let probe = FfprobeProbe::new(config.ffprobe_path.clone())?;
    let rasterizer = PopplerRasterizer::new(
        config.pdfinfo_path.clone(),
        config.pdftocairo_path.clone(),
    );

    let dispatcher = Dispatcher::with_default_pipelines(Collaborators {
        storage,
        state_tracker: Arc::new(state_tracker),
        scanner: Arc::new(scanner),
        rasterizer: Arc::new(rasterizer),
        probe: Arc::new(probe),
        transcoder: Arc::new(transcoder),
        destination_bucket: config.destination_bucket.clone(),
        page_render_concurrency: config.page_render_concurrency,
        video: VideoSettings {
            signed_url_expiry: config.signed_url_expiry(),
            queue: config.transcode_queue.clone(),
            role: config.transcode_role.clone(),
        },
    });

    tracing::info!("Collaborators initialized");

    Ok(routes::setup_routes(AppState::new(dispatcher)))
}
