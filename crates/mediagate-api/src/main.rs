use mediagate_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    mediagate_api::telemetry::init_telemetry(&config.log_format)?;

    // Build collaborators, dispatcher and routes
    let router = mediagate_api::setup::initialize_app(&config).await?;

    // Start the server
    mediagate_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
