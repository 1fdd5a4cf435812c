//! Configuration module
//!
//! Immutable process-wide settings (bucket names, collaborator endpoints,
//! tool paths), loaded once from the environment at startup.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 4000;
const STATE_TRACKER_TIMEOUT_SECS: u64 = 30;
const TRANSCODE_TIMEOUT_SECS: u64 = 30;
const CLAMAV_PORT: u16 = 3310;
const CLAMAV_TIMEOUT_SECS: u64 = 120;
const SIGNED_URL_EXPIRY_SECS: u64 = 1200;
const PAGE_RENDER_CONCURRENCY: usize = 8;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub log_format: String,
    // Storage configuration
    pub destination_bucket: String,
    pub storage_backend: StorageBackend,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // External collaborators
    pub state_tracker_endpoint: String,
    pub state_tracker_timeout_secs: u64,
    pub transcode_endpoint: String,
    pub transcode_timeout_secs: u64,
    pub transcode_queue: Option<String>,
    pub transcode_role: Option<String>,
    pub clamav_host: String,
    pub clamav_port: u16,
    pub clamav_timeout_secs: u64,
    // Local tools
    pub ffprobe_path: String,
    pub pdfinfo_path: String,
    pub pdftocairo_path: String,
    pub signed_url_expiry_secs: u64,
    /// Shared live media pages rendered at once
    pub page_render_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StorageBackend::S3,
        };

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "compact".to_string())
                .to_lowercase(),
            destination_bucket: env::var("DESTINATION_BUCKET_NAME").unwrap_or_default(),
            storage_backend,
            s3_region: env::var("S3_REGION").or_else(|_| env::var("AWS_REGION")).ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            state_tracker_endpoint: env::var("STATE_TRACKER_ENDPOINT").unwrap_or_default(),
            state_tracker_timeout_secs: env::var("STATE_TRACKER_TIMEOUT_SECS")
                .unwrap_or_else(|_| STATE_TRACKER_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(STATE_TRACKER_TIMEOUT_SECS),
            transcode_endpoint: env::var("TRANSCODE_ENDPOINT").unwrap_or_default(),
            transcode_timeout_secs: env::var("TRANSCODE_TIMEOUT_SECS")
                .unwrap_or_else(|_| TRANSCODE_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(TRANSCODE_TIMEOUT_SECS),
            transcode_queue: env::var("TRANSCODE_QUEUE").ok().filter(|s| !s.is_empty()),
            transcode_role: env::var("TRANSCODE_ROLE").ok().filter(|s| !s.is_empty()),
            clamav_host: env::var("CLAMAV_HOST").unwrap_or_else(|_| "localhost".to_string()),
            clamav_port: env::var("CLAMAV_PORT")
                .unwrap_or_else(|_| CLAMAV_PORT.to_string())
                .parse()
                .unwrap_or(CLAMAV_PORT),
            clamav_timeout_secs: env::var("CLAMAV_TIMEOUT_SECS")
                .unwrap_or_else(|_| CLAMAV_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CLAMAV_TIMEOUT_SECS),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            pdfinfo_path: env::var("PDFINFO_PATH").unwrap_or_else(|_| "pdfinfo".to_string()),
            pdftocairo_path: env::var("PDFTOCAIRO_PATH")
                .unwrap_or_else(|_| "pdftocairo".to_string()),
            signed_url_expiry_secs: env::var("SIGNED_URL_EXPIRY_SECS")
                .unwrap_or_else(|_| SIGNED_URL_EXPIRY_SECS.to_string())
                .parse()
                .unwrap_or(SIGNED_URL_EXPIRY_SECS),
            page_render_concurrency: env::var("PAGE_RENDER_CONCURRENCY")
                .unwrap_or_else(|_| PAGE_RENDER_CONCURRENCY.to_string())
                .parse()
                .unwrap_or(PAGE_RENDER_CONCURRENCY),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.destination_bucket.trim().is_empty() {
            return Err(anyhow::anyhow!("DESTINATION_BUCKET_NAME must be set"));
        }

        if !self.state_tracker_endpoint.starts_with("http://")
            && !self.state_tracker_endpoint.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "STATE_TRACKER_ENDPOINT must be set to an http(s) URL"
            ));
        }

        if !self.transcode_endpoint.starts_with("http://")
            && !self.transcode_endpoint.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "TRANSCODE_ENDPOINT must be set to an http(s) URL"
            ));
        }

        if self.page_render_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "PAGE_RENDER_CONCURRENCY must be at least 1"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiry_secs)
    }

    pub fn state_tracker_timeout(&self) -> Duration {
        Duration::from_secs(self.state_tracker_timeout_secs)
    }

    pub fn transcode_timeout(&self) -> Duration {
        Duration::from_secs(self.transcode_timeout_secs)
    }
}
