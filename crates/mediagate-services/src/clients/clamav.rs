//! ClamAV daemon scanner

use super::scanner::{ScanVerdict, VirusScanner};
use async_trait::async_trait;
use clamav_client::{clean, Tcp};
use mediagate_core::{IngestError, IngestResult};
use std::path::{Path, PathBuf};
use std::str;
use std::time::{Duration, Instant};

#[derive(Clone)]
pub struct ClamAVScanner {
    host: String,
    port: u16,
    /// Timeout in seconds for each scan operation
    timeout_secs: u64,
}

impl ClamAVScanner {
    /// Create a new ClamAVScanner.
    ///
    /// # Arguments
    /// * `host` - ClamAV daemon hostname
    /// * `port` - ClamAV daemon port (typically 3310)
    /// * `timeout_secs` - Upper bound for one scan, including the file upload
    pub fn new(host: String, port: u16, timeout_secs: u64) -> Self {
        Self {
            host,
            port,
            timeout_secs,
        }
    }
}

/// Extract signature names from a clamd response such as
/// `stream: Win.Test.EICAR_HDB-1 FOUND`.
fn parse_signatures(response: &str) -> Vec<String> {
    let signatures: Vec<String> = response
        .split(['\0', '\n'])
        .filter_map(|line| {
            let line = line.trim();
            let finding = line.strip_suffix("FOUND")?.trim_end();
            let name = finding.rsplit_once(':').map_or(finding, |(_, name)| name);
            let name = name.trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect();

    if signatures.is_empty() {
        vec!["unknown".to_string()]
    } else {
        signatures
    }
}

#[async_trait]
impl VirusScanner for ClamAVScanner {
    /// Scan with the sync client inside spawn_blocking to avoid !Send tokio futures.
    async fn scan_file(&self, path: &Path) -> IngestResult<ScanVerdict> {
        let start = Instant::now();
        tracing::debug!(host = %self.host, port = %self.port, "Starting ClamAV scan");
        let path: PathBuf = path.to_path_buf();
        let address = format!("{}:{}", self.host, self.port);
        let timeout_secs = self.timeout_secs;

        let result = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::task::spawn_blocking(move || -> IngestResult<ScanVerdict> {
                let connection = Tcp {
                    host_address: address.as_str(),
                };
                let response_bytes = clamav_client::scan_file(&path, connection, None)
                    .map_err(|e| IngestError::Scan(e.to_string()))?;

                let is_clean = clean(&response_bytes).map_err(|e| {
                    IngestError::Scan(format!("Failed to parse ClamAV response: {}", e))
                })?;

                if is_clean {
                    return Ok(ScanVerdict::Clean);
                }

                let response = str::from_utf8(&response_bytes).unwrap_or("unknown");
                Ok(ScanVerdict::Infected(parse_signatures(response)))
            }),
        )
        .await;

        let verdict = match result {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => Err(IngestError::Scan(format!(
                "ClamAV scan task join error: {}",
                e
            ))),
            Err(_) => Err(IngestError::Scan(format!(
                "ClamAV scan timeout (exceeded {} seconds)",
                timeout_secs
            ))),
        };

        match &verdict {
            Ok(ScanVerdict::Clean) => tracing::info!(
                duration_ms = start.elapsed().as_millis(),
                "File scan completed: clean"
            ),
            Ok(ScanVerdict::Infected(signatures)) => tracing::warn!(
                duration_ms = start.elapsed().as_millis(),
                signatures = ?signatures,
                "File scan detected virus"
            ),
            Err(e) => tracing::error!(error = %e, "ClamAV scan failed"),
        }

        verdict
    }
}
