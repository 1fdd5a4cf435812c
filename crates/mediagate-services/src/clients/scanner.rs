//! Virus scanning seam

use async_trait::async_trait;
use mediagate_core::IngestResult;
use std::path::Path;

/// Outcome of a completed scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    /// Signature names reported by the engine
    Infected(Vec<String>),
}

/// Scans a file on local disk.
///
/// A finding is a verdict, not an error; `Err` means the engine itself could
/// not produce an answer.
#[async_trait]
pub trait VirusScanner: Send + Sync {
    async fn scan_file(&self, path: &Path) -> IngestResult<ScanVerdict>;
}
