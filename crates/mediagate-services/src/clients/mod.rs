//! Clients for the external collaborators of the ingest pipelines

pub mod scanner;
pub mod state_tracker;
pub mod transcoder;

#[cfg(feature = "clamav")]
pub mod clamav;

pub use scanner::{ScanVerdict, VirusScanner};
pub use state_tracker::{HttpStateTracker, StateTracker};
pub use transcoder::{HttpTranscodeEngine, TranscodeEngine};

#[cfg(feature = "clamav")]
pub use clamav::ClamAVScanner;
