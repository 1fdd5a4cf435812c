//! Mediagate Services Layer
//!
//! This crate hosts the ingest pipelines, the dispatcher routing object keys
//! to them, and the clients for the collaborators the pipelines call (state
//! tracker, transcode engine, virus scanner). It re-exports the storage and
//! processing seams so the API crate depends on a single facade.

pub mod clients;
pub mod dispatcher;
pub mod pipelines;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use clients::{
    HttpStateTracker, HttpTranscodeEngine, ScanVerdict, StateTracker, TranscodeEngine,
    VirusScanner,
};
#[cfg(feature = "clamav")]
pub use clients::ClamAVScanner;
pub use dispatcher::{Collaborators, Dispatcher};
pub use mediagate_processing::{FfprobeProbe, MediaProbe, PdfRasterizer, PopplerRasterizer};
pub use mediagate_storage::{create_storage, Storage, StorageBackend, StorageError, StorageResult};
pub use pipelines::{Pipeline, PipelineContext, PipelineOutcome, VideoSettings};
