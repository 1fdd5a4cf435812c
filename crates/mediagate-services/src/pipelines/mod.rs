//! Per-kind ingest pipelines
//!
//! Each pipeline receives its collaborators at construction, runs for one
//! object key and reports progress to the state tracker. The destination
//! keys a pipeline writes never overlap with another key's, so pipelines for
//! different keys run without coordination.

mod copy;
mod outcome;
mod scan;
mod shared_live_media;
mod thumbnail;
mod timed_text;
mod video;

pub use copy::CopyPipeline;
pub use outcome::PipelineOutcome;
pub use scan::ScanCopyPipeline;
pub use shared_live_media::{SharedLiveMediaPipeline, DEFAULT_PAGE_CONCURRENCY};
pub use thumbnail::ThumbnailPipeline;
pub use timed_text::TimedTextPipeline;
pub use video::{VideoPipeline, VideoSettings};

use crate::clients::StateTracker;
use async_trait::async_trait;
use mediagate_core::{IngestResult, ResourceKey, ResourceState, StateMetadata};
use mediagate_storage::Storage;
use std::sync::Arc;

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn run(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<PipelineOutcome>;
}

/// Collaborators every pipeline needs: storage, the state tracker and the
/// bucket derived artifacts are written to.
#[derive(Clone)]
pub struct PipelineContext {
    pub storage: Arc<dyn Storage>,
    pub state_tracker: Arc<dyn StateTracker>,
    pub destination_bucket: String,
}

impl PipelineContext {
    pub fn new(
        storage: Arc<dyn Storage>,
        state_tracker: Arc<dyn StateTracker>,
        destination_bucket: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            state_tracker,
            destination_bucket: destination_bucket.into(),
        }
    }

    pub(crate) async fn set_state(
        &self,
        key: &ResourceKey,
        state: ResourceState,
        metadata: Option<StateMetadata>,
    ) -> IngestResult<()> {
        tracing::debug!(key = %key, state = %state, "Updating resource state");
        self.state_tracker
            .update_state(key.object_key(), state, metadata)
            .await
    }

    /// Copy the source object to `to_key` in the destination bucket.
    pub(crate) async fn copy_to_destination(
        &self,
        key: &ResourceKey,
        source_bucket: &str,
        to_key: &str,
    ) -> IngestResult<()> {
        self.storage
            .copy(
                source_bucket,
                key.object_key(),
                &self.destination_bucket,
                to_key,
            )
            .await?;
        Ok(())
    }
}

/// Metadata map holding a single `extension` entry, when there is one
pub(crate) fn extension_metadata(extension: Option<&str>) -> Option<StateMetadata> {
    extension.map(|ext| {
        let mut metadata = StateMetadata::new();
        metadata.insert("extension".to_string(), ext.into());
        metadata
    })
}
