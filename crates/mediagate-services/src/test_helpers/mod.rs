//! Test helpers for pipeline tests
//!
//! This module provides an in-memory Storage and recording fakes for every
//! collaborator, so pipelines can be exercised without network services or
//! external binaries.

pub mod fakes;
pub mod mock_storage;

pub use fakes::*;
pub use mock_storage::*;

use crate::dispatcher::Collaborators;
use crate::pipelines::{PipelineContext, VideoSettings, DEFAULT_PAGE_CONCURRENCY};
use std::sync::Arc;

pub const SOURCE_BUCKET: &str = "source";
pub const DESTINATION_BUCKET: &str = "destination";

/// Handles on the fakes behind a [`Collaborators`] set
pub struct TestHarness {
    pub storage: Arc<MemoryStorage>,
    pub tracker: Arc<RecordingStateTracker>,
    pub scanner: Arc<FakeScanner>,
    pub rasterizer: Arc<FakeRasterizer>,
    pub probe: Arc<FakeProbe>,
    pub transcoder: Arc<FakeTranscoder>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            tracker: Arc::new(RecordingStateTracker::new()),
            scanner: Arc::new(FakeScanner::clean()),
            rasterizer: Arc::new(FakeRasterizer::with_pages(1)),
            probe: Arc::new(FakeProbe::new(None)),
            transcoder: Arc::new(FakeTranscoder::new("1234567890123-abc123")),
        }
    }

    pub fn context(&self) -> PipelineContext {
        PipelineContext::new(
            self.storage.clone(),
            self.tracker.clone(),
            DESTINATION_BUCKET,
        )
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            storage: self.storage.clone(),
            state_tracker: self.tracker.clone(),
            scanner: self.scanner.clone(),
            rasterizer: self.rasterizer.clone(),
            probe: self.probe.clone(),
            transcoder: self.transcoder.clone(),
            destination_bucket: DESTINATION_BUCKET.to_string(),
            page_render_concurrency: DEFAULT_PAGE_CONCURRENCY,
            video: VideoSettings::default(),
        }
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
