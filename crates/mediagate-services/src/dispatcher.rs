//! Routing from resource kind to pipeline

use crate::clients::{StateTracker, TranscodeEngine, VirusScanner};
use crate::pipelines::{
    CopyPipeline, Pipeline, PipelineContext, PipelineOutcome, ScanCopyPipeline,
    SharedLiveMediaPipeline, ThumbnailPipeline, TimedTextPipeline, VideoPipeline, VideoSettings,
};
use mediagate_core::{IngestError, IngestResult, ResourceKey, ResourceKind};
use mediagate_processing::{MediaProbe, PdfRasterizer};
use mediagate_storage::Storage;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything the default pipelines are built from
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn Storage>,
    pub state_tracker: Arc<dyn StateTracker>,
    pub scanner: Arc<dyn VirusScanner>,
    pub rasterizer: Arc<dyn PdfRasterizer>,
    pub probe: Arc<dyn MediaProbe>,
    pub transcoder: Arc<dyn TranscodeEngine>,
    pub destination_bucket: String,
    pub page_render_concurrency: usize,
    pub video: VideoSettings,
}

/// Routing table from [`ResourceKind`] to the pipeline handling it
#[derive(Clone, Default)]
pub struct Dispatcher {
    pipelines: HashMap<ResourceKind, Arc<dyn Pipeline>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `kind` to `pipeline`, replacing any previous route.
    pub fn register(mut self, kind: ResourceKind, pipeline: Arc<dyn Pipeline>) -> Self {
        self.pipelines.insert(kind, pipeline);
        self
    }

    /// The standard table covering every kind.
    pub fn with_default_pipelines(collaborators: Collaborators) -> Self {
        let ctx = PipelineContext::new(
            collaborators.storage,
            collaborators.state_tracker,
            collaborators.destination_bucket,
        );

        let copy: Arc<dyn Pipeline> = Arc::new(CopyPipeline::new(ctx.clone()));

        Self::new()
            .register(ResourceKind::Document, Arc::clone(&copy))
            .register(ResourceKind::ClassroomDocument, Arc::clone(&copy))
            .register(ResourceKind::MarkdownImage, copy)
            .register(
                ResourceKind::DepositedFile,
                Arc::new(ScanCopyPipeline::new(ctx.clone(), collaborators.scanner)),
            )
            .register(
                ResourceKind::SharedLiveMedia,
                Arc::new(
                    SharedLiveMediaPipeline::new(ctx.clone(), collaborators.rasterizer)
                        .with_page_concurrency(collaborators.page_render_concurrency),
                ),
            )
            .register(
                ResourceKind::TimedTextTrack,
                Arc::new(TimedTextPipeline::new(ctx.clone())),
            )
            .register(
                ResourceKind::Thumbnail,
                Arc::new(ThumbnailPipeline::new(ctx.clone())),
            )
            .register(
                ResourceKind::Video,
                Arc::new(VideoPipeline::new(
                    ctx,
                    collaborators.probe,
                    collaborators.transcoder,
                    collaborators.video,
                )),
            )
    }

    /// Run the pipeline registered for the key's kind.
    pub async fn dispatch(
        &self,
        key: &ResourceKey,
        source_bucket: &str,
    ) -> IngestResult<PipelineOutcome> {
        let pipeline = self.pipelines.get(&key.kind()).ok_or_else(|| {
            IngestError::Internal(format!("No pipeline registered for {}", key.kind().token()))
        })?;

        let start = std::time::Instant::now();
        tracing::info!(
            key = %key,
            bucket = %source_bucket,
            pipeline = pipeline.name(),
            "Dispatching object"
        );

        let result = pipeline.run(key, source_bucket).await;

        match &result {
            Ok(outcome) => tracing::info!(
                key = %key,
                pipeline = pipeline.name(),
                state = %outcome.state(),
                duration_ms = start.elapsed().as_millis(),
                "Pipeline completed"
            ),
            Err(e) => tracing::error!(
                key = %key,
                pipeline = pipeline.name(),
                error = %e,
                error_type = e.error_type(),
                duration_ms = start.elapsed().as_millis(),
                "Pipeline failed"
            ),
        }

        result
    }

    /// Validate a raw object key and dispatch it.
    pub async fn handle(
        &self,
        object_key: &str,
        source_bucket: &str,
    ) -> IngestResult<PipelineOutcome> {
        let key = ResourceKey::parse(object_key).inspect_err(|e| {
            tracing::warn!(key = %object_key, error = %e, "Rejected object key");
        })?;
        self.dispatch(&key, source_bucket).await
    }
}
