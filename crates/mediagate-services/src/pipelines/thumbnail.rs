//! Thumbnail pipeline: one JPEG per player height

use super::{Pipeline, PipelineContext, PipelineOutcome};
use async_trait::async_trait;
use mediagate_core::{IngestError, IngestResult, ResourceKey, ResourceState};
use mediagate_processing::{render_thumbnails, THUMBNAIL_SIZES};

const JPEG_CONTENT_TYPE: &str = "image/jpeg";

pub struct ThumbnailPipeline {
    ctx: PipelineContext,
}

impl ThumbnailPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    fn size_key(key: &ResourceKey, size: u32) -> String {
        format!(
            "{}/thumbnails/{}_{}.jpg",
            key.resource_id(),
            key.stamp(),
            size
        )
    }
}

#[async_trait]
impl Pipeline for ThumbnailPipeline {
    fn name(&self) -> &'static str {
        "thumbnail"
    }

    async fn run(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<PipelineOutcome> {
        let data = self
            .ctx
            .storage
            .download(source_bucket, key.object_key())
            .await?;

        // Decoding and resampling are CPU bound
        let renditions =
            tokio::task::spawn_blocking(move || render_thumbnails(&data, &THUMBNAIL_SIZES))
        .await
        .map_err(|e| IngestError::Internal(format!("Thumbnail task join error: {}", e)))?
        .map_err(|e| IngestError::Thumbnail(format!("{:#}", e)))?;

        for (size, jpeg) in renditions {
            self.ctx
                .storage
                .upload_with_key(
                    &self.ctx.destination_bucket,
                    &Self::size_key(key, size),
                    jpeg,
                    JPEG_CONTENT_TYPE,
                )
                .await?;
        }

        self.ctx.set_state(key, ResourceState::Ready, None).await?;
        Ok(PipelineOutcome::terminal(ResourceState::Ready, None))
    }
}
