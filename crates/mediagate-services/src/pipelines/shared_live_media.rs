//! Paginate-and-convert pipeline for shared live media PDFs

use super::{Pipeline, PipelineContext, PipelineOutcome};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use mediagate_core::{IngestError, IngestResult, ResourceKey, ResourceState, StateMetadata};
use mediagate_processing::PdfRasterizer;
use serde_json::json;
use std::sync::Arc;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// Pages rendered at once unless configured otherwise
pub const DEFAULT_PAGE_CONCURRENCY: usize = 8;

pub struct SharedLiveMediaPipeline {
    ctx: PipelineContext,
    rasterizer: Arc<dyn PdfRasterizer>,
    page_concurrency: usize,
}

impl SharedLiveMediaPipeline {
    pub fn new(ctx: PipelineContext, rasterizer: Arc<dyn PdfRasterizer>) -> Self {
        Self {
            ctx,
            rasterizer,
            page_concurrency: DEFAULT_PAGE_CONCURRENCY,
        }
    }

    /// Bound the number of pages rendered and uploaded at the same time.
    pub fn with_page_concurrency(mut self, limit: usize) -> Self {
        self.page_concurrency = limit.max(1);
        self
    }

    fn page_key(key: &ResourceKey, page: u32) -> String {
        format!(
            "{}/sharedlivemedia/{}/{}_{}.svg",
            key.resource_id(),
            key.record_id(),
            key.stamp(),
            page
        )
    }

    async fn publish_page(&self, key: &ResourceKey, pdf: &[u8], page: u32) -> IngestResult<String> {
        let svg = self
            .rasterizer
            .render_page_svg(pdf, page)
            .await
            .map_err(|e| IngestError::Rasterize(format!("Page {}: {:#}", page, e)))?;

        let page_key = Self::page_key(key, page);
        self.ctx
            .storage
            .upload_with_key(&self.ctx.destination_bucket, &page_key, svg, SVG_CONTENT_TYPE)
            .await?;

        Ok(page_key)
    }
}

#[async_trait]
impl Pipeline for SharedLiveMediaPipeline {
    fn name(&self) -> &'static str {
        "paginate-and-convert"
    }

    async fn run(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<PipelineOutcome> {
        self.ctx
            .set_state(key, ResourceState::Processing, None)
            .await?;

        let pdf = self
            .ctx
            .storage
            .download(source_bucket, key.object_key())
            .await?;

        let nb_pages = self
            .rasterizer
            .page_count(&pdf)
            .await
            .map_err(|e| IngestError::Rasterize(format!("{:#}", e)))?;

        // All pages or nothing: the first failure drops the remaining futures
        let page_keys: Vec<String> = stream::iter(1..=nb_pages)
            .map(|page| self.publish_page(key, &pdf, page))
            .buffered(self.page_concurrency)
            .try_collect()
            .await?;

        tracing::info!(
            key = %key,
            nb_pages = nb_pages,
            pages_written = page_keys.len(),
            "Shared live media pages published"
        );

        self.ctx
            .copy_to_destination(key, source_bucket, key.object_key())
            .await?;

        let mut metadata = StateMetadata::new();
        metadata.insert("nbPages".to_string(), json!(page_keys.len()));
        metadata.insert("extension".to_string(), json!(key.extension()));

        self.ctx
            .set_state(key, ResourceState::Ready, Some(metadata.clone()))
            .await?;

        Ok(PipelineOutcome::Success { metadata })
    }
}
