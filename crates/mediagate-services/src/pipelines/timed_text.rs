//! Timed text track pipeline: caption files to WebVTT

use super::{extension_metadata, Pipeline, PipelineContext, PipelineOutcome};
use async_trait::async_trait;
use mediagate_core::{IngestResult, ResourceKey, ResourceState, TimedTextMode};
use mediagate_processing::subtitle::{convert_to_webvtt, encode_transcript};

const VTT_CONTENT_TYPE: &str = "text/vtt";

pub struct TimedTextPipeline {
    ctx: PipelineContext,
}

impl TimedTextPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    fn vtt_key(key: &ResourceKey) -> String {
        format!("{}/timedtext/{}.vtt", key.resource_id(), key.stamp())
    }

    fn source_key(key: &ResourceKey) -> String {
        format!("{}/timedtext/source/{}", key.resource_id(), key.stamp())
    }
}

#[async_trait]
impl Pipeline for TimedTextPipeline {
    fn name(&self) -> &'static str {
        "timed-text"
    }

    async fn run(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<PipelineOutcome> {
        let data = self
            .ctx
            .storage
            .download(source_bucket, key.object_key())
            .await?;

        let converted = match key.mode() {
            Some(TimedTextMode::Subtitle) | Some(TimedTextMode::ClosedCaption) => {
                convert_to_webvtt(&data)
            }
            Some(TimedTextMode::Transcript) | None => encode_transcript(&data),
        };

        // Bad caption content ends the pipeline in `error` without failing the call
        let track = match converted {
            Ok(track) => track,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Timed text conversion failed");
                self.ctx.set_state(key, ResourceState::Error, None).await?;
                return Ok(PipelineOutcome::terminal(ResourceState::Error, None));
            }
        };

        self.ctx
            .storage
            .upload_with_key(
                &self.ctx.destination_bucket,
                &Self::vtt_key(key),
                track.vtt.into_bytes(),
                VTT_CONTENT_TYPE,
            )
            .await?;

        self.ctx
            .copy_to_destination(key, source_bucket, &Self::source_key(key))
            .await?;

        let metadata = extension_metadata(Some(track.format.as_str()));
        self.ctx
            .set_state(key, ResourceState::Ready, metadata.clone())
            .await?;

        Ok(PipelineOutcome::terminal(ResourceState::Ready, metadata))
    }
}
