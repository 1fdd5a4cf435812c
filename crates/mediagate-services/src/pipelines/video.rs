//! Video pipeline: probe, derive the encoding profile, submit a transcode job

use super::{Pipeline, PipelineContext, PipelineOutcome};
use crate::clients::TranscodeEngine;
use async_trait::async_trait;
use mediagate_core::{IngestError, IngestResult, ResourceKey, ResourceState};
use mediagate_processing::{derive_profile, MediaProbe, TranscodeJobBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Job settings taken from configuration
#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub signed_url_expiry: Duration,
    pub queue: Option<String>,
    pub role: Option<String>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            signed_url_expiry: Duration::from_secs(1200),
            queue: None,
            role: None,
        }
    }
}

pub struct VideoPipeline {
    ctx: PipelineContext,
    probe: Arc<dyn MediaProbe>,
    transcoder: Arc<dyn TranscodeEngine>,
    settings: VideoSettings,
}

impl VideoPipeline {
    pub fn new(
        ctx: PipelineContext,
        probe: Arc<dyn MediaProbe>,
        transcoder: Arc<dyn TranscodeEngine>,
        settings: VideoSettings,
    ) -> Self {
        Self {
            ctx,
            probe,
            transcoder,
            settings,
        }
    }
}

#[async_trait]
impl Pipeline for VideoPipeline {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn run(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<PipelineOutcome> {
        let signed_url = self
            .ctx
            .storage
            .get_presigned_url(
                source_bucket,
                key.object_key(),
                self.settings.signed_url_expiry,
            )
            .await?;

        let media = self
            .probe
            .probe(&signed_url)
            .await
            .map_err(|e| IngestError::Probe(format!("{:#}", e)))?;

        let profile = derive_profile(media.as_ref());
        tracing::debug!(key = %key, profile = ?profile, "Encoding profile derived");

        let job = TranscodeJobBuilder::new(
            format!("s3://{}/{}", source_bucket, key.object_key()),
            format!(
                "s3://{}/{}",
                self.ctx.destination_bucket,
                key.resource_id()
            ),
            key.stamp(),
        )
        .queue(self.settings.queue.clone())
        .role(self.settings.role.clone())
        .metadata("resourceKey", key.object_key())
        .build(&profile);

        let job_id = self.transcoder.submit(&job).await?;

        self.ctx
            .set_state(key, ResourceState::Processing, None)
            .await?;

        Ok(PipelineOutcome::JobSubmitted { job_id })
    }
}
