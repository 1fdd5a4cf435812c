//! Scan-and-copy pipeline for deposited files

use super::{extension_metadata, Pipeline, PipelineContext, PipelineOutcome};
use crate::clients::{ScanVerdict, VirusScanner};
use async_trait::async_trait;
use mediagate_core::{IngestError, IngestResult, ResourceKey, ResourceState, StateMetadata};
use serde_json::json;
use std::sync::Arc;

/// `scanning → (infected | error | copying → ready)`
pub struct ScanCopyPipeline {
    ctx: PipelineContext,
    scanner: Arc<dyn VirusScanner>,
}

impl ScanCopyPipeline {
    pub fn new(ctx: PipelineContext, scanner: Arc<dyn VirusScanner>) -> Self {
        Self { ctx, scanner }
    }

    /// Stage the source in a temporary file and scan it. The file is removed
    /// when this returns, whatever the outcome.
    async fn scan(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<ScanVerdict> {
        let data = self
            .ctx
            .storage
            .download(source_bucket, key.object_key())
            .await?;

        let temp_file = tempfile::NamedTempFile::new()?;
        tokio::fs::write(temp_file.path(), &data).await?;

        self.scanner.scan_file(temp_file.path()).await
    }
}

#[async_trait]
impl Pipeline for ScanCopyPipeline {
    fn name(&self) -> &'static str {
        "scan-and-copy"
    }

    async fn run(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<PipelineOutcome> {
        self.ctx.set_state(key, ResourceState::Scanning, None).await?;

        match self.scan(key, source_bucket).await {
            Ok(ScanVerdict::Clean) => {}
            Ok(ScanVerdict::Infected(signatures)) => {
                tracing::warn!(key = %key, signatures = ?signatures, "Deposited file is infected");
                let mut metadata = StateMetadata::new();
                metadata.insert("error".to_string(), json!(signatures));
                self.ctx
                    .set_state(key, ResourceState::Infected, Some(metadata.clone()))
                    .await?;
                return Ok(PipelineOutcome::terminal(
                    ResourceState::Infected,
                    Some(metadata),
                ));
            }
            Err(IngestError::Scan(message)) => {
                let mut metadata = StateMetadata::new();
                metadata.insert("error".to_string(), json!(message));
                if let Err(state_err) = self
                    .ctx
                    .set_state(key, ResourceState::Error, Some(metadata))
                    .await
                {
                    tracing::error!(
                        key = %key,
                        error = %state_err,
                        "Failed to record scan failure"
                    );
                }
                return Err(IngestError::Scan(message));
            }
            Err(e) => return Err(e),
        }

        self.ctx.set_state(key, ResourceState::Copying, None).await?;
        self.ctx
            .copy_to_destination(key, source_bucket, key.object_key())
            .await?;

        let metadata = extension_metadata(key.extension());
        self.ctx
            .set_state(key, ResourceState::Ready, metadata.clone())
            .await?;

        Ok(PipelineOutcome::terminal(ResourceState::Ready, metadata))
    }
}
