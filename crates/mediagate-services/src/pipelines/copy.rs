//! Copy-family pipelines: documents, classroom documents, markdown images

use super::{Pipeline, PipelineContext, PipelineOutcome};
use async_trait::async_trait;
use mediagate_core::{IngestError, IngestResult, ResourceKey, ResourceKind, ResourceState};

/// Copies the upload to its published location, then marks it ready
pub struct CopyPipeline {
    ctx: PipelineContext,
}

impl CopyPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self { ctx }
    }

    fn destination_key(key: &ResourceKey) -> IngestResult<String> {
        match key.kind() {
            ResourceKind::Document => {
                Ok(format!("{}/document/{}", key.resource_id(), key.stamp()))
            }
            ResourceKind::ClassroomDocument => Ok(format!(
                "{}/classroomdocument/{}/{}",
                key.resource_id(),
                key.record_id(),
                key.stamp()
            )),
            ResourceKind::MarkdownImage => Ok(key.object_key().to_string()),
            other => Err(IngestError::Internal(format!(
                "Copy pipeline cannot handle {} keys",
                other.token()
            ))),
        }
    }
}

#[async_trait]
impl Pipeline for CopyPipeline {
    fn name(&self) -> &'static str {
        "copy"
    }

    async fn run(&self, key: &ResourceKey, source_bucket: &str) -> IngestResult<PipelineOutcome> {
        let destination = Self::destination_key(key)?;
        self.ctx
            .copy_to_destination(key, source_bucket, &destination)
            .await?;

        self.ctx.set_state(key, ResourceState::Ready, None).await?;
        Ok(PipelineOutcome::terminal(ResourceState::Ready, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn destination(object_key: &str) -> IngestResult<String> {
        CopyPipeline::destination_key(&ResourceKey::parse(object_key).unwrap())
    }

    #[test]
    fn document_drops_record_segment() {
        assert_eq!(
            destination("d1/document/d1/1533686400").unwrap(),
            "d1/document/1533686400"
        );
    }

    #[test]
    fn classroom_document_and_markdown_image_keep_their_shape() {
        assert_eq!(
            destination("c1/classroomdocument/r1/1533686400").unwrap(),
            "c1/classroomdocument/r1/1533686400"
        );
        assert_eq!(
            destination("m1/markdown-images/i1/1533686400.png").unwrap(),
            "m1/markdown-images/i1/1533686400.png"
        );
    }

    #[test]
    fn other_kinds_are_rejected() {
        assert!(matches!(
            destination("v1/video/v1/1533686400"),
            Err(IngestError::Internal(_))
        ));
    }
}
