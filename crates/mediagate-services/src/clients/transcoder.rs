//! Transcode engine client

use async_trait::async_trait;
use mediagate_core::{IngestError, IngestResult};
use mediagate_processing::TranscodeJob;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Accepts a job description and returns the engine-assigned job id
#[async_trait]
pub trait TranscodeEngine: Send + Sync {
    async fn submit(&self, job: &TranscodeJob) -> IngestResult<String>;
}

#[derive(Debug, Deserialize)]
struct SubmitJobResponse {
    id: String,
}

/// Transcode engine exposing `POST {endpoint}/jobs`
pub struct HttpTranscodeEngine {
    http_client: Client,
    endpoint: String,
}

impl HttpTranscodeEngine {
    pub fn new(endpoint: String, timeout: Duration) -> IngestResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                IngestError::Internal(format!("Failed to create transcode client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl TranscodeEngine for HttpTranscodeEngine {
    #[tracing::instrument(skip(self, job), fields(input = %job.input))]
    async fn submit(&self, job: &TranscodeJob) -> IngestResult<String> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(self.jobs_url())
            .json(job)
            .send()
            .await
            .map_err(|e| IngestError::Transcode(format!("Failed to submit job: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IngestError::Transcode(format!(
                "Job submission rejected: {} - {}",
                status, error_text
            )));
        }

        let submitted: SubmitJobResponse = response.json().await.map_err(|e| {
            IngestError::Transcode(format!("Failed to parse job submission response: {}", e))
        })?;

        tracing::info!(
            job_id = %submitted.id,
            output_groups = job.output_groups.len(),
            duration_ms = start.elapsed().as_millis(),
            "Transcode job submitted"
        );

        Ok(submitted.id)
    }
}
