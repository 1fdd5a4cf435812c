//! State tracker client
//!
//! The tracker owns the lifecycle state of every uploaded resource. Pipelines
//! report transitions and await the acknowledgement; a failed update is an
//! external-service error like any other.

use async_trait::async_trait;
use mediagate_core::{IngestError, IngestResult, ResourceState, StateMetadata};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[async_trait]
pub trait StateTracker: Send + Sync {
    /// Record `state` for the resource identified by its object key.
    async fn update_state(
        &self,
        key: &str,
        state: ResourceState,
        metadata: Option<StateMetadata>,
    ) -> IngestResult<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStateRequest<'a> {
    key: &'a str,
    state: ResourceState,
    extra_parameters: StateMetadata,
}

/// Tracker reached over HTTP with a JSON body
pub struct HttpStateTracker {
    http_client: Client,
    endpoint: String,
}

impl HttpStateTracker {
    pub fn new(endpoint: String, timeout: Duration) -> IngestResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                IngestError::Internal(format!("Failed to create state tracker client: {}", e))
            })?;

        Ok(Self {
            http_client,
            endpoint,
        })
    }
}

#[async_trait]
impl StateTracker for HttpStateTracker {
    #[tracing::instrument(skip(self, metadata))]
    async fn update_state(
        &self,
        key: &str,
        state: ResourceState,
        metadata: Option<StateMetadata>,
    ) -> IngestResult<()> {
        let start = std::time::Instant::now();
        let body = UpdateStateRequest {
            key,
            state,
            extra_parameters: metadata.unwrap_or_default(),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| IngestError::StateTracker(format!("Failed to update state: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(IngestError::StateTracker(format!(
                "State update rejected: {} - {}",
                status, error_text
            )));
        }

        tracing::info!(
            key = %key,
            state = %state,
            duration_ms = start.elapsed().as_millis(),
            "Resource state updated"
        );

        Ok(())
    }
}
