use mediagate_core::{ResourceState, StateMetadata};
use serde_json::{json, Value};

/// What a pipeline run produced.
///
/// Failures travel as `Err(IngestError)` next to this type rather than as a
/// variant of it.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Pipeline ended in `state`, nothing returned to the caller
    Terminal {
        state: ResourceState,
        metadata: Option<StateMetadata>,
    },
    /// Pipeline ended in `ready` and hands `metadata` back to the caller
    Success { metadata: StateMetadata },
    /// The work continues in the transcode engine under `job_id`
    JobSubmitted { job_id: String },
}

impl PipelineOutcome {
    pub fn terminal(state: ResourceState, metadata: Option<StateMetadata>) -> Self {
        PipelineOutcome::Terminal { state, metadata }
    }

    /// Last state this run wrote to the tracker
    pub fn state(&self) -> ResourceState {
        match self {
            PipelineOutcome::Terminal { state, .. } => *state,
            PipelineOutcome::Success { .. } => ResourceState::Ready,
            PipelineOutcome::JobSubmitted { .. } => ResourceState::Processing,
        }
    }

    /// Value returned to the invoking layer
    pub fn payload(&self) -> Option<Value> {
        match self {
            PipelineOutcome::Terminal { .. } => None,
            PipelineOutcome::Success { metadata } => Some(Value::Object(metadata.clone())),
            PipelineOutcome::JobSubmitted { job_id } => Some(json!({ "jobId": job_id })),
        }
    }
}
