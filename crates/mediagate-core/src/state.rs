//! Resource lifecycle states recorded by the external state tracker.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extra parameters attached to a state transition.
pub type StateMetadata = Map<String, Value>;

/// Lifecycle state of an uploaded resource.
///
/// Not every pipeline traverses every state; only `ready`, `infected` and
/// `error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Scanning,
    Copying,
    Processing,
    Ready,
    Infected,
    Error,
}

impl ResourceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceState::Scanning => "scanning",
            ResourceState::Copying => "copying",
            ResourceState::Processing => "processing",
            ResourceState::Ready => "ready",
            ResourceState::Infected => "infected",
            ResourceState::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResourceState::Ready | ResourceState::Infected | ResourceState::Error
        )
    }
}

impl Display for ResourceState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
