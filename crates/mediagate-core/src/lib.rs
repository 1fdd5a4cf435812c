//! Mediagate Core Library
//!
//! This crate provides the object-key grammar, resource lifecycle types, error
//! taxonomy and configuration shared across all Mediagate components.

pub mod config;
pub mod error;
pub mod key;
pub mod state;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, IngestError, IngestResult, LogLevel};
pub use key::{ResourceKey, ResourceKind, TimedTextMode};
pub use state::{ResourceState, StateMetadata};
pub use storage_types::StorageBackend;
