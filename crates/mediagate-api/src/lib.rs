//! Mediagate API
//!
//! HTTP entry point receiving object-created notifications from the storage
//! provider and handing each record to the ingest dispatcher.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;
