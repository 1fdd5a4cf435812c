//! Mediagate Storage Library
//!
//! This crate provides the bucket-aware storage abstraction used by every
//! pipeline, with implementations for S3 (and S3-compatible providers) and
//! the local filesystem.
//!
//! # Object addressing
//!
//! Objects are addressed by `(bucket, key)`. Keys are the raw object keys
//! from upload events or the destination keys derived from them; they must
//! not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use mediagate_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
