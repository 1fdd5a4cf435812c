//! In-memory Storage implementation for testing

use async_trait::async_trait;
use mediagate_storage::{Storage, StorageBackend, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Storage keeping every object in memory, keyed by `(bucket, key)`
#[derive(Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<BTreeMap<(String, String), Vec<u8>>>>,
    fail_uploads_containing: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a file in the mock storage
    pub fn set_file(&self, bucket: &str, key: &str, data: Vec<u8>) {
        self.files
            .lock()
            .unwrap()
            .insert((bucket.to_string(), key.to_string()), data);
    }

    /// Check if a file exists in the mock storage
    pub fn has_file(&self, bucket: &str, key: &str) -> bool {
        self.files
            .lock()
            .unwrap()
            .contains_key(&(bucket.to_string(), key.to_string()))
    }

    /// Get file data (for test assertions)
    pub fn get_file(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Sorted keys stored in `bucket`
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    /// Make every upload whose key contains `pattern` fail
    pub fn fail_uploads_containing(&self, pattern: &str) {
        *self.fail_uploads_containing.lock().unwrap() = Some(pattern.to_string());
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        self.get_file(bucket, key)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", bucket, key)))
    }

    async fn upload_with_key(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        if let Some(pattern) = self.fail_uploads_containing.lock().unwrap().as_deref() {
            if key.contains(pattern) {
                return Err(StorageError::UploadFailed(format!("{}/{}", bucket, key)));
            }
        }
        self.set_file(bucket, key, data);
        Ok(format!("https://example.com/{}/{}", bucket, key))
    }

    async fn copy(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> StorageResult<String> {
        let data = self
            .get_file(from_bucket, from_key)
            .ok_or_else(|| StorageError::NotFound(format!("{}/{}", from_bucket, from_key)))?;
        self.set_file(to_bucket, to_key, data);
        Ok(format!("https://example.com/{}/{}", to_bucket, to_key))
    }

    async fn get_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        if !self.has_file(bucket, key) {
            return Err(StorageError::NotFound(format!("{}/{}", bucket, key)));
        }
        Ok(format!("https://example.com/presigned/{}/{}", bucket, key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
