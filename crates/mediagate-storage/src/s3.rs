use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// S3 storage implementation
///
/// One `AmazonS3` store is built per bucket on first use and cached; events
/// name their source bucket while pipelines write to the configured
/// destination bucket.
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: RwLock<HashMap<String, Arc<AmazonS3>>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `buckets` - Buckets to build stores for eagerly, so configuration
    ///   errors surface at startup
    pub fn new(
        region: String,
        endpoint_url: Option<String>,
        buckets: &[String],
    ) -> StorageResult<Self> {
        let storage = S3Storage {
            region,
            endpoint_url,
            stores: RwLock::new(HashMap::new()),
        };

        for bucket in buckets {
            storage.store(bucket)?;
        }

        Ok(storage)
    }

    fn build_store(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    fn store(&self, bucket: &str) -> StorageResult<Arc<AmazonS3>> {
        if bucket.is_empty() {
            return Err(StorageError::ConfigError("Bucket name is empty".to_string()));
        }

        {
            let stores = self
                .stores
                .read()
                .map_err(|_| StorageError::BackendError("S3 store cache poisoned".to_string()))?;
            if let Some(store) = stores.get(bucket) {
                return Ok(Arc::clone(store));
            }
        }

        let store = Arc::new(self.build_store(bucket)?);
        let mut stores = self
            .stores
            .write()
            .map_err(|_| StorageError::BackendError("S3 store cache poisoned".to_string()))?;
        Ok(Arc::clone(
            stores.entry(bucket.to_string()).or_insert(store),
        ))
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style URLs on the endpoint
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket, self.region, key
            )
        }
    }

    async fn get_bytes(&self, bucket: &str, key: &str) -> StorageResult<Bytes> {
        let store = self.store(bucket)?;
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(format!("{}/{}", bucket, key)),
            other => StorageError::DownloadFailed(other.to_string()),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn download(&self, bucket: &str, key: &str) -> StorageResult<Vec<u8>> {
        let start = std::time::Instant::now();

        let bytes = self.get_bytes(bucket, key).await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 download failed"
            );
            e
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes.to_vec())
    }

    async fn upload_with_key(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let store = self.store(bucket)?;
        let size = data.len() as u64;
        let location = Path::from(key.to_string());
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload_with_key failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload_with_key successful"
        );

        Ok(self.generate_url(bucket, key))
    }

    async fn copy(
        &self,
        from_bucket: &str,
        from_key: &str,
        to_bucket: &str,
        to_key: &str,
    ) -> StorageResult<String> {
        let start = std::time::Instant::now();
        let to = Path::from(to_key.to_string());

        let copy_result: ObjectResult<_> = if from_bucket == to_bucket {
            let store = self.store(from_bucket)?;
            let from = Path::from(from_key.to_string());
            store.copy(&from, &to).await
        } else {
            // object_store copies only within one bucket
            let bytes = self.get_bytes(from_bucket, from_key).await?;
            let store = self.store(to_bucket)?;
            store.put(&to, PutPayload::from(bytes)).await.map(|_| ())
        };

        copy_result.map_err(|e| {
            tracing::error!(
                error = %e,
                from_bucket = %from_bucket,
                from_key = %from_key,
                to_bucket = %to_bucket,
                to_key = %to_key,
                "S3 copy failed"
            );
            StorageError::CopyFailed(e.to_string())
        })?;

        tracing::info!(
            from_bucket = %from_bucket,
            from_key = %from_key,
            to_bucket = %to_bucket,
            to_key = %to_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 copy successful"
        );

        Ok(self.generate_url(to_bucket, to_key))
    }

    async fn get_presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let store = self.store(bucket)?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(endpoint: Option<&str>) -> S3Storage {
        S3Storage {
            region: "eu-west-1".to_string(),
            endpoint_url: endpoint.map(String::from),
            stores: RwLock::new(HashMap::new()),
        }
    }

    #[test]
    fn aws_urls_are_virtual_hosted() {
        assert_eq!(
            storage(None).generate_url("dest", "a/video/b/1"),
            "https://dest.s3.eu-west-1.amazonaws.com/a/video/b/1"
        );
    }

    #[test]
    fn compatible_provider_urls_are_path_style() {
        assert_eq!(
            storage(Some("http://localhost:9000/")).generate_url("dest", "k"),
            "http://localhost:9000/dest/k"
        );
    }

    #[test]
    fn empty_bucket_is_a_config_error() {
        assert!(matches!(
            storage(None).store(""),
            Err(StorageError::ConfigError(_))
        ));
    }
}
