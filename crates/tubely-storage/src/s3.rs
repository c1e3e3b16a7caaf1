use crate::traits::{Storage, StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::time::Duration;

/// Object used by `health_check`; a missing object still proves the bucket is reachable.
const HEALTH_CHECK_KEY: &str = ".tubely-health";

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - default bucket, also used for health checks
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> StorageResult<Self> {
        let store = Self::build_store(&bucket, &region, endpoint_url.as_deref())?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn build_store(bucket: &str, region: &str, endpoint_url: Option<&str>) -> StorageResult<AmazonS3> {
        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket);

        if let Some(endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder.with_endpoint(endpoint).with_allow_http(allow_http);
        }

        builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))
    }

    /// Store for `bucket`. Anything other than the configured bucket gets a fresh client
    /// with the same region and endpoint.
    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        if bucket == self.bucket {
            Ok(self.store.clone())
        } else {
            Self::build_store(bucket, &self.region, self.endpoint_url.as_deref())
        }
    }
}

fn validate_key(key: &str) -> StorageResult<Path> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Path::parse(key).map_err(|e| StorageError::InvalidKey(e.to_string()))
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        let location = validate_key(key)?;
        let store = self.store_for(bucket)?;
        let size = data.len() as u64;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(())
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let location = validate_key(key)?;
        let store = self.store_for(bucket)?;

        let url_result: ObjectResult<_> = store.signed_url(Method::GET, &location, expires_in).await;

        let url = url_result
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %bucket,
                    key = %key,
                    "S3 presign failed"
                );
                StorageError::PresignFailed(e.to_string())
            })?
            .to_string();

        tracing::debug!(
            bucket = %bucket,
            key = %key,
            expires_in_secs = expires_in.as_secs(),
            "Generated presigned URL"
        );

        Ok(url)
    }

    async fn health_check(&self) -> StorageResult<()> {
        let location = Path::from(HEALTH_CHECK_KEY);
        match self.store.head(&location).await {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_rejects_traversal() {
        assert!(validate_key("landscape/abc.mp4").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/landscape/abc.mp4").is_err());
        assert!(validate_key("landscape/../secrets").is_err());
    }

    #[test]
    fn test_store_for_other_bucket_builds_client() {
        let storage = S3Storage::new(
            "tubely-videos".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .unwrap();
        assert_eq!(storage.bucket(), "tubely-videos");
        assert!(storage.store_for("tubely-archive").is_ok());
    }
}
