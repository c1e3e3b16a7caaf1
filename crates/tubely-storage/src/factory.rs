use crate::S3Storage;
use crate::{Storage, StorageError, StorageResult};
use std::sync::Arc;
use tubely_core::Config;

/// Create the storage backend described by the configuration
pub fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let region = config.s3_region().map(String::from).ok_or_else(|| {
        StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
    })?;
    let endpoint = config.s3_endpoint().map(String::from);

    tracing::info!(
        bucket = %config.s3_bucket(),
        region = %region,
        endpoint = ?endpoint,
        "Initializing S3 storage"
    );

    let storage = S3Storage::new(config.s3_bucket().to_string(), region, endpoint)?;
    Ok(Arc::new(storage))
}
