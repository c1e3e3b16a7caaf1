use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tubely_storage::{Storage, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutCall {
    pub bucket: String,
    pub key: String,
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignCall {
    pub bucket: String,
    pub key: String,
    pub expires_in: Duration,
}

/// Recording [`Storage`] fake
#[derive(Default)]
pub struct MockStorage {
    puts: Mutex<Vec<PutCall>>,
    presigns: Mutex<Vec<PresignCall>>,
    fail_puts: AtomicBool,
    fail_presigns: AtomicBool,
    unhealthy: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn puts(&self) -> Vec<PutCall> {
        self.puts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn presigns(&self) -> Vec<PresignCall> {
        self.presigns.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_presigns(&self, fail: bool) {
        self.fail_presigns.store(fail, Ordering::SeqCst);
    }

    pub fn set_unhealthy(&self, unhealthy: bool) {
        self.unhealthy.store(unhealthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed("service unavailable".to_string()));
        }
        if let Ok(mut puts) = self.puts.lock() {
            puts.push(PutCall {
                bucket: bucket.to_string(),
                key: key.to_string(),
                data,
                content_type: content_type.to_string(),
            });
        }
        Ok(())
    }

    async fn presigned_get_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if self.fail_presigns.load(Ordering::SeqCst) {
            return Err(StorageError::PresignFailed("credentials expired".to_string()));
        }
        let mut presigns = self
            .presigns
            .lock()
            .map_err(|_| StorageError::BackendError("mock storage poisoned".to_string()))?;
        presigns.push(PresignCall {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expires_in,
        });
        Ok(format!(
            "https://{}.s3.example.test/{}?X-Amz-Expires={}&X-Amz-Signature={}",
            bucket,
            key,
            expires_in.as_secs(),
            presigns.len()
        ))
    }

    async fn health_check(&self) -> StorageResult<()> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(StorageError::BackendError("unreachable".to_string()));
        }
        Ok(())
    }
}
