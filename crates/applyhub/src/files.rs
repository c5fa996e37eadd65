//! Object storage backends.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;

use applyhub_core::files::{AccessGrant, AccessMethod, FileStorage, FileStorageError};

/// Object storage that only tracks keys.
///
/// Granting write access counts as the upload having happened, so a later
/// read grant for the same key succeeds.
#[derive(Debug, Clone)]
pub struct InMemoryFileStorage {
    bucket: String,
    ttl: Duration,
    objects: Arc<RwLock<BTreeSet<String>>>,
}

impl InMemoryFileStorage {
    pub fn new(bucket: impl Into<String>, ttl: Duration) -> Self {
        Self {
            bucket: bucket.into(),
            ttl,
            objects: Arc::new(RwLock::new(BTreeSet::new())),
        }
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.iter().cloned().collect()
    }

    fn grant(&self, key: &str, method: AccessMethod) -> AccessGrant {
        let expires_at = Utc::now() + self.ttl;
        let verb = match method {
            AccessMethod::Get => "GET",
            AccessMethod::Put => "PUT",
        };
        AccessGrant {
            key: key.to_string(),
            url: format!(
                "memory://{}/{}?method={}&expires={}",
                self.bucket,
                key,
                verb,
                expires_at.timestamp()
            ),
            method,
            expires_at,
        }
    }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn grant_read_access(&self, key: &str) -> Result<AccessGrant, FileStorageError> {
        if !self.contains(key).await {
            return Err(FileStorageError::NotFound(key.to_string()));
        }
        Ok(self.grant(key, AccessMethod::Get))
    }

    async fn grant_write_access(&self, key: &str) -> Result<AccessGrant, FileStorageError> {
        self.objects.write().await.insert(key.to_string());
        Ok(self.grant(key, AccessMethod::Put))
    }

    async fn delete(&self, key: &str) -> Result<(), FileStorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn batch_delete(&self, keys: &[String]) -> Result<(), FileStorageError> {
        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> InMemoryFileStorage {
        InMemoryFileStorage::new("applyhub-documents", Duration::seconds(900))
    }

    #[tokio::test]
    async fn test_write_grant_then_read_grant() {
        let storage = storage();

        let write = storage
            .grant_write_access("APP#1-Document-CV.pdf")
            .await
            .unwrap();
        assert_eq!(write.method, AccessMethod::Put);
        assert!(write.url.starts_with("memory://applyhub-documents/APP#1-Document-CV.pdf"));
        assert!(write.expires_at > Utc::now());

        let read = storage
            .grant_read_access("APP#1-Document-CV.pdf")
            .await
            .unwrap();
        assert_eq!(read.method, AccessMethod::Get);
    }

    #[tokio::test]
    async fn test_read_grant_for_missing_object() {
        let result = storage().grant_read_access("missing.pdf").await;

        assert_eq!(
            result,
            Err(FileStorageError::NotFound("missing.pdf".to_string()))
        );
    }

    #[tokio::test]
    async fn test_batch_delete() {
        let storage = storage();
        storage.grant_write_access("a.pdf").await.unwrap();
        storage.grant_write_access("b.pdf").await.unwrap();
        storage.grant_write_access("c.pdf").await.unwrap();

        storage
            .batch_delete(&["a.pdf".to_string(), "b.pdf".to_string()])
            .await
            .unwrap();

        assert_eq!(storage.keys().await, vec!["c.pdf".to_string()]);
    }
}
