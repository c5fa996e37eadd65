//! Object storage capability used for document content.
//!
//! The core never handles file bytes. It computes deterministic object keys and
//! asks a [`FileStorage`] to hand out time-limited access or to delete objects.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// HTTP method a grant is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccessMethod {
    Get,
    Put,
}

/// Time-limited access to one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub key: String,
    pub url: String,
    pub method: AccessMethod,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileStorageError {
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Object storage unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to delete {} objects", keys.len())]
    PartialDelete { keys: Vec<String> },
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Grants time-limited download access to `key`.
    async fn grant_read_access(&self, key: &str) -> Result<AccessGrant, FileStorageError>;

    /// Grants time-limited upload access to `key`.
    async fn grant_write_access(&self, key: &str) -> Result<AccessGrant, FileStorageError>;

    async fn delete(&self, key: &str) -> Result<(), FileStorageError>;

    /// Deletes every key, reporting the ones that could not be removed.
    async fn batch_delete(&self, keys: &[String]) -> Result<(), FileStorageError>;
}
