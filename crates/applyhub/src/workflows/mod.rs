//! Multi-repository operations over applications and posts.
//!
//! Each workflow composes the repositories with object storage the way a
//! request handler would, without any transport concerns.

mod application;
mod post;

pub use application::{ApplicationDetails, ApplicationWorkflow, CreatedApplication, NewApplication};
pub use post::{CreatedPost, NewPost, PostDetails, PostWorkflow};

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use applyhub_core::files::{AccessGrant, FileStorage, FileStorageError};
use applyhub_core::models::{Document, DocumentType, ValidationError};
use applyhub_core::storage::{repository_error_to_status_code, RepositoryError};

/// Errors surfaced by workflows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Files(#[from] FileStorageError),
}

impl WorkflowError {
    pub fn status_code(&self) -> u16 {
        match self {
            WorkflowError::Repository(err) => repository_error_to_status_code(err),
            WorkflowError::Validation(_) => 400,
            WorkflowError::Files(FileStorageError::NotFound(_)) => 404,
            WorkflowError::Files(_) => 503,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// A document submitted together with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpload {
    pub document_type: DocumentType,
    pub file_name: String,
    pub size_bytes: u64,
}

/// Builds uploaded documents under `owner_pk`, validating each one.
///
/// A document type may appear once, since each type has a single slot.
fn uploaded_documents(
    owner_pk: &str,
    uploads: &[DocumentUpload],
) -> std::result::Result<Vec<Document>, ValidationError> {
    let mut seen = HashSet::new();
    uploads
        .iter()
        .map(|upload| {
            if !seen.insert(upload.document_type.to_string()) {
                return Err(ValidationError::DuplicateDocument(
                    upload.document_type.to_string(),
                ));
            }
            let mut document = Document::requested(owner_pk, &upload.document_type, "");
            document.record_upload(&upload.file_name, upload.size_bytes)?;
            document.validate()?;
            Ok(document)
        })
        .collect()
}

/// Write grants for every uploaded document's object.
async fn grant_uploads(files: &dyn FileStorage, documents: &[Document]) -> Result<Vec<AccessGrant>> {
    let mut grants = Vec::with_capacity(documents.len());
    for name in documents.iter().filter_map(|document| document.name.as_deref()) {
        grants.push(files.grant_write_access(name).await?);
    }
    Ok(grants)
}

/// Removes the objects of every uploaded document in `documents`.
async fn delete_objects(files: &dyn FileStorage, documents: &[Document]) -> Result<()> {
    let keys: Vec<String> = documents
        .iter()
        .filter(|document| document.is_uploaded())
        .filter_map(|document| document.name.clone())
        .collect();
    if keys.is_empty() {
        return Ok(());
    }
    tracing::debug!(objects = keys.len(), "Deleting document objects");
    files.batch_delete(&keys).await?;
    Ok(())
}
