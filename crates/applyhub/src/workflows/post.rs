use std::sync::Arc;

use serde::{Deserialize, Serialize};

use applyhub_core::files::{AccessGrant, FileStorage};
use applyhub_core::models::{Document, Language, Post};
use applyhub_core::store::KeyValueStore;

use super::{delete_objects, grant_uploads, uploaded_documents, DocumentUpload, Result};
use crate::config::Config;
use crate::repository::{DocumentRepository, PostRepository};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub language: Language,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPost {
    pub post: Post,
    pub uploads: Vec<AccessGrant>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetails {
    pub post: Post,
    pub documents: Vec<Document>,
}

/// Post lifecycle. Every post carries a thumbnail.
#[derive(Clone)]
pub struct PostWorkflow {
    posts: PostRepository,
    documents: DocumentRepository,
    files: Arc<dyn FileStorage>,
}

impl PostWorkflow {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: &Config,
        files: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            posts: PostRepository::new(store.clone(), &config.created_index),
            documents: DocumentRepository::new(store),
            files,
        }
    }

    pub async fn create(&self, input: NewPost, uploads: &[DocumentUpload]) -> Result<CreatedPost> {
        let post = Post::new(input.language, input.title, input.content);
        let documents = uploaded_documents(&post.pk, uploads)?;
        post.validate(&documents)?;

        self.posts.save(&post).await?;
        self.documents.batch_save(&documents).await?;
        let uploads = grant_uploads(self.files.as_ref(), &documents).await?;

        tracing::info!(pk = %post.pk, language = %input.language, "Post created");
        Ok(CreatedPost { post, uploads })
    }

    /// Deletes the post, its documents and their objects.
    pub async fn delete(&self, post_pk: &str) -> Result<()> {
        self.posts.delete(post_pk).await?;
        let documents = self.documents.batch_delete(post_pk).await?;
        delete_objects(self.files.as_ref(), &documents).await?;

        tracing::info!(pk = %post_pk, documents = documents.len(), "Post deleted");
        Ok(())
    }

    /// Replaces the title and content of an existing post.
    ///
    /// Both fields are written in one put of the stored post, so other
    /// attributes keep their stored values.
    pub async fn update(&self, post_pk: &str, title: &str, content: &str) -> Result<Post> {
        let mut post = self.posts.get_by_id(post_pk).await?;
        post.title = title.to_string();
        post.content = content.to_string();
        post.validate_fields()?;

        self.posts.save(&post).await?;
        tracing::info!(pk = %post_pk, "Post updated");
        Ok(post)
    }

    pub async fn by_language(&self, language: Language) -> Result<Vec<Post>> {
        Ok(self.posts.get_by_language(language).await?)
    }

    pub async fn get(&self, post_pk: &str) -> Result<PostDetails> {
        let post = self.posts.get_by_id(post_pk).await?;
        let documents = self.documents.get_all_by_parent_pk(post_pk).await?;
        Ok(PostDetails { post, documents })
    }
}

#[cfg(test)]
mod tests {
    use applyhub_core::models::{DocumentType, ValidationError};
    use applyhub_core::storage::RepositoryError;

    use super::*;
    use crate::files::InMemoryFileStorage;
    use crate::storage::InMemoryStore;
    use crate::workflows::WorkflowError;

    fn workflow() -> (Arc<InMemoryStore>, Arc<InMemoryFileStorage>, PostWorkflow) {
        let config = Config {
            table_name: "applyhub".to_string(),
            created_index: "GSI1".to_string(),
            identity_index: "GSI2".to_string(),
            bucket_name: "applyhub-documents".to_string(),
            aws_endpoint_url: None,
            aws_region: "us-east-1".to_string(),
            log_format: Default::default(),
            presign_ttl_seconds: 60,
        };
        let store = Arc::new(InMemoryStore::single_table("applyhub", "GSI1", "GSI2"));
        let files = Arc::new(InMemoryFileStorage::new("applyhub-documents", config.presign_ttl()));
        let workflow = PostWorkflow::new(store.clone(), &config, files.clone());
        (store, files, workflow)
    }

    fn new_post(language: Language, title: &str) -> NewPost {
        NewPost {
            language,
            title: title.to_string(),
            content: "Body".to_string(),
        }
    }

    fn thumbnail() -> Vec<DocumentUpload> {
        vec![DocumentUpload {
            document_type: DocumentType::Thumbnail,
            file_name: "thumb.png".to_string(),
            size_bytes: 4096,
        }]
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_, files, workflow) = workflow();

        let created = workflow
            .create(new_post(Language::English, "Hello"), &thumbnail())
            .await
            .unwrap();

        assert_eq!(created.uploads.len(), 1);
        assert!(files.contains(&created.uploads[0].key).await);
        let details = workflow.get(&created.post.pk).await.unwrap();
        assert_eq!(details.post.title, "Hello");
        assert_eq!(details.documents[0].sk, "Document-Thumbnail");
    }

    #[tokio::test]
    async fn test_create_requires_thumbnail() {
        let (store, _, workflow) = workflow();

        let result = workflow
            .create(new_post(Language::English, "Hello"), &[])
            .await;

        assert_eq!(
            result.unwrap_err(),
            WorkflowError::Validation(ValidationError::MandatoryDocuments {
                expected: 1,
                found: 0
            })
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_by_language() {
        let (_, _, workflow) = workflow();
        workflow
            .create(new_post(Language::German, "Hallo"), &thumbnail())
            .await
            .unwrap();
        workflow
            .create(new_post(Language::English, "Hello"), &thumbnail())
            .await
            .unwrap();

        let posts = workflow.by_language(Language::German).await.unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Hallo");
    }

    #[tokio::test]
    async fn test_update_replaces_title_and_content() {
        let (_, _, workflow) = workflow();
        let created = workflow
            .create(new_post(Language::German, "Hallo"), &thumbnail())
            .await
            .unwrap();

        let updated = workflow
            .update(&created.post.pk, "Servus", "Neuer Text")
            .await
            .unwrap();

        assert_eq!(updated.title, "Servus");
        let details = workflow.get(&created.post.pk).await.unwrap();
        assert_eq!(details.post.title, "Servus");
        assert_eq!(details.post.content, "Neuer Text");
        assert_eq!(details.post.gsi_pk, created.post.gsi_pk);
        assert_eq!(details.documents.len(), 1);
        let listed = workflow.by_language(Language::German).await.unwrap();
        assert_eq!(listed[0].title, "Servus");
    }

    #[tokio::test]
    async fn test_update_rejects_blank_fields() {
        let (_, _, workflow) = workflow();
        let created = workflow
            .create(new_post(Language::English, "Hello"), &thumbnail())
            .await
            .unwrap();

        let result = workflow.update(&created.post.pk, "Hello", " ").await;

        assert_eq!(
            result.unwrap_err(),
            WorkflowError::Validation(ValidationError::MissingField("Content"))
        );
        let stored = workflow.get(&created.post.pk).await.unwrap();
        assert_eq!(stored.post.content, "Body");
    }

    #[tokio::test]
    async fn test_update_missing_post() {
        let (store, _, workflow) = workflow();

        let result = workflow.update("Postmissing", "Title", "Body").await;

        assert!(matches!(
            result,
            Err(WorkflowError::Repository(RepositoryError::NotFound { .. }))
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let (store, files, workflow) = workflow();
        let created = workflow
            .create(new_post(Language::Tagalog, "Kumusta"), &thumbnail())
            .await
            .unwrap();

        workflow.delete(&created.post.pk).await.unwrap();

        assert!(store.is_empty().await);
        assert!(files.keys().await.is_empty());
        assert!(matches!(
            workflow.delete(&created.post.pk).await,
            Err(WorkflowError::Repository(RepositoryError::NotFound { .. }))
        ));
    }
}
