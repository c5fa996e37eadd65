use std::sync::Arc;

use applyhub_core::models::keys::{self, ATTR_GSI_PK};
use applyhub_core::models::{Language, Post};
use applyhub_core::storage::{CreatedRange, Result};
use applyhub_core::store::{AttributeValue, KeyValueStore, PropertyType, Query};

use super::base::BaseRepository;

/// Posts, listed per language over the creation-time index.
#[derive(Clone)]
pub struct PostRepository {
    base: BaseRepository<Post>,
}

impl PostRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, created_index: impl Into<String>) -> Self {
        Self {
            base: BaseRepository::with_index(store, created_index),
        }
    }

    pub async fn save(&self, post: &Post) -> Result<()> {
        self.base.save(post).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.base.delete(id).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Post> {
        self.base.get_by_id(id).await
    }

    pub async fn update_property(
        &self,
        id: &str,
        property: &str,
        property_type: PropertyType,
        value: AttributeValue,
    ) -> Result<()> {
        self.base
            .update_property(id, property, property_type, value)
            .await
    }

    /// Every post written in `language`, newest first.
    pub async fn get_by_language(&self, language: Language) -> Result<Vec<Post>> {
        let index = self.base.index()?;
        let gsi_pk = keys::post_gsi_pk(language);
        tracing::debug!(index, %gsi_pk, "Querying posts by language");

        let query = Query::partition(ATTR_GSI_PK, gsi_pk)
            .on_index(index)
            .descending();
        self.base.query(query).await
    }

    /// Posts in `language` created within `range`, newest first.
    pub async fn get_between_dates(
        &self,
        range: &CreatedRange,
        language: Language,
    ) -> Result<Vec<Post>> {
        self.base
            .get_between_dates(range, &keys::post_gsi_pk(language))
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use applyhub_core::storage::RepositoryError;

    use super::*;
    use crate::storage::InMemoryStore;

    fn repository() -> PostRepository {
        let store = Arc::new(InMemoryStore::single_table("applyhub", "GSI1", "GSI2"));
        PostRepository::new(store, "GSI1")
    }

    async fn save_post(repo: &PostRepository, language: Language, title: &str, hours: i64) -> Post {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut post = Post::new(language, title, "Body");
        post.generate_attributes_at(base + Duration::hours(hours));
        repo.save(&post).await.unwrap();
        post
    }

    #[tokio::test]
    async fn test_get_by_language_newest_first() {
        let repo = repository();
        save_post(&repo, Language::German, "eins", 1).await;
        save_post(&repo, Language::German, "drei", 3).await;
        save_post(&repo, Language::German, "zwei", 2).await;
        save_post(&repo, Language::English, "one", 4).await;

        let posts = repo.get_by_language(Language::German).await.unwrap();

        let titles: Vec<_> = posts.iter().map(|post| post.title.as_str()).collect();
        assert_eq!(titles, vec!["drei", "zwei", "eins"]);
    }

    #[tokio::test]
    async fn test_get_by_language_empty() {
        let repo = repository();
        save_post(&repo, Language::English, "one", 1).await;

        let posts = repo.get_by_language(Language::Tagalog).await.unwrap();

        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_get_between_dates_by_language() {
        let repo = repository();
        save_post(&repo, Language::Austrian, "early", 1).await;
        save_post(&repo, Language::Austrian, "inside", 5).await;
        save_post(&repo, Language::Austrian, "late", 30).await;

        let base = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let range = CreatedRange::new(base + Duration::hours(2), base + Duration::hours(24)).unwrap();
        let posts = repo
            .get_between_dates(&range, Language::Austrian)
            .await
            .unwrap();

        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "inside");
    }

    #[tokio::test]
    async fn test_delete_and_get() {
        let repo = repository();
        let post = save_post(&repo, Language::English, "one", 1).await;

        repo.delete(&post.pk).await.unwrap();

        assert!(matches!(
            repo.get_by_id(&post.pk).await,
            Err(RepositoryError::NotFound { .. })
        ));
        assert!(repo.delete(&post.pk).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_update_property() {
        let repo = repository();
        let post = save_post(&repo, Language::English, "one", 1).await;

        repo.update_property(
            &post.pk,
            "Content",
            PropertyType::String,
            AttributeValue::S("Edited".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(repo.get_by_id(&post.pk).await.unwrap().content, "Edited");
    }
}
