//! Repository for entities stored under their parent's partition key.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use applyhub_core::models::{ChildEntity, WritePolicy};
use applyhub_core::storage::{RepositoryError, Result};
use applyhub_core::store::{
    AttributeValue, Condition, KeyValueStore, PrimaryKey, PropertyType, Query, TransactItem,
    WriteRequest, ATTR_PK, ATTR_SK, MAX_BATCH_WRITE_ITEMS,
};

use super::base::ensure_property_type;
use super::error::{conflict_on_condition, store_error};

fn child_id(key: &PrimaryKey) -> String {
    format!("{}/{}", key.pk, key.sk)
}

fn request_key(request: &WriteRequest) -> Option<PrimaryKey> {
    match request {
        WriteRequest::Put(item) => PrimaryKey::from_item(item),
        WriteRequest::Delete(key) => Some(key.clone()),
    }
}

/// Store-backed repository for one [`ChildKind`](applyhub_core::models::ChildKind).
///
/// The kind is fixed by `T::KIND`; it selects the sort key prefix used for
/// listing and the write policy of single-item saves.
pub struct ChildRepository<T: ChildEntity> {
    store: Arc<dyn KeyValueStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: ChildEntity> Clone for ChildRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: ChildEntity> ChildRepository<T> {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// Saves the child in one transaction with a check that its parent exists.
    ///
    /// A `FirstWriteWins` kind also refuses to replace an existing child. Either
    /// failed condition surfaces as a conflict and nothing is written.
    pub async fn save(&self, item: &T) -> Result<()> {
        let key = item.primary_key();
        let put_condition = match T::KIND.write_policy() {
            WritePolicy::Overwrite => None,
            WritePolicy::FirstWriteWins => Some(Condition::attribute_not_exists(ATTR_SK)),
        };
        tracing::debug!(entity = T::ENTITY_TYPE, pk = %key.pk, sk = %key.sk, "Saving child");

        self.store
            .transact_write(vec![
                TransactItem::ConditionCheck {
                    key: PrimaryKey::root(&key.pk),
                    condition: Condition::attribute_exists(ATTR_PK),
                },
                TransactItem::Put {
                    item: item.to_item(),
                    condition: put_condition,
                },
            ])
            .await
            .map_err(|err| conflict_on_condition(T::ENTITY_TYPE, &child_id(&key), err))
    }

    /// Unconditional delete of one child.
    pub async fn delete(&self, parent_pk: &str, sk: &str) -> Result<()> {
        tracing::debug!(entity = T::ENTITY_TYPE, pk = %parent_pk, sk = %sk, "Deleting child");

        self.store
            .delete(&PrimaryKey::new(parent_pk, sk), None)
            .await
            .map_err(store_error)
    }

    /// Every child of this kind under `parent_pk`, in sort key order.
    pub async fn get_all_by_parent_pk(&self, parent_pk: &str) -> Result<Vec<T>> {
        let query = Query::partition(ATTR_PK, parent_pk).begins_with(ATTR_SK, T::KIND.sk_prefix());

        self.store
            .query(query)
            .await
            .map_err(store_error)?
            .iter()
            .map(T::from_item)
            .collect()
    }

    pub async fn get_by_primary_key(&self, parent_pk: &str, sk: &str) -> Result<T> {
        let key = PrimaryKey::new(parent_pk, sk);
        let item = self
            .store
            .get(&key)
            .await
            .map_err(store_error)?
            .ok_or_else(|| RepositoryError::not_found(T::ENTITY_TYPE, child_id(&key)))?;

        T::from_item(&item)
    }

    /// Deletes every child of this kind under `parent_pk`, returning what was deleted.
    ///
    /// Not atomic. See [`ChildRepository::batch_save`] for partial failures.
    pub async fn batch_delete(&self, parent_pk: &str) -> Result<Vec<T>> {
        let children = self.get_all_by_parent_pk(parent_pk).await?;
        let requests = children
            .iter()
            .map(|child| WriteRequest::Delete(child.primary_key()))
            .collect();

        self.write_in_chunks(requests).await?;
        Ok(children)
    }

    /// Writes every child without preconditions, replacing existing ones.
    ///
    /// Children sharing a primary key collapse into one put of the last of
    /// them. Requests are sent in chunks of the store's batch limit and are not
    /// retried. When the store leaves any unprocessed the call fails with
    /// [`RepositoryError::PartialBatch`]; everything else stays written.
    pub async fn batch_save(&self, items: &[T]) -> Result<()> {
        let mut requests: Vec<WriteRequest> = Vec::with_capacity(items.len());
        let mut positions: HashMap<PrimaryKey, usize> = HashMap::new();

        for item in items {
            let request = WriteRequest::Put(item.to_item());
            match positions.entry(item.primary_key()) {
                Entry::Occupied(position) => requests[*position.get()] = request,
                Entry::Vacant(position) => {
                    position.insert(requests.len());
                    requests.push(request);
                }
            }
        }
        if requests.len() < items.len() {
            tracing::debug!(
                entity = T::ENTITY_TYPE,
                collapsed = items.len() - requests.len(),
                "Collapsed repeated keys in batch"
            );
        }

        self.write_in_chunks(requests).await
    }

    /// Sets a single attribute of the child at (`parent_pk`, `sk`).
    pub async fn update_property(
        &self,
        parent_pk: &str,
        sk: &str,
        property: &str,
        property_type: PropertyType,
        value: AttributeValue,
    ) -> Result<()> {
        ensure_property_type(property, property_type, &value)?;
        tracing::debug!(
            entity = T::ENTITY_TYPE,
            pk = %parent_pk,
            sk = %sk,
            property,
            "Updating child property"
        );

        self.store
            .update(&PrimaryKey::new(parent_pk, sk), property, property_type, value)
            .await
            .map_err(store_error)
    }

    async fn write_in_chunks(&self, requests: Vec<WriteRequest>) -> Result<()> {
        let mut unprocessed = Vec::new();

        for chunk in requests.chunks(MAX_BATCH_WRITE_ITEMS) {
            tracing::debug!(entity = T::ENTITY_TYPE, size = chunk.len(), "Writing batch");
            let left = self
                .store
                .batch_write(chunk.to_vec())
                .await
                .map_err(store_error)?;
            unprocessed.extend(left.iter().filter_map(request_key));
        }

        if !unprocessed.is_empty() {
            tracing::warn!(
                entity = T::ENTITY_TYPE,
                unprocessed = unprocessed.len(),
                total = requests.len(),
                "Batch write partially applied"
            );
            return Err(RepositoryError::PartialBatch { unprocessed });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use applyhub_core::models::{
        Application, Document, DocumentStatus, DocumentType, Entity, Message, MessageAuthor,
    };

    use super::*;
    use crate::repository::BaseRepository;
    use crate::storage::InMemoryStore;

    struct Fixture {
        store: Arc<InMemoryStore>,
        applications: BaseRepository<Application>,
        documents: ChildRepository<Document>,
        messages: ChildRepository<Message>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::single_table("applyhub", "GSI1", "GSI2"));
        Fixture {
            applications: BaseRepository::new(store.clone()),
            documents: ChildRepository::new(store.clone()),
            messages: ChildRepository::new(store.clone()),
            store,
        }
    }

    async fn saved_application(fixture: &Fixture) -> Application {
        let app = Application::new("Ana", "ana@example.com");
        fixture.applications.save(&app).await.unwrap();
        app
    }

    #[tokio::test]
    async fn test_save_requires_parent() {
        let fixture = fixture();
        let document = Document::requested("APP#missing", &DocumentType::Cv, "");

        let result = fixture.documents.save(&document).await;

        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
        assert!(fixture.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_message_save_requires_parent() {
        let fixture = fixture();
        let message = Message::new("APP#missing", MessageAuthor::User, "Hi");

        let result = fixture.messages.save(&message).await;

        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
        assert!(fixture.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_with_parent() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        let document = Document::requested(&app.pk, &DocumentType::Cv, "Latest version");

        fixture.documents.save(&document).await.unwrap();

        let fetched = fixture
            .documents
            .get_by_primary_key(&app.pk, "Document-CV")
            .await
            .unwrap();
        assert_eq!(fetched.sk, "Document-CV");
        assert_eq!(fetched.notes, "Latest version");
        assert_eq!(fetched.status, DocumentStatus::Requested);
    }

    #[tokio::test]
    async fn test_document_save_overwrites() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        let mut document = Document::requested(&app.pk, &DocumentType::Cv, "");
        fixture.documents.save(&document).await.unwrap();

        document.record_upload("cv.pdf", 1024).unwrap();
        fixture.documents.save(&document).await.unwrap();

        let documents = fixture.documents.get_all_by_parent_pk(&app.pk).await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].status, DocumentStatus::UnderAnalysis);
    }

    #[tokio::test]
    async fn test_message_save_first_write_wins() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        let message = Message::new(&app.pk, MessageAuthor::Admin, "Welcome");
        fixture.messages.save(&message).await.unwrap();

        let mut duplicate = message.clone();
        duplicate.content = "Replaced".to_string();
        let result = fixture.messages.save(&duplicate).await;

        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
        let stored = fixture
            .messages
            .get_by_primary_key(&app.pk, &message.sk)
            .await
            .unwrap();
        assert_eq!(stored.content, "Welcome");
    }

    #[tokio::test]
    async fn test_get_all_by_parent_pk_only_returns_kind() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        fixture
            .documents
            .save(&Document::requested(&app.pk, &DocumentType::Cv, ""))
            .await
            .unwrap();
        fixture
            .documents
            .save(&Document::requested(&app.pk, &DocumentType::Consent, ""))
            .await
            .unwrap();
        fixture
            .messages
            .save(&Message::new(&app.pk, MessageAuthor::User, "Hello"))
            .await
            .unwrap();

        let documents = fixture.documents.get_all_by_parent_pk(&app.pk).await.unwrap();
        let messages = fixture.messages.get_all_by_parent_pk(&app.pk).await.unwrap();

        let sks: Vec<_> = documents.iter().map(|document| document.sk.as_str()).collect();
        assert_eq!(sks, vec!["Document-CV", "Document-Consent"]);
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_primary_key_not_found() {
        let fixture = fixture();

        let result = fixture
            .documents
            .get_by_primary_key("APP#1", "Document-CV")
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::not_found("Document", "APP#1/Document-CV"))
        );
    }

    #[tokio::test]
    async fn test_batch_save_overwrites_by_type() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;

        fixture
            .documents
            .batch_save(&[Document::requested(&app.pk, &DocumentType::Cv, "first")])
            .await
            .unwrap();
        fixture
            .documents
            .batch_save(&[Document::requested(&app.pk, &DocumentType::Cv, "second")])
            .await
            .unwrap();

        let documents = fixture.documents.get_all_by_parent_pk(&app.pk).await.unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].sk, "Document-CV");
        assert_eq!(documents[0].pk, app.pk);
        assert_eq!(documents[0].notes, "second");
    }

    #[tokio::test]
    async fn test_batch_save_repeated_key_keeps_last() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;

        fixture
            .documents
            .batch_save(&[
                Document::requested(&app.pk, &DocumentType::Cv, "first"),
                Document::requested(&app.pk, &DocumentType::Consent, ""),
                Document::requested(&app.pk, &DocumentType::Cv, "second"),
            ])
            .await
            .unwrap();

        let documents = fixture.documents.get_all_by_parent_pk(&app.pk).await.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].sk, "Document-CV");
        assert_eq!(documents[0].notes, "second");
        assert_eq!(documents[1].sk, "Document-Consent");
    }

    #[tokio::test]
    async fn test_batch_save_chunks_past_the_limit() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        let documents: Vec<_> = DocumentType::KNOWN
            .iter()
            .map(|document_type| Document::requested(&app.pk, document_type, ""))
            .collect();
        assert!(documents.len() > MAX_BATCH_WRITE_ITEMS);

        fixture.documents.batch_save(&documents).await.unwrap();

        let stored = fixture.documents.get_all_by_parent_pk(&app.pk).await.unwrap();
        assert_eq!(stored.len(), DocumentType::KNOWN.len());
    }

    #[tokio::test]
    async fn test_batch_save_reports_unprocessed() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        let documents = vec![
            Document::requested(&app.pk, &DocumentType::Cv, ""),
            Document::requested(&app.pk, &DocumentType::Consent, ""),
            Document::requested(&app.pk, &DocumentType::Picture, ""),
        ];
        fixture.store.fail_next_batch_with_unprocessed(1);

        let result = fixture.documents.batch_save(&documents).await;

        assert_eq!(
            result,
            Err(RepositoryError::PartialBatch {
                unprocessed: vec![documents[2].primary_key()],
            })
        );
        let stored = fixture.documents.get_all_by_parent_pk(&app.pk).await.unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn test_batch_delete() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        fixture
            .documents
            .batch_save(&[
                Document::requested(&app.pk, &DocumentType::Cv, ""),
                Document::requested(&app.pk, &DocumentType::Consent, ""),
            ])
            .await
            .unwrap();
        fixture
            .messages
            .save(&Message::new(&app.pk, MessageAuthor::User, "Hello"))
            .await
            .unwrap();

        let deleted = fixture.documents.batch_delete(&app.pk).await.unwrap();

        assert_eq!(deleted.len(), 2);
        assert!(fixture
            .documents
            .get_all_by_parent_pk(&app.pk)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            fixture.messages.get_all_by_parent_pk(&app.pk).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_batch_delete_reports_unprocessed() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        fixture
            .documents
            .batch_save(&[
                Document::requested(&app.pk, &DocumentType::Cv, ""),
                Document::requested(&app.pk, &DocumentType::Consent, ""),
            ])
            .await
            .unwrap();
        fixture.store.fail_next_batch_with_unprocessed(1);

        let result = fixture.documents.batch_delete(&app.pk).await;

        assert_eq!(
            result,
            Err(RepositoryError::PartialBatch {
                unprocessed: vec![PrimaryKey::new(&app.pk, "Document-Consent")],
            })
        );
        let left = fixture.documents.get_all_by_parent_pk(&app.pk).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].sk, "Document-Consent");
    }

    #[tokio::test]
    async fn test_batch_delete_without_children() {
        let fixture = fixture();

        let deleted = fixture.documents.batch_delete("APP#empty").await.unwrap();

        assert!(deleted.is_empty());
    }

    #[tokio::test]
    async fn test_update_property_targets_child() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        let document = Document::requested(&app.pk, &DocumentType::Cv, "");
        fixture.documents.save(&document).await.unwrap();

        fixture
            .documents
            .update_property(
                &app.pk,
                &document.sk,
                "Status",
                PropertyType::String,
                AttributeValue::S(DocumentStatus::Approved.as_str().to_string()),
            )
            .await
            .unwrap();

        let updated = fixture
            .documents
            .get_by_primary_key(&app.pk, &document.sk)
            .await
            .unwrap();
        assert_eq!(updated.status, DocumentStatus::Approved);
        let parent = fixture.applications.get_by_id(&app.pk).await.unwrap();
        assert_eq!(parent.email, app.email);
    }

    #[tokio::test]
    async fn test_delete_child() {
        let fixture = fixture();
        let app = saved_application(&fixture).await;
        let message = Message::new(&app.pk, MessageAuthor::User, "Hello");
        fixture.messages.save(&message).await.unwrap();

        fixture.messages.delete(&app.pk, &message.sk).await.unwrap();

        assert!(fixture
            .messages
            .get_all_by_parent_pk(&app.pk)
            .await
            .unwrap()
            .is_empty());
    }
}
