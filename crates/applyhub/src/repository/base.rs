//! Generic repository over one root entity type.

use std::marker::PhantomData;
use std::sync::Arc;

use applyhub_core::models::keys::{ATTR_CREATED_AT, ATTR_GSI_PK};
use applyhub_core::models::{Entity, ValidationError};
use applyhub_core::storage::{CreatedRange, RepositoryError, Result};
use applyhub_core::store::{
    AttributeValue, Condition, KeyValueStore, PrimaryKey, PropertyType, Query, ATTR_PK,
};

use super::error::{not_found_on_condition, store_error};

/// Rejects a value whose variant disagrees with the declared property type.
pub(crate) fn ensure_property_type(
    property: &str,
    property_type: PropertyType,
    value: &AttributeValue,
) -> Result<()> {
    if property_type.matches(value) {
        return Ok(());
    }
    Err(ValidationError::PropertyTypeMismatch {
        attribute: property.to_string(),
        expected: property_type,
    }
    .into())
}

/// Store-backed repository for entities whose item is keyed `PK = SK = id`.
///
/// `index` names the secondary index over (`GSI_PK`, `CreatedAt`). Without it
/// range queries fail with [`RepositoryError::IndexNotConfigured`].
pub struct BaseRepository<T: Entity> {
    store: Arc<dyn KeyValueStore>,
    index: Option<String>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for BaseRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index: self.index.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> BaseRepository<T> {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            index: None,
            _entity: PhantomData,
        }
    }

    pub fn with_index(store: Arc<dyn KeyValueStore>, index: impl Into<String>) -> Self {
        Self {
            store,
            index: Some(index.into()),
            _entity: PhantomData,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Unconditional upsert.
    pub async fn save(&self, item: &T) -> Result<()> {
        let key = item.primary_key();
        tracing::debug!(entity = T::ENTITY_TYPE, pk = %key.pk, sk = %key.sk, "Saving item");

        self.store
            .put(item.to_item(), None)
            .await
            .map_err(store_error)
    }

    /// Deletes the item, failing with NotFound when it does not exist.
    pub async fn delete(&self, id: &str) -> Result<()> {
        tracing::debug!(entity = T::ENTITY_TYPE, pk = %id, "Deleting item");

        self.store
            .delete(
                &PrimaryKey::root(id),
                Some(Condition::attribute_exists(ATTR_PK)),
            )
            .await
            .map_err(|err| not_found_on_condition(T::ENTITY_TYPE, id, err))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<T> {
        tracing::debug!(entity = T::ENTITY_TYPE, pk = %id, "Getting item");

        let item = self
            .store
            .get(&PrimaryKey::root(id))
            .await
            .map_err(store_error)?
            .ok_or_else(|| RepositoryError::not_found(T::ENTITY_TYPE, id))?;

        T::from_item(&item)
    }

    /// Items of the `type_prefix` index partition created within `range`, newest first.
    pub async fn get_between_dates(
        &self,
        range: &CreatedRange,
        type_prefix: &str,
    ) -> Result<Vec<T>> {
        let index = self.index()?;
        let (start, end) = range.bounds();
        tracing::debug!(
            entity = T::ENTITY_TYPE,
            index,
            gsi_pk = %type_prefix,
            %start,
            %end,
            "Querying by creation date"
        );

        let query = Query::partition(ATTR_GSI_PK, type_prefix)
            .on_index(index)
            .between(ATTR_CREATED_AT, start, end)
            .descending();

        self.query(query).await
    }

    /// Sets a single attribute of the item.
    ///
    /// The value must agree with `property_type`; a mismatch is rejected before
    /// any store call.
    pub async fn update_property(
        &self,
        id: &str,
        property: &str,
        property_type: PropertyType,
        value: AttributeValue,
    ) -> Result<()> {
        ensure_property_type(property, property_type, &value)?;
        tracing::debug!(entity = T::ENTITY_TYPE, pk = %id, property, "Updating property");

        self.store
            .update(&PrimaryKey::root(id), property, property_type, value)
            .await
            .map_err(store_error)
    }

    pub(crate) fn index(&self) -> Result<&str> {
        self.index
            .as_deref()
            .ok_or(RepositoryError::IndexNotConfigured {
                entity_type: T::ENTITY_TYPE,
            })
    }

    pub(crate) async fn query(&self, query: Query) -> Result<Vec<T>> {
        self.store
            .query(query)
            .await
            .map_err(store_error)?
            .iter()
            .map(T::from_item)
            .collect()
    }
}
