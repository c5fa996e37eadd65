use std::sync::Arc;

use applyhub_core::models::conversions::{email_marker_item, email_marker_key, get_string};
use applyhub_core::models::keys::{self, ATTR_COGNITO_ID, ATTR_EMAIL, ATTR_GSI_PK};
use applyhub_core::models::{Application, Entity};
use applyhub_core::storage::{CreatedRange, RepositoryError, Result};
use applyhub_core::store::{
    AttributeValue, Condition, KeyValueStore, PrimaryKey, PropertyType, Query, TransactItem,
    ATTR_PK,
};

use super::base::BaseRepository;
use super::error::{conflict_on_condition, not_found_on_condition, store_error};

const ENTITY_TYPE: &str = Application::ENTITY_TYPE;

/// Applications, their email uniqueness markers and identity lookups.
#[derive(Clone)]
pub struct ApplicationRepository {
    base: BaseRepository<Application>,
    identity_index: Option<String>,
}

impl ApplicationRepository {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        created_index: impl Into<String>,
        identity_index: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseRepository::with_index(store, created_index),
            identity_index: Some(identity_index.into()),
        }
    }

    /// Creates the application together with its email marker.
    ///
    /// Fails with a conflict when the id or the email is already taken; in that
    /// case neither item is written.
    pub async fn save(&self, app: &Application) -> Result<()> {
        tracing::debug!(pk = %app.pk, "Saving application");

        self.base
            .store()
            .transact_write(vec![
                TransactItem::Put {
                    item: app.to_item(),
                    condition: Some(Condition::attribute_not_exists(ATTR_PK)),
                },
                TransactItem::Put {
                    item: email_marker_item(&app.email),
                    condition: Some(Condition::attribute_not_exists(ATTR_PK)),
                },
            ])
            .await
            .map_err(|err| conflict_on_condition(ENTITY_TYPE, &app.email, err))
    }

    /// Deletes the application and releases its email.
    ///
    /// Documents and messages are left to the caller.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let app = self.base.get_by_id(id).await?;
        tracing::debug!(pk = %id, "Deleting application");

        self.base
            .store()
            .transact_write(vec![
                TransactItem::Delete {
                    key: PrimaryKey::root(id),
                    condition: Some(Condition::attribute_exists(ATTR_PK)),
                },
                TransactItem::Delete {
                    key: email_marker_key(&app.email),
                    condition: None,
                },
            ])
            .await
            .map_err(|err| not_found_on_condition(ENTITY_TYPE, id, err))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Application> {
        self.base.get_by_id(id).await
    }

    /// Applications created within `range`, newest first.
    pub async fn get_between_dates(&self, range: &CreatedRange) -> Result<Vec<Application>> {
        self.base
            .get_between_dates(range, &keys::application_gsi_pk())
            .await
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

    /// PK of the single application linked to `identity`.
    ///
    /// More than one match means the index is inconsistent and is reported as
    /// an integrity violation rather than picking one.
    pub async fn get_application_id_by_cognito_id(&self, identity: &str) -> Result<String> {
        if identity == keys::UNLINKED_IDENTITY {
            return Err(RepositoryError::not_found(ENTITY_TYPE, identity));
        }
        let index = self
            .identity_index
            .as_deref()
            .ok_or(RepositoryError::IndexNotConfigured {
                entity_type: ENTITY_TYPE,
            })?;
        tracing::debug!(index, identity, "Looking up application by identity");

        let items = self
            .base
            .store()
            .query(Query::partition(ATTR_COGNITO_ID, identity).on_index(index))
            .await
            .map_err(store_error)?;

        match items.as_slice() {
            [] => Err(RepositoryError::not_found(ENTITY_TYPE, identity)),
            [item] => get_string(item, ATTR_PK),
            _ => Err(RepositoryError::Integrity {
                entity_type: ENTITY_TYPE,
                detail: format!("{} applications share identity {}", items.len(), identity),
            }),
        }
    }

    /// The single application registered with `email`.
    pub async fn get_application_by_email(&self, email: &str) -> Result<Application> {
        let index = self.base.index()?;
        tracing::debug!(index, email, "Looking up application by email");

        let query = Query::partition(ATTR_GSI_PK, keys::application_gsi_pk())
            .on_index(index)
            .filter_eq(ATTR_EMAIL, AttributeValue::S(email.to_string()));
        let mut applications = self.base.query(query).await?;

        match applications.len() {
            0 => Err(RepositoryError::not_found(ENTITY_TYPE, email)),
            1 => Ok(applications.remove(0)),
            count => Err(RepositoryError::Integrity {
                entity_type: ENTITY_TYPE,
                detail: format!("{count} applications share email {email}"),
            }),
        }
    }

    /// Links an external identity to an existing application.
    pub async fn link_identity(&self, id: &str, identity: &str) -> Result<()> {
        self.base.get_by_id(id).await?;
        tracing::info!(pk = %id, identity, "Linking identity");

        self.base
            .update_property(
                id,
                ATTR_COGNITO_ID,
                PropertyType::String,
                AttributeValue::S(identity.to_string()),
            )
            .await
    }
}
