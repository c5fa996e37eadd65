use std::sync::Arc;

use serde::{Deserialize, Serialize};

use applyhub_core::files::{AccessGrant, FileStorage, FileStorageError};
use applyhub_core::models::keys;
use applyhub_core::models::{
    Actor, Application, ApplicationProperty, Document, DocumentStatus, DocumentType, Message,
    MessageAuthor, ValidationError,
};
use applyhub_core::storage::CreatedRange;
use applyhub_core::store::{AttributeValue, KeyValueStore, PropertyType};

use super::{delete_objects, grant_uploads, uploaded_documents, DocumentUpload, Result};
use crate::config::Config;
use crate::repository::{ApplicationRepository, DocumentRepository, MessageRepository};

const STATUS_ATTRIBUTE: &str = "Status";

/// Fields an applicant submits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedApplication {
    pub application: Application,
    pub uploads: Vec<AccessGrant>,
}

/// An application with everything stored under it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetails {
    pub application: Application,
    pub documents: Vec<Document>,
    pub messages: Vec<Message>,
}

/// Application lifecycle: creation with documents, document requests and
/// uploads, messaging, admin updates and cascading deletion.
#[derive(Clone)]
pub struct ApplicationWorkflow {
    applications: ApplicationRepository,
    documents: DocumentRepository,
    messages: MessageRepository,
    files: Arc<dyn FileStorage>,
}

impl ApplicationWorkflow {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        config: &Config,
        files: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            applications: ApplicationRepository::new(
                store.clone(),
                &config.created_index,
                &config.identity_index,
            ),
            documents: DocumentRepository::new(store.clone()),
            messages: MessageRepository::new(store),
            files,
        }
    }

    /// Creates an application with its mandatory documents.
    ///
    /// Every document is validated and the application is checked against
    /// them before anything is written. Returns one upload grant per document.
    pub async fn create(
        &self,
        input: NewApplication,
        uploads: &[DocumentUpload],
    ) -> Result<CreatedApplication> {
        let mut application = Application::new(input.name, input.email);
        application.message = input.message;

        let documents = uploaded_documents(&application.pk, uploads)?;
        application.validate(&documents)?;

        self.applications.save(&application).await?;
        self.documents.batch_save(&documents).await?;
        let uploads = grant_uploads(self.files.as_ref(), &documents).await?;

        tracing::info!(
            pk = %application.pk,
            documents = documents.len(),
            "Application created"
        );
        Ok(CreatedApplication {
            application,
            uploads,
        })
    }

    /// Deletes the application, its documents with their objects, and its messages.
    pub async fn delete(&self, app_pk: &str) -> Result<()> {
        self.applications.delete(app_pk).await?;
        let documents = self.documents.batch_delete(app_pk).await?;
        delete_objects(self.files.as_ref(), &documents).await?;
        let messages = self.messages.batch_delete(app_pk).await?;

        tracing::info!(
            pk = %app_pk,
            documents = documents.len(),
            messages = messages.len(),
            "Application deleted"
        );
        Ok(())
    }

    /// PK of the application the actor may act on.
    ///
    /// Admins address any application by id; users only reach the application
    /// linked to their identity.
    pub async fn resolve(&self, actor: &Actor, admin_target_id: &str) -> Result<String> {
        match actor {
            Actor::Admin => Ok(keys::application_pk_from_id(admin_target_id)),
            Actor::User { identity_id } => Ok(self
                .applications
                .get_application_id_by_cognito_id(identity_id)
                .await?),
        }
    }

    pub async fn get(&self, app_pk: &str) -> Result<ApplicationDetails> {
        let application = self.applications.get_by_id(app_pk).await?;
        let documents = self.documents.get_all_by_parent_pk(app_pk).await?;
        let messages = self.messages.get_all_by_parent_pk(app_pk).await?;

        Ok(ApplicationDetails {
            application,
            documents,
            messages,
        })
    }

    /// Applications created within `range`, newest first.
    pub async fn list(&self, range: &CreatedRange) -> Result<Vec<Application>> {
        Ok(self.applications.get_between_dates(range).await?)
    }

    pub async fn by_email(&self, email: &str) -> Result<Application> {
        Ok(self.applications.get_application_by_email(email).await?)
    }

    /// Opens a slot per document type, replacing any previous slot of that type.
    pub async fn request_documents(
        &self,
        app_pk: &str,
        requests: &[(DocumentType, String)],
    ) -> Result<Vec<Document>> {
        self.applications.get_by_id(app_pk).await?;

        let documents = requests
            .iter()
            .map(|(document_type, notes)| {
                let document = Document::requested(app_pk, document_type, notes.as_str());
                document.validate_request()?;
                Ok(document)
            })
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;

        self.documents.batch_save(&documents).await?;
        tracing::info!(pk = %app_pk, documents = documents.len(), "Documents requested");
        Ok(documents)
    }

    /// Records an upload into a requested slot and grants write access to its object.
    pub async fn upload_document(
        &self,
        app_pk: &str,
        upload: &DocumentUpload,
    ) -> Result<AccessGrant> {
        let sk = keys::document_sk(upload.document_type.as_str());
        let mut document = self.documents.get_by_primary_key(app_pk, &sk).await?;

        document.record_upload(&upload.file_name, upload.size_bytes)?;
        document.validate()?;
        self.documents.save(&document).await?;

        tracing::info!(pk = %app_pk, sk = %sk, "Document uploaded");
        match document.name.as_deref() {
            Some(name) => Ok(self.files.grant_write_access(name).await?),
            None => Err(FileStorageError::NotFound(sk).into()),
        }
    }

    pub async fn delete_document(&self, app_pk: &str, document_type: &DocumentType) -> Result<()> {
        let sk = keys::document_sk(document_type.as_str());
        let document = self.documents.get_by_primary_key(app_pk, &sk).await?;

        self.documents.delete(app_pk, &sk).await?;
        delete_objects(self.files.as_ref(), std::slice::from_ref(&document)).await
    }

    /// Read access to an uploaded document's content.
    pub async fn document_content(
        &self,
        app_pk: &str,
        document_type: &DocumentType,
    ) -> Result<AccessGrant> {
        let sk = keys::document_sk(document_type.as_str());
        let document = self.documents.get_by_primary_key(app_pk, &sk).await?;

        match document.name.as_deref() {
            Some(name) if document.is_uploaded() => Ok(self.files.grant_read_access(name).await?),
            _ => Err(FileStorageError::NotFound(sk).into()),
        }
    }

    pub async fn post_message(
        &self,
        app_pk: &str,
        author: MessageAuthor,
        content: &str,
    ) -> Result<Message> {
        let message = Message::new(app_pk, author, content);
        message.validate()?;
        self.messages.save(&message).await?;

        tracing::info!(pk = %app_pk, sk = %message.sk, author = author.as_str(), "Message posted");
        Ok(message)
    }

    /// Records an admin decision on a document.
    pub async fn set_document_status(
        &self,
        app_pk: &str,
        document_type: &DocumentType,
        status: DocumentStatus,
    ) -> Result<()> {
        if !status.is_decision() {
            return Err(ValidationError::InvalidPropertyValue {
                property: STATUS_ATTRIBUTE.to_string(),
                reason: format!("{} is not a decision", status.as_str()),
            }
            .into());
        }
        let sk = keys::document_sk(document_type.as_str());
        self.documents.get_by_primary_key(app_pk, &sk).await?;

        self.documents
            .update_property(
                app_pk,
                &sk,
                STATUS_ATTRIBUTE,
                PropertyType::String,
                AttributeValue::S(status.as_str().to_string()),
            )
            .await?;
        Ok(())
    }

    pub async fn update_application_property(
        &self,
        app_pk: &str,
        property: &ApplicationProperty,
    ) -> Result<()> {
        self.applications.get_by_id(app_pk).await?;

        self.applications
            .update_property(
                app_pk,
                property.attribute(),
                property.property_type(),
                property.value(),
            )
            .await?;
        Ok(())
    }

    pub async fn link_identity(&self, app_pk: &str, identity: &str) -> Result<()> {
        Ok(self.applications.link_identity(app_pk, identity).await?)
    }
}
