//! Item conversion for every entity.
//!
//! Pure functions mapping entities to and from the attribute maps stored in the
//! table. A malformed item surfaces as [`RepositoryError::InvalidData`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::storage::RepositoryError;
use crate::store::{AttributeValue, Item, PrimaryKey, ATTR_PK, ATTR_SK};

use super::keys::{
    self, ATTR_COGNITO_ID, ATTR_CREATED_AT, ATTR_EMAIL, ATTR_GSI_PK, ATTR_UPLOADED_AT,
};
use super::{
    Accommodation, Application, ChildEntity, ChildKind, Document, EmployerInfo, Entity,
    GermanTrainingInfo, Message, Post,
};

// ============================================================================
// Application conversions
// ============================================================================

impl Entity for Application {
    const ENTITY_TYPE: &'static str = "Application";

    fn primary_key(&self) -> PrimaryKey {
        PrimaryKey::new(&self.pk, &self.sk)
    }

    fn to_item(&self) -> Item {
        let mut item = HashMap::new();

        // Keys
        item.insert(ATTR_PK.to_string(), AttributeValue::S(self.pk.clone()));
        item.insert(ATTR_SK.to_string(), AttributeValue::S(self.sk.clone()));
        item.insert(ATTR_GSI_PK.to_string(), AttributeValue::S(self.gsi_pk.clone()));
        item.insert(
            ATTR_COGNITO_ID.to_string(),
            AttributeValue::S(self.cognito_id.clone()),
        );

        // Data
        item.insert(
            ATTR_CREATED_AT.to_string(),
            AttributeValue::S(keys::timestamp(self.created_at)),
        );
        item.insert("Name".to_string(), AttributeValue::S(self.name.clone()));
        item.insert(ATTR_EMAIL.to_string(), AttributeValue::S(self.email.clone()));
        if let Some(message) = &self.message {
            item.insert("Message".to_string(), AttributeValue::S(message.clone()));
        }
        item.insert("Analysed".to_string(), AttributeValue::Bool(self.analysed));
        item.insert(
            "PreScreeningStatus".to_string(),
            AttributeValue::S(self.pre_screening_status.as_str().to_string()),
        );
        if let Some(info) = &self.german_training_info {
            item.insert("GermanTrainingInfo".to_string(), info.to_attribute());
        }
        if let Some(info) = &self.employer_info {
            item.insert("EmployerInfo".to_string(), info.to_attribute());
        }

        item
    }

    fn from_item(item: &Item) -> Result<Self, RepositoryError> {
        let status = get_string(item, "PreScreeningStatus")?;

        Ok(Application {
            pk: get_string(item, ATTR_PK)?,
            sk: get_string(item, ATTR_SK)?,
            gsi_pk: get_string(item, ATTR_GSI_PK)?,
            created_at: get_datetime(item, ATTR_CREATED_AT)?,
            name: get_string(item, "Name")?,
            email: get_string(item, ATTR_EMAIL)?,
            message: get_optional_string(item, "Message"),
            analysed: get_optional_bool(item, "Analysed").unwrap_or(false),
            pre_screening_status: status.parse().map_err(|_| {
                RepositoryError::InvalidData(format!("Invalid PreScreeningStatus: {status}"))
            })?,
            cognito_id: get_optional_string(item, ATTR_COGNITO_ID)
                .unwrap_or_else(|| keys::UNLINKED_IDENTITY.to_string()),
            german_training_info: get_optional_map(item, "GermanTrainingInfo")
                .map(german_training_info_from_map)
                .transpose()?,
            employer_info: get_optional_map(item, "EmployerInfo")
                .map(employer_info_from_map)
                .transpose()?,
        })
    }
}

fn german_training_info_from_map(
    map: &HashMap<String, AttributeValue>,
) -> Result<GermanTrainingInfo, RepositoryError> {
    Ok(GermanTrainingInfo {
        exam_date: get_string(map, "ExamDate")?,
    })
}

fn employer_info_from_map(
    map: &HashMap<String, AttributeValue>,
) -> Result<EmployerInfo, RepositoryError> {
    let accommodation = match get_optional_map(map, "Accommodation") {
        Some(accommodation) => Accommodation {
            location: get_optional_string(accommodation, "Location").unwrap_or_default(),
            from: get_optional_string(accommodation, "From").unwrap_or_default(),
            to: get_optional_string(accommodation, "To").unwrap_or_default(),
        },
        None => Accommodation::default(),
    };

    Ok(EmployerInfo {
        name: get_string(map, "Name")?,
        accommodation,
    })
}

/// The companion item occupying `APP#email#<email>` for as long as the application exists.
pub fn email_marker_item(email: &str) -> Item {
    email_marker_key(email).to_item()
}

pub fn email_marker_key(email: &str) -> PrimaryKey {
    PrimaryKey::new(keys::email_marker_pk(email), keys::EMAIL_UNIQUE_SK)
}

// ============================================================================
// Post conversions
// ============================================================================

impl Entity for Post {
    const ENTITY_TYPE: &'static str = "Post";

    fn primary_key(&self) -> PrimaryKey {
        PrimaryKey::new(&self.pk, &self.sk)
    }

    fn to_item(&self) -> Item {
        let mut item = HashMap::new();

        // Keys
        item.insert(ATTR_PK.to_string(), AttributeValue::S(self.pk.clone()));
        item.insert(ATTR_SK.to_string(), AttributeValue::S(self.sk.clone()));
        item.insert(ATTR_GSI_PK.to_string(), AttributeValue::S(self.gsi_pk.clone()));

        // Data
        item.insert(
            ATTR_CREATED_AT.to_string(),
            AttributeValue::S(keys::timestamp(self.created_at)),
        );
        item.insert("Title".to_string(), AttributeValue::S(self.title.clone()));
        item.insert("Content".to_string(), AttributeValue::S(self.content.clone()));

        item
    }

    fn from_item(item: &Item) -> Result<Self, RepositoryError> {
        Ok(Post {
            pk: get_string(item, ATTR_PK)?,
            sk: get_string(item, ATTR_SK)?,
            gsi_pk: get_string(item, ATTR_GSI_PK)?,
            created_at: get_datetime(item, ATTR_CREATED_AT)?,
            title: get_string(item, "Title")?,
            content: get_string(item, "Content")?,
        })
    }
}

// ============================================================================
// Document conversions
// ============================================================================

impl Entity for Document {
    const ENTITY_TYPE: &'static str = "Document";

    fn primary_key(&self) -> PrimaryKey {
        PrimaryKey::new(&self.pk, &self.sk)
    }

    fn to_item(&self) -> Item {
        let mut item = HashMap::new();

        // Keys
        item.insert(ATTR_PK.to_string(), AttributeValue::S(self.pk.clone()));
        item.insert(ATTR_SK.to_string(), AttributeValue::S(self.sk.clone()));

        // Data
        if let Some(name) = &self.name {
            item.insert("Name".to_string(), AttributeValue::S(name.clone()));
        }
        if let Some(content_type) = &self.content_type {
            item.insert(
                "ContentType".to_string(),
                AttributeValue::S(content_type.clone()),
            );
        }
        if let Some(size) = self.size_bytes {
            item.insert("SizeBytes".to_string(), AttributeValue::N(size.to_string()));
        }
        item.insert(
            "RequestedAt".to_string(),
            AttributeValue::S(keys::timestamp(self.requested_at)),
        );
        if let Some(uploaded_at) = self.uploaded_at {
            item.insert(
                ATTR_UPLOADED_AT.to_string(),
                AttributeValue::S(keys::timestamp(uploaded_at)),
            );
        }
        item.insert(
            "Status".to_string(),
            AttributeValue::S(self.status.as_str().to_string()),
        );
        item.insert("Notes".to_string(), AttributeValue::S(self.notes.clone()));

        item
    }

    fn from_item(item: &Item) -> Result<Self, RepositoryError> {
        let status = get_string(item, "Status")?;

        Ok(Document {
            pk: get_string(item, ATTR_PK)?,
            sk: get_string(item, ATTR_SK)?,
            name: get_optional_string(item, "Name"),
            content_type: get_optional_string(item, "ContentType"),
            size_bytes: get_optional_number(item, "SizeBytes")?,
            requested_at: get_datetime(item, "RequestedAt")?,
            uploaded_at: get_optional_datetime(item, ATTR_UPLOADED_AT)?,
            status: status
                .parse()
                .map_err(|_| RepositoryError::InvalidData(format!("Invalid Status: {status}")))?,
            notes: get_optional_string(item, "Notes").unwrap_or_default(),
        })
    }
}

impl ChildEntity for Document {
    const KIND: ChildKind = ChildKind::Document;
}

// ============================================================================
// Message conversions
// ============================================================================

impl Entity for Message {
    const ENTITY_TYPE: &'static str = "Message";

    fn primary_key(&self) -> PrimaryKey {
        PrimaryKey::new(&self.pk, &self.sk)
    }

    fn to_item(&self) -> Item {
        let mut item = HashMap::new();

        // Keys
        item.insert(ATTR_PK.to_string(), AttributeValue::S(self.pk.clone()));
        item.insert(ATTR_SK.to_string(), AttributeValue::S(self.sk.clone()));

        // Data
        item.insert(
            "Author".to_string(),
            AttributeValue::S(self.author.as_str().to_string()),
        );
        item.insert("IsRead".to_string(), AttributeValue::Bool(self.is_read));
        item.insert("Content".to_string(), AttributeValue::S(self.content.clone()));
        item.insert(
            ATTR_CREATED_AT.to_string(),
            AttributeValue::S(keys::timestamp(self.created_at)),
        );

        item
    }

    fn from_item(item: &Item) -> Result<Self, RepositoryError> {
        let author = get_string(item, "Author")?;

        Ok(Message {
            pk: get_string(item, ATTR_PK)?,
            sk: get_string(item, ATTR_SK)?,
            author: author
                .parse()
                .map_err(|_| RepositoryError::InvalidData(format!("Invalid Author: {author}")))?,
            is_read: get_optional_bool(item, "IsRead").unwrap_or(false),
            content: get_string(item, "Content")?,
            created_at: get_datetime(item, ATTR_CREATED_AT)?,
        })
    }
}

impl ChildEntity for Message {
    const KIND: ChildKind = ChildKind::Message;
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
pub fn get_string(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<String, RepositoryError> {
    item.get(key)
        .and_then(AttributeValue::as_s)
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Get an optional string attribute.
pub fn get_optional_string(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key)
        .and_then(AttributeValue::as_s)
        .map(|s| s.to_string())
}

fn get_optional_bool(item: &HashMap<String, AttributeValue>, key: &str) -> Option<bool> {
    item.get(key).and_then(AttributeValue::as_bool)
}

fn get_optional_map<'a>(
    item: &'a HashMap<String, AttributeValue>,
    key: &str,
) -> Option<&'a HashMap<String, AttributeValue>> {
    item.get(key).and_then(AttributeValue::as_m)
}

/// Get an optional non-negative integer attribute.
fn get_optional_number(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<Option<u64>, RepositoryError> {
    item.get(key)
        .and_then(AttributeValue::as_n)
        .map(|n| {
            n.parse::<u64>()
                .map_err(|e| RepositoryError::InvalidData(format!("Invalid number {}: {}", key, e)))
        })
        .transpose()
}

/// Get a required RFC 3339 timestamp attribute.
fn get_datetime(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let s = get_string(item, key)?;
    parse_datetime(key, &s)
}

fn get_optional_datetime(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<Option<DateTime<Utc>>, RepositoryError> {
    get_optional_string(item, key)
        .map(|s| parse_datetime(key, &s))
        .transpose()
}

fn parse_datetime(key: &str, s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid datetime {}: {}", key, e)))
}
