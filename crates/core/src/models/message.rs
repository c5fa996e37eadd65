use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::error::{missing_field, not_blank};
use super::{keys, ValidationError};

/// Who wrote a message in an application's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAuthor {
    Admin,
    User,
}

impl MessageAuthor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageAuthor::Admin => "admin",
            MessageAuthor::User => "user",
        }
    }
}

impl FromStr for MessageAuthor {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(MessageAuthor::Admin),
            "user" => Ok(MessageAuthor::User),
            other => Err(ValidationError::InvalidPropertyValue {
                property: "Author".to_string(),
                reason: format!("unknown author {other}"),
            }),
        }
    }
}

/// One entry of an application's message thread. Messages are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(rename = "id")]
    #[validate(length(min = 1))]
    pub pk: String,
    #[serde(skip)]
    #[validate(length(min = 1))]
    pub sk: String,
    pub author: MessageAuthor,
    pub is_read: bool,
    #[validate(custom(function = "not_blank"))]
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(parent_pk: impl Into<String>, author: MessageAuthor, content: impl Into<String>) -> Self {
        Self::new_at(parent_pk, author, content, Utc::now())
    }

    pub fn new_at(
        parent_pk: impl Into<String>,
        author: MessageAuthor,
        content: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            pk: parent_pk.into(),
            sk: keys::message_sk(Uuid::new_v4()),
            author,
            is_read: false,
            content: content.into(),
            created_at: at,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        Validate::validate(self).map_err(|errors| {
            missing_field(errors, &[("pk", "PK"), ("sk", "SK"), ("content", "Content")])
        })
    }
}
