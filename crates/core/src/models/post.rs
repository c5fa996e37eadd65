use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use super::document::check_mandatory_documents;
use super::error::{missing_field, not_blank};
use super::{keys, Document, DocumentType, Language, ValidationError};

/// A published content item, listed per language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(rename = "id")]
    #[validate(length(min = 1))]
    pub pk: String,
    #[serde(skip)]
    #[validate(length(min = 1))]
    pub sk: String,
    #[serde(skip)]
    pub gsi_pk: String,
    pub created_at: DateTime<Utc>,
    #[validate(custom(function = "not_blank"))]
    pub title: String,
    #[validate(custom(function = "not_blank"))]
    pub content: String,
}

const POST_FIELDS: [(&str, &str); 4] = [
    ("pk", "PK"),
    ("sk", "SK"),
    ("title", "Title"),
    ("content", "Content"),
];

impl Post {
    /// Creates a post with fresh keys in `language`.
    pub fn new(language: Language, title: impl Into<String>, content: impl Into<String>) -> Self {
        let mut post = Self {
            pk: String::new(),
            sk: String::new(),
            gsi_pk: String::new(),
            created_at: Utc::now(),
            title: title.into(),
            content: content.into(),
        };
        post.generate_keys(language);
        post
    }

    /// Assigns a new `Post<uuid>` identity and the language-scoped index partition.
    pub fn generate_keys(&mut self, language: Language) {
        self.pk = keys::post_pk(Uuid::new_v4());
        self.sk = self.pk.clone();
        self.gsi_pk = keys::post_gsi_pk(language);
    }

    pub fn generate_attributes_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    pub fn mandatory_documents() -> [DocumentType; 1] {
        [DocumentType::Thumbnail]
    }

    /// Required fields only, without the mandatory documents.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        Validate::validate(self).map_err(|errors| missing_field(errors, &POST_FIELDS))
    }

    pub fn validate(&self, documents: &[Document]) -> Result<(), ValidationError> {
        self.validate_fields()?;
        check_mandatory_documents(&Self::mandatory_documents(), documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_keys() {
        let post = Post::new(Language::English, "Title", "Body");

        assert!(post.pk.starts_with("Post"));
        assert!(!post.pk.contains('#'));
        assert_eq!(post.sk, post.pk);
        assert_eq!(post.gsi_pk, "Posten#");
    }

    #[test]
    fn test_validate_requires_thumbnail() {
        let post = Post::new(Language::German, "Title", "Body");
        let audio = Document::requested(&post.pk, &DocumentType::PostAudioRecording, "");
        let thumbnail = Document::requested(&post.pk, &DocumentType::Thumbnail, "");

        assert_eq!(
            post.validate(&[audio.clone()]),
            Err(ValidationError::MandatoryDocuments {
                expected: 1,
                found: 0
            })
        );
        assert!(post.validate(&[audio, thumbnail]).is_ok());
    }

    #[test]
    fn test_validate_requires_title() {
        let post = Post::new(Language::German, "", "Body");
        let thumbnail = Document::requested(&post.pk, &DocumentType::Thumbnail, "");

        assert_eq!(
            post.validate(&[thumbnail]),
            Err(ValidationError::MissingField("Title"))
        );
    }

    #[test]
    fn test_validate_fields_reports_first_missing() {
        let mut post = Post::new(Language::English, "Title", "   ");

        assert_eq!(
            post.validate_fields(),
            Err(ValidationError::MissingField("Content"))
        );

        post.pk.clear();
        post.title.clear();
        assert_eq!(post.validate_fields(), Err(ValidationError::MissingField("PK")));
    }
}
