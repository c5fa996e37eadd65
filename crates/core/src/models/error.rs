use thiserror::Error;
use validator::ValidationErrors;

use crate::store::PropertyType;

/// Errors raised while validating or building an entity.
///
/// Validation never touches the store; a failure here means nothing was written.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
    #[error("Invalid language: {0}")]
    InvalidLanguage(String),
    #[error("Unsupported extension: {0}")]
    UnsupportedExtension(String),
    #[error("Document {document_type} is {size} bytes, maximum allowed is {max}")]
    SizeExceeded {
        document_type: String,
        size: u64,
        max: u64,
    },
    #[error("Wrong number of mandatory documents: expected {expected}, found {found}")]
    MandatoryDocuments { expected: usize, found: usize },
    #[error("Wrong document prefix: {0}")]
    InvalidDocumentPrefix(String),
    #[error("Value for {attribute} does not match type {expected:?}")]
    PropertyTypeMismatch {
        attribute: String,
        expected: PropertyType,
    },
    #[error("Unknown property: {0}")]
    UnknownProperty(String),
    #[error("Invalid value for {property}: {reason}")]
    InvalidPropertyValue { property: String, reason: String },
    #[error("Invalid range: start must be before or equal to end")]
    InvalidRange,
    #[error("Document type submitted more than once: {0}")]
    DuplicateDocument(String),
    #[error("Invalid fields: {0}")]
    InvalidFields(String),
}

/// Check a derived field validation failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldCheck {
    Required,
    Email,
}

/// First of `fields` that failed, with the attribute it is persisted as.
///
/// `fields` pairs each struct field with its attribute name, in the order
/// failures are reported.
pub(crate) fn first_failure(
    errors: &ValidationErrors,
    fields: &[(&'static str, &'static str)],
) -> Option<(&'static str, FieldCheck)> {
    let field_errors = errors.field_errors();
    fields.iter().find_map(|(field, attribute)| {
        let failures = field_errors.get(*field)?;
        let check = if failures.iter().all(|failure| failure.code == "email") {
            FieldCheck::Email
        } else {
            FieldCheck::Required
        };
        Some((*attribute, check))
    })
}

/// Maps derived checks that only require presence.
pub(crate) fn missing_field(
    errors: ValidationErrors,
    fields: &[(&'static str, &'static str)],
) -> ValidationError {
    match first_failure(&errors, fields) {
        Some((attribute, _)) => ValidationError::MissingField(attribute),
        None => ValidationError::InvalidFields(errors.to_string()),
    }
}

/// Custom field check: the value has something besides whitespace.
pub(crate) fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        return Err(validator::ValidationError::new("required"));
    }
    Ok(())
}
