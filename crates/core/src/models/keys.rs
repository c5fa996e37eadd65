//! Single-table key generation.
//!
//! Pure functions for building partition and sort keys. Root items repeat
//! their PK as SK; children live under the owner's PK with a typed SK prefix.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use super::Language;

// ============================================================================
// Separators and prefixes
// ============================================================================

pub const PK_SEPARATOR: &str = "#";
pub const SK_SEPARATOR: &str = "-";

pub const APPLICATION_PREFIX: &str = "APP";
pub const POST_PREFIX: &str = "Post";
pub const POST_LANGUAGE_SEPARATOR: &str = "#";

pub const DOCUMENT_PREFIX: &str = "Document";
pub const MESSAGE_PREFIX: &str = "Message";

/// Sort key of every email uniqueness marker.
pub const EMAIL_UNIQUE_SK: &str = "EMAIL_UNIQUE_CONSTRAINT";

/// Identity placeholder for applications not yet linked to a user account.
pub const UNLINKED_IDENTITY: &str = "NA";

// ============================================================================
// Attribute names
// ============================================================================

pub const ATTR_GSI_PK: &str = "GSI_PK";
pub const ATTR_CREATED_AT: &str = "CreatedAt";
pub const ATTR_COGNITO_ID: &str = "CognitoID";
pub const ATTR_EMAIL: &str = "Email";
/// Upload time of a document. Lower camel case, unlike the other attributes.
pub const ATTR_UPLOADED_AT: &str = "uploadedAt";

// ============================================================================
// Application keys
// ============================================================================

/// Generate primary key for an Application.
///
/// Pattern: `APP#<uuid>`
pub fn application_pk(id: Uuid) -> String {
    application_pk_from_id(&id.to_string())
}

/// Builds an Application PK from an externally supplied id (path parameter, CLI argument).
pub fn application_pk_from_id(id: &str) -> String {
    format!("{APPLICATION_PREFIX}{PK_SEPARATOR}{id}")
}

/// Strips the `APP#` prefix, returning the bare id.
pub fn application_id(pk: &str) -> &str {
    pk.strip_prefix(APPLICATION_PREFIX)
        .and_then(|rest| rest.strip_prefix(PK_SEPARATOR))
        .unwrap_or(pk)
}

/// GSI1 partition shared by every Application.
pub fn application_gsi_pk() -> String {
    APPLICATION_PREFIX.to_string()
}

/// Generate primary key of the email uniqueness marker.
///
/// Pattern: `APP#email#<email>`
pub fn email_marker_pk(email: &str) -> String {
    format!("{APPLICATION_PREFIX}{PK_SEPARATOR}email{PK_SEPARATOR}{email}")
}

// ============================================================================
// Post keys
// ============================================================================

/// Generate primary key for a Post.
///
/// Pattern: `Post<uuid>` (no separator)
pub fn post_pk(id: Uuid) -> String {
    post_pk_from_id(&id.to_string())
}

pub fn post_pk_from_id(id: &str) -> String {
    format!("{POST_PREFIX}{id}")
}

/// GSI1 partition of every Post written in `language`.
///
/// Pattern: `Post<lang>#`
pub fn post_gsi_pk(language: Language) -> String {
    format!("{POST_PREFIX}{}{POST_LANGUAGE_SEPARATOR}", language.code())
}

// ============================================================================
// Child keys
// ============================================================================

/// Sort key prefix shared by every child of one kind, e.g. `Document-`.
pub fn child_sk_prefix(kind_prefix: &str) -> String {
    format!("{kind_prefix}{SK_SEPARATOR}")
}

/// Generate sort key for a Document slot.
///
/// Pattern: `Document-<type>`
pub fn document_sk(document_type: &str) -> String {
    format!("{DOCUMENT_PREFIX}{SK_SEPARATOR}{document_type}")
}

/// Generate sort key for a Message.
///
/// Pattern: `Message-<uuid>`
pub fn message_sk(id: Uuid) -> String {
    format!("{MESSAGE_PREFIX}{SK_SEPARATOR}{id}")
}

/// Object storage key of an uploaded document: `<ownerPK>-<SK><.ext>`.
pub fn document_object_key(owner_pk: &str, sk: &str, extension: &str) -> String {
    format!("{owner_pk}{SK_SEPARATOR}{sk}{extension}")
}

// ============================================================================
// Timestamps
// ============================================================================

/// Formats a timestamp the way it is persisted: RFC 3339, UTC, whole seconds.
///
/// Fixed width keeps lexicographic order equal to chronological order.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
