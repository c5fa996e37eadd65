//! Entity models and the single-table key scheme.
//!
//! Each entity knows how to generate its keys, fill in its defaults and
//! validate itself. Validation is pure: it never mutates and never touches
//! the store.

mod actor;
mod application;
pub mod conversions;
mod document;
mod entity;
mod error;
pub mod keys;
mod language;
mod message;
mod post;

pub use actor::Actor;
pub use application::{
    Accommodation, Application, ApplicationProperty, EmployerInfo, GermanTrainingInfo,
    PreScreeningStatus,
};
pub use document::{content_type_for, document_extension, Document, DocumentStatus, DocumentType};
pub use entity::{ChildEntity, ChildKind, Entity, WritePolicy};
pub use error::ValidationError;
pub use language::Language;
pub use message::{Message, MessageAuthor};
pub use post::Post;
