use crate::storage::RepositoryError;
use crate::store::{Item, PrimaryKey};

use super::keys;

/// A record that can be stored as one item of the single table.
pub trait Entity: Sized + Send + Sync {
    /// Name used in errors and logs.
    const ENTITY_TYPE: &'static str;

    fn primary_key(&self) -> PrimaryKey;

    fn to_item(&self) -> Item;

    fn from_item(item: &Item) -> Result<Self, RepositoryError>;
}

/// The closed set of entities stored under a parent's partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    Document,
    Message,
}

/// What a single-item child save does when the child's key is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Replace the existing child.
    Overwrite,
    /// Reject the write with a conflict.
    FirstWriteWins,
}

impl ChildKind {
    /// Sort key prefix selecting every child of this kind, e.g. `Document-`.
    pub fn sk_prefix(&self) -> String {
        keys::child_sk_prefix(match self {
            ChildKind::Document => keys::DOCUMENT_PREFIX,
            ChildKind::Message => keys::MESSAGE_PREFIX,
        })
    }

    /// One slot per document type is re-requested in place; messages are never replaced.
    pub fn write_policy(&self) -> WritePolicy {
        match self {
            ChildKind::Document => WritePolicy::Overwrite,
            ChildKind::Message => WritePolicy::FirstWriteWins,
        }
    }
}

/// An entity owned by a root item and stored under the root's PK.
pub trait ChildEntity: Entity {
    const KIND: ChildKind;
}
