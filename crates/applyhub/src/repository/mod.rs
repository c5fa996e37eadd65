//! Repositories over the single table.
//!
//! [`BaseRepository`] and [`ChildRepository`] are generic over the entity type;
//! [`ApplicationRepository`] and [`PostRepository`] add the lookups and write
//! patterns specific to their entity by wrapping a `BaseRepository`.

mod application;
mod base;
mod child;
mod error;
mod post;

pub use application::ApplicationRepository;
pub use base::BaseRepository;
pub use child::ChildRepository;
pub use post::PostRepository;

use applyhub_core::models::{Document, Message};

pub type DocumentRepository = ChildRepository<Document>;
pub type MessageRepository = ChildRepository<Message>;
