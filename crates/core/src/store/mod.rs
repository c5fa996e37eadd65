//! The single-table key-value store contract.
//!
//! Repositories only ever talk to a [`KeyValueStore`]. The store knows nothing
//! about entities: it moves [`Item`]s addressed by a [`PrimaryKey`], evaluates
//! [`Condition`]s and answers [`Query`]s against the base table or one of its
//! secondary indexes.

mod error;
mod traits;
mod types;

pub use error::{CancellationReason, Result, StoreError};
pub use traits::{KeyValueStore, MAX_BATCH_WRITE_ITEMS, MAX_TRANSACT_ITEMS};
pub use types::{
    AttributeValue, Condition, Filter, IndexSchema, Item, KeyCondition, PrimaryKey, PropertyType,
    Query, SortCondition, TableSchema, TransactItem, WriteRequest, ATTR_PK, ATTR_SK,
};
