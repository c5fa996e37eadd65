use async_trait::async_trait;

use super::{AttributeValue, Item, PrimaryKey, PropertyType, Query, Result, TransactItem};
use super::{Condition, WriteRequest};

/// Maximum number of requests a single `batch_write` call accepts.
pub const MAX_BATCH_WRITE_ITEMS: usize = 25;

/// Maximum number of members a single `transact_write` call accepts.
pub const MAX_TRANSACT_ITEMS: usize = 100;

/// Uniform interface over one key-value table and its secondary indexes.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Name of the table this store addresses.
    fn table_name(&self) -> &str;

    /// Point read. Absence is `Ok(None)`, not an error.
    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>>;

    /// Writes a whole item, replacing any previous version.
    async fn put(&self, item: Item, condition: Option<Condition>) -> Result<()>;

    /// Removes an item. Deleting an absent item succeeds unless a condition says otherwise.
    async fn delete(&self, key: &PrimaryKey, condition: Option<Condition>) -> Result<()>;

    /// Sets a single attribute, creating the item if it does not exist.
    async fn update(
        &self,
        key: &PrimaryKey,
        attribute: &str,
        property_type: PropertyType,
        value: AttributeValue,
    ) -> Result<()>;

    /// Runs a query, returning every matching item in sort key order.
    async fn query(&self, query: Query) -> Result<Vec<Item>>;

    /// Best-effort batch of puts and deletes, at most [`MAX_BATCH_WRITE_ITEMS`].
    ///
    /// Returns the requests the store did not process. Nothing is rolled back.
    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<Vec<WriteRequest>>;

    /// All-or-nothing write of at most [`MAX_TRANSACT_ITEMS`] members.
    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<()>;
}
