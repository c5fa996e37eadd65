//! In-memory single-table store.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use applyhub_core::store::{
    AttributeValue, CancellationReason, Condition, Item, KeyValueStore, PrimaryKey, PropertyType,
    Query, Result, StoreError, TableSchema, TransactItem, WriteRequest, ATTR_PK, ATTR_SK,
    MAX_BATCH_WRITE_ITEMS, MAX_TRANSACT_ITEMS,
};

/// In-memory emulation of a single key-value table.
///
/// Items live in a `BTreeMap` wrapped in `Arc<RwLock<_>>`. Every call takes the
/// lock once, so each call is atomic the way a single store request is.
/// Secondary indexes are evaluated on read and are sparse: items without the
/// index's partition attribute are invisible to it.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    table_name: String,
    schema: TableSchema,
    items: Arc<RwLock<BTreeMap<PrimaryKey, Item>>>,
    unprocessed_next_batch: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new(table_name: impl Into<String>, schema: TableSchema) -> Self {
        Self {
            table_name: table_name.into(),
            schema,
            items: Arc::new(RwLock::new(BTreeMap::new())),
            unprocessed_next_batch: Arc::new(AtomicUsize::new(0)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates a store with the applyhub index layout.
    pub fn single_table(table_name: impl Into<String>, gsi1: &str, gsi2: &str) -> Self {
        Self::new(table_name, TableSchema::single_table(gsi1, gsi2))
    }

    /// The next `batch_write` leaves its last `count` requests unprocessed.
    pub fn fail_next_batch_with_unprocessed(&self, count: usize) {
        self.unprocessed_next_batch.store(count, Ordering::SeqCst);
    }

    /// While set, every call fails with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of items in the table.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "table {} is unavailable",
                self.table_name
            )));
        }
        Ok(())
    }

    /// Resolves the `(partition, sort)` attributes a query reads.
    fn query_keys(&self, query: &Query) -> Result<(String, Option<String>)> {
        match &query.index {
            None => Ok((ATTR_PK.to_string(), Some(ATTR_SK.to_string()))),
            Some(name) => self
                .schema
                .index(name)
                .map(|index| (index.partition_key.clone(), index.sort_key.clone()))
                .ok_or_else(|| StoreError::Validation(format!("Unknown index: {name}"))),
        }
    }
}

fn key_of(item: &Item) -> Result<PrimaryKey> {
    PrimaryKey::from_item(item)
        .ok_or_else(|| StoreError::Validation("Item is missing its PK or SK".to_string()))
}

fn check(condition: Option<&Condition>, current: Option<&Item>) -> bool {
    condition.is_none_or(|condition| condition.evaluate(current))
}

fn string_attribute<'a>(item: &'a Item, attribute: &str) -> Option<&'a str> {
    item.get(attribute).and_then(|value| match value {
        AttributeValue::S(s) | AttributeValue::N(s) => Some(s.as_str()),
        _ => None,
    })
}

fn ensure_unique_keys<'a>(keys: impl Iterator<Item = &'a PrimaryKey>) -> Result<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(StoreError::Validation(format!(
                "Duplicate key in request: {}/{}",
                key.pk, key.sk
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>> {
        self.check_available()?;
        let items = self.items.read().await;
        Ok(items.get(key).cloned())
    }

    async fn put(&self, item: Item, condition: Option<Condition>) -> Result<()> {
        self.check_available()?;
        let key = key_of(&item)?;
        let mut items = self.items.write().await;
        if !check(condition.as_ref(), items.get(&key)) {
            return Err(StoreError::ConditionFailed);
        }
        items.insert(key, item);
        Ok(())
    }

    async fn delete(&self, key: &PrimaryKey, condition: Option<Condition>) -> Result<()> {
        self.check_available()?;
        let mut items = self.items.write().await;
        if !check(condition.as_ref(), items.get(key)) {
            return Err(StoreError::ConditionFailed);
        }
        items.remove(key);
        Ok(())
    }

    async fn update(
        &self,
        key: &PrimaryKey,
        attribute: &str,
        property_type: PropertyType,
        value: AttributeValue,
    ) -> Result<()> {
        self.check_available()?;
        if attribute == ATTR_PK || attribute == ATTR_SK {
            return Err(StoreError::Validation(format!(
                "Cannot update key attribute {attribute}"
            )));
        }
        if !property_type.matches(&value) {
            return Err(StoreError::Validation(format!(
                "Value for {} does not match placeholder {}",
                attribute,
                property_type.placeholder()
            )));
        }

        let mut items = self.items.write().await;
        let item = items.entry(key.clone()).or_insert_with(|| key.to_item());
        item.insert(attribute.to_string(), value);
        Ok(())
    }

    async fn query(&self, query: Query) -> Result<Vec<Item>> {
        self.check_available()?;
        let (partition_key, sort_key) = self.query_keys(&query)?;
        if let Some(sort) = &query.key_condition.sort {
            if sort_key.as_deref() != Some(sort.attribute()) {
                return Err(StoreError::Validation(format!(
                    "{} is not the sort key of this index",
                    sort.attribute()
                )));
            }
        }
        if partition_key != query.key_condition.partition_key {
            return Err(StoreError::Validation(format!(
                "{} is not the partition key of this index",
                query.key_condition.partition_key
            )));
        }

        let items = self.items.read().await;
        let mut matches: Vec<&Item> = items
            .values()
            .filter(|item| {
                string_attribute(item, &partition_key)
                    == Some(query.key_condition.partition_value.as_str())
            })
            // Sparse index: items lacking the sort attribute are not projected.
            .filter(|item| match &sort_key {
                Some(sort_key) => string_attribute(item, sort_key).is_some(),
                None => true,
            })
            .filter(|item| match &query.key_condition.sort {
                Some(sort) => string_attribute(item, sort.attribute())
                    .is_some_and(|value| sort.matches(value)),
                None => true,
            })
            .filter(|item| match &query.filter {
                Some(filter) => item.get(&filter.attribute) == Some(&filter.value),
                None => true,
            })
            .collect();

        // Stable sort keeps the (PK, SK) order among equal sort values.
        if let Some(sort_key) = &sort_key {
            matches.sort_by(|a, b| string_attribute(a, sort_key).cmp(&string_attribute(b, sort_key)));
        }
        if !query.scan_forward {
            matches.reverse();
        }

        Ok(matches.into_iter().cloned().collect())
    }

    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<Vec<WriteRequest>> {
        self.check_available()?;
        if requests.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(StoreError::Validation(format!(
                "Batch of {} requests exceeds the limit of {}",
                requests.len(),
                MAX_BATCH_WRITE_ITEMS
            )));
        }

        let keys = requests
            .iter()
            .map(|request| match request {
                WriteRequest::Put(item) => key_of(item),
                WriteRequest::Delete(key) => Ok(key.clone()),
            })
            .collect::<Result<Vec<_>>>()?;
        ensure_unique_keys(keys.iter())?;

        let skipped = self
            .unprocessed_next_batch
            .swap(0, Ordering::SeqCst)
            .min(requests.len());
        let mut requests = requests;
        let unprocessed = requests.split_off(requests.len() - skipped);

        let mut items = self.items.write().await;
        for (request, key) in requests.into_iter().zip(keys) {
            match request {
                WriteRequest::Put(item) => {
                    items.insert(key, item);
                }
                WriteRequest::Delete(_) => {
                    items.remove(&key);
                }
            }
        }

        Ok(unprocessed)
    }

    async fn transact_write(&self, transact_items: Vec<TransactItem>) -> Result<()> {
        self.check_available()?;
        if transact_items.is_empty() || transact_items.len() > MAX_TRANSACT_ITEMS {
            return Err(StoreError::Validation(format!(
                "Transaction must contain between 1 and {} items, got {}",
                MAX_TRANSACT_ITEMS,
                transact_items.len()
            )));
        }

        let keys = transact_items
            .iter()
            .map(|transact_item| match transact_item {
                TransactItem::ConditionCheck { key, .. } | TransactItem::Delete { key, .. } => {
                    Ok(key.clone())
                }
                TransactItem::Put { item, .. } => key_of(item),
            })
            .collect::<Result<Vec<_>>>()?;
        ensure_unique_keys(keys.iter())?;

        let mut items = self.items.write().await;

        // Every condition is evaluated against the state before the transaction.
        let reasons: Vec<CancellationReason> = transact_items
            .iter()
            .zip(&keys)
            .map(|(transact_item, key)| {
                let condition = match transact_item {
                    TransactItem::ConditionCheck { condition, .. } => Some(condition),
                    TransactItem::Put { condition, .. } | TransactItem::Delete { condition, .. } => {
                        condition.as_ref()
                    }
                };
                if check(condition, items.get(key)) {
                    CancellationReason::None
                } else {
                    CancellationReason::ConditionalCheckFailed
                }
            })
            .collect();

        if reasons.iter().any(CancellationReason::is_condition_failure) {
            return Err(StoreError::TransactionCanceled { reasons });
        }

        for (transact_item, key) in transact_items.into_iter().zip(keys) {
            match transact_item {
                TransactItem::ConditionCheck { .. } => {}
                TransactItem::Put { item, .. } => {
                    items.insert(key, item);
                }
                TransactItem::Delete { .. } => {
                    items.remove(&key);
                }
            }
        }
        Ok(())
    }
}
