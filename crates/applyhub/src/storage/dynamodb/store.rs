//! DynamoDB store implementation.
//!
//! Implements the `KeyValueStore` contract from `applyhub_core::store` against
//! one DynamoDB table.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{
    ConditionCheck, Delete, DeleteRequest, Put, PutRequest, TransactWriteItem,
    WriteRequest as SdkWriteRequest,
};
use aws_sdk_dynamodb::Client;

use applyhub_core::store::{
    AttributeValue, Condition, Item, KeyValueStore, PrimaryKey, PropertyType, Query, Result,
    StoreError, TransactItem, WriteRequest, MAX_BATCH_WRITE_ITEMS, MAX_TRANSACT_ITEMS,
};

use super::conversions::{item_from_sdk, item_to_sdk, key_to_sdk, values_to_sdk};
use super::error::{
    map_batch_write_error, map_build_error, map_delete_item_error, map_get_item_error,
    map_put_item_error, map_query_error, map_transact_write_error, map_update_item_error,
};
use super::expressions::{
    condition_expression, filter_expression, key_condition_expression, update_expression,
};
use crate::config::Config;

/// DynamoDB-backed store.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a store from configuration.
    ///
    /// Uses the AWS SDK default credential chain, honoring `AWS_ENDPOINT_URL`
    /// for local DynamoDB.
    pub async fn from_config(config: &Config) -> Self {
        let mut sdk_config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()));

        if let Some(endpoint) = &config.aws_endpoint_url {
            sdk_config_loader = sdk_config_loader.endpoint_url(endpoint);
        }

        let sdk_config = sdk_config_loader.load().await;
        Self::new(Client::new(&sdk_config), &config.table_name)
    }
}

/// Expression text and names for an optional condition.
fn condition_parts(
    condition: Option<&Condition>,
) -> (Option<String>, Option<HashMap<String, String>>) {
    match condition.map(condition_expression) {
        Some(expression) => (Some(expression.expression), Some(expression.names)),
        None => (None, None),
    }
}

fn write_request_from_sdk(request: &SdkWriteRequest) -> Result<WriteRequest> {
    if let Some(put) = request.put_request() {
        return item_from_sdk(put.item()).map(WriteRequest::Put);
    }
    if let Some(delete) = request.delete_request() {
        let key = item_from_sdk(delete.key())?;
        return PrimaryKey::from_item(&key)
            .map(WriteRequest::Delete)
            .ok_or_else(|| StoreError::Serialization("Unprocessed delete without key".to_string()));
    }
    Err(StoreError::Serialization(
        "Unprocessed request is neither a put nor a delete".to_string(),
    ))
}

#[async_trait]
impl KeyValueStore for DynamoDbStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn get(&self, key: &PrimaryKey) -> Result<Option<Item>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_sdk(key)))
            .send()
            .await
            .map_err(map_get_item_error)?;

        result.item.as_ref().map(item_from_sdk).transpose()
    }

    async fn put(&self, item: Item, condition: Option<Condition>) -> Result<()> {
        let (expression, names) = condition_parts(condition.as_ref());

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item_to_sdk(&item)))
            .set_condition_expression(expression)
            .set_expression_attribute_names(names)
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn delete(&self, key: &PrimaryKey, condition: Option<Condition>) -> Result<()> {
        let (expression, names) = condition_parts(condition.as_ref());

        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_sdk(key)))
            .set_condition_expression(expression)
            .set_expression_attribute_names(names)
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }

    async fn update(
        &self,
        key: &PrimaryKey,
        attribute: &str,
        property_type: PropertyType,
        value: AttributeValue,
    ) -> Result<()> {
        if !property_type.matches(&value) {
            return Err(StoreError::Validation(format!(
                "Value for {} does not match placeholder {}",
                attribute,
                property_type.placeholder()
            )));
        }
        let expression = update_expression(attribute, property_type, value);

        self.client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_sdk(key)))
            .update_expression(expression.expression)
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(values_to_sdk(expression.values)))
            .send()
            .await
            .map_err(map_update_item_error)?;

        Ok(())
    }

    async fn query(&self, query: Query) -> Result<Vec<Item>> {
        let mut expression = key_condition_expression(&query.key_condition);
        let filter = query.filter.as_ref().map(filter_expression);
        let filter_text = filter.as_ref().map(|filter| filter.expression.clone());
        if let Some(filter) = filter {
            expression.merge_placeholders(filter);
        }

        let request = self
            .client
            .query()
            .table_name(&self.table_name)
            .set_index_name(query.index.clone())
            .key_condition_expression(expression.expression)
            .set_filter_expression(filter_text)
            .set_expression_attribute_names(Some(expression.names))
            .set_expression_attribute_values(Some(values_to_sdk(expression.values)))
            .scan_index_forward(query.scan_forward);

        // Follow LastEvaluatedKey until the result set is exhausted.
        let mut items = Vec::new();
        let mut start_key = None;
        loop {
            let page = request
                .clone()
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            for item in page.items.as_deref().unwrap_or_default() {
                items.push(item_from_sdk(item)?);
            }

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }

    async fn batch_write(&self, requests: Vec<WriteRequest>) -> Result<Vec<WriteRequest>> {
        if requests.len() > MAX_BATCH_WRITE_ITEMS {
            return Err(StoreError::Validation(format!(
                "Batch of {} requests exceeds the limit of {}",
                requests.len(),
                MAX_BATCH_WRITE_ITEMS
            )));
        }
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let write_requests = requests
            .iter()
            .map(|request| match request {
                WriteRequest::Put(item) => PutRequest::builder()
                    .set_item(Some(item_to_sdk(item)))
                    .build()
                    .map(|put| SdkWriteRequest::builder().put_request(put).build()),
                WriteRequest::Delete(key) => DeleteRequest::builder()
                    .set_key(Some(key_to_sdk(key)))
                    .build()
                    .map(|delete| SdkWriteRequest::builder().delete_request(delete).build()),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_build_error)?;

        let result = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, write_requests)
            .send()
            .await
            .map_err(map_batch_write_error)?;

        result
            .unprocessed_items
            .unwrap_or_default()
            .remove(&self.table_name)
            .unwrap_or_default()
            .iter()
            .map(write_request_from_sdk)
            .collect()
    }

    async fn transact_write(&self, items: Vec<TransactItem>) -> Result<()> {
        if items.is_empty() || items.len() > MAX_TRANSACT_ITEMS {
            return Err(StoreError::Validation(format!(
                "Transaction must contain between 1 and {} items, got {}",
                MAX_TRANSACT_ITEMS,
                items.len()
            )));
        }

        let transact_items = items
            .iter()
            .map(|transact_item| self.to_transact_write_item(transact_item))
            .collect::<Result<Vec<_>>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(transact_items))
            .send()
            .await
            .map_err(map_transact_write_error)?;

        Ok(())
    }
}

impl DynamoDbStore {
    fn to_transact_write_item(&self, transact_item: &TransactItem) -> Result<TransactWriteItem> {
        let builder = TransactWriteItem::builder();
        let transact_write_item = match transact_item {
            TransactItem::ConditionCheck { key, condition } => {
                let expression = condition_expression(condition);
                let check = ConditionCheck::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(key_to_sdk(key)))
                    .condition_expression(expression.expression)
                    .set_expression_attribute_names(Some(expression.names))
                    .build()
                    .map_err(map_build_error)?;
                builder.condition_check(check).build()
            }
            TransactItem::Put { item, condition } => {
                let (expression, names) = condition_parts(condition.as_ref());
                let put = Put::builder()
                    .table_name(&self.table_name)
                    .set_item(Some(item_to_sdk(item)))
                    .set_condition_expression(expression)
                    .set_expression_attribute_names(names)
                    .build()
                    .map_err(map_build_error)?;
                builder.put(put).build()
            }
            TransactItem::Delete { key, condition } => {
                let (expression, names) = condition_parts(condition.as_ref());
                let delete = Delete::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(key_to_sdk(key)))
                    .set_condition_expression(expression)
                    .set_expression_attribute_names(names)
                    .build()
                    .map_err(map_build_error)?;
                builder.delete(delete).build()
            }
        };
        Ok(transact_write_item)
    }
}
