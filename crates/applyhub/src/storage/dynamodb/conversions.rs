//! Conversion between the store contract's item model and SDK attribute values.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as SdkValue;

use applyhub_core::store::{AttributeValue, Item, PrimaryKey, StoreError};

/// Convert a core attribute value to its SDK form.
pub fn to_sdk(value: &AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::N(n) => SdkValue::N(n.clone()),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::M(map) => SdkValue::M(item_to_sdk(map)),
        AttributeValue::L(list) => SdkValue::L(list.iter().map(to_sdk).collect()),
        AttributeValue::Null => SdkValue::Null(true),
    }
}

/// Convert an SDK attribute value to the core form.
///
/// Sets and binary values are not part of the applyhub table layout.
pub fn from_sdk(value: &SdkValue) -> Result<AttributeValue, StoreError> {
    match value {
        SdkValue::S(s) => Ok(AttributeValue::S(s.clone())),
        SdkValue::N(n) => Ok(AttributeValue::N(n.clone())),
        SdkValue::Bool(b) => Ok(AttributeValue::Bool(*b)),
        SdkValue::M(map) => item_from_sdk(map).map(AttributeValue::M),
        SdkValue::L(list) => list
            .iter()
            .map(from_sdk)
            .collect::<Result<Vec<_>, _>>()
            .map(AttributeValue::L),
        SdkValue::Null(_) => Ok(AttributeValue::Null),
        other => Err(StoreError::Serialization(format!(
            "Unsupported attribute value: {:?}",
            other
        ))),
    }
}

pub fn item_to_sdk(item: &Item) -> HashMap<String, SdkValue> {
    item.iter()
        .map(|(name, value)| (name.clone(), to_sdk(value)))
        .collect()
}

pub fn item_from_sdk(item: &HashMap<String, SdkValue>) -> Result<Item, StoreError> {
    item.iter()
        .map(|(name, value)| from_sdk(value).map(|value| (name.clone(), value)))
        .collect()
}

pub fn key_to_sdk(key: &PrimaryKey) -> HashMap<String, SdkValue> {
    item_to_sdk(&key.to_item())
}

pub fn values_to_sdk(values: HashMap<String, AttributeValue>) -> HashMap<String, SdkValue> {
    values
        .into_iter()
        .map(|(placeholder, value)| (placeholder, to_sdk(&value)))
        .collect()
}
