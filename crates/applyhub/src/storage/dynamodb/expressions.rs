//! DynamoDB expression builders.
//!
//! Pure functions turning the store contract's conditions, key conditions,
//! filters and updates into expression strings. Attribute names always go
//! through `#name` placeholders so reserved words (`Name`, `Status`) are safe.

use std::collections::HashMap;

use applyhub_core::store::{
    AttributeValue, Condition, Filter, KeyCondition, PropertyType, SortCondition,
};

/// An expression with its name and value placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expression {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl Expression {
    /// Moves another expression's placeholders into this one. The text is left alone.
    pub fn merge_placeholders(&mut self, other: Expression) {
        self.names.extend(other.names);
        self.values.extend(other.values);
    }
}

/// Condition expression, e.g. `attribute_not_exists(#cond)`.
pub fn condition_expression(condition: &Condition) -> Expression {
    let (function, attribute) = match condition {
        Condition::AttributeExists(attribute) => ("attribute_exists", attribute),
        Condition::AttributeNotExists(attribute) => ("attribute_not_exists", attribute),
    };
    Expression {
        expression: format!("{function}(#cond)"),
        names: HashMap::from([("#cond".to_string(), attribute.clone())]),
        values: HashMap::new(),
    }
}

/// Key condition expression, e.g. `#pk = :pk AND begins_with(#sk, :prefix)`.
pub fn key_condition_expression(key_condition: &KeyCondition) -> Expression {
    let mut names = HashMap::from([("#pk".to_string(), key_condition.partition_key.clone())]);
    let mut values = HashMap::from([(
        ":pk".to_string(),
        AttributeValue::S(key_condition.partition_value.clone()),
    )]);

    let expression = match &key_condition.sort {
        None => "#pk = :pk".to_string(),
        Some(SortCondition::BeginsWith { attribute, prefix }) => {
            names.insert("#sk".to_string(), attribute.clone());
            values.insert(":prefix".to_string(), AttributeValue::S(prefix.clone()));
            "#pk = :pk AND begins_with(#sk, :prefix)".to_string()
        }
        Some(SortCondition::Between {
            attribute,
            low,
            high,
        }) => {
            names.insert("#sk".to_string(), attribute.clone());
            values.insert(":low".to_string(), AttributeValue::S(low.clone()));
            values.insert(":high".to_string(), AttributeValue::S(high.clone()));
            "#pk = :pk AND #sk BETWEEN :low AND :high".to_string()
        }
    };

    Expression {
        expression,
        names,
        values,
    }
}

/// Filter expression, e.g. `#filter = :filter`.
pub fn filter_expression(filter: &Filter) -> Expression {
    Expression {
        expression: "#filter = :filter".to_string(),
        names: HashMap::from([("#filter".to_string(), filter.attribute.clone())]),
        values: HashMap::from([(":filter".to_string(), filter.value.clone())]),
    }
}

/// Update expression setting a single attribute, e.g. `SET #attr = :b`.
pub fn update_expression(
    attribute: &str,
    property_type: PropertyType,
    value: AttributeValue,
) -> Expression {
    let placeholder = property_type.placeholder();
    Expression {
        expression: format!("SET #attr = {placeholder}"),
        names: HashMap::from([("#attr".to_string(), attribute.to_string())]),
        values: HashMap::from([(placeholder.to_string(), value)]),
    }
}
