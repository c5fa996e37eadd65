use std::collections::HashMap;

/// Partition key attribute of the base table.
pub const ATTR_PK: &str = "PK";
/// Sort key attribute of the base table.
pub const ATTR_SK: &str = "SK";

/// A stored value, mirroring the subset of DynamoDB attribute types applyhub uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as their decimal string representation.
    N(String),
    Bool(bool),
    M(HashMap<String, AttributeValue>),
    L(Vec<AttributeValue>),
    Null,
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            AttributeValue::M(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

/// A full item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// The `(PK, SK)` pair addressing one item of the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey {
    pub pk: String,
    pub sk: String,
}

impl PrimaryKey {
    pub fn new(pk: impl Into<String>, sk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            sk: sk.into(),
        }
    }

    /// Key of a root item, whose sort key repeats its partition key.
    pub fn root(pk: impl Into<String>) -> Self {
        let pk = pk.into();
        Self { sk: pk.clone(), pk }
    }

    /// Reads the key attributes out of an item.
    pub fn from_item(item: &Item) -> Option<Self> {
        let pk = item.get(ATTR_PK)?.as_s()?;
        let sk = item.get(ATTR_SK)?.as_s()?;
        Some(Self::new(pk, sk))
    }

    /// The key as an attribute map, as the store expects it on the wire.
    pub fn to_item(&self) -> Item {
        let mut item = HashMap::with_capacity(2);
        item.insert(ATTR_PK.to_string(), AttributeValue::S(self.pk.clone()));
        item.insert(ATTR_SK.to_string(), AttributeValue::S(self.sk.clone()));
        item
    }
}

/// Type tag for single-attribute updates.
///
/// Updates are expressed as `SET <attr> = :<tag>`, so the tag doubles as the
/// value placeholder name and must agree with the value's variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Number,
    Bool,
    Map,
}

impl PropertyType {
    /// The expression placeholder for a value of this type.
    pub fn placeholder(&self) -> &'static str {
        match self {
            PropertyType::String => ":s",
            PropertyType::Number => ":n",
            PropertyType::Bool => ":b",
            PropertyType::Map => ":m",
        }
    }

    /// Returns true if `value` is of this type.
    pub fn matches(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (PropertyType::String, AttributeValue::S(_))
                | (PropertyType::Number, AttributeValue::N(_))
                | (PropertyType::Bool, AttributeValue::Bool(_))
                | (PropertyType::Map, AttributeValue::M(_))
        )
    }
}

/// Existence predicate attached to a write or checked inside a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    AttributeExists(String),
    AttributeNotExists(String),
}

impl Condition {
    pub fn attribute_exists(name: impl Into<String>) -> Self {
        Condition::AttributeExists(name.into())
    }

    pub fn attribute_not_exists(name: impl Into<String>) -> Self {
        Condition::AttributeNotExists(name.into())
    }

    /// Evaluates the predicate against the current version of the target item.
    pub fn evaluate(&self, current: Option<&Item>) -> bool {
        match self {
            Condition::AttributeExists(name) => current.is_some_and(|i| i.contains_key(name)),
            Condition::AttributeNotExists(name) => !current.is_some_and(|i| i.contains_key(name)),
        }
    }
}

/// Optional restriction on the sort key of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCondition {
    BeginsWith {
        attribute: String,
        prefix: String,
    },
    /// Inclusive on both ends.
    Between {
        attribute: String,
        low: String,
        high: String,
    },
}

impl SortCondition {
    pub fn attribute(&self) -> &str {
        match self {
            SortCondition::BeginsWith { attribute, .. } => attribute,
            SortCondition::Between { attribute, .. } => attribute,
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            SortCondition::BeginsWith { prefix, .. } => value.starts_with(prefix.as_str()),
            SortCondition::Between { low, high, .. } => {
                value >= low.as_str() && value <= high.as_str()
            }
        }
    }
}

/// Key condition of a query: partition equality plus an optional sort condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCondition {
    pub partition_key: String,
    pub partition_value: String,
    pub sort: Option<SortCondition>,
}

/// Post-key-condition equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub attribute: String,
    pub value: AttributeValue,
}

/// A query against the base table or a secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub index: Option<String>,
    pub key_condition: KeyCondition,
    pub filter: Option<Filter>,
    /// Ascending sort key order when true.
    pub scan_forward: bool,
}

impl Query {
    /// Starts a query selecting every item whose `attribute` equals `value`.
    pub fn partition(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            index: None,
            key_condition: KeyCondition {
                partition_key: attribute.into(),
                partition_value: value.into(),
                sort: None,
            },
            filter: None,
            scan_forward: true,
        }
    }

    pub fn on_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn begins_with(mut self, attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.key_condition.sort = Some(SortCondition::BeginsWith {
            attribute: attribute.into(),
            prefix: prefix.into(),
        });
        self
    }

    pub fn between(
        mut self,
        attribute: impl Into<String>,
        low: impl Into<String>,
        high: impl Into<String>,
    ) -> Self {
        self.key_condition.sort = Some(SortCondition::Between {
            attribute: attribute.into(),
            low: low.into(),
            high: high.into(),
        });
        self
    }

    pub fn filter_eq(mut self, attribute: impl Into<String>, value: AttributeValue) -> Self {
        self.filter = Some(Filter {
            attribute: attribute.into(),
            value,
        });
        self
    }

    /// Newest-first when the sort key is a timestamp.
    pub fn descending(mut self) -> Self {
        self.scan_forward = false;
        self
    }
}

/// One member of a best-effort batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRequest {
    Put(Item),
    Delete(PrimaryKey),
}

/// One member of an all-or-nothing transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactItem {
    /// Asserts a condition on an item without writing it.
    ConditionCheck {
        key: PrimaryKey,
        condition: Condition,
    },
    Put {
        item: Item,
        condition: Option<Condition>,
    },
    Delete {
        key: PrimaryKey,
        condition: Option<Condition>,
    },
}

/// Key schema of one secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }
}

/// Key schema of the whole table: `PK`/`SK` plus its secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    /// The applyhub layout: a creation-time index over `GSI_PK`/`CreatedAt`
    /// and an external-identity index over `CognitoID`.
    pub fn single_table(created_index: &str, identity_index: &str) -> Self {
        Self {
            indexes: vec![
                IndexSchema::new(created_index, "GSI_PK").with_sort_key("CreatedAt"),
                IndexSchema::new(identity_index, "CognitoID"),
            ],
        }
    }

    pub fn index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes.iter().find(|index| index.name == name)
    }
}
