//! Structured-query collaborator.
//!
//! Every read and write the feed core performs goes through [`Store`]: a
//! filter/order/limit query, a single-row insert and a filtered delete. Each
//! mutation is one atomic statement keyed by a unique constraint, so the core
//! never needs locks or multi-statement transactions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A row as returned by the store: a JSON object keyed by column name.
pub type Row = serde_json::Value;

pub type SharedStore = Arc<dyn Store>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Posts,
    Reactions,
    Comments,
    Follows,
    Profiles,
}

impl Entity {
    pub fn table(self) -> &'static str {
        match self {
            Entity::Posts => "posts",
            Entity::Reactions => "reactions",
            Entity::Comments => "comments",
            Entity::Follows => "follows",
            Entity::Profiles => "profiles",
        }
    }

    /// Columns forming the entity's uniqueness constraint.
    pub fn unique_key(self) -> &'static [&'static str] {
        match self {
            Entity::Reactions => &["post_id", "user_id", "type"],
            Entity::Follows => &["follower_id", "following_id"],
            Entity::Posts | Entity::Comments | Entity::Profiles => &["id"],
        }
    }
}

/// A typed column value, used both as a filter operand and as an insert field.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    TextList(Vec<String>),
}

impl Value {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Uuid(id) => serde_json::Value::String(id.to_string()),
            Value::Text(text) => serde_json::Value::String(text.clone()),
            Value::Bool(flag) => serde_json::Value::Bool(*flag),
            Value::Timestamp(at) => {
                serde_json::Value::String(at.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            Value::TextList(items) => serde_json::Value::Array(
                items
                    .iter()
                    .cloned()
                    .map(serde_json::Value::String)
                    .collect(),
            ),
        }
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Uuid(id)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Value::Timestamp(at)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::TextList(items)
    }
}

/// Row predicate. A query's filters are combined by conjunction.
#[derive(Debug, Clone)]
pub enum Filter {
    Eq(&'static str, Value),
    /// Array column contains the given element.
    Contains(&'static str, String),
    /// Column value is one of the given ids.
    In(&'static str, Vec<Uuid>),
    /// Strict row-wise comparison `(a, b) < (x, y)`; the keyset cursor predicate.
    Before([&'static str; 2], [Value; 2]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub field: &'static str,
    pub direction: Direction,
}

impl Order {
    pub fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed row: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Rows of `entity` matching every filter, sorted by `order`, at most `limit` of them.
    async fn query(
        &self,
        entity: Entity,
        filters: &[Filter],
        order: &[Order],
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Insert one row and return it as stored. Fails with [`StoreError::Conflict`]
    /// when the entity's unique key is already taken.
    async fn insert(
        &self,
        entity: Entity,
        fields: Vec<(&'static str, Value)>,
    ) -> Result<Row, StoreError>;

    /// Delete every matching row, returning how many were removed.
    async fn delete(&self, entity: Entity, filters: &[Filter]) -> Result<u64, StoreError>;
}

pub fn decode<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode_one).collect()
}

pub fn decode_one<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Malformed(e.to_string()))
}
