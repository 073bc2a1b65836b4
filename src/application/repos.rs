//! Storage collaborator contract for the read pipeline.

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

use crate::application::query::CompiledQuery;
use crate::domain::columns::ColumnDescriptor;
use crate::domain::entities::EntityDefinition;
use crate::domain::value::Value;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// One result row: column values in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.fields.push((column.into(), value));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value))
                .collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (column, value) in &self.fields {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Everything the store needs to run one read.
///
/// `where_fragment` uses `?` placeholders matched positionally by `values`; an empty
/// fragment means no `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectRequest {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub where_fragment: String,
    pub values: Vec<Value>,
    pub limit: u64,
    pub offset: u64,
}

impl SelectRequest {
    pub fn new(entity: &EntityDefinition, query: &CompiledQuery) -> Self {
        Self {
            table: entity.table().to_string(),
            columns: entity.columns().columns().to_vec(),
            where_fragment: query.where_fragment(),
            values: query.bound_values().cloned().collect(),
            limit: query.limit(),
            offset: query.offset(),
        }
    }
}

#[async_trait]
pub trait StorageRepo: Send + Sync {
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Row>, RepoError>;

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
