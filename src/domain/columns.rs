//! Column registry: the closed set of column names a filter may reference.
//!
//! User-supplied column names never reach SQL unless [`ColumnRegistry::lookup`]
//! resolves them first; bound values are the only user text that travels further.

use std::collections::HashMap;

use serde::Serialize;

use super::error::DomainError;

/// Semantic type of a column, used to decode stored rows and to refine bound literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Uuid,
    Bytes,
    Structured,
    Array,
    Geometry,
    KeyValue,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Text => "text",
            SemanticType::Integer => "integer",
            SemanticType::Float => "float",
            SemanticType::Boolean => "boolean",
            SemanticType::Timestamp => "timestamp",
            SemanticType::Uuid => "uuid",
            SemanticType::Bytes => "bytes",
            SemanticType::Structured => "structured",
            SemanticType::Array => "array",
            SemanticType::Geometry => "geometry",
            SemanticType::KeyValue => "key_value",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub semantic_type: SemanticType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
        }
    }
}

/// Immutable lookup table from column name to descriptor, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<ColumnDescriptor>,
    index: HashMap<String, usize>,
}

impl ColumnRegistry {
    pub fn new(columns: impl IntoIterator<Item = ColumnDescriptor>) -> Result<Self, DomainError> {
        let mut registry = Self::default();
        for column in columns {
            validate_identifier(&column.name)?;
            if registry.index.contains_key(&column.name) {
                return Err(DomainError::duplicate("column", column.name));
            }
            registry
                .index
                .insert(column.name.clone(), registry.columns.len());
            registry.columns.push(column);
        }
        Ok(registry)
    }

    pub fn lookup(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.index.get(name).map(|position| &self.columns[*position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Accepts lowercase SQL identifiers: `[a-z_][a-z0-9_]*`.
pub(crate) fn validate_identifier(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(DomainError::invalid_identifier(name, "must not be empty"));
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(DomainError::invalid_identifier(
            name,
            "must start with a lowercase letter or underscore",
        ));
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        return Err(DomainError::invalid_identifier(
            name,
            "may only contain lowercase letters, digits and underscores",
        ));
    }
    Ok(())
}
