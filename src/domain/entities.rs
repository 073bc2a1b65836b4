//! Entity definitions and the process-wide catalog built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use super::columns::{ColumnRegistry, validate_identifier};
use super::error::DomainError;

/// Conventional name of the nullable timestamp column that marks a row as deleted.
pub const SOFT_DELETE_COLUMN: &str = "deleted_at";

#[derive(Debug, Clone)]
pub struct EntityDefinition {
    table: String,
    primary_key: String,
    columns: ColumnRegistry,
    soft_delete_column: Option<String>,
}

impl EntityDefinition {
    /// Build a definition; the soft-delete marker defaults to [`SOFT_DELETE_COLUMN`]
    /// when the registry contains it.
    pub fn new(
        table: impl Into<String>,
        primary_key: impl Into<String>,
        columns: ColumnRegistry,
    ) -> Result<Self, DomainError> {
        let table = table.into();
        let primary_key = primary_key.into();
        validate_identifier(&table)?;

        if !columns.contains(&primary_key) {
            return Err(DomainError::invariant(format!(
                "primary key `{primary_key}` is not a column of `{table}`"
            )));
        }

        let soft_delete_column = columns
            .contains(SOFT_DELETE_COLUMN)
            .then(|| SOFT_DELETE_COLUMN.to_string());

        Ok(Self {
            table,
            primary_key,
            columns,
            soft_delete_column,
        })
    }

    /// Override the soft-delete marker; `None` disables the default predicate.
    pub fn with_soft_delete_column(mut self, column: Option<&str>) -> Result<Self, DomainError> {
        if let Some(column) = column.filter(|column| !self.columns.contains(column)) {
            return Err(DomainError::invariant(format!(
                "soft delete column `{column}` is not a column of `{}`",
                self.table
            )));
        }
        self.soft_delete_column = column.map(str::to_string);
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn soft_delete_column(&self) -> Option<&str> {
        self.soft_delete_column.as_deref()
    }
}

/// Read-only map from table name to definition. Never mutated after startup.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: HashMap<String, Arc<EntityDefinition>>,
}

impl EntityCatalog {
    pub fn new(definitions: impl IntoIterator<Item = EntityDefinition>) -> Result<Self, DomainError> {
        let mut entities = HashMap::new();
        for definition in definitions {
            let table = definition.table().to_string();
            if entities.contains_key(&table) {
                return Err(DomainError::duplicate("table", table));
            }
            entities.insert(table, Arc::new(definition));
        }
        Ok(Self { entities })
    }

    pub fn get(&self, table: &str) -> Option<Arc<EntityDefinition>> {
        self.entities.get(table).cloned()
    }

    /// Table names in sorted order.
    pub fn tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = self.entities.keys().map(String::as_str).collect();
        tables.sort_unstable();
        tables
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::columns::{ColumnDescriptor, SemanticType};

    fn columns(names: &[&str]) -> ColumnRegistry {
        ColumnRegistry::new(
            names
                .iter()
                .map(|name| ColumnDescriptor::new(*name, SemanticType::Text)),
        )
        .expect("valid registry")
    }

    #[test]
    fn soft_delete_detected_from_columns() {
        let with = EntityDefinition::new("things", "id", columns(&["id", "deleted_at"]))
            .expect("valid entity");
        assert_eq!(with.soft_delete_column(), Some("deleted_at"));

        let without =
            EntityDefinition::new("things", "id", columns(&["id"])).expect("valid entity");
        assert_eq!(without.soft_delete_column(), None);
    }

    #[test]
    fn soft_delete_override_must_name_a_column() {
        let entity = EntityDefinition::new("things", "id", columns(&["id", "archived_at"]))
            .expect("valid entity");
        assert!(
            entity
                .clone()
                .with_soft_delete_column(Some("missing"))
                .is_err()
        );
        let entity = entity
            .with_soft_delete_column(Some("archived_at"))
            .expect("known column");
        assert_eq!(entity.soft_delete_column(), Some("archived_at"));
    }

    #[test]
    fn primary_key_must_exist() {
        let err = EntityDefinition::new("things", "uuid", columns(&["id"]))
            .expect_err("missing primary key");
        assert!(matches!(err, DomainError::Invariant { .. }));
    }

    #[test]
    fn catalog_rejects_duplicate_tables() {
        let a = EntityDefinition::new("things", "id", columns(&["id"])).expect("valid entity");
        let err = EntityCatalog::new([a.clone(), a]).expect_err("duplicate table");
        assert_eq!(err, DomainError::duplicate("table", "things"));
    }

    #[test]
    fn catalog_lists_sorted_tables() {
        let catalog = EntityCatalog::new([
            EntityDefinition::new("zebras", "id", columns(&["id"])).expect("valid"),
            EntityDefinition::new("apples", "id", columns(&["id"])).expect("valid"),
        ])
        .expect("valid catalog");
        assert_eq!(catalog.tables(), ["apples", "zebras"]);
        assert!(catalog.get("apples").is_some());
        assert!(catalog.get("pears").is_none());
    }
}
