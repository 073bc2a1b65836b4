//! Built-in entity set served by the gateway.

use super::columns::{ColumnDescriptor, ColumnRegistry, SemanticType};
use super::entities::{EntityCatalog, EntityDefinition};
use super::error::DomainError;

pub const PHYSICAL_THINGS: &str = "physical_things";
pub const LOGICAL_THINGS: &str = "logical_things";
pub const LOCATION_HISTORY: &str = "location_history";
pub const FUZZ: &str = "fuzz";

/// One column per Postgres type family, used to exercise decoding end to end.
const FUZZ_COLUMNS: [(&str, SemanticType); 34] = [
    ("id", SemanticType::Uuid),
    ("column1", SemanticType::Timestamp),
    ("column2", SemanticType::Timestamp),
    ("column3", SemanticType::Structured),
    ("column4", SemanticType::Structured),
    ("column5", SemanticType::Array),
    ("column6", SemanticType::Array),
    ("column7", SemanticType::Text),
    ("column8", SemanticType::Text),
    ("column9", SemanticType::Array),
    ("column10", SemanticType::Array),
    ("column11", SemanticType::Array),
    ("column12", SemanticType::Integer),
    ("column13", SemanticType::Integer),
    ("column14", SemanticType::Integer),
    ("column15", SemanticType::Array),
    ("column16", SemanticType::Array),
    ("column17", SemanticType::Array),
    ("column18", SemanticType::Array),
    ("column19", SemanticType::Float),
    ("column20", SemanticType::Float),
    ("column21", SemanticType::Float),
    ("column22", SemanticType::Float),
    ("column23", SemanticType::Array),
    ("column24", SemanticType::Boolean),
    // tsvector
    ("column25", SemanticType::Structured),
    ("column26", SemanticType::Uuid),
    ("column27", SemanticType::KeyValue),
    ("column28", SemanticType::Geometry),
    ("column29", SemanticType::Geometry),
    ("column30", SemanticType::Geometry),
    ("column31", SemanticType::Geometry),
    // inet
    ("column32", SemanticType::Text),
    ("column33", SemanticType::Bytes),
];

/// Compose the catalog of every entity this binary knows about.
pub fn builtin() -> Result<EntityCatalog, DomainError> {
    EntityCatalog::new([
        physical_things()?,
        logical_things()?,
        location_history()?,
        fuzz()?,
    ])
}

fn audited(extra: Vec<ColumnDescriptor>) -> Vec<ColumnDescriptor> {
    let mut columns = vec![
        ColumnDescriptor::new("id", SemanticType::Uuid),
        ColumnDescriptor::new("created_at", SemanticType::Timestamp),
        ColumnDescriptor::new("updated_at", SemanticType::Timestamp),
        ColumnDescriptor::new("deleted_at", SemanticType::Timestamp),
    ];
    columns.extend(extra);
    columns
}

fn thing_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::new("external_id", SemanticType::Text),
        ColumnDescriptor::new("name", SemanticType::Text),
        ColumnDescriptor::new("type", SemanticType::Text),
        ColumnDescriptor::new("tags", SemanticType::Array),
        ColumnDescriptor::new("metadata", SemanticType::KeyValue),
        ColumnDescriptor::new("raw_data", SemanticType::Structured),
    ]
}

fn physical_things() -> Result<EntityDefinition, DomainError> {
    let columns = ColumnRegistry::new(audited(thing_columns()))?;
    EntityDefinition::new(PHYSICAL_THINGS, "id", columns)
}

fn logical_things() -> Result<EntityDefinition, DomainError> {
    let mut extra = thing_columns();
    extra.push(ColumnDescriptor::new(
        "parent_physical_thing_id",
        SemanticType::Uuid,
    ));
    extra.push(ColumnDescriptor::new(
        "parent_logical_thing_id",
        SemanticType::Uuid,
    ));
    let columns = ColumnRegistry::new(audited(extra))?;
    EntityDefinition::new(LOGICAL_THINGS, "id", columns)
}

fn location_history() -> Result<EntityDefinition, DomainError> {
    let columns = ColumnRegistry::new(audited(vec![
        ColumnDescriptor::new("timestamp", SemanticType::Timestamp),
        ColumnDescriptor::new("point", SemanticType::Geometry),
        ColumnDescriptor::new("polygon", SemanticType::Geometry),
        ColumnDescriptor::new("parent_physical_thing_id", SemanticType::Uuid),
    ]))?;
    EntityDefinition::new(LOCATION_HISTORY, "id", columns)
}

/// Type-coverage table without audit columns, so it never soft-deletes.
fn fuzz() -> Result<EntityDefinition, DomainError> {
    let columns = ColumnRegistry::new(
        FUZZ_COLUMNS
            .iter()
            .map(|(name, semantic_type)| ColumnDescriptor::new(*name, *semantic_type)),
    )?;
    EntityDefinition::new(FUZZ, "id", columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_composes() {
        let catalog = builtin().expect("builtin catalog");
        assert_eq!(
            catalog.tables(),
            [FUZZ, LOCATION_HISTORY, LOGICAL_THINGS, PHYSICAL_THINGS]
        );
    }

    #[test]
    fn audited_entities_soft_delete() {
        let catalog = builtin().expect("builtin catalog");
        for table in [PHYSICAL_THINGS, LOGICAL_THINGS, LOCATION_HISTORY] {
            let entity = catalog.get(table).expect("entity");
            assert_eq!(entity.soft_delete_column(), Some("deleted_at"), "{table}");
            assert_eq!(entity.primary_key(), "id");
        }
    }

    #[test]
    fn fuzz_covers_every_column_family() {
        let catalog = builtin().expect("builtin catalog");
        let fuzz = catalog.get(FUZZ).expect("fuzz entity");
        assert_eq!(fuzz.primary_key(), "id");
        assert_eq!(fuzz.soft_delete_column(), None);
        assert_eq!(fuzz.columns().len(), 34);

        let type_of = |name: &str| {
            fuzz.columns()
                .lookup(name)
                .map(|descriptor| descriptor.semantic_type)
        };
        assert_eq!(type_of("id"), Some(SemanticType::Uuid));
        assert_eq!(type_of("column1"), Some(SemanticType::Timestamp));
        assert_eq!(type_of("column3"), Some(SemanticType::Structured));
        assert_eq!(type_of("column5"), Some(SemanticType::Array));
        assert_eq!(type_of("column7"), Some(SemanticType::Text));
        assert_eq!(type_of("column12"), Some(SemanticType::Integer));
        assert_eq!(type_of("column19"), Some(SemanticType::Float));
        assert_eq!(type_of("column24"), Some(SemanticType::Boolean));
        assert_eq!(type_of("column26"), Some(SemanticType::Uuid));
        assert_eq!(type_of("column27"), Some(SemanticType::KeyValue));
        assert_eq!(type_of("column28"), Some(SemanticType::Geometry));
        assert_eq!(type_of("column33"), Some(SemanticType::Bytes));
        assert_eq!(type_of("deleted_at"), None);

        let mut families: Vec<_> = fuzz
            .columns()
            .iter()
            .map(|descriptor| descriptor.semantic_type.as_str())
            .collect();
        families.sort_unstable();
        families.dedup();
        assert_eq!(families.len(), 11);
    }
}
