//! Offline rendering of a compiled query, used by the `explain` command.

use serde::Serialize;

use crate::cache::fingerprint;
use crate::domain::entities::EntityDefinition;
use crate::domain::value::Value;

use super::compiler::FilterCompiler;
use super::error::FilterError;
use super::params::QueryParams;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub table: String,
    pub where_clause: String,
    pub values: Vec<Value>,
    pub limit: u64,
    pub offset: u64,
    pub cache_key: String,
}

/// Compile `params` for `entity` and describe the result without touching any backend.
pub fn explain(
    compiler: &FilterCompiler,
    entity: &EntityDefinition,
    params: &QueryParams,
) -> Result<Explanation, FilterError> {
    let query = compiler.compile(entity, params)?;
    Ok(Explanation {
        table: query.table().to_string(),
        where_clause: query.where_clause(),
        values: query.bound_values().cloned().collect(),
        limit: query.limit(),
        offset: query.offset(),
        cache_key: fingerprint(&query, None).into_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog;

    #[test]
    fn explains_a_list_query() {
        let catalog = catalog::builtin().expect("builtin catalog");
        let entity = catalog.get(catalog::PHYSICAL_THINGS).expect("entity");
        let explanation = explain(
            &FilterCompiler::default(),
            &entity,
            &QueryParams::parse("name__ilike=pump&limit=5"),
        )
        .expect("explains");

        assert_eq!(explanation.table, "physical_things");
        assert_eq!(
            explanation.where_clause,
            "name ILIKE $1 AND deleted_at IS NULL"
        );
        assert_eq!(explanation.values, vec![Value::String("%pump%".to_string())]);
        assert_eq!(explanation.limit, 5);
        assert!(explanation.cache_key.starts_with("crudgate:physical_things:"));
    }

    #[test]
    fn reports_problems() {
        let catalog = catalog::builtin().expect("builtin catalog");
        let entity = catalog.get(catalog::PHYSICAL_THINGS).expect("entity");
        let error = explain(
            &FilterCompiler::default(),
            &entity,
            &QueryParams::parse("colour__eq=red"),
        )
        .expect_err("rejected");
        assert_eq!(error.to_string(), "unrecognized params colour__eq=red");
    }
}
