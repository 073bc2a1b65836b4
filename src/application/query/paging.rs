//! Paging defaults and the implicit "not soft-deleted" predicate.

use crate::domain::entities::EntityDefinition;

use super::compiler::CompiledPredicate;
use super::error::FilterProblem;
use super::params::QueryParams;

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";
pub const DEFAULT_LIMIT: u64 = 2000;
pub const DEFAULT_MAX_LIMIT: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingPolicy {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PagingPolicy {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

impl From<&crate::config::QuerySettings> for PagingPolicy {
    fn from(settings: &crate::config::QuerySettings) -> Self {
        Self {
            default_limit: settings.default_limit.get(),
            max_limit: settings.max_limit.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u64,
    pub offset: u64,
}

impl Page {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }
}

impl PagingPolicy {
    /// Read `limit`/`offset`, applying defaults for absent or empty values.
    ///
    /// Requested limits above `max_limit` are clamped. Both parameters are checked
    /// before returning so a request with two bad values reports both.
    pub fn resolve(&self, params: &QueryParams) -> Result<Page, Vec<FilterProblem>> {
        let limit = parse_bound(params, LIMIT_PARAM);
        let offset = parse_bound(params, OFFSET_PARAM);

        match (limit, offset) {
            (Ok(limit), Ok(offset)) => Ok(Page {
                limit: limit
                    .unwrap_or(self.default_limit)
                    .min(self.max_limit.max(1)),
                offset: offset.unwrap_or(0),
            }),
            (limit, offset) => Err([limit.err(), offset.err()].into_iter().flatten().collect()),
        }
    }
}

fn parse_bound(params: &QueryParams, key: &'static str) -> Result<Option<u64>, FilterProblem> {
    match params.first(key) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| FilterProblem::LimitOffsetParseError(format!("{key}={raw}"))),
    }
}

/// Append `<marker> IS NULL` unless a predicate already constrains the marker column.
pub fn apply_soft_delete(entity: &EntityDefinition, predicates: &mut Vec<CompiledPredicate>) {
    let Some(marker) = entity.soft_delete_column() else {
        return;
    };

    if predicates
        .iter()
        .any(|predicate| predicate.column() == marker)
    {
        return;
    }

    predicates.push(CompiledPredicate::without_values(
        marker,
        format!("{marker} IS NULL"),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::columns::{ColumnDescriptor, ColumnRegistry, SemanticType};
    use crate::domain::value::Value;

    fn entity(columns: &[&str]) -> EntityDefinition {
        let registry = ColumnRegistry::new(
            columns
                .iter()
                .map(|name| ColumnDescriptor::new(*name, SemanticType::Text)),
        )
        .expect("valid registry");
        EntityDefinition::new("things", "id", registry).expect("valid entity")
    }

    #[test]
    fn defaults_when_absent() {
        let page = PagingPolicy::default()
            .resolve(&QueryParams::new())
            .expect("defaults");
        assert_eq!(page, Page::new(2000, 0));
    }

    #[test]
    fn empty_values_use_defaults() {
        let page = PagingPolicy::default()
            .resolve(&QueryParams::parse("limit=&offset="))
            .expect("defaults");
        assert_eq!(page, Page::new(2000, 0));
    }

    #[test]
    fn explicit_values_are_used() {
        let page = PagingPolicy::default()
            .resolve(&QueryParams::parse("limit=50&offset=100"))
            .expect("valid paging");
        assert_eq!(page, Page::new(50, 100));
    }

    #[test]
    fn large_limits_are_clamped() {
        let policy = PagingPolicy {
            default_limit: 10,
            max_limit: 20,
        };
        let page = policy
            .resolve(&QueryParams::parse("limit=5000"))
            .expect("valid paging");
        assert_eq!(page.limit, 20);
    }

    #[test]
    fn unparseable_values_are_all_reported() {
        let problems = PagingPolicy::default()
            .resolve(&QueryParams::parse("limit=ten&offset=-1"))
            .expect_err("invalid paging");
        assert_eq!(
            problems,
            vec![
                FilterProblem::LimitOffsetParseError("limit=ten".to_string()),
                FilterProblem::LimitOffsetParseError("offset=-1".to_string()),
            ]
        );
    }

    #[test]
    fn soft_delete_default_is_injected() {
        let entity = entity(&["id", "deleted_at"]);
        let mut predicates = Vec::new();
        apply_soft_delete(&entity, &mut predicates);
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].fragment(), "deleted_at IS NULL");
        assert!(predicates[0].bound_values().is_empty());
    }

    #[test]
    fn explicit_soft_delete_filter_wins() {
        let entity = entity(&["id", "deleted_at"]);
        let mut predicates = vec![CompiledPredicate::without_values(
            "deleted_at",
            "deleted_at IS NOT NULL",
        )];
        apply_soft_delete(&entity, &mut predicates);
        assert_eq!(predicates.len(), 1);
        assert_eq!(predicates[0].fragment(), "deleted_at IS NOT NULL");
    }

    #[test]
    fn entities_without_marker_are_untouched() {
        let entity = entity(&["id", "name"]);
        let mut predicates = vec![CompiledPredicate::new(
            "name",
            "name = ?",
            vec![Value::String("bob".to_string())],
        )];
        apply_soft_delete(&entity, &mut predicates);
        assert_eq!(predicates.len(), 1);
    }
}
