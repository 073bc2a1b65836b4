//! Turns a raw parameter multimap into parameterised predicates.
//!
//! Column names reach a fragment only after a registry lookup; values never appear in a
//! fragment at all. Each value is represented by a [`PLACEHOLDER`] and carried alongside
//! in [`CompiledPredicate::bound_values`].

use std::fmt::Write as _;

use crate::domain::columns::SemanticType;
use crate::domain::entities::EntityDefinition;
use crate::domain::value::Value;

use super::coerce::{Coerced, coerce};
use super::error::{FilterError, FilterProblem};
use super::operators::{Cardinality, OperatorEntry, OperatorTable};
use super::paging::{LIMIT_PARAM, OFFSET_PARAM, Page, PagingPolicy, apply_soft_delete};
use super::params::QueryParams;

pub const KEY_SEPARATOR: &str = "__";
pub const PLACEHOLDER: char = '?';
/// Single-object lookups ask for one extra row so duplicates can be detected.
pub const PRIMARY_KEY_ROW_LIMIT: u64 = 2;

const RESERVED_PARAMS: [&str; 2] = [LIMIT_PARAM, OFFSET_PARAM];

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    column: String,
    fragment: String,
    bound_values: Vec<Value>,
}

impl CompiledPredicate {
    pub fn new(column: impl Into<String>, fragment: impl Into<String>, bound_values: Vec<Value>) -> Self {
        Self {
            column: column.into(),
            fragment: fragment.into(),
            bound_values,
        }
    }

    pub fn without_values(column: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self::new(column, fragment, Vec::new())
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn bound_values(&self) -> &[Value] {
        &self.bound_values
    }

    pub fn placeholder_count(&self) -> usize {
        self.fragment.matches(PLACEHOLDER).count()
    }
}

/// Effective query after defaults, ready for fingerprinting and storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    table: String,
    predicates: Vec<CompiledPredicate>,
    limit: u64,
    offset: u64,
}

impl CompiledQuery {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn predicates(&self) -> &[CompiledPredicate] {
        &self.predicates
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Predicates joined with `AND`, still using [`PLACEHOLDER`] tokens.
    pub fn where_fragment(&self) -> String {
        self.predicates
            .iter()
            .map(CompiledPredicate::fragment)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Predicates joined with `AND`, placeholders numbered `$1..$N` in bind order.
    pub fn where_clause(&self) -> String {
        render_positional(&self.where_fragment())
    }

    /// Every bound value, in the order the placeholders appear.
    pub fn bound_values(&self) -> impl Iterator<Item = &Value> {
        self.predicates
            .iter()
            .flat_map(|predicate| predicate.bound_values.iter())
    }

    pub fn placeholder_count(&self) -> usize {
        self.predicates
            .iter()
            .map(CompiledPredicate::placeholder_count)
            .sum()
    }
}

/// Replace each [`PLACEHOLDER`] with `$1`, `$2`, ...
pub fn render_positional(fragment: &str) -> String {
    let mut rendered = String::with_capacity(fragment.len() + 8);
    let mut index = 0usize;
    for ch in fragment.chars() {
        if ch == PLACEHOLDER {
            index += 1;
            let _ = write!(rendered, "${index}");
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

/// A recognised key waiting to be compiled.
#[derive(Debug)]
struct FilterClause<'a> {
    key: &'a str,
    column: &'a str,
    semantic_type: SemanticType,
    operator: &'static OperatorEntry,
    raw_values: &'a [String],
}

/// Stateless compiler shared by every entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCompiler {
    operators: OperatorTable,
    paging: PagingPolicy,
}

impl FilterCompiler {
    pub fn new(operators: OperatorTable, paging: PagingPolicy) -> Self {
        Self { operators, paging }
    }

    /// Compile a list request.
    ///
    /// Every problem in `params`, including bad paging values, is collected before
    /// failing, so the error names all offending parameters at once.
    pub fn compile(
        &self,
        entity: &EntityDefinition,
        params: &QueryParams,
    ) -> Result<CompiledQuery, FilterError> {
        let (page, paging_problems) = match self.paging.resolve(params) {
            Ok(page) => (Some(page), Vec::new()),
            Err(problems) => (None, problems),
        };

        let (predicates, mut problems) = self.compile_predicates(entity, params);
        problems.extend(paging_problems);

        if let Some(error) = FilterError::from_problems(problems) {
            return Err(error);
        }

        let page = page.unwrap_or(Page::new(self.paging.default_limit, 0));
        Ok(self.finish(entity, predicates, page))
    }

    /// Query for a single object by its primary key.
    ///
    /// The raw key is narrowed to the key column's type before binding.
    pub fn primary_key_query(&self, entity: &EntityDefinition, raw_key: &str) -> CompiledQuery {
        let column = entity.primary_key();
        let key = Value::String(raw_key.to_string());
        let key = match entity.columns().lookup(column) {
            Some(descriptor) => key.refine_for(descriptor.semantic_type, Some(raw_key)),
            None => key,
        };
        let predicate = CompiledPredicate::new(
            column,
            format!("{column} = {PLACEHOLDER}"),
            vec![key],
        );
        self.finish(
            entity,
            vec![predicate],
            Page::new(PRIMARY_KEY_ROW_LIMIT, 0),
        )
    }

    fn finish(
        &self,
        entity: &EntityDefinition,
        mut predicates: Vec<CompiledPredicate>,
        page: Page,
    ) -> CompiledQuery {
        apply_soft_delete(entity, &mut predicates);
        CompiledQuery {
            table: entity.table().to_string(),
            predicates,
            limit: page.limit,
            offset: page.offset,
        }
    }

    fn compile_predicates(
        &self,
        entity: &EntityDefinition,
        params: &QueryParams,
    ) -> (Vec<CompiledPredicate>, Vec<FilterProblem>) {
        let mut keys: Vec<(&str, &[String])> = params
            .iter()
            .filter(|(key, _)| !RESERVED_PARAMS.contains(key))
            .collect();
        keys.sort_by(|(a, _), (b, _)| sort_key(a).cmp(&sort_key(b)));

        let mut predicates = Vec::new();
        let mut problems = Vec::new();

        for (key, raw_values) in keys {
            match self.recognize(entity, key, raw_values) {
                Some(clause) => compile_clause(&clause, &mut predicates, &mut problems),
                None => problems.extend(raw_values.iter().map(|raw| {
                    FilterProblem::UnrecognizedParameter(format!("{key}={raw}"))
                })),
            }
        }

        (predicates, problems)
    }

    fn recognize<'a>(
        &self,
        entity: &'a EntityDefinition,
        key: &'a str,
        raw_values: &'a [String],
    ) -> Option<FilterClause<'a>> {
        let mut parts = key.split(KEY_SEPARATOR);
        let (column, suffix) = match (parts.next(), parts.next(), parts.next()) {
            (Some(column), Some(suffix), None) => (column, suffix),
            _ => return None,
        };

        let column = entity.columns().lookup(column)?;
        let operator = self.operators.lookup(suffix)?;
        Some(FilterClause {
            key,
            column: column.name.as_str(),
            semantic_type: column.semantic_type,
            operator,
            raw_values,
        })
    }
}

fn sort_key(key: &str) -> (&str, &str, &str) {
    match key.split_once(KEY_SEPARATOR) {
        Some((column, suffix)) => (column, suffix, key),
        None => (key, "", key),
    }
}

fn compile_clause(
    clause: &FilterClause<'_>,
    predicates: &mut Vec<CompiledPredicate>,
    problems: &mut Vec<FilterProblem>,
) {
    let column = clause.column;
    let operator = clause.operator.sql_operator;

    if clause.operator.cardinality == Cardinality::Null {
        predicates.push(CompiledPredicate::without_values(
            column,
            format!("{column} {operator}"),
        ));
        return;
    }

    for raw in clause.raw_values {
        match coerce(raw, clause.operator.cardinality) {
            Some(Coerced::List(literals)) if !literals.is_empty() => {
                let values: Vec<Value> = literals
                    .into_iter()
                    .map(|literal| literal.refine_for(clause.semantic_type))
                    .collect();
                let placeholders = vec![PLACEHOLDER.to_string(); values.len()].join(", ");
                predicates.push(CompiledPredicate::new(
                    column,
                    format!("{column} {operator} ({placeholders})"),
                    values,
                ));
            }
            Some(Coerced::Single(literal)) => {
                predicates.push(CompiledPredicate::new(
                    column,
                    format!("{column} {operator} {PLACEHOLDER}"),
                    vec![literal.refine_for(clause.semantic_type)],
                ));
            }
            Some(Coerced::List(_)) | None => {
                problems.push(FilterProblem::UnparseableValue(format!(
                    "{}={raw}",
                    clause.key
                )));
            }
        }
    }
}
