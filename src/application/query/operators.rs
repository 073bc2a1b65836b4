//! Filter suffix tokens and the SQL comparison each one compiles to.

/// How many bound values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// Exactly one value.
    Scalar,
    /// One or more values, rendered as a parenthesised list.
    List,
    /// No value; any submitted value string is ignored.
    Null,
    /// One value, always bound as a `%...%` string.
    Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorEntry {
    pub suffix: &'static str,
    pub sql_operator: &'static str,
    pub cardinality: Cardinality,
}

const fn entry(
    suffix: &'static str,
    sql_operator: &'static str,
    cardinality: Cardinality,
) -> OperatorEntry {
    OperatorEntry {
        suffix,
        sql_operator,
        cardinality,
    }
}

const STANDARD_OPERATORS: &[OperatorEntry] = &[
    entry("eq", "=", Cardinality::Scalar),
    entry("ne", "!=", Cardinality::Scalar),
    entry("gt", ">", Cardinality::Scalar),
    entry("gte", ">=", Cardinality::Scalar),
    entry("lt", "<", Cardinality::Scalar),
    entry("lte", "<=", Cardinality::Scalar),
    entry("in", "IN", Cardinality::List),
    entry("nin", "NOT IN", Cardinality::List),
    entry("notin", "NOT IN", Cardinality::List),
    entry("isnull", "IS NULL", Cardinality::Null),
    entry("nisnull", "IS NOT NULL", Cardinality::Null),
    entry("isnotnull", "IS NOT NULL", Cardinality::Null),
    entry("l", "LIKE", Cardinality::Pattern),
    entry("like", "LIKE", Cardinality::Pattern),
    entry("nl", "NOT LIKE", Cardinality::Pattern),
    entry("nlike", "NOT LIKE", Cardinality::Pattern),
    entry("notlike", "NOT LIKE", Cardinality::Pattern),
    entry("il", "ILIKE", Cardinality::Pattern),
    entry("ilike", "ILIKE", Cardinality::Pattern),
    entry("nil", "NOT ILIKE", Cardinality::Pattern),
    entry("nilike", "NOT ILIKE", Cardinality::Pattern),
    entry("notilike", "NOT ILIKE", Cardinality::Pattern),
];

/// Immutable suffix lookup shared by every entity.
#[derive(Debug, Clone, Copy)]
pub struct OperatorTable {
    entries: &'static [OperatorEntry],
}

impl OperatorTable {
    pub const fn standard() -> Self {
        Self {
            entries: STANDARD_OPERATORS,
        }
    }

    pub fn lookup(&self, suffix: &str) -> Option<&'static OperatorEntry> {
        self.entries.iter().find(|entry| entry.suffix == suffix)
    }

    pub fn entries(&self) -> &'static [OperatorEntry] {
        self.entries
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::standard()
    }
}
