//! Query-string filter compilation.
//!
//! Raw `<column>__<suffix>=<value>` parameters are validated against an entity's
//! column registry and the shared operator table, coerced into typed literals and
//! compiled into parameterised predicates.

mod coerce;
mod compiler;
mod error;
mod explain;
mod operators;
mod paging;
mod params;

pub use coerce::{Coerced, Literal, coerce};
pub use compiler::{
    CompiledPredicate, CompiledQuery, FilterCompiler, KEY_SEPARATOR, PLACEHOLDER,
    PRIMARY_KEY_ROW_LIMIT, render_positional,
};
pub use error::{FilterError, FilterProblem};
pub use explain::{Explanation, explain};
pub use operators::{Cardinality, OperatorEntry, OperatorTable};
pub use paging::{
    DEFAULT_LIMIT, DEFAULT_MAX_LIMIT, LIMIT_PARAM, OFFSET_PARAM, Page, PagingPolicy,
    apply_soft_delete,
};
pub use params::QueryParams;
