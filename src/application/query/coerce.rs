//! Best-effort conversion of raw query-string text into bound literals.
//!
//! The coercer does not know a column's concrete type. It builds an ordered list of
//! candidate encodings for the raw text and keeps the first one that decodes as a
//! generic JSON literal, so `123` becomes a number and `bob` becomes a string.

use serde_json::Value as JsonValue;

use crate::domain::columns::SemanticType;
use crate::domain::value::Value;

use super::operators::Cardinality;

/// A coerced value and, when it came from the unquoted candidate, the text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub source: Option<String>,
}

impl Literal {
    fn new(value: Value, source: Option<&str>) -> Self {
        Self {
            value,
            source: source.map(str::to_string),
        }
    }

    /// Narrow the value to a column type, keeping the source text for textual columns.
    pub fn refine_for(self, semantic_type: SemanticType) -> Value {
        self.value.refine_for(semantic_type, self.source.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Single(Literal),
    List(Vec<Literal>),
}

/// Coerce `raw` for an operator of the given cardinality.
///
/// Returns `None` when no candidate decodes to an acceptable shape. Null-cardinality
/// operators bind nothing, so they always coerce to an empty list.
pub fn coerce(raw: &str, cardinality: Cardinality) -> Option<Coerced> {
    if cardinality == Cardinality::Null {
        return Some(Coerced::List(Vec::new()));
    }

    candidates(raw, cardinality)
        .iter()
        .enumerate()
        .filter_map(|(index, candidate)| {
            let literal = serde_json::from_str::<JsonValue>(candidate).ok()?;
            Some((index == BARE_CANDIDATE, literal))
        })
        .find_map(|(bare, literal)| accept(literal, cardinality, bare.then_some(raw)))
}

/// Index of the candidate that embeds the raw text without added quotes.
const BARE_CANDIDATE: usize = 0;

/// Candidate encodings in priority order.
///
/// Quoting is literal: raw text containing `"` or `\` produces candidates that do not
/// decode, which is how malformed values surface as unparseable.
fn candidates(raw: &str, cardinality: Cardinality) -> Vec<String> {
    match cardinality {
        Cardinality::Scalar | Cardinality::Null => vec![raw.to_string(), format!("\"{raw}\"")],
        Cardinality::List => {
            let quoted: Vec<String> = raw.split(',').map(|item| format!("\"{item}\"")).collect();
            vec![format!("[{raw}]"), format!("[{}]", quoted.join(","))]
        }
        Cardinality::Pattern => vec![format!("\"%{raw}%\"")],
    }
}

fn accept(literal: JsonValue, cardinality: Cardinality, bare: Option<&str>) -> Option<Coerced> {
    match cardinality {
        Cardinality::List => match literal {
            JsonValue::Array(items) if !items.is_empty() => {
                let sources: Vec<&str> = bare
                    .map(|raw| raw.split(',').collect())
                    .filter(|pieces: &Vec<&str>| pieces.len() == items.len())
                    .unwrap_or_default();
                let literals = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        Literal::new(Value::from_literal(item), sources.get(index).copied())
                    })
                    .collect();
                Some(Coerced::List(literals))
            }
            _ => None,
        },
        Cardinality::Pattern => match literal {
            JsonValue::String(pattern) => {
                Some(Coerced::Single(Literal::new(Value::String(pattern), None)))
            }
            _ => None,
        },
        Cardinality::Scalar | Cardinality::Null => Some(Coerced::Single(Literal::new(
            Value::from_literal(literal),
            bare,
        ))),
    }
}
