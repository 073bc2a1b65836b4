//! Tagged field values.
//!
//! A [`Value`] is either a literal decoded from a filter parameter or a field decoded
//! from a stored row. Both paths go through `serde_json::Value`: filter literals via
//! [`Value::from_literal`], stored rows via [`Value::from_column_json`].

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value as JsonValue;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime,
    format_description::{FormatItem, well_known::Rfc3339},
    macros::format_description,
};
use uuid::Uuid;

use super::columns::SemanticType;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATE_TIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);
const OFFSET_DATE_TIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory][optional [:[offset_minute]]]"
);

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(OffsetDateTime),
    Uuid(Uuid),
    Bytes(Vec<u8>),
    /// JSON objects, arrays and anything else without a narrower tag.
    Structured(JsonValue),
    /// Passed through untouched; geometry wire formats are not parsed here.
    Geometry(JsonValue),
    KeyValue(BTreeMap<String, Option<String>>),
}

impl Value {
    /// Map a generically-decoded literal onto the narrowest tag it fits.
    pub fn from_literal(literal: JsonValue) -> Self {
        match literal {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            JsonValue::String(s) => Value::String(s),
            other => Value::Structured(other),
        }
    }

    /// Decode a stored field using the column's semantic type.
    ///
    /// Shapes that do not match the declared type fall back to `Structured`
    /// (or `String` for textual input) rather than failing the whole row.
    pub fn from_column_json(semantic_type: SemanticType, json: JsonValue) -> Self {
        if json.is_null() {
            return Value::Null;
        }

        match (semantic_type, json) {
            (SemanticType::Text, JsonValue::String(s)) => Value::String(s),
            (SemanticType::Integer, JsonValue::Number(n)) if n.as_i64().is_some() => {
                n.as_i64().map(Value::Integer).unwrap_or(Value::Null)
            }
            (SemanticType::Float, JsonValue::Number(n)) => {
                n.as_f64().map(Value::Float).unwrap_or(Value::Null)
            }
            (SemanticType::Boolean, JsonValue::Bool(b)) => Value::Bool(b),
            (SemanticType::Timestamp, JsonValue::String(s)) => parse_timestamp(&s)
                .map(Value::Timestamp)
                .unwrap_or(Value::String(s)),
            (SemanticType::Uuid, JsonValue::String(s)) => Uuid::parse_str(&s)
                .map(Value::Uuid)
                .unwrap_or(Value::String(s)),
            (SemanticType::Bytes, JsonValue::String(s)) => decode_bytea(&s)
                .map(Value::Bytes)
                .unwrap_or(Value::String(s)),
            (SemanticType::Geometry, json) => Value::Geometry(json),
            (SemanticType::KeyValue, JsonValue::Object(map)) => {
                let mut pairs = BTreeMap::new();
                for (key, value) in map {
                    let value = match value {
                        JsonValue::Null => None,
                        JsonValue::String(s) => Some(s),
                        other => Some(other.to_string()),
                    };
                    pairs.insert(key, value);
                }
                Value::KeyValue(pairs)
            }
            (_, JsonValue::String(s)) => Value::String(s),
            (_, json) => Value::Structured(json),
        }
    }

    /// Narrow a coerced filter literal to the column's type so the store can bind it natively.
    ///
    /// `source` is the unquoted text the literal was decoded from. Text columns bind that
    /// text as written, so `1.50` stays `1.50` instead of being re-printed from a float.
    /// Literals that do not convert cleanly are returned unchanged.
    pub fn refine_for(self, semantic_type: SemanticType, source: Option<&str>) -> Self {
        match (semantic_type, self) {
            (SemanticType::Uuid, Value::String(s)) => match Uuid::parse_str(&s) {
                Ok(uuid) => Value::Uuid(uuid),
                Err(_) => Value::String(s),
            },
            (SemanticType::Timestamp, Value::String(s)) => match parse_timestamp(&s) {
                Some(ts) => Value::Timestamp(ts),
                None => Value::String(s),
            },
            (SemanticType::Integer, Value::String(s)) => match s.parse::<i64>() {
                Ok(i) => Value::Integer(i),
                Err(_) => Value::String(s),
            },
            (SemanticType::Float, Value::Integer(i)) => Value::Float(i as f64),
            (SemanticType::Boolean, Value::String(s)) => match parse_bool(&s) {
                Some(b) => Value::Bool(b),
                None => Value::String(s),
            },
            (SemanticType::Boolean, Value::Integer(i @ (0 | 1))) => Value::Bool(i == 1),
            (SemanticType::Bytes, Value::String(s)) => match decode_bytea(&s) {
                Some(bytes) => Value::Bytes(bytes),
                None => Value::Bytes(s.into_bytes()),
            },
            (
                SemanticType::Text,
                value @ (Value::Integer(_) | Value::Float(_) | Value::Bool(_) | Value::Structured(_)),
            ) => match source {
                Some(raw) => Value::String(raw.to_string()),
                None => value.into_text(),
            },
            (_, value) => value,
        }
    }

    fn into_text(self) -> Self {
        match self {
            Value::Integer(i) => Value::String(i.to_string()),
            Value::Float(f) => Value::String(f.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            Value::Structured(json) => Value::String(json.to_string()),
            other => other,
        }
    }

    /// Append an unambiguous, type-tagged encoding of this value.
    ///
    /// Every variant starts with its own tag byte and every variable-length payload is
    /// length-prefixed, so distinct values never share an encoding.
    pub fn write_canonical(&self, out: &mut Vec<u8>) {
        match self {
            Value::Null => out.push(0),
            Value::Bool(b) => {
                out.push(1);
                out.push(u8::from(*b));
            }
            Value::Integer(i) => {
                out.push(2);
                out.extend_from_slice(&i.to_le_bytes());
            }
            Value::Float(f) => {
                out.push(3);
                out.extend_from_slice(&f.to_bits().to_le_bytes());
            }
            Value::String(s) => {
                out.push(4);
                write_len_prefixed(out, s.as_bytes());
            }
            Value::Timestamp(ts) => {
                out.push(5);
                out.extend_from_slice(&ts.unix_timestamp_nanos().to_le_bytes());
            }
            Value::Uuid(uuid) => {
                out.push(6);
                out.extend_from_slice(uuid.as_bytes());
            }
            Value::Bytes(bytes) => {
                out.push(7);
                write_len_prefixed(out, bytes);
            }
            Value::Structured(json) => {
                out.push(8);
                write_len_prefixed(out, json.to_string().as_bytes());
            }
            Value::Geometry(json) => {
                out.push(9);
                write_len_prefixed(out, json.to_string().as_bytes());
            }
            Value::KeyValue(map) => {
                out.push(10);
                out.extend_from_slice(&(map.len() as u64).to_le_bytes());
                for (key, value) in map {
                    write_len_prefixed(out, key.as_bytes());
                    match value {
                        Some(value) => {
                            out.push(1);
                            write_len_prefixed(out, value.as_bytes());
                        }
                        None => out.push(0),
                    }
                }
            }
        }
    }
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(bytes);
}

/// RFC 3339 first, then the looser forms Postgres accepts for timestamp input.
///
/// Date-only and offset-less values are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }

    let spaced = raw.replacen('T', " ", 1);
    if let Ok(ts) = OffsetDateTime::parse(&spaced, OFFSET_DATE_TIME_FORMAT) {
        return Some(ts);
    }
    if let Ok(local) = PrimitiveDateTime::parse(&spaced, DATE_TIME_FORMAT) {
        return Some(local.assume_utc());
    }
    Date::parse(raw, DATE_FORMAT)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Postgres renders `bytea` as `\x` followed by hex digits.
fn decode_bytea(raw: &str) -> Option<Vec<u8>> {
    hex::decode(raw.strip_prefix("\\x")?).ok()
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => {
                let formatted = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
                serializer.serialize_str(&formatted)
            }
            Value::Uuid(uuid) => serializer.serialize_str(&uuid.hyphenated().to_string()),
            Value::Bytes(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            Value::Structured(json) | Value::Geometry(json) => json.serialize(serializer),
            Value::KeyValue(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    entries.serialize_entry(key, value)?;
                }
                entries.end()
            }
        }
    }
}
