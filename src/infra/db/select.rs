use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder, Row as _};

use crate::application::query::PLACEHOLDER;
use crate::application::repos::{RepoError, Row, SelectRequest, StorageRepo};
use crate::domain::value::Value;

use super::{PostgresRepositories, map_sqlx_error};

const ROW_ALIAS: &str = "row";

#[async_trait]
impl StorageRepo for PostgresRepositories {
    async fn select(&self, request: &SelectRequest) -> Result<Vec<Row>, RepoError> {
        let mut qb = build_select(request)?;
        let records = qb
            .build()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        records
            .into_iter()
            .map(|record| {
                let json: JsonValue = record.try_get(ROW_ALIAS).map_err(map_sqlx_error)?;
                Ok(decode_row(request, json))
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

/// `SELECT to_jsonb(t) AS row FROM (SELECT <columns> FROM <table> [WHERE ...] LIMIT $n OFFSET $m) AS t`
///
/// The where fragment is split at each placeholder and the matching value bound in its
/// place, so no caller text is ever spliced into the statement.
fn build_select(request: &SelectRequest) -> Result<QueryBuilder<'static, Postgres>, RepoError> {
    let pieces: Vec<&str> = request.where_fragment.split(PLACEHOLDER).collect();
    if pieces.len() - 1 != request.values.len() {
        return Err(RepoError::InvalidInput {
            message: format!(
                "where fragment has {} placeholders but {} values",
                pieces.len() - 1,
                request.values.len()
            ),
        });
    }

    let limit = to_i64("limit", request.limit)?;
    let offset = to_i64("offset", request.offset)?;

    let columns = request
        .columns
        .iter()
        .map(|column| quote_identifier(&column.name))
        .collect::<Vec<_>>()
        .join(", ");

    let mut qb = QueryBuilder::new(format!(
        "SELECT to_jsonb(t) AS {ROW_ALIAS} FROM (SELECT {columns} FROM {}",
        quote_identifier(&request.table)
    ));

    if !request.where_fragment.is_empty() {
        qb.push(" WHERE ");
        qb.push(pieces[0]);
        for (piece, value) in pieces[1..].iter().zip(&request.values) {
            push_value(&mut qb, value);
            qb.push(*piece);
        }
    }

    qb.push(" LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);
    qb.push(") AS t");
    Ok(qb)
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &Value) {
    match value.clone() {
        Value::Null => qb.push_bind(Option::<String>::None),
        Value::Bool(b) => qb.push_bind(b),
        Value::Integer(i) => qb.push_bind(i),
        Value::Float(f) => qb.push_bind(f),
        Value::String(s) => qb.push_bind(s),
        Value::Timestamp(ts) => qb.push_bind(ts),
        Value::Uuid(uuid) => qb.push_bind(uuid),
        Value::Bytes(bytes) => qb.push_bind(bytes),
        Value::Structured(json) | Value::Geometry(json) => qb.push_bind(Json(json)),
        Value::KeyValue(map) => qb.push_bind(Json(map)),
    };
}

fn decode_row(request: &SelectRequest, json: JsonValue) -> Row {
    let mut object = match json {
        JsonValue::Object(object) => object,
        _ => serde_json::Map::new(),
    };
    request
        .columns
        .iter()
        .map(|column| {
            let raw = object.remove(&column.name).unwrap_or(JsonValue::Null);
            (
                column.name.clone(),
                Value::from_column_json(column.semantic_type, raw),
            )
        })
        .collect()
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn to_i64(name: &'static str, value: u64) -> Result<i64, RepoError> {
    i64::try_from(value).map_err(|_| RepoError::InvalidInput {
        message: format!("{name} {value} exceeds the supported range"),
    })
}
