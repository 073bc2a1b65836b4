//! Turns result rows into the wire payload returned to clients and stored in the cache.

use bytes::Bytes;
use crudgate_api_types::ObjectsEnvelope;
use thiserror::Error;

use super::repos::Row;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode response payload: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait ResponseSerializer: Send + Sync {
    fn serialize(&self, rows: &[Row]) -> Result<Bytes, SerializeError>;

    fn content_type(&self) -> &'static str;
}

/// `{"status":200,"success":true,"error":null,"objects":[...]}`
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEnvelopeSerializer;

impl ResponseSerializer for JsonEnvelopeSerializer {
    fn serialize(&self, rows: &[Row]) -> Result<Bytes, SerializeError> {
        let envelope = ObjectsEnvelope::ok(rows.iter().collect());
        Ok(Bytes::from(serde_json::to_vec(&envelope)?))
    }

    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }
}
