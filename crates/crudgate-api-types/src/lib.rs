//! Wire types shared by the crudgate server and its clients.

use serde::{Deserialize, Serialize};

/// Envelope wrapping every read response, successful or not.
///
/// Successful reads carry `objects` (possibly empty) and `error: null`;
/// failures carry the error text and `objects: null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectsEnvelope<T> {
    pub status: u16,
    pub success: bool,
    pub error: Option<String>,
    pub objects: Option<Vec<T>>,
}

impl<T> ObjectsEnvelope<T> {
    pub fn ok(objects: Vec<T>) -> Self {
        Self {
            status: 200,
            success: true,
            error: None,
            objects: Some(objects),
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self {
            status,
            success: false,
            error: Some(error.into()),
            objects: None,
        }
    }
}
