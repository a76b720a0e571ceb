//! # HTTP Handlers
//!
//! One module per resource. Handlers parse and check the request, call
//! into cpr-core for the rules and cpr-db for storage, and shape the JSON
//! response.

pub mod auth;
pub mod branch;
pub mod guarantee;
pub mod health;
pub mod people;
pub mod report;
pub mod ticket;

use axum::extract::{FromRequest, Request};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

use cpr_core::validation::validate_id;

use crate::error::{ApiError, ApiResult};

/// A JSON object request body.
///
/// Malformed JSON, or JSON that is not an object, is a 400 in the usual
/// `{"message"}` shape.
#[derive(Debug, Clone, Default)]
pub struct JsonObject(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
        match value {
            Value::Object(map) => Ok(JsonObject(map)),
            _ => Err(ApiError::bad_request("Request body must be a JSON object")),
        }
    }
}

impl JsonObject {
    /// Trimmed string field, `None` when missing, null or blank.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Decodes the whole body into `T`; a shape mismatch is a 400.
    pub fn decode<T: DeserializeOwned>(self) -> ApiResult<T> {
        serde_json::from_value(Value::Object(self.0)).map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

/// Rejects path ids that cannot name a stored record.
pub(crate) fn check_id(id: &str, message: &str) -> ApiResult<()> {
    validate_id("id", id).map_err(|_| ApiError::bad_request(message))
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
