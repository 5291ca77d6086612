//! Decoded response bodies.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};

/// A response payload decoded by declared content kind at the transport
/// boundary. Callers never see raw bytes of unknown shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// `application/json` payloads (empty bodies decode to `Null`).
    Json(Value),
    /// `text/*` payloads.
    Text(String),
    /// Any other content kind, kept opaque.
    Binary(Vec<u8>),
}

impl ResponseBody {
    /// Deserialize into a caller type. Text bodies deserialize as a JSON
    /// string; binary bodies have no typed representation.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        let value = match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
            Self::Binary(_) => {
                return Err(ApiError::Network(
                    "binary response cannot be decoded as a typed value".into(),
                ));
            }
        };
        serde_json::from_value(value)
            .map_err(|e| ApiError::Network(format!("failed to decode response body: {e}")))
    }

    /// The decoded JSON value, when this is a structured payload.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}
