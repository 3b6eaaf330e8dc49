//! Response normalization.
//!
//! Every call resolves to a [`ResponseResult`]: `Data` on a success status,
//! `Error` carrying the remote error payload otherwise. Only transport and
//! undecodable-body failures surface as `Err`.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::CONTENT_LENGTH;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::error::TwitterResult;

/// Outcome of an API call: exactly one of `data` or `error`.
///
/// Serializes as `{"data": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseResult<D = Value, E = Value> {
    Data(D),
    Error(E),
}

impl<D, E> ResponseResult<D, E> {
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    #[must_use]
    pub const fn data(&self) -> Option<&D> {
        match self {
            Self::Data(d) => Some(d),
            Self::Error(_) => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<&E> {
        match self {
            Self::Data(_) => None,
            Self::Error(e) => Some(e),
        }
    }

    /// Convert into a standard `Result`.
    pub fn into_result(self) -> Result<D, E> {
        match self {
            Self::Data(d) => Ok(d),
            Self::Error(e) => Err(e),
        }
    }
}

impl ResponseResult<Value, Value> {
    /// Deserialize both sides into typed payloads.
    pub fn decode<D: DeserializeOwned, E: DeserializeOwned>(
        self,
    ) -> TwitterResult<ResponseResult<D, E>> {
        Ok(match self {
            Self::Data(d) => ResponseResult::Data(serde_json::from_value(d)?),
            Self::Error(e) => ResponseResult::Error(serde_json::from_value(e)?),
        })
    }
}

/// How a response body is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// JSON body; 204 or `Content-Length: 0` on success is an empty object.
    Json,
    /// Text body: URL-encoded pairs on success, JSON (or the raw text) on
    /// failure. Used by the legacy OAuth 1.0a token endpoints.
    TextOrJson,
}

/// Status, length and body of a fully read response.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub content_length: Option<u64>,
    pub body: Bytes,
}

impl RawResponse {
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            status,
            content_length: Some(body.len() as u64),
            body,
        }
    }

    /// Drain a `reqwest` response. A body that cannot be read is a
    /// transport error.
    pub async fn read(response: reqwest::Response) -> TwitterResult<Self> {
        let status = response.status();
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.bytes().await?;

        Ok(Self {
            status,
            content_length,
            body,
        })
    }
}

/// Normalize a raw response under the given read mode.
pub fn normalize(raw: &RawResponse, mode: ReadMode) -> TwitterResult<ResponseResult> {
    let success = raw.status.is_success();
    debug!(status = raw.status.as_u16(), ?mode, success, "Normalizing response");

    if !success {
        return error_payload(&raw.body, mode).map(ResponseResult::Error);
    }

    let data = match mode {
        ReadMode::Json => {
            if raw.status == StatusCode::NO_CONTENT || raw.content_length == Some(0) {
                Value::Object(Map::new())
            } else {
                serde_json::from_slice(&raw.body)?
            }
        }
        ReadMode::TextOrJson => parse_form(&String::from_utf8_lossy(&raw.body)),
    };

    Ok(ResponseResult::Data(data))
}

/// Parse an error body. Text mode falls back to the raw text when the body
/// is not JSON; JSON mode treats that as a decode failure.
fn error_payload(body: &[u8], mode: ReadMode) -> TwitterResult<Value> {
    match mode {
        ReadMode::Json => Ok(serde_json::from_slice(body)?),
        ReadMode::TextOrJson => {
            let text = String::from_utf8_lossy(body);
            Ok(serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned())))
        }
    }
}

/// Parse `a=1&b=2` into a JSON object of strings. Repeated keys collect
/// into an array.
fn parse_form(text: &str) -> Value {
    let mut map = Map::new();
    for (key, value) in form_urlencoded::parse(text.trim().as_bytes()) {
        let value = Value::String(value.into_owned());
        match map.get_mut(key.as_ref()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key.into_owned(), value);
            }
        }
    }
    Value::Object(map)
}
