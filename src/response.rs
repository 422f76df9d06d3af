use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};

/// Body of a provider response.
///
/// Provider error payloads (bad key, unknown city, ...) arrive here as ordinary
/// data; the HTTP status is not inspected.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// The body parsed as JSON.
    Decoded(Value),
    /// The body was not valid JSON (or was empty) and is kept verbatim.
    Raw(String),
}

impl ApiResponse {
    /// Parse a body, falling back to [`ApiResponse::Raw`] when it is not JSON.
    pub fn from_body(body: String) -> Self {
        match serde_json::from_str::<Value>(&body) {
            Ok(v) => ApiResponse::Decoded(v),
            Err(_) => ApiResponse::Raw(body),
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, ApiResponse::Decoded(_))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Decoded(v) => Some(v),
            ApiResponse::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            ApiResponse::Decoded(_) => None,
            ApiResponse::Raw(s) => Some(s),
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ApiResponse::Decoded(v) => Some(v),
            ApiResponse::Raw(_) => None,
        }
    }

    /// Provider error code from an error payload such as
    /// `{"cod":401,"message":"Invalid API key..."}`.
    ///
    /// Success payloads also carry `cod` (`200`, sometimes as a string), so this
    /// only returns codes of 400 and above.
    pub fn provider_error(&self) -> Option<(u16, String)> {
        let v = self.as_json()?;
        let code = match v.get("cod")? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.parse().ok()?,
            _ => return None,
        };
        if code < 400 {
            return None;
        }
        let message = v
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        Some((u16::try_from(code).ok()?, message))
    }

    /// Deserialize a decoded body into a caller-chosen type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        let v = self.as_json().ok_or(Error::NotJson)?;
        Ok(T::deserialize(v)?)
    }
}

impl std::fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiResponse::Decoded(v) => write!(f, "{v}"),
            ApiResponse::Raw(s) => f.write_str(s),
        }
    }
}
