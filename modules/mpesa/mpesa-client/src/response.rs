use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::GatewayError;

/// Raw result of one HTTP exchange: status, headers and the buffered body.
///
/// Business-level result codes inside the body are left to the caller.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl GatewayResponse {
    /// Create a response from buffered bytes
    #[must_use]
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// Create a response whose body is `value` encoded as JSON
    ///
    /// # Errors
    /// Returns [`GatewayError::Serialization`] if `value` cannot be encoded.
    pub fn from_json<T: serde::Serialize>(status: StatusCode, value: &T) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        Ok(Self::from_bytes(status, headers, serde_json::to_vec(value)?))
    }

    /// Get the HTTP status code
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the raw body
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Consume the response and return the body
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.body
    }

    /// Decode the body as JSON
    ///
    /// # Errors
    /// Returns [`GatewayError::Serialization`] if the body is not valid JSON
    /// for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, GatewayError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the body as UTF-8 text
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidResponse`] if the body is not UTF-8.
    pub fn text(&self) -> Result<&str, GatewayError> {
        std::str::from_utf8(&self.body)
            .map_err(|e| GatewayError::InvalidResponse(format!("Invalid UTF-8: {e}")))
    }
}
