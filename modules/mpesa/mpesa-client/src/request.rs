use std::time::Duration;

use http::{HeaderMap, HeaderValue, Method};
use secrecy::SecretString;
use url::Url;

use crate::error::GatewayError;
use crate::payload::Payload;

/// Build a sensitive `Authorization: Bearer <token>` header value.
///
/// # Errors
/// Returns [`GatewayError::BuildError`] if the token contains characters not
/// allowed in a header value.
pub fn bearer_header(token: &str) -> Result<HeaderValue, GatewayError> {
    let mut value = HeaderValue::try_from(format!("Bearer {token}"))
        .map_err(|e| GatewayError::BuildError(format!("Invalid access token: {e}")))?;
    value.set_sensitive(true);
    Ok(value)
}

/// A JSON request to one operation endpoint.
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    payload: Payload,
    timeout: Option<Duration>,
}

impl DispatchRequest {
    /// Create a request carrying `payload` as its JSON body.
    #[must_use]
    pub fn new(method: Method, url: Url, payload: Payload) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            method,
            url,
            headers,
            payload,
            timeout: None,
        }
    }

    /// Set the `Authorization` header
    #[must_use]
    pub fn authorization(mut self, value: HeaderValue) -> Self {
        self.headers.insert(http::header::AUTHORIZATION, value);
        self
    }

    /// Set request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the HTTP method
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the target URL
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the request headers
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the JSON body
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Get the timeout duration
    #[must_use]
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }

    /// Serialize the payload into the request body
    ///
    /// # Errors
    /// Returns [`GatewayError::Serialization`] if the payload cannot be encoded.
    pub fn body_bytes(&self) -> Result<Vec<u8>, GatewayError> {
        Ok(serde_json::to_vec(&self.payload)?)
    }
}

/// An HTTP Basic authenticated GET against the OAuth endpoint.
#[derive(Debug)]
pub struct TokenRequest {
    url: Url,
    consumer_key: String,
    consumer_secret: SecretString,
    timeout: Option<Duration>,
}

impl TokenRequest {
    /// Target `endpoint` with `grant_type` appended as a query parameter.
    #[must_use]
    pub fn new(
        mut endpoint: Url,
        grant_type: &str,
        consumer_key: impl Into<String>,
        consumer_secret: SecretString,
    ) -> Self {
        endpoint
            .query_pairs_mut()
            .append_pair("grant_type", grant_type);
        Self {
            url: endpoint,
            consumer_key: consumer_key.into(),
            consumer_secret,
            timeout: None,
        }
    }

    /// Set request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the target URL, including the query string
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the Basic auth user name
    #[must_use]
    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    /// Get the Basic auth password
    #[must_use]
    pub fn consumer_secret(&self) -> &SecretString {
        &self.consumer_secret
    }

    /// Get the timeout duration
    #[must_use]
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }
}
