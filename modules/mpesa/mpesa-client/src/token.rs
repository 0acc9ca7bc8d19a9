//! OAuth client-credentials token acquisition.
//!
//! Tokens issued by the API expire after roughly an hour; callers are
//! expected to track the expiry and build a new [`crate::GatewayClient`]
//! with a fresh token.

use std::time::Duration;

use http::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::operation::OAUTH_GENERATE_TOKEN;
use crate::request::TokenRequest;
use crate::response::GatewayResponse;
use crate::transport::{ReqwestTransport, Transport};
use crate::urls::{DEFAULT_VERSION, SANDBOX, UrlTable};

pub const DEFAULT_GRANT_TYPE: &str = "client_credentials";

/// Parameters of a token request besides the consumer credentials.
#[derive(Debug, Clone)]
pub struct TokenOptions {
    pub grant_type: String,
    pub environment: String,
    pub version: String,
    pub timeout: Option<Duration>,
    pub urls: UrlTable,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            grant_type: DEFAULT_GRANT_TYPE.to_owned(),
            environment: SANDBOX.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            timeout: None,
            urls: UrlTable::sandbox_and_production(),
        }
    }
}

impl From<&GatewayConfig> for TokenOptions {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            grant_type: DEFAULT_GRANT_TYPE.to_owned(),
            environment: config.environment.clone(),
            version: config.version.clone(),
            timeout: config.timeout,
            urls: config.urls.clone(),
        }
    }
}

impl TokenOptions {
    #[must_use]
    pub fn with_grant_type(mut self, grant_type: impl Into<String>) -> Self {
        self.grant_type = grant_type.into();
        self
    }
}

/// Request an OAuth access token with HTTP Basic authentication.
///
/// The raw response is returned whatever its status; use
/// [`AccessToken::from_response`] to extract the token.
///
/// # Errors
/// Returns a configuration error if the token endpoint is not in the table
/// and a transport error if the exchange fails.
pub async fn acquire_token(
    consumer_key: &str,
    consumer_secret: &SecretString,
    options: &TokenOptions,
) -> Result<GatewayResponse, GatewayError> {
    let transport = ReqwestTransport::new()?;
    acquire_token_with(&transport, consumer_key, consumer_secret, options).await
}

/// [`acquire_token`] over an explicit [`Transport`].
///
/// # Errors
/// See [`acquire_token`].
pub async fn acquire_token_with(
    transport: &dyn Transport,
    consumer_key: &str,
    consumer_secret: &SecretString,
    options: &TokenOptions,
) -> Result<GatewayResponse, GatewayError> {
    let endpoint = options
        .urls
        .resolve(&options.environment, &options.version, OAUTH_GENERATE_TOKEN)?;
    let request = TokenRequest::new(
        endpoint,
        &options.grant_type,
        consumer_key,
        SecretString::from(consumer_secret.expose_secret().to_owned()),
    )
    .timeout(options.timeout);

    let response = transport.fetch_token(request).await?;
    if response.status() == StatusCode::OK {
        tracing::info!(environment = %options.environment, "Generated new token");
    } else {
        tracing::warn!(
            environment = %options.environment,
            status = %response.status(),
            "token endpoint did not return 200"
        );
    }
    Ok(response)
}

/// Access token extracted from a token endpoint response.
pub struct AccessToken {
    token: SecretString,
    expires_in: Option<Duration>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

impl AccessToken {
    /// Read `access_token` (and `expires_in`, if present) from a 200
    /// response. Any other status yields an empty token.
    ///
    /// # Errors
    /// Returns [`GatewayError::Serialization`] if a 200 body is not JSON and
    /// [`GatewayError::InvalidResponse`] if it lacks a string `access_token`.
    pub fn from_response(response: &GatewayResponse) -> Result<Self, GatewayError> {
        if response.status() != StatusCode::OK {
            return Ok(Self::empty());
        }

        let body: Value = response.json()?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| GatewayError::InvalidResponse("missing access_token".into()))?;

        // The API reports the lifetime as a string ("3599"); accept numbers too.
        let expires_in = body.get("expires_in").and_then(|v| match v {
            Value::String(s) => s.parse::<u64>().ok(),
            other => other.as_u64(),
        });

        Ok(Self {
            token: SecretString::from(token.to_owned()),
            expires_in: expires_in.map(Duration::from_secs),
        })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            token: SecretString::from(String::new()),
            expires_in: None,
        }
    }

    #[must_use]
    pub fn secret(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.expose_secret().is_empty()
    }

    #[must_use]
    pub fn expires_in(&self) -> Option<Duration> {
        self.expires_in
    }
}
