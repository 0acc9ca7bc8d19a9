use secrecy::ExposeSecret;

use crate::error::GatewayError;
use crate::request::{DispatchRequest, TokenRequest};
use crate::response::GatewayResponse;

/// HTTP layer used by the gateway client.
///
/// One call performs exactly one exchange. Implementations must not retry.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send a JSON request and buffer the response.
    ///
    /// # Errors
    /// Returns a transport error (`Connection`, `Timeout`, `Transport`) when
    /// the exchange fails at the network level.
    async fn dispatch(&self, request: DispatchRequest) -> Result<GatewayResponse, GatewayError>;

    /// Perform the Basic authenticated token GET and buffer the response.
    ///
    /// # Errors
    /// Returns a transport error when the exchange fails at the network level.
    async fn fetch_token(&self, request: TokenRequest) -> Result<GatewayResponse, GatewayError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with a default `reqwest` client.
    ///
    /// # Errors
    /// Returns [`GatewayError::BuildError`] if the TLS backend cannot be
    /// initialised.
    pub fn new() -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| GatewayError::BuildError(e.to_string()))?;
        Ok(Self { http_client })
    }

    /// Reuse an existing `reqwest` client (connection pool, proxies, TLS).
    #[must_use]
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }

    async fn execute(&self, builder: reqwest::RequestBuilder) -> Result<GatewayResponse, GatewayError> {
        let resp = builder.send().await.map_err(classify)?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await.map_err(classify)?;

        Ok(GatewayResponse::from_bytes(status, headers, body))
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(&self, request: DispatchRequest) -> Result<GatewayResponse, GatewayError> {
        let body = request.body_bytes()?;

        let mut req_builder = self
            .http_client
            .request(request.method().clone(), request.url().as_str())
            .headers(request.headers().clone())
            .body(body);

        if let Some(timeout) = request.timeout_duration() {
            req_builder = req_builder.timeout(timeout);
        }

        self.execute(req_builder).await
    }

    async fn fetch_token(&self, request: TokenRequest) -> Result<GatewayResponse, GatewayError> {
        let mut req_builder = self
            .http_client
            .get(request.url().as_str())
            .basic_auth(
                request.consumer_key(),
                Some(request.consumer_secret().expose_secret()),
            );

        if let Some(timeout) = request.timeout_duration() {
            req_builder = req_builder.timeout(timeout);
        }

        self.execute(req_builder).await
    }
}

fn classify(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout(e.to_string())
    } else if e.is_connect() {
        GatewayError::Connection(e.to_string())
    } else {
        GatewayError::Transport(e)
    }
}
