use std::sync::Arc;
use std::time::Duration;

use http::{HeaderValue, Method};
use secrecy::{ExposeSecret, SecretString};
use tokio::runtime::RuntimeFlavor;
use url::Url;

use crate::config::GatewayConfig;
use crate::credentials::{Clock, SystemClock};
use crate::error::GatewayError;
use crate::operation::Operation;
use crate::payload::{Payload, build_payload};
use crate::request::{DispatchRequest, bearer_header};
use crate::response::GatewayResponse;
use crate::transport::{ReqwestTransport, Transport};
use crate::urls::UrlTable;

/// Authenticated session against the M-Pesa API.
///
/// The access token, environment, version and timeout are fixed for the
/// lifetime of the client. Obtaining a fresh token is up to the caller.
pub struct GatewayClient {
    authorization: HeaderValue,
    environment: String,
    version: String,
    timeout: Option<Duration>,
    urls: UrlTable,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("authorization", &self.authorization)
            .field("environment", &self.environment)
            .field("version", &self.version)
            .field("timeout", &self.timeout)
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a client that talks HTTP through `reqwest`.
    ///
    /// # Errors
    /// Returns [`GatewayError::BuildError`] if the token is not a valid
    /// header value or the HTTP client cannot be built.
    pub fn new(access_token: &SecretString, config: GatewayConfig) -> Result<Self, GatewayError> {
        Self::with_transport(access_token, config, Arc::new(ReqwestTransport::new()?))
    }

    /// Create a client on top of a custom [`Transport`].
    ///
    /// # Errors
    /// Returns [`GatewayError::BuildError`] if the token is not a valid
    /// header value.
    pub fn with_transport(
        access_token: &SecretString,
        config: GatewayConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, GatewayError> {
        let GatewayConfig {
            environment,
            version,
            timeout,
            urls,
        } = config;
        Ok(Self {
            authorization: bearer_header(access_token.expose_secret())?,
            environment,
            version,
            timeout,
            urls,
            transport,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the clock used for injected `Timestamp` fields.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Validate `data`, inject fixed fields and resolve the endpoint,
    /// without touching the network.
    ///
    /// # Errors
    /// Returns [`GatewayError::MissingField`] for absent input and a
    /// configuration error when the endpoint cannot be resolved.
    pub fn prepare(&self, operation: Operation, data: &Payload) -> Result<DispatchRequest, GatewayError> {
        let mut payload = build_payload(operation.required_fields(), data)?;
        for (name, value) in operation.fixed_fields(&self.clock.timestamp()) {
            payload.insert(name.to_owned(), value);
        }
        let url = self
            .urls
            .resolve(&self.environment, &self.version, operation.key())?;

        Ok(self.request(url, payload, Operation::METHOD))
    }

    /// Send `payload` as JSON to `url` with the session's bearer token.
    ///
    /// # Errors
    /// Returns a transport error on network failure.
    pub async fn dispatch(&self, url: Url, payload: Payload, method: Method) -> Result<GatewayResponse, GatewayError> {
        self.transport.dispatch(self.request(url, payload, method)).await
    }

    /// Run one operation end to end.
    ///
    /// # Errors
    /// Validation and endpoint errors are returned before any I/O; transport
    /// errors are passed through unchanged. Non-2xx responses are not errors.
    #[tracing::instrument(level = "debug", skip(self, data), fields(environment = %self.environment, version = %self.version))]
    pub async fn call(&self, operation: Operation, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        let request = self.prepare(operation, data)?;
        tracing::debug!(url = %request.url(), "dispatching");

        let response = self.transport.dispatch(request).await?;
        tracing::info!(%operation, status = %response.status(), "operation completed");
        Ok(response)
    }

    /// Blocking version of [`GatewayClient::call`] for sync contexts.
    ///
    /// Uses the current tokio runtime if available, or creates a temporary
    /// one if called from a non-async context.
    ///
    /// # Errors
    /// Same as [`GatewayClient::call`], plus [`GatewayError::Io`] if a
    /// temporary runtime cannot be started and [`GatewayError::BuildError`]
    /// when called from inside a current-thread runtime, which cannot block.
    pub fn call_blocking(&self, operation: Operation, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => Err(GatewayError::BuildError(
                "call_blocking requires a multi-threaded runtime".into(),
            )),
            Ok(handle) => tokio::task::block_in_place(|| handle.block_on(self.call(operation, data))),
            Err(_) => tokio::runtime::Runtime::new()?.block_on(self.call(operation, data)),
        }
    }

    /// Transfer funds between two businesses.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn b2b_payment_request(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::B2bPaymentRequest, data).await
    }

    /// Pay out from a business to a customer.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn b2c_payment_request(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::B2cPaymentRequest, data).await
    }

    /// Register the C2B validation and confirmation URLs.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn c2b_register_url(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::C2bRegisterUrl, data).await
    }

    /// Simulate a customer paybill payment. Sends `CommandID=CustomerPayBillOnline`.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn c2b_simulate_transaction(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::C2bSimulateTransaction, data).await
    }

    /// Check the status of a transaction.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn transaction_status_request(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::TransactionStatusRequest, data).await
    }

    /// Query the balance of a till or paybill.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn account_balance_request(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::AccountBalanceRequest, data).await
    }

    /// Reverse a transaction.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn reversal_request(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::ReversalRequest, data).await
    }

    /// Query an STK push request. The caller's `Timestamp` is replaced by
    /// the current time.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn lipa_na_mpesa_online_query(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::LipaNaMpesaOnlineQuery, data).await
    }

    /// Initiate an STK push payment.
    ///
    /// # Errors
    /// See [`GatewayClient::call`].
    pub async fn lipa_na_mpesa_online_payment(&self, data: &Payload) -> Result<GatewayResponse, GatewayError> {
        self.call(Operation::LipaNaMpesaOnlinePayment, data).await
    }

    fn request(&self, url: Url, payload: Payload, method: Method) -> DispatchRequest {
        DispatchRequest::new(method, url, payload)
            .authorization(self.authorization.clone())
            .timeout(self.timeout)
    }
}
