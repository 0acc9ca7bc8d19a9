//! M-Pesa Gateway Client
//!
//! Thin client for the Safaricom M-Pesa REST API. Each remote operation is a
//! method on [`GatewayClient`] that:
//!
//! - validates the caller's fields against the operation's required set
//! - injects the fields the API expects the client to set (`CommandID`,
//!   `Timestamp`, ...)
//! - resolves the endpoint from the (environment, version, operation) table
//! - sends one JSON request with the session's bearer token
//!
//! Responses are returned as-is. Business result codes in the body are for
//! the caller to interpret.
//!
//! # Examples
//!
//! ## Token then payment
//!
//! ```no_run
//! use mpesa_client::{AccessToken, GatewayClient, GatewayConfig, TokenOptions, acquire_token};
//! use secrecy::SecretString;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = GatewayConfig::from_env();
//! let secret = SecretString::from("consumer-secret".to_owned());
//!
//! let response = acquire_token("consumer-key", &secret, &TokenOptions::from(&config)).await?;
//! let token = AccessToken::from_response(&response)?;
//!
//! let client = GatewayClient::new(token.secret(), config)?;
//! let data = serde_json::from_value(json!({
//!     "ShortCode": "600000",
//!     "Amount": "100",
//!     "Msisdn": "254708374149"
//! }))?;
//!
//! let response = client.c2b_simulate_transaction(&data).await?;
//! let body: serde_json::Value = response.json()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Blocking Usage
//!
//! ```no_run
//! use mpesa_client::{GatewayClient, GatewayConfig, Operation, Payload};
//! use secrecy::SecretString;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let token = SecretString::from("access-token".to_owned());
//! let client = GatewayClient::new(&token, GatewayConfig::load(None)?)?;
//!
//! let response = client.call_blocking(Operation::AccountBalanceRequest, &Payload::new());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod credentials;
mod error;
mod operation;
mod payload;
mod request;
mod response;
mod token;
mod transport;
mod urls;

// Re-export public API
pub use client::GatewayClient;
pub use config::{ENV_PREFIX, ENVIRONMENT_VAR, GatewayConfig};
pub use credentials::{Clock, FixedClock, SystemClock, TIMESTAMP_FORMAT, encode_password, generate_timestamp};
pub use error::GatewayError;
pub use operation::{OAUTH_GENERATE_TOKEN, Operation};
pub use payload::{Payload, build_payload, is_absent};
pub use request::{DispatchRequest, TokenRequest, bearer_header};
pub use response::GatewayResponse;
pub use token::{AccessToken, DEFAULT_GRANT_TYPE, TokenOptions, acquire_token, acquire_token_with};
pub use transport::{ReqwestTransport, Transport};
pub use urls::{DEFAULT_VERSION, PRODUCTION, SANDBOX, UrlTable};

// Re-export commonly used types from dependencies
pub use http::{Method, StatusCode};
