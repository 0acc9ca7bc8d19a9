use std::io;
use thiserror::Error;

/// Errors produced by gateway client operations.
///
/// Validation and endpoint resolution failures are raised before any
/// network I/O takes place. Transport failures come straight from the HTTP
/// layer and are never retried.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Missing value on key {field}")]
    MissingField { field: String },

    #[error(
        "No endpoint configured for operation '{operation}' (environment={environment}, version={version})"
    )]
    EndpointNotConfigured {
        environment: String,
        version: String,
        operation: String,
    },

    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Request build error: {0}")]
    BuildError(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Whether the error is an endpoint table or configuration failure.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::EndpointNotConfigured { .. } | Self::InvalidEndpoint { .. } | Self::InvalidConfig(_)
        )
    }

    /// Whether the error originated in the HTTP transport.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout(_) | Self::Transport(_)
        )
    }

    /// Name of the offending field for [`GatewayError::MissingField`].
    #[must_use]
    pub fn missing_field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Serialization(err.to_string())
    }
}

impl From<figment::Error> for GatewayError {
    fn from(err: figment::Error) -> Self {
        GatewayError::InvalidConfig(err.to_string())
    }
}
