use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;
use crate::operation::{OAUTH_GENERATE_TOKEN, Operation};

pub const SANDBOX: &str = "sandbox";
pub const PRODUCTION: &str = "production";
pub const DEFAULT_VERSION: &str = "v1";

const SANDBOX_BASE_URL: &str = "https://sandbox.safaricom.co.ke";
const PRODUCTION_BASE_URL: &str = "https://api.safaricom.co.ke";

type OperationUrls = BTreeMap<String, String>;

/// Endpoint table: environment -> version -> operation -> URL.
///
/// Deserializes from a plain nested mapping, e.g.
///
/// ```yaml
/// sandbox:
///   v1:
///     c2b_simulate_transaction: https://sandbox.safaricom.co.ke/mpesa/c2b/v1/simulate
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTable(BTreeMap<String, BTreeMap<String, OperationUrls>>);

impl UrlTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Safaricom Daraja endpoints for `sandbox` and `production`, version `v1`.
    #[must_use]
    pub fn sandbox_and_production() -> Self {
        let mut table = Self::new();
        for (environment, base_url) in [(SANDBOX, SANDBOX_BASE_URL), (PRODUCTION, PRODUCTION_BASE_URL)] {
            table.insert(
                environment,
                DEFAULT_VERSION,
                OAUTH_GENERATE_TOKEN,
                format!("{base_url}/oauth/v1/generate"),
            );
            for op in Operation::ALL {
                table.insert(
                    environment,
                    DEFAULT_VERSION,
                    op.key(),
                    format!("{base_url}{}", v1_path(op)),
                );
            }
        }
        table
    }

    /// Add or replace a single endpoint.
    pub fn insert(
        &mut self,
        environment: impl Into<String>,
        version: impl Into<String>,
        operation: impl Into<String>,
        url: impl Into<String>,
    ) {
        self.0
            .entry(environment.into())
            .or_default()
            .entry(version.into())
            .or_default()
            .insert(operation.into(), url.into());
    }

    /// Builder-style [`UrlTable::insert`].
    #[must_use]
    pub fn with_endpoint(
        mut self,
        environment: impl Into<String>,
        version: impl Into<String>,
        operation: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.insert(environment, version, operation, url);
        self
    }

    /// Look up and parse the URL for `(environment, version, operation)`.
    ///
    /// # Errors
    /// Returns [`GatewayError::EndpointNotConfigured`] if any level of the
    /// lookup is absent and [`GatewayError::InvalidEndpoint`] if the stored
    /// value is not an absolute URL.
    pub fn resolve(&self, environment: &str, version: &str, operation: &str) -> Result<Url, GatewayError> {
        let raw = self
            .0
            .get(environment)
            .and_then(|versions| versions.get(version))
            .and_then(|operations| operations.get(operation))
            .ok_or_else(|| GatewayError::EndpointNotConfigured {
                environment: environment.to_owned(),
                version: version.to_owned(),
                operation: operation.to_owned(),
            })?;

        Url::parse(raw).map_err(|e| GatewayError::InvalidEndpoint {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    /// Configured environment names.
    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

fn v1_path(op: Operation) -> &'static str {
    match op {
        Operation::B2bPaymentRequest => "/mpesa/b2b/v1/paymentrequest",
        Operation::B2cPaymentRequest => "/mpesa/b2c/v1/paymentrequest",
        Operation::C2bRegisterUrl => "/mpesa/c2b/v1/registerurl",
        Operation::C2bSimulateTransaction => "/mpesa/c2b/v1/simulate",
        Operation::TransactionStatusRequest => "/mpesa/transactionstatus/v1/query",
        Operation::AccountBalanceRequest => "/mpesa/accountbalance/v1/query",
        Operation::ReversalRequest => "/mpesa/reversal/v1/request",
        Operation::LipaNaMpesaOnlineQuery => "/mpesa/stkpushquery/v1/query",
        Operation::LipaNaMpesaOnlinePayment => "/mpesa/stkpush/v1/processrequest",
    }
}
