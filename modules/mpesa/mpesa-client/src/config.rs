use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::urls::{DEFAULT_VERSION, SANDBOX, UrlTable};

/// Prefix of the environment variables read by [`GatewayConfig::load`].
pub const ENV_PREFIX: &str = "MPESA_";

/// Legacy variable selecting the deployment environment.
pub const ENVIRONMENT_VAR: &str = "ENV";

/// Session-wide settings for [`crate::GatewayClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Deployment environment tag, e.g. `sandbox` or `production`.
    pub environment: String,
    /// API version tag.
    pub version: String,
    /// Upper bound for each HTTP exchange, written as a human readable
    /// duration (`30s`, `1m 30s`). Unbounded when absent.
    #[serde(with = "humantime_opt", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Endpoint table.
    pub urls: UrlTable,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: SANDBOX.to_owned(),
            version: DEFAULT_VERSION.to_owned(),
            timeout: None,
            urls: UrlTable::sandbox_and_production(),
        }
    }
}

impl GatewayConfig {
    /// Configuration for `environment` with the built-in endpoint table.
    #[must_use]
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            ..Self::default()
        }
    }

    /// Set the API version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set a timeout for every request
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the endpoint table
    #[must_use]
    pub fn with_urls(mut self, urls: UrlTable) -> Self {
        self.urls = urls;
        self
    }

    /// Create configuration from the process environment.
    ///
    /// Reads `ENV` for the environment tag and falls back to `sandbox`
    /// when it is unset or empty.
    #[must_use]
    pub fn from_env() -> Self {
        let environment = std::env::var(ENVIRONMENT_VAR)
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| SANDBOX.to_owned());
        Self::new(environment)
    }

    /// Layered load: built-in defaults, then the optional YAML file, then
    /// `MPESA_*` environment variables (`MPESA_ENVIRONMENT`,
    /// `MPESA_VERSION`, `MPESA_TIMEOUT`).
    ///
    /// A `urls` mapping in the file is merged into the built-in table, so it
    /// can add environments or override single endpoints.
    ///
    /// # Errors
    /// Returns [`GatewayError::InvalidConfig`] when a source cannot be parsed
    /// or holds a value of the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self, GatewayError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config: Self = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        tracing::debug!(
            environment = %config.environment,
            version = %config.version,
            timeout = ?config.timeout,
            "loaded gateway configuration"
        );
        Ok(config)
    }
}

mod humantime_opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub(super) fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_str(&humantime::format_duration(*duration).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| humantime::parse_duration(raw.trim()).map_err(serde::de::Error::custom))
            .transpose()
    }
}
