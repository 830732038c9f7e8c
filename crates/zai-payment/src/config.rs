//! Client configuration.
//!
//! [`ZaiConfig`] carries the environment selector, OAuth2 client credentials
//! and HTTP timeouts. It can be built in code or loaded from a configuration
//! file layered with `ZAI__*` environment variables.
//!
//! # Examples
//!
//! ```
//! use zai_payment::config::{Environment, ZaiConfig};
//! use std::time::Duration;
//!
//! let config = ZaiConfig::new(Environment::Prelive, "client-id", "client-secret", "im-au-10/scope")
//!     .with_timeout(Duration::from_secs(20));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.auth_base_url(), "https://au-0000.sandbox.auth.assemblypay.com");
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Prefix for environment variable overrides, e.g. `ZAI__CLIENT_ID`.
pub const ENV_PREFIX: &str = "ZAI";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OPEN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: u64 = 60;

/// Largest accepted token refresh margin (one day).
pub const MAX_TOKEN_REFRESH_MARGIN_SECS: u64 = 86_400;

/// Target platform environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Pre-production sandbox.
    #[default]
    #[serde(alias = "sandbox")]
    Prelive,
    /// Live environment.
    Production,
}

impl Environment {
    /// Base URL of the core API (users, items, webhooks, ...).
    pub fn core_base_url(&self) -> &'static str {
        match self {
            Self::Prelive => "https://test.api.promisepay.com",
            Self::Production => "https://secure.api.promisepay.com",
        }
    }

    /// Base URL of the virtual-account API.
    pub fn va_base_url(&self) -> &'static str {
        match self {
            Self::Prelive => "https://sandbox.au-0000.api.assemblypay.com",
            Self::Production => "https://secure.au-0000.api.assemblypay.com",
        }
    }

    /// Base URL of the OAuth2 authorization server.
    pub fn auth_base_url(&self) -> &'static str {
        match self {
            Self::Prelive => "https://au-0000.sandbox.auth.assemblypay.com",
            Self::Production => "https://au-0000.auth.assemblypay.com",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prelive => write!(f, "prelive"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Library configuration.
///
/// Timeouts are (de)serialized as whole seconds.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZaiConfig {
    /// Which platform environment to talk to.
    pub environment: Environment,

    /// OAuth2 client identifier.
    pub client_id: String,

    /// OAuth2 client secret.
    pub client_secret: String,

    /// Scope requested with every token.
    pub scope: String,

    /// Overall request timeout.
    #[serde(with = "seconds")]
    pub timeout: Duration,

    /// Connection-open timeout.
    #[serde(with = "seconds")]
    pub open_timeout: Duration,

    /// Read timeout (idle time between body chunks).
    #[serde(with = "seconds")]
    pub read_timeout: Duration,

    /// Cached tokens are refreshed once they are this close to expiry.
    #[serde(with = "seconds")]
    pub token_refresh_margin: Duration,

    /// Override for the core API base URL.
    pub core_base_url: Option<String>,

    /// Override for the virtual-account API base URL.
    pub va_base_url: Option<String>,

    /// Override for the auth server base URL.
    pub auth_base_url: Option<String>,
}

impl Default for ZaiConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            client_id: String::new(),
            client_secret: String::new(),
            scope: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            open_timeout: Duration::from_secs(DEFAULT_OPEN_TIMEOUT_SECS),
            read_timeout: Duration::from_secs(DEFAULT_READ_TIMEOUT_SECS),
            token_refresh_margin: Duration::from_secs(DEFAULT_TOKEN_REFRESH_MARGIN_SECS),
            core_base_url: None,
            va_base_url: None,
            auth_base_url: None,
        }
    }
}

impl ZaiConfig {
    /// Create a configuration with the given credentials and default timeouts.
    pub fn new(
        environment: Environment,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Self {
        Self {
            environment,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
            ..Self::default()
        }
    }

    /// Load configuration from an optional file plus `ZAI__*` environment variables.
    ///
    /// The file format is inferred from its extension (yaml, toml, json).
    /// Environment variables override file values, e.g. `ZAI__CLIENT_ID=abc`.
    /// The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading Zai configuration file");
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::Load {
                message: e.to_string(),
            })?;

        let config: ZaiConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigError::Load {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Set the environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the overall request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connection-open timeout.
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Set the read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set how long before expiry a cached token is considered stale.
    pub fn with_token_refresh_margin(mut self, margin: Duration) -> Self {
        self.token_refresh_margin = margin;
        self
    }

    /// Override the core API base URL.
    pub fn with_core_base_url(mut self, url: impl Into<String>) -> Self {
        self.core_base_url = Some(url.into());
        self
    }

    /// Override the virtual-account API base URL.
    pub fn with_va_base_url(mut self, url: impl Into<String>) -> Self {
        self.va_base_url = Some(url.into());
        self
    }

    /// Override the auth server base URL.
    pub fn with_auth_base_url(mut self, url: impl Into<String>) -> Self {
        self.auth_base_url = Some(url.into());
        self
    }

    /// Effective core API base URL, without a trailing slash.
    pub fn core_base_url(&self) -> &str {
        resolve(&self.core_base_url, self.environment.core_base_url())
    }

    /// Effective virtual-account API base URL, without a trailing slash.
    pub fn va_base_url(&self) -> &str {
        resolve(&self.va_base_url, self.environment.va_base_url())
    }

    /// Effective auth server base URL, without a trailing slash.
    pub fn auth_base_url(&self) -> &str {
        resolve(&self.auth_base_url, self.environment.auth_base_url())
    }

    /// Check that the configuration can be used for token requests.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` for empty credentials or scope and
    /// `ConfigError::InvalidValue` for zero timeouts or unusable URL overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", &self.scope),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        for (field, value) in [
            ("timeout", self.timeout),
            ("open_timeout", self.open_timeout),
            ("read_timeout", self.read_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }

        check_refresh_margin(self.token_refresh_margin)?;

        for (field, value) in [
            ("core_base_url", &self.core_base_url),
            ("va_base_url", &self.va_base_url),
            ("auth_base_url", &self.auth_base_url),
        ] {
            if let Some(raw) = value {
                validate_base_url(field, raw)?;
            }
        }

        Ok(())
    }
}

// Security: Don't expose the client secret in debug output
impl std::fmt::Debug for ZaiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZaiConfig")
            .field("environment", &self.environment)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .field("scope", &self.scope)
            .field("timeout", &self.timeout)
            .field("open_timeout", &self.open_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("token_refresh_margin", &self.token_refresh_margin)
            .field("core_base_url", &self.core_base_url)
            .field("va_base_url", &self.va_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .finish()
    }
}

fn resolve<'a>(override_url: &'a Option<String>, default: &'static str) -> &'a str {
    match override_url {
        Some(url) => url.trim_end_matches('/'),
        None => default,
    }
}

/// Reject refresh margins above [`MAX_TOKEN_REFRESH_MARGIN_SECS`].
pub(crate) fn check_refresh_margin(margin: Duration) -> Result<(), ConfigError> {
    if margin > Duration::from_secs(MAX_TOKEN_REFRESH_MARGIN_SECS) {
        return Err(ConfigError::InvalidValue {
            field: "token_refresh_margin".to_string(),
            message: format!("must not exceed {} seconds", MAX_TOKEN_REFRESH_MARGIN_SECS),
        });
    }
    Ok(())
}

fn validate_base_url(field: &str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("unsupported scheme '{}'", other),
        }),
    }
}

mod seconds {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
