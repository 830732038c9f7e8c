//! Zero-argument token access for the common one-credential-per-process case.
//!
//! A [`TokenFacade`] holds a configuration and lazily builds one
//! [`TokenProvider`] from it on first use. Installing a new configuration
//! drops the provider, so credentials are never served from a stale
//! instance. [`global`] returns the process-wide facade.
//!
//! ```rust,no_run
//! use zai_payment::auth;
//! use zai_payment::config::{Environment, ZaiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! auth::global().configure(ZaiConfig::new(
//!     Environment::Prelive,
//!     "client-id",
//!     "client-secret",
//!     "scope",
//! ))?;
//!
//! let header = auth::global().token().await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use super::{AccessToken, TokenProvider};
use crate::config::ZaiConfig;
use crate::error::{AuthError, ConfigError};

static GLOBAL: TokenFacade = TokenFacade::new();

/// Get the process-wide token facade.
pub fn global() -> &'static TokenFacade {
    &GLOBAL
}

#[derive(Default)]
struct FacadeState {
    config: Option<ZaiConfig>,
    provider: Option<Arc<TokenProvider>>,
}

/// Configuration holder with a lazily constructed [`TokenProvider`].
pub struct TokenFacade {
    state: RwLock<FacadeState>,
}

impl TokenFacade {
    /// Create an unconfigured facade.
    pub const fn new() -> Self {
        Self {
            state: RwLock::new(FacadeState {
                config: None,
                provider: None,
            }),
        }
    }

    /// Install a configuration, discarding any provider built from the previous one.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid; the previous
    /// configuration stays active in that case.
    pub fn configure(&self, config: ZaiConfig) -> Result<(), ConfigError> {
        config.validate()?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        info!(
            environment = %config.environment,
            client_id = %config.client_id,
            "Installed Zai configuration"
        );
        state.config = Some(config);
        state.provider = None;
        Ok(())
    }

    /// Forget the configuration and the provider.
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = FacadeState::default();
    }

    /// Currently installed configuration.
    pub fn config(&self) -> Option<ZaiConfig> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .clone()
    }

    /// Get the provider, building it on first use.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if no configuration was installed.
    pub fn provider(&self) -> Result<Arc<TokenProvider>, ConfigError> {
        if let Some(provider) = self.existing_provider() {
            return Ok(provider);
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(provider) = &state.provider {
            return Ok(Arc::clone(provider));
        }

        let config = state.config.as_ref().ok_or(ConfigError::NotConfigured)?;
        let provider = Arc::new(TokenProvider::new(config)?);
        state.provider = Some(Arc::clone(&provider));
        Ok(provider)
    }

    /// `Authorization` header value from the default provider.
    pub async fn token(&self) -> Result<String, AuthError> {
        self.provider()?.bearer_token().await
    }

    /// Force a token refresh on the default provider.
    pub async fn refresh_token(&self) -> Result<Arc<AccessToken>, AuthError> {
        self.provider()?.refresh_token().await
    }

    /// Drop the default provider's cached token, if a provider exists.
    pub fn clear_token(&self) {
        if let Some(provider) = self.existing_provider() {
            provider.clear_token();
        }
    }

    /// Token type of the cached token, if any.
    pub fn token_type(&self) -> Option<String> {
        self.existing_provider()?.token_type()
    }

    /// Expiry of the cached token, if any.
    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.existing_provider()?.token_expiry()
    }

    fn existing_provider(&self) -> Option<Arc<TokenProvider>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .provider
            .clone()
    }
}

impl Default for TokenFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("TokenFacade")
            .field("config", &state.config)
            .field("provider", &state.provider)
            .finish()
    }
}

#[cfg(test)]
#[path = "facade_tests.rs"]
mod tests;
