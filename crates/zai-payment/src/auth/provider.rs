//! Cached client-credentials token provider.
//!
//! [`TokenProvider`] owns exactly one cached [`AccessToken`]. Readers clone an
//! `Arc` out of a short-lived lock, so they always observe either the previous
//! entry or a fully built replacement. Refreshes are single-flight: concurrent
//! cache misses queue on an async mutex and re-check the cache once they hold
//! it, so a burst of callers results in one token request.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, instrument, warn};

use super::{AccessToken, ClientCredentials, HttpTokenEndpoint, TokenEndpoint};
use crate::config::{check_refresh_margin, ZaiConfig};
use crate::error::{AuthError, ConfigError};

/// Produces currently valid bearer tokens, minimizing token requests.
///
/// # Examples
///
/// ```rust,no_run
/// use zai_payment::auth::TokenProvider;
/// use zai_payment::config::{Environment, ZaiConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ZaiConfig::new(Environment::Prelive, "id", "secret", "scope");
/// let provider = TokenProvider::new(&config)?;
///
/// let header = provider.bearer_token().await?;
/// println!("Expires at {:?}", provider.token_expiry());
///
/// // Force the next call to fetch a new token.
/// provider.clear_token();
/// # Ok(())
/// # }
/// ```
pub struct TokenProvider {
    endpoint: Arc<dyn TokenEndpoint>,
    credentials: ClientCredentials,
    refresh_margin: Duration,
    cached: RwLock<Option<Arc<AccessToken>>>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl TokenProvider {
    /// Create a provider talking to the configured auth server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if credentials are missing or the HTTP client
    /// cannot be built. No network call is made.
    pub fn new(config: &ZaiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let endpoint = HttpTokenEndpoint::new(config)?;
        Self::with_endpoint(
            ClientCredentials::from_config(config)?,
            Arc::new(endpoint),
            config.token_refresh_margin,
        )
    }

    /// Create a provider over an arbitrary token endpoint.
    pub fn with_endpoint(
        credentials: ClientCredentials,
        endpoint: Arc<dyn TokenEndpoint>,
        refresh_margin: std::time::Duration,
    ) -> Result<Self, ConfigError> {
        check_refresh_margin(refresh_margin)?;
        let refresh_margin =
            Duration::from_std(refresh_margin).map_err(|e| ConfigError::InvalidValue {
                field: "token_refresh_margin".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            endpoint,
            credentials,
            refresh_margin,
            cached: RwLock::new(None),
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Get the `Authorization` header value: `<token_type> <access_token>`.
    ///
    /// Returns the cached token while it is outside the refresh margin,
    /// otherwise fetches a new one.
    pub async fn bearer_token(&self) -> Result<String, AuthError> {
        Ok(self.access_token().await?.authorization_header())
    }

    /// Get a valid token entry, refreshing it if needed.
    pub async fn access_token(&self) -> Result<Arc<AccessToken>, AuthError> {
        if let Some(token) = self.fresh_cached_token() {
            debug!("Using cached access token");
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited for the lock.
        if let Some(token) = self.fresh_cached_token() {
            debug!("Access token refreshed by concurrent caller");
            return Ok(token);
        }

        self.fetch_and_store().await
    }

    /// Unconditionally request a new token and replace the cached entry.
    ///
    /// On failure the previous entry, if any, is left in place.
    pub async fn refresh_token(&self) -> Result<Arc<AccessToken>, AuthError> {
        let _guard = self.refresh_lock.lock().await;
        self.fetch_and_store().await
    }

    /// Discard the cached entry; the next [`bearer_token`](Self::bearer_token) call refreshes.
    ///
    /// Clearing does not cancel a refresh already in flight. A
    /// `bearer_token` call that queues behind that refresh is served the
    /// token it stores instead of issuing a separate request.
    pub fn clear_token(&self) {
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!("Cleared cached access token");
    }

    /// Token type of the cached entry, if any.
    pub fn token_type(&self) -> Option<String> {
        self.cached_token().map(|t| t.token_type().to_string())
    }

    /// Expiry of the cached entry, if any.
    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.cached_token().map(|t| t.expires_at())
    }

    /// Currently cached entry regardless of freshness.
    pub fn cached_token(&self) -> Option<Arc<AccessToken>> {
        self.cached
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Margin before expiry at which a cached token is no longer served.
    pub fn refresh_margin(&self) -> Duration {
        self.refresh_margin
    }

    fn fresh_cached_token(&self) -> Option<Arc<AccessToken>> {
        self.cached_token()
            .filter(|token| !token.expires_soon(self.refresh_margin))
    }

    #[instrument(skip(self), fields(client_id = %self.credentials.client_id()))]
    async fn fetch_and_store(&self) -> Result<Arc<AccessToken>, AuthError> {
        let response = match self.endpoint.request_token(&self.credentials).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, transient = e.is_transient(), "Access token refresh failed");
                return Err(e);
            }
        };

        let token = Arc::new(response.into_access_token(Utc::now())?);
        *self.cached.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&token));

        info!(
            token_type = %token.token_type(),
            expires_at = %token.expires_at(),
            "Refreshed access token"
        );

        Ok(token)
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("credentials", &self.credentials)
            .field("refresh_margin", &self.refresh_margin)
            .field("cached", &self.cached_token())
            .finish()
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
