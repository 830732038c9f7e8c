//! Authenticated HTTP client for the Zai REST APIs.
//!
//! [`ZaiClient`] sends requests to either the core API or the
//! virtual-account API ([`ApiBase`]). Every request asks the shared
//! [`TokenProvider`] for the `Authorization` header, so a long-lived client
//! picks up refreshed tokens without being rebuilt.
//!
//! Non-success statuses are mapped to [`ApiError`] by status code, and
//! transport failures to [`NetworkError`].

mod response;

use std::sync::Arc;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::auth::{self, TokenProvider};
use crate::config::ZaiConfig;
use crate::error::{ApiError, AuthError, ConfigError, Error, NetworkError};
use crate::resources::{Users, Webhooks};

pub use response::{ApiResponse, ListMeta, Page};

/// Build the HTTP client used for both token and resource requests.
///
/// Applies the overall, connection-open and read timeouts from `config`.
pub(crate) fn build_http_client(config: &ZaiConfig) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.open_timeout)
        .read_timeout(config.read_timeout)
        .user_agent(concat!("zai-payment/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            field: "http_client".to_string(),
            message: format!("Failed to create HTTP client: {}", e),
        })
}

/// Which API a request is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiBase {
    /// Core payments API (users, webhooks, items, ...).
    Core,
    /// Virtual-account API.
    VirtualAccounts,
}

/// Client for the Zai REST APIs.
///
/// # Examples
///
/// ```rust,no_run
/// use zai_payment::client::{ApiBase, ZaiClient};
/// use zai_payment::config::{Environment, ZaiConfig};
///
/// # async fn example() -> Result<(), zai_payment::Error> {
/// let config = ZaiConfig::new(Environment::Prelive, "id", "secret", "scope");
/// let client = ZaiClient::new(config)?;
///
/// let page = client.users().list(10, 0).await?;
/// for user in page.items {
///     println!("{}", user.id);
/// }
///
/// let raw = client.get(ApiBase::Core, "/users", &[("limit", "1".to_string())]).await?;
/// println!("{}", raw.status());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ZaiClient {
    http_client: reqwest::Client,
    tokens: Arc<TokenProvider>,
    config: ZaiConfig,
}

impl ZaiClient {
    /// Create a client with its own token provider.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid. No network call
    /// is made.
    pub fn new(config: ZaiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tokens = Arc::new(TokenProvider::new(&config)?);
        Self::with_token_provider(config, tokens)
    }

    /// Create a client that shares an existing token provider.
    pub fn with_token_provider(
        config: ZaiConfig,
        tokens: Arc<TokenProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let http_client = build_http_client(&config)?;
        Ok(Self {
            http_client,
            tokens,
            config,
        })
    }

    /// Create a client from the process-wide configuration and token provider.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if [`auth::global`] has not been
    /// configured.
    pub fn from_global() -> Result<Self, ConfigError> {
        let facade = auth::global();
        let config = facade.config().ok_or(ConfigError::NotConfigured)?;
        let tokens = facade.provider()?;
        Self::with_token_provider(config, tokens)
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ZaiConfig {
        &self.config
    }

    /// Get the token provider used for `Authorization` headers.
    pub fn token_provider(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    /// Base URL (without trailing slash) for an API.
    pub fn base_url(&self, base: ApiBase) -> &str {
        match base {
            ApiBase::Core => self.config.core_base_url(),
            ApiBase::VirtualAccounts => self.config.va_base_url(),
        }
    }

    /// Users resource.
    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// Webhooks resource.
    pub fn webhooks(&self) -> Webhooks<'_> {
        Webhooks::new(self)
    }

    /// Send an authenticated GET request.
    ///
    /// # Errors
    ///
    /// - `Error::Auth` if no token could be obtained
    /// - `Error::Network` for timeouts and connection failures
    /// - `Error::Api` for non-success statuses and undecodable bodies
    pub async fn get(
        &self,
        base: ApiBase,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, Error> {
        self.send::<()>(Method::GET, base, path, query, None).await
    }

    /// Send an authenticated POST request with a JSON body.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        base: ApiBase,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        self.send(Method::POST, base, path, &[], Some(body)).await
    }

    /// Send an authenticated PATCH request with a JSON body.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        base: ApiBase,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, Error> {
        self.send(Method::PATCH, base, path, &[], Some(body)).await
    }

    /// Send an authenticated DELETE request.
    pub async fn delete(&self, base: ApiBase, path: &str) -> Result<ApiResponse, Error> {
        self.send::<()>(Method::DELETE, base, path, &[], None).await
    }

    #[instrument(skip(self, query, body))]
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        base: ApiBase,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<ApiResponse, Error> {
        let url = format!("{}/{}", self.base_url(base), path.trim_start_matches('/'));

        // Fetched per request so an expired token is replaced transparently.
        let authorization = self.tokens.bearer_token().await?;
        let mut authorization =
            HeaderValue::from_str(&authorization).map_err(|_| AuthError::InvalidResponse {
                message: "Access token contains characters not allowed in a header".to_string(),
            })?;
        authorization.set_sensitive(true);

        let mut request = self
            .http_client
            .request(method, &url)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json");

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(NetworkError::from_reqwest)?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(NetworkError::from_reqwest)?;

        if !(200..300).contains(&status) {
            let error = ApiError::from_status(status, &headers, &text);
            warn!(status, error = %error, "Zai API request failed");

            if status == 401 {
                // The cached token was refused; fetch a new one next time.
                self.tokens.clear_token();
            }
            return Err(error.into());
        }

        debug!(status, "Zai API request succeeded");
        Ok(ApiResponse::from_text(status, headers, &text)?)
    }
}

impl std::fmt::Debug for ZaiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZaiClient")
            .field("environment", &self.config.environment)
            .field("core_base_url", &self.config.core_base_url())
            .field("va_base_url", &self.config.va_base_url())
            .field("tokens", &"<TokenProvider>")
            .finish()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
