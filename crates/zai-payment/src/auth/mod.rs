//! OAuth2 client-credentials authentication.
//!
//! This module provides:
//! - Token types ([`AccessToken`], [`TokenResponse`])
//! - The [`TokenEndpoint`] seam and its HTTP implementation
//! - [`TokenProvider`], a single-entry token cache with refresh-before-expiry
//! - [`TokenFacade`] and the process-wide [`global`] instance
//!
//! # Examples
//!
//! ```rust,no_run
//! use zai_payment::auth::TokenProvider;
//! use zai_payment::config::{Environment, ZaiConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ZaiConfig::new(Environment::Prelive, "client-id", "client-secret", "scope");
//! let provider = TokenProvider::new(&config)?;
//!
//! // First call fetches a token, later calls reuse it until it nears expiry.
//! let header = provider.bearer_token().await?;
//! assert!(header.starts_with("Bearer "));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ZaiConfig;
use crate::error::{AuthError, ConfigError};

mod endpoint;
mod facade;
mod provider;

pub use endpoint::HttpTokenEndpoint;
pub use facade::{global, TokenFacade};
pub use provider::TokenProvider;

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

// ============================================================================
// Credentials
// ============================================================================

/// OAuth2 client credentials used for token requests.
///
/// The secret is never exposed in Debug output.
#[derive(Clone)]
pub struct ClientCredentials {
    client_id: String,
    client_secret: String,
    scope: String,
}

impl ClientCredentials {
    /// Create credentials, rejecting empty values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` naming the first empty value.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let credentials = Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scope: scope.into(),
        };

        for (field, value) in [
            ("client_id", &credentials.client_id),
            ("client_secret", &credentials.client_secret),
            ("scope", &credentials.scope),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        Ok(credentials)
    }

    /// Extract credentials from a configuration.
    pub fn from_config(config: &ZaiConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.scope.clone(),
        )
    }

    /// Get the client identifier.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the client secret (only for building the token request).
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Get the requested scope.
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

// Security: Don't expose the secret in debug output
impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .field("scope", &self.scope)
            .finish()
    }
}

// ============================================================================
// Token Types
// ============================================================================

/// Body returned by the token endpoint.
///
/// The expiry is given either as `expires_in` (seconds from now) or as an
/// absolute `expires_at` unix timestamp.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl TokenResponse {
    /// Build a response with a relative expiry.
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some(token_type.into()),
            expires_in: Some(expires_in),
            expires_at: None,
        }
    }

    /// Convert into a cache entry, resolving the expiry relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResponse` if the token is empty or no
    /// usable expiry is present.
    pub fn into_access_token(self, now: DateTime<Utc>) -> Result<AccessToken, AuthError> {
        if self.access_token.trim().is_empty() {
            return Err(AuthError::InvalidResponse {
                message: "access_token is empty".to_string(),
            });
        }

        let expires_at = match (self.expires_in, self.expires_at) {
            (Some(seconds), _) if seconds > 0 => Duration::try_seconds(seconds)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .ok_or_else(|| AuthError::InvalidResponse {
                    message: format!("expires_in is out of range: {}", seconds),
                })?,
            (Some(seconds), _) => {
                return Err(AuthError::InvalidResponse {
                    message: format!("expires_in must be positive, got {}", seconds),
                })
            }
            (None, Some(timestamp)) => {
                DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
                    AuthError::InvalidResponse {
                        message: format!("expires_at is not a valid timestamp: {}", timestamp),
                    }
                })?
            }
            (None, None) => {
                return Err(AuthError::InvalidResponse {
                    message: "response carries neither expires_in nor expires_at".to_string(),
                })
            }
        };

        let token_type = self
            .token_type
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string());

        Ok(AccessToken::new(self.access_token, token_type, expires_at))
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<REDACTED>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Cached bearer token with its absolute expiry.
///
/// Instances are immutable; a refresh replaces the whole entry.
///
/// # Examples
///
/// ```
/// use zai_payment::auth::AccessToken;
/// use chrono::{Utc, Duration};
///
/// let token = AccessToken::new("abc", "Bearer", Utc::now() + Duration::hours(1));
///
/// assert_eq!(token.authorization_header(), "Bearer abc");
/// assert!(!token.expires_soon(Duration::minutes(5)));
/// ```
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    token_type: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a new cache entry.
    pub fn new(
        token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            token: token.into(),
            token_type: token_type.into(),
            issued_at: Utc::now(),
            expires_at,
        }
    }

    /// Get the raw access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Get the token type, typically `Bearer`.
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// Get when this entry was created.
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    /// Get when this token expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the token is currently expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Check if the token will expire within `margin`.
    ///
    /// A margin reaching past the representable time range counts as expiring.
    pub fn expires_soon(&self, margin: Duration) -> bool {
        Utc::now()
            .checked_add_signed(margin)
            .map_or(true, |deadline| deadline >= self.expires_at)
    }

    /// Value for the `Authorization` header: `<token_type> <access_token>`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

// Security: Don't expose token in debug output
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

// ============================================================================
// Trait Interfaces
// ============================================================================

/// Source of fresh access tokens.
///
/// [`HttpTokenEndpoint`] is the production implementation; tests substitute
/// their own to count or fail requests.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Perform one client-credentials token request.
    async fn request_token(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<TokenResponse, AuthError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
