//! HTTP implementation of the token endpoint.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::{ClientCredentials, TokenEndpoint, TokenResponse};
use crate::client::build_http_client;
use crate::config::ZaiConfig;
use crate::error::{extract_error_message, AuthError, ConfigError, NetworkError};

const TOKEN_PATH: &str = "tokens";
const GRANT_TYPE: &str = "client_credentials";

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    scope: &'a str,
}

/// Token endpoint reached over HTTP: `POST <auth_base>/tokens`.
#[derive(Clone)]
pub struct HttpTokenEndpoint {
    http_client: reqwest::Client,
    token_url: String,
}

impl HttpTokenEndpoint {
    /// Create an endpoint for the configured auth server, honouring its timeouts.
    pub fn new(config: &ZaiConfig) -> Result<Self, ConfigError> {
        let http_client = build_http_client(config)?;
        Ok(Self::with_client(http_client, config.auth_base_url()))
    }

    /// Create an endpoint from an existing HTTP client.
    pub fn with_client(http_client: reqwest::Client, auth_base_url: &str) -> Self {
        let token_url = format!("{}/{}", auth_base_url.trim_end_matches('/'), TOKEN_PATH);
        Self {
            http_client,
            token_url,
        }
    }

    /// Full URL token requests are sent to.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenEndpoint for HttpTokenEndpoint {
    #[instrument(skip(self, credentials), fields(client_id = %credentials.client_id()))]
    async fn request_token(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<TokenResponse, AuthError> {
        let body = TokenRequest {
            grant_type: GRANT_TYPE,
            client_id: credentials.client_id(),
            client_secret: credentials.client_secret(),
            scope: credentials.scope(),
        };

        let response = self
            .http_client
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(NetworkError::from_reqwest)?;

        let status = response.status();
        let text = response.text().await.map_err(NetworkError::from_reqwest)?;

        if !status.is_success() {
            let message = extract_error_message(&text)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            warn!(status = status.as_u16(), "Token endpoint rejected the request");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), "Token endpoint responded");

        serde_json::from_str::<TokenResponse>(&text).map_err(|e| AuthError::InvalidResponse {
            message: format!("Failed to parse token response: {}", e),
        })
    }
}

impl std::fmt::Debug for HttpTokenEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTokenEndpoint")
            .field("token_url", &self.token_url)
            .finish()
    }
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
