//! Webhooks resource (`/webhooks`).
//!
//! Registers delivery endpoints and the shared secret the platform signs
//! deliveries with. Incoming deliveries are checked with
//! [`crate::webhook::SignatureVerifier`].

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use super::{decode_page, list_query, validate_id};
use crate::client::{ApiBase, Page, ZaiClient};
use crate::error::{Error, ValidationError};

const ENVELOPE: &str = "webhooks";

/// Shortest secret the platform accepts for signing deliveries.
pub const MIN_SECRET_KEY_LENGTH: usize = 32;

/// Registered webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    /// Webhook identifier
    #[serde(alias = "uuid")]
    pub id: String,

    /// Delivery URL
    pub url: String,

    /// Object type the webhook fires for, e.g. `transactions`
    pub object_type: String,

    /// Whether deliveries are enabled
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,

    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Request to register a webhook.
#[derive(Debug, Clone, Serialize)]
pub struct CreateWebhookRequest {
    /// Delivery URL (https, or http for localhost)
    pub url: String,

    /// Object type to subscribe to
    pub object_type: String,

    /// Whether deliveries start enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CreateWebhookRequest {
    /// Create a request with the required fields.
    pub fn new(url: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            object_type: object_type.into(),
            enabled: None,
            description: None,
        }
    }

    /// Check the request before it is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_url(&self.url)?;
        validate_object_type(&self.object_type)
    }
}

/// Request to update a webhook. Only fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWebhookRequest {
    /// Delivery URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Object type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,

    /// Whether deliveries are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdateWebhookRequest {
    /// Check the request before it is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = &self.url {
            validate_url(url)?;
        }
        if let Some(object_type) = &self.object_type {
            validate_object_type(object_type)?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SecretKeyRequest<'a> {
    secret_key: &'a str,
}

/// Operations on `/webhooks`.
#[derive(Debug, Clone, Copy)]
pub struct Webhooks<'a> {
    client: &'a ZaiClient,
}

impl<'a> Webhooks<'a> {
    pub(crate) fn new(client: &'a ZaiClient) -> Self {
        Self { client }
    }

    /// List webhooks.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<Page<Webhook>, Error> {
        let query = list_query(limit, offset)?;
        let response = self.client.get(ApiBase::Core, "/webhooks", &query).await?;
        Ok(decode_page(&response, ENVELOPE, limit, offset)?)
    }

    /// Get a webhook by id.
    pub async fn show(&self, id: &str) -> Result<Webhook, Error> {
        validate_id("id", id)?;
        let response = self
            .client
            .get(ApiBase::Core, &format!("/webhooks/{}", id), &[])
            .await?;
        Ok(response.envelope(ENVELOPE)?)
    }

    /// Register a webhook.
    pub async fn create(&self, request: &CreateWebhookRequest) -> Result<Webhook, Error> {
        request.validate()?;
        let response = self
            .client
            .post(ApiBase::Core, "/webhooks", request)
            .await?;
        let webhook: Webhook = response.envelope(ENVELOPE)?;
        info!(webhook_id = %webhook.id, object_type = %webhook.object_type, "Registered webhook");
        Ok(webhook)
    }

    /// Update a webhook.
    pub async fn update(&self, id: &str, request: &UpdateWebhookRequest) -> Result<Webhook, Error> {
        validate_id("id", id)?;
        request.validate()?;
        let response = self
            .client
            .patch(ApiBase::Core, &format!("/webhooks/{}", id), request)
            .await?;
        Ok(response.envelope(ENVELOPE)?)
    }

    /// Delete a webhook.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        validate_id("id", id)?;
        self.client
            .delete(ApiBase::Core, &format!("/webhooks/{}", id))
            .await?;
        info!(webhook_id = %id, "Deleted webhook");
        Ok(())
    }

    /// Register the secret the platform signs deliveries with.
    ///
    /// The same secret must be added to the local
    /// [`SecretKeyRegistry`](crate::webhook::SecretKeyRegistry) to verify
    /// deliveries.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if the secret is shorter than
    /// [`MIN_SECRET_KEY_LENGTH`] or contains non-ASCII characters.
    pub async fn register_secret_key(&self, secret_key: &str) -> Result<(), Error> {
        if !secret_key.is_ascii() || secret_key.len() < MIN_SECRET_KEY_LENGTH {
            return Err(ValidationError::InvalidFormat {
                field: "secret_key".to_string(),
                message: format!(
                    "must be at least {} ASCII characters",
                    MIN_SECRET_KEY_LENGTH
                ),
            }
            .into());
        }

        self.client
            .post(
                ApiBase::Core,
                "/webhooks/secret_key",
                &SecretKeyRequest { secret_key },
            )
            .await?;
        info!("Registered webhook secret key");
        Ok(())
    }
}

fn validate_url(raw: &str) -> Result<(), ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "url".to_string(),
        });
    }

    let invalid = |message: &str| ValidationError::InvalidFormat {
        field: "url".to_string(),
        message: message.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    let is_local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));

    match url.scheme() {
        "https" => Ok(()),
        "http" if is_local => Ok(()),
        _ => Err(invalid("must be an https URL")),
    }
}

fn validate_object_type(object_type: &str) -> Result<(), ValidationError> {
    if object_type.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "object_type".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "webhooks_tests.rs"]
mod tests;
