//! Users resource (`/users`).

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{decode_page, list_query, validate_id};
use crate::client::{ApiBase, Page, ZaiClient};
use crate::error::{Error, ValidationError};

const ENVELOPE: &str = "users";

/// Platform user (payin or payout party).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: String,

    /// Email address
    #[serde(default)]
    pub email: Option<String>,

    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,

    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,

    /// Full name as stored by the platform
    #[serde(default)]
    pub full_name: Option<String>,

    /// Mobile number
    #[serde(default)]
    pub mobile: Option<String>,

    /// Phone number
    #[serde(default)]
    pub phone: Option<String>,

    /// ISO 3166-1 alpha-3 country code
    #[serde(default)]
    pub country: Option<String>,

    /// Date of birth (DD/MM/YYYY)
    #[serde(default)]
    pub dob: Option<String>,

    /// KYC verification state
    #[serde(default)]
    pub verification_state: Option<String>,

    /// Whether the user is held pending review
    #[serde(default)]
    pub held_state: Option<bool>,

    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,

    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Request to create a user.
///
/// `first_name` and `email` are required.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateUserRequest {
    /// Caller-chosen identifier; the platform assigns one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Given name
    pub first_name: String,

    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Email address
    pub email: String,

    /// Mobile number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,

    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// ISO 3166-1 alpha-3 country code, e.g. `AUS`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Date of birth (DD/MM/YYYY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
}

impl CreateUserRequest {
    /// Create a request with the required fields.
    pub fn new(first_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Check the request before it is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(id) = &self.id {
            validate_id("id", id)?;
        }
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "first_name".to_string(),
            });
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "email".to_string(),
            });
        }
        validate_email(&self.email)?;
        if let Some(country) = &self.country {
            validate_country(country)?;
        }
        Ok(())
    }
}

/// Request to update a user. Only fields that are set are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserRequest {
    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Mobile number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,

    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// ISO 3166-1 alpha-3 country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    /// Date of birth (DD/MM/YYYY)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
}

impl UpdateUserRequest {
    /// Check the request before it is sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(first_name) = &self.first_name {
            if first_name.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "first_name".to_string(),
                });
            }
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(country) = &self.country {
            validate_country(country)?;
        }
        Ok(())
    }
}

/// Operations on `/users`.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a ZaiClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a ZaiClient) -> Self {
        Self { client }
    }

    /// List users.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `limit` is outside `1..=200`.
    pub async fn list(&self, limit: u32, offset: u32) -> Result<Page<User>, Error> {
        let query = list_query(limit, offset)?;
        let response = self.client.get(ApiBase::Core, "/users", &query).await?;
        Ok(decode_page(&response, ENVELOPE, limit, offset)?)
    }

    /// Get a user by id.
    pub async fn show(&self, id: &str) -> Result<User, Error> {
        validate_id("id", id)?;
        let response = self
            .client
            .get(ApiBase::Core, &format!("/users/{}", id), &[])
            .await?;
        Ok(response.envelope(ENVELOPE)?)
    }

    /// Create a user.
    pub async fn create(&self, request: &CreateUserRequest) -> Result<User, Error> {
        request.validate()?;
        let response = self.client.post(ApiBase::Core, "/users", request).await?;
        let user: User = response.envelope(ENVELOPE)?;
        debug!(user_id = %user.id, "Created user");
        Ok(user)
    }

    /// Update a user.
    pub async fn update(&self, id: &str, request: &UpdateUserRequest) -> Result<User, Error> {
        validate_id("id", id)?;
        request.validate()?;
        let response = self
            .client
            .patch(ApiBase::Core, &format!("/users/{}", id), request)
            .await?;
        Ok(response.envelope(ENVELOPE)?)
    }
}

/// A single `@` with non-empty local and domain parts, and no whitespace.
fn validate_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        message: "must be an address of the form local@domain".to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

fn validate_country(country: &str) -> Result<(), ValidationError> {
    if country.len() == 3 && country.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "country".to_string(),
            message: "must be a 3-letter uppercase ISO 3166-1 code".to_string(),
        })
    }
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
