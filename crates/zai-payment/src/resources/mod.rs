//! Typed wrappers over Zai REST resources.
//!
//! Each resource validates its input before any request is sent and decodes
//! responses from the envelope key it declares, e.g. `users` or `webhooks`.

mod users;
mod webhooks;

use serde::de::DeserializeOwned;

use crate::client::{ApiResponse, ListMeta, Page};
use crate::error::{ApiError, ValidationError};

pub use users::{CreateUserRequest, UpdateUserRequest, User, Users};
pub use webhooks::{
    CreateWebhookRequest, UpdateWebhookRequest, Webhook, Webhooks, MIN_SECRET_KEY_LENGTH,
};

/// Largest page size list endpoints accept.
pub const MAX_PAGE_LIMIT: u32 = 200;

/// Check a path identifier before it is placed in a URL.
pub(crate) fn validate_id(field: &str, id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            message: "must not contain whitespace or URL delimiters".to_string(),
        });
    }

    Ok(())
}

/// Paging parameters shared by list endpoints.
pub(crate) fn list_query(
    limit: u32,
    offset: u32,
) -> Result<Vec<(&'static str, String)>, ValidationError> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            message: format!("must be between 1 and {}", MAX_PAGE_LIMIT),
        });
    }

    Ok(vec![("limit", limit.to_string()), ("offset", offset.to_string())])
}

/// Decode a list envelope, falling back to the requested paging when the
/// response has no `meta` object.
pub(crate) fn decode_page<T: DeserializeOwned>(
    response: &ApiResponse,
    key: &str,
    limit: u32,
    offset: u32,
) -> Result<Page<T>, ApiError> {
    let items = response.envelope::<Vec<T>>(key)?;
    let meta = response.meta().unwrap_or(ListMeta {
        limit,
        offset,
        total: None,
    });

    Ok(Page { items, meta })
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
