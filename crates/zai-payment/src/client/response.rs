//! Decoded API responses.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Successful API response with its body parsed as JSON.
///
/// Resources declare the envelope key their payload lives under and decode
/// it with [`envelope`](Self::envelope):
///
/// ```rust
/// use zai_payment::client::ApiResponse;
/// use reqwest::header::HeaderMap;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Webhook { id: String }
///
/// let body = serde_json::json!({"webhooks": {"id": "wh_1"}});
/// let response = ApiResponse::new(200, HeaderMap::new(), body);
///
/// let webhook: Webhook = response.envelope("webhooks").unwrap();
/// assert_eq!(webhook.id, "wh_1");
/// ```
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: u16,
    headers: HeaderMap,
    body: serde_json::Value,
}

impl ApiResponse {
    /// Create a response from already parsed parts.
    pub fn new(status: u16, headers: HeaderMap, body: serde_json::Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Parse a raw body. An empty body becomes `null`.
    pub(crate) fn from_text(status: u16, headers: HeaderMap, text: &str) -> Result<Self, ApiError> {
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(text).map_err(|e| ApiError::Decode {
                message: format!("Response body is not valid JSON: {}", e),
            })?
        };

        Ok(Self::new(status, headers, body))
    }

    /// HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Parsed JSON body.
    pub fn body(&self) -> &serde_json::Value {
        &self.body
    }

    /// Take ownership of the parsed body.
    pub fn into_body(self) -> serde_json::Value {
        self.body
    }

    /// Decode the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the key is absent or its value does not
    /// match `T`.
    pub fn envelope<T: DeserializeOwned>(&self, key: &str) -> Result<T, ApiError> {
        let value = self.body.get(key).ok_or_else(|| ApiError::Decode {
            message: format!("Response has no '{}' envelope", key),
        })?;

        T::deserialize(value).map_err(|e| ApiError::Decode {
            message: format!("Failed to decode '{}' envelope: {}", key, e),
        })
    }

    /// Decode the whole body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        T::deserialize(&self.body).map_err(|e| ApiError::Decode {
            message: format!("Failed to decode response body: {}", e),
        })
    }

    /// List metadata (`meta` object), if the response carries one.
    pub fn meta(&self) -> Option<ListMeta> {
        self.body
            .get("meta")
            .and_then(|meta| ListMeta::deserialize(meta).ok())
    }
}

/// Paging metadata returned alongside list responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    /// Page size used by the server.
    #[serde(default)]
    pub limit: u32,

    /// Number of records skipped.
    #[serde(default)]
    pub offset: u32,

    /// Total number of records, when reported.
    #[serde(default)]
    pub total: Option<u64>,
}

/// One page of a list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,

    /// Paging metadata (defaults when the server omits it).
    pub meta: ListMeta,
}

impl<T> Page<T> {
    /// Check if more records exist after this page.
    ///
    /// Without a reported total, a full page is taken to mean there may be more.
    pub fn has_more(&self) -> bool {
        let seen = u64::from(self.meta.offset) + self.items.len() as u64;
        match self.meta.total {
            Some(total) => seen < total,
            None => self.meta.limit > 0 && self.items.len() as u64 >= u64::from(self.meta.limit),
        }
    }

    /// Offset to request the following page with.
    pub fn next_offset(&self) -> u32 {
        self.meta
            .offset
            .saturating_add(u32::try_from(self.items.len()).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
