//! Webhook secret key storage with rotation support.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use tracing::info;
use zeroize::Zeroizing;

use crate::error::SignatureError;

/// Slot used by [`SecretKeyRegistry::create_secret_key`].
pub const DEFAULT_KEY_NAME: &str = "default";

/// Webhook signing secret.
///
/// The bytes are wiped on drop and never appear in Debug output.
#[derive(Clone)]
pub struct SecretKey {
    bytes: Zeroizing<Vec<u8>>,
}

impl SecretKey {
    /// Wrap a secret, rejecting empty values.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(SignatureError::InvalidKey {
                message: "secret key must not be empty".to_string(),
            });
        }

        Ok(Self {
            bytes: Zeroizing::new(secret.to_vec()),
        })
    }

    /// Get the raw key bytes (only for immediate HMAC use).
    pub fn expose_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length without exposing content.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty keys cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey")
            .field("length", &self.len())
            .field("value", &"<REDACTED>")
            .finish()
    }
}

/// Named webhook secrets that signatures are verified against.
///
/// Every registered key is tried during verification, which allows a
/// zero-downtime rotation:
///
/// 1. `add_key("next", new_secret)` and start signing with the new secret
/// 2. wait until in-flight webhooks signed with the old secret are delivered
/// 3. `remove_key("default")`
///
/// [`create_secret_key`](Self::create_secret_key) overwrites the `default`
/// slot only; keys under other names are untouched.
///
/// # Examples
///
/// ```
/// use zai_payment::webhook::SecretKeyRegistry;
///
/// let registry = SecretKeyRegistry::new();
/// registry.create_secret_key("old-secret").unwrap();
/// registry.add_key("next", "new-secret").unwrap();
///
/// assert_eq!(registry.names(), vec!["default".to_string(), "next".to_string()]);
///
/// registry.remove_key("default");
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default)]
pub struct SecretKeyRegistry {
    keys: RwLock<BTreeMap<String, SecretKey>>,
}

impl SecretKeyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding a single default key.
    pub fn with_secret(secret: impl AsRef<[u8]>) -> Result<Self, SignatureError> {
        let registry = Self::new();
        registry.create_secret_key(secret)?;
        Ok(registry)
    }

    /// Register or overwrite the default key.
    pub fn create_secret_key(&self, secret: impl AsRef<[u8]>) -> Result<(), SignatureError> {
        self.add_key(DEFAULT_KEY_NAME, secret)
    }

    /// Register or overwrite a named key.
    pub fn add_key(
        &self,
        name: impl Into<String>,
        secret: impl AsRef<[u8]>,
    ) -> Result<(), SignatureError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SignatureError::InvalidKey {
                message: "key name must not be empty".to_string(),
            });
        }

        let key = SecretKey::new(secret)?;
        let replaced = self
            .keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), key)
            .is_some();

        info!(key = %name, replaced, "Registered webhook secret key");
        Ok(())
    }

    /// Remove a named key. Returns whether it was present.
    pub fn remove_key(&self, name: &str) -> bool {
        let removed = self
            .keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some();

        if removed {
            info!(key = %name, "Removed webhook secret key");
        }
        removed
    }

    /// Remove every key.
    pub fn clear(&self) {
        self.keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Names of registered keys, sorted.
    pub fn names(&self) -> Vec<String> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Check if no key is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the current keys, so verification does not hold the lock.
    pub(crate) fn snapshot(&self) -> Vec<(String, SecretKey)> {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, key)| (name.clone(), key.clone()))
            .collect()
    }
}

impl std::fmt::Debug for SecretKeyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKeyRegistry")
            .field("keys", &self.names())
            .finish()
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod tests;
