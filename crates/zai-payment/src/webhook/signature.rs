//! Webhook signature generation and verification.
//!
//! Signatures are HMAC-SHA256 over `"<timestamp>.<payload>"`, keyed with the
//! webhook secret and encoded as unpadded URL-safe base64. They are delivered
//! in a single header of the form:
//!
//! ```text
//! t=1700000000,v=<signature>[,v=<signature>...]
//! ```
//!
//! Several `v` components may be present while the platform signs with more
//! than one key. `v1` is accepted as an alias of `v`; unknown components are
//! ignored.
//!
//! # Security
//!
//! - Header structure is checked before any HMAC is computed
//! - Timestamps further than the tolerance from now, in either direction, are rejected
//! - Candidates are compared in constant time against every registered key
//! - Secrets and signature values are never logged

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use super::keys::{SecretKey, SecretKeyRegistry};
use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Name of the HTTP header carrying webhook signatures.
pub const SIGNATURE_HEADER: &str = "webhooks-signature";

/// Default replay window.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

const TIMESTAMP_KEY: &str = "t";
const SIGNATURE_KEYS: [&str; 2] = ["v", "v1"];

/// Compute the signature for a payload.
///
/// # Examples
///
/// ```
/// use zai_payment::webhook::generate_signature;
///
/// let a = generate_signature(br#"{"event":"ping"}"#, b"secret123", 1700000000).unwrap();
/// let b = generate_signature(br#"{"event":"ping"}"#, b"secret123", 1700000000).unwrap();
/// assert_eq!(a, b);
/// assert!(!a.contains('='));
/// ```
pub fn generate_signature(
    payload: &[u8],
    secret_key: &[u8],
    timestamp: i64,
) -> Result<String, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(secret_key).map_err(|e| SignatureError::InvalidKey {
            message: format!("Failed to create HMAC instance: {}", e),
        })?;

    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// One-shot verification against explicit keys using the wall clock.
///
/// Returns `Ok(true)` only when a candidate matches one of `secret_keys` and
/// the timestamp is within `tolerance`. Use [`SignatureVerifier`] when the
/// reason for a rejection matters.
///
/// # Errors
///
/// Returns `SignatureError` for malformed headers, an empty key list or
/// empty keys.
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret_keys: &[&[u8]],
    tolerance: Duration,
) -> Result<bool, SignatureError> {
    let header = SignatureHeader::parse(signature_header)?;

    let keys = secret_keys
        .iter()
        .enumerate()
        .map(|(i, secret)| Ok((format!("key-{}", i), SecretKey::new(secret)?)))
        .collect::<Result<Vec<_>, SignatureError>>()?;

    let verdict = evaluate(payload, &header, &keys, tolerance, Utc::now())?;
    Ok(verdict.is_valid())
}

// ============================================================================
// Signature Header
// ============================================================================

/// Parsed signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

impl SignatureHeader {
    /// Create a header from its components.
    pub fn new(timestamp: i64, signatures: Vec<String>) -> Self {
        Self {
            timestamp,
            signatures,
        }
    }

    /// Sign a payload and wrap the result in a header.
    pub fn sign(payload: &[u8], secret_key: &[u8], timestamp: i64) -> Result<Self, SignatureError> {
        let signature = generate_signature(payload, secret_key, timestamp)?;
        Ok(Self::new(timestamp, vec![signature]))
    }

    /// Parse a header value.
    ///
    /// Components are `key=value` pairs separated by commas and/or whitespace.
    ///
    /// # Errors
    ///
    /// - `MissingTimestamp` / `MissingSignature` when a component is absent
    /// - `InvalidTimestamp` when `t` is not plain decimal digits without a leading zero
    /// - `Malformed` for components without `=`, empty signatures or a repeated `t`
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        let mut timestamp: Option<i64> = None;
        let mut signatures = Vec::new();

        let parts = header
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|part| !part.is_empty());

        for part in parts {
            let (key, value) = part.split_once('=').ok_or_else(|| SignatureError::Malformed {
                message: "component is not a key=value pair".to_string(),
            })?;

            if key == TIMESTAMP_KEY {
                if timestamp.is_some() {
                    return Err(SignatureError::Malformed {
                        message: "timestamp appears more than once".to_string(),
                    });
                }
                timestamp = Some(parse_timestamp(value)?);
            } else if SIGNATURE_KEYS.contains(&key) {
                if value.is_empty() {
                    return Err(SignatureError::Malformed {
                        message: "signature component is empty".to_string(),
                    });
                }
                signatures.push(value.to_string());
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
        if signatures.is_empty() {
            return Err(SignatureError::MissingSignature);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }

    /// Unix timestamp (seconds) the payload was signed at.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Candidate signatures, in header order.
    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }
}

impl FromStr for SignatureHeader {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for SignatureHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", TIMESTAMP_KEY, self.timestamp)?;
        for signature in &self.signatures {
            write!(f, ",{}={}", SIGNATURE_KEYS[0], signature)?;
        }
        Ok(())
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Outcome of checking a well-formed header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureVerdict {
    /// A candidate matched the named key.
    Valid { key: String },
    /// No candidate matched any key.
    Mismatch,
    /// The timestamp is outside the replay window; signatures were not checked.
    OutsideTolerance { age: Duration },
}

impl SignatureVerdict {
    /// Check if the webhook should be accepted.
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Verifies webhook signatures against a shared key registry.
///
/// # Examples
///
/// ```
/// use zai_payment::webhook::{SecretKeyRegistry, SignatureHeader, SignatureVerifier};
/// use std::sync::Arc;
///
/// let registry = Arc::new(SecretKeyRegistry::with_secret("secret123").unwrap());
/// let verifier = SignatureVerifier::new(registry);
///
/// let payload = br#"{"event":"ping"}"#;
/// let now = chrono::Utc::now().timestamp();
/// let header = SignatureHeader::sign(payload, b"secret123", now).unwrap().to_string();
///
/// assert!(verifier.verify(payload, &header).unwrap().is_valid());
/// ```
#[derive(Clone)]
pub struct SignatureVerifier {
    keys: Arc<SecretKeyRegistry>,
    tolerance: Duration,
}

impl SignatureVerifier {
    /// Create a verifier with the default five-minute tolerance.
    pub fn new(keys: Arc<SecretKeyRegistry>) -> Self {
        Self {
            keys,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Set the replay window.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Get the replay window.
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Get the key registry.
    pub fn keys(&self) -> &Arc<SecretKeyRegistry> {
        &self.keys
    }

    /// Verify a payload against a raw header value using the wall clock.
    ///
    /// # Returns
    ///
    /// * `Ok(SignatureVerdict::Valid { .. })` - Accept the webhook
    /// * `Ok(SignatureVerdict::Mismatch)` - Wrong signature (tampered payload or unknown key)
    /// * `Ok(SignatureVerdict::OutsideTolerance { .. })` - Stale or future timestamp
    /// * `Err(SignatureError)` - Malformed header or no key registered
    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<SignatureVerdict, SignatureError> {
        self.verify_at(payload, signature_header, Utc::now())
    }

    /// Verify as of an explicit instant.
    pub fn verify_at(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> Result<SignatureVerdict, SignatureError> {
        let header = SignatureHeader::parse(signature_header)?;
        let keys = self.keys.snapshot();
        evaluate(payload, &header, &keys, self.tolerance, now)
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("keys", &self.keys)
            .field("tolerance", &self.tolerance)
            .finish()
    }
}

fn evaluate(
    payload: &[u8],
    header: &SignatureHeader,
    keys: &[(String, SecretKey)],
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<SignatureVerdict, SignatureError> {
    if keys.is_empty() {
        return Err(SignatureError::NoSecretKey);
    }

    let age_secs = (i128::from(now.timestamp()) - i128::from(header.timestamp())).unsigned_abs();
    if age_secs > u128::from(tolerance.as_secs()) {
        let age = Duration::from_secs(u64::try_from(age_secs).unwrap_or(u64::MAX));
        warn!(
            age_secs = age.as_secs(),
            tolerance_secs = tolerance.as_secs(),
            "Webhook timestamp outside tolerance"
        );
        return Ok(SignatureVerdict::OutsideTolerance { age });
    }

    // Every (candidate, key) pair is compared so timing does not reveal
    // which key or candidate matched.
    let mut matched: Option<&str> = None;
    for (name, key) in keys {
        let expected = generate_signature(payload, key.expose_bytes(), header.timestamp())?;
        for candidate in header.signatures() {
            let candidate = candidate.trim_end_matches('=');
            let equal: bool = candidate.as_bytes().ct_eq(expected.as_bytes()).into();
            if equal && matched.is_none() {
                matched = Some(name.as_str());
            }
        }
    }

    match matched {
        Some(name) => {
            debug!(key = %name, "Webhook signature verified");
            Ok(SignatureVerdict::Valid {
                key: name.to_string(),
            })
        }
        None => {
            warn!(
                candidates = header.signatures().len(),
                keys = keys.len(),
                "Webhook signature mismatch"
            );
            Ok(SignatureVerdict::Mismatch)
        }
    }
}

/// Timestamps are canonical decimal: digits only, no sign, no leading zero.
fn parse_timestamp(value: &str) -> Result<i64, SignatureError> {
    let canonical = !value.is_empty()
        && value.bytes().all(|b| b.is_ascii_digit())
        && (value == "0" || !value.starts_with('0'));
    if !canonical {
        return Err(SignatureError::InvalidTimestamp);
    }
    value
        .parse::<i64>()
        .map_err(|_| SignatureError::InvalidTimestamp)
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
