//! Webhook signature verification.
//!
//! The platform signs every webhook delivery with a shared secret and sends
//! the result in the [`SIGNATURE_HEADER`] header. Receivers verify it before
//! trusting the payload.
//!
//! # Core Components
//!
//! - [`SecretKeyRegistry`] - Named secrets, several of which may be active during rotation
//! - [`SignatureVerifier`] - Checks a payload and header against the registry
//! - [`SignatureHeader`] - Parsed `t=...,v=...` header value
//! - [`generate_signature`]/[`verify_signature`] - One-shot helpers
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use zai_payment::webhook::{SecretKeyRegistry, SignatureVerdict, SignatureVerifier};
//!
//! # fn handle(body: &[u8], header: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(SecretKeyRegistry::with_secret("whsec-shared-secret")?);
//! let verifier = SignatureVerifier::new(registry);
//!
//! match verifier.verify(body, header)? {
//!     SignatureVerdict::Valid { .. } => { /* process the event */ }
//!     SignatureVerdict::Mismatch => { /* reject: forged or unknown key */ }
//!     SignatureVerdict::OutsideTolerance { .. } => { /* reject: possible replay */ }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Errors (as opposed to verdicts) mean the header could not be checked at
//! all, e.g. it has no timestamp, or no secret has been registered.

pub mod keys;
pub mod signature;

pub use keys::{SecretKey, SecretKeyRegistry, DEFAULT_KEY_NAME};
pub use signature::{
    generate_signature, verify_signature, SignatureHeader, SignatureVerdict, SignatureVerifier,
    DEFAULT_TOLERANCE, SIGNATURE_HEADER,
};
