//! # Zai Payment
//!
//! Client library for the Zai payments platform.
//!
//! This crate provides:
//! - OAuth2 client-credentials authentication with a cached, single-flight token provider
//! - An authenticated HTTP client for the core and virtual-account APIs
//! - Typed resources for users and webhooks
//! - Webhook signature generation and verification with key rotation
//!
//! # Examples
//!
//! ## Calling the API
//!
//! ```rust,no_run
//! use zai_payment::{Environment, ZaiClient, ZaiConfig};
//!
//! # async fn example() -> Result<(), zai_payment::Error> {
//! let config = ZaiConfig::new(Environment::Prelive, "client-id", "client-secret", "scope");
//! let client = ZaiClient::new(config)?;
//!
//! let user = client.users().show("user-1").await?;
//! println!("{:?}", user.email);
//! # Ok(())
//! # }
//! ```
//!
//! ## Loading configuration
//!
//! ```rust,no_run
//! use std::path::Path;
//! use zai_payment::ZaiConfig;
//!
//! // File values are overridden by ZAI__* environment variables.
//! let config = ZaiConfig::load(Some(Path::new("zai.yaml")))?;
//! # Ok::<(), zai_payment::error::ConfigError>(())
//! ```
//!
//! ## Verifying a webhook
//!
//! ```rust
//! use std::sync::Arc;
//! use zai_payment::webhook::{SecretKeyRegistry, SignatureHeader, SignatureVerifier};
//!
//! let registry = Arc::new(SecretKeyRegistry::with_secret("secret123").unwrap());
//! let verifier = SignatureVerifier::new(registry);
//!
//! let payload = br#"{"event":"ping"}"#;
//! let header = SignatureHeader::sign(payload, b"secret123", chrono::Utc::now().timestamp())
//!     .unwrap()
//!     .to_string();
//!
//! assert!(verifier.verify(payload, &header).unwrap().is_valid());
//! ```

// Public modules
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod resources;
pub mod webhook;

// Re-export commonly used types at crate root for convenience
pub use auth::{AccessToken, ClientCredentials, TokenFacade, TokenProvider};
pub use client::{ApiBase, ApiResponse, ZaiClient};
pub use config::{Environment, ZaiConfig};
pub use error::{
    ApiError, AuthError, ConfigError, Error, NetworkError, SignatureError, ValidationError,
};
pub use webhook::{SecretKeyRegistry, SignatureVerdict, SignatureVerifier};
