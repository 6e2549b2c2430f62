//! Token manager contract.
//!
//! A token manager is the external collaborator able to validate a bearer
//! token and produce a verified [`User`], or fail. Its internals (signing,
//! key handling, revocation) are out of scope here; the auth interceptors
//! only rely on this boundary.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::User;
use crate::registry::Registry;

/// Errors produced by a token manager.
///
/// Callers enforcing authentication must not surface these details to the
/// remote peer; they map any variant to a generic unauthenticated status.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token could not be dismantled into an identity.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The manager could not be constructed from its configuration.
    #[error("token manager configuration error: {0}")]
    Config(String),
}

/// Capability to dismantle a bearer token into a verified identity.
///
/// Validation may involve network or cryptographic I/O, hence async.
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Validates `token` and returns the identity it encodes.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] when the token is expired,
    /// malformed, or otherwise rejected.
    async fn dismantle_token(&self, token: &str) -> Result<User, TokenError>;
}

/// Constructor signature token managers register under a name.
///
/// The opaque configuration blob is whatever the server configuration carried
/// for that manager name.
pub type NewTokenManager =
    Arc<dyn Fn(&serde_json::Value) -> Result<Arc<dyn TokenManager>, TokenError> + Send + Sync>;

/// Registry of token manager constructors, keyed by manager name.
pub type TokenManagerRegistry = Registry<NewTokenManager>;
