//! Test fixtures for Pharos development and testing.
//!
//! This module provides a deterministic in-memory token manager and identity
//! helpers used in tests across the workspace.
//!
//! # Example
//!
//! ```
//! use pharos_core::fixtures;
//!
//! let manager = fixtures::StaticTokenManager::with_token("tok", fixtures::demo_user());
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::identity::User;
use crate::token::{TokenError, TokenManager};

/// Returns a deterministic demo identity.
#[must_use]
pub fn demo_user() -> User {
    User::new("https://idp.example.org", "u-demo", "demo-subject", "demo")
}

/// An in-memory token manager backed by a fixed token → user table.
///
/// Any token not in the table is rejected. Useful wherever a real manager
/// (JWT, opaque introspection) would be overkill.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenManager {
    tokens: HashMap<String, User>,
}

impl StaticTokenManager {
    /// Creates an empty manager that rejects every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager accepting a single token.
    #[must_use]
    pub fn with_token(token: impl Into<String>, user: User) -> Self {
        let mut tokens = HashMap::new();
        tokens.insert(token.into(), user);
        Self { tokens }
    }

    /// Adds another accepted token.
    #[must_use]
    pub fn and_token(mut self, token: impl Into<String>, user: User) -> Self {
        self.tokens.insert(token.into(), user);
        self
    }
}

#[async_trait]
impl TokenManager for StaticTokenManager {
    async fn dismantle_token(&self, token: &str) -> Result<User, TokenError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| TokenError::InvalidToken("unknown token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_manager_rejects() {
        let manager = StaticTokenManager::new();
        assert!(manager.dismantle_token("anything").await.is_err());
    }

    #[tokio::test]
    async fn test_and_token_accumulates() {
        let manager = StaticTokenManager::with_token("a", demo_user())
            .and_token("b", User::new("idp", "u-2", "sub-2", "bob"));

        assert_eq!(manager.dismantle_token("a").await.unwrap(), demo_user());
        assert_eq!(
            manager.dismantle_token("b").await.unwrap().username,
            "bob"
        );
    }
}
