//! Verified caller identity.
//!
//! A [`User`] is what a token manager produces when it dismantles a bearer
//! token. The auth interceptors attach it to the per-call context; nothing in
//! this crate ever constructs one from unverified input.

use serde::{Deserialize, Serialize};

/// Stable identifier of a user within its identity provider.
///
/// The pair `(idp, opaque_id)` is unique across the federation: the `idp`
/// names the issuing identity provider and `opaque_id` is the provider's own
/// opaque handle for the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId {
    /// The identity provider (issuer) that vouches for this user.
    pub idp: String,

    /// Provider-scoped opaque identifier. Not meaningful outside the `idp`.
    pub opaque_id: String,
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.idp, self.opaque_id)
    }
}

/// A verified principal.
///
/// Produced exclusively by a [`TokenManager`](crate::TokenManager); carried on
/// the [`RequestContext`](crate::RequestContext) for the remainder of the
/// request once the auth layer has set it.
///
/// # Example
///
/// ```
/// use pharos_core::User;
///
/// let user = User::new("https://idp.example.org", "u-123", "alice", "alice");
/// assert_eq!(user.log_id(), "alice@https://idp.example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Issuer-scoped identifier.
    pub id: UserId,

    /// Token subject claim.
    pub subject: String,

    /// Human-readable display name.
    pub username: String,
}

impl User {
    /// Creates a new verified user.
    #[must_use]
    pub fn new(
        idp: impl Into<String>,
        opaque_id: impl Into<String>,
        subject: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId {
                idp: idp.into(),
                opaque_id: opaque_id.into(),
            },
            subject: subject.into(),
            username: username.into(),
        }
    }

    /// Returns a string identifier suitable for logging and span attributes.
    ///
    /// This never includes token material.
    #[must_use]
    pub fn log_id(&self) -> String {
        format!("{}@{}", self.username, self.id.idp)
    }
}
