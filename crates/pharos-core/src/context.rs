//! Per-request context.
//!
//! The [`RequestContext`] is the explicit carrier for everything that rides
//! along with one request or call: the request id, the remote peer, and the
//! verified identity plus the raw token once authentication has run. It
//! replaces the untyped key/value context a handler chain would otherwise
//! smuggle state through.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::User;

/// A unique identifier for each request, using UUID v7.
///
/// UUID v7 is time-ordered, which makes it ideal for request tracking
/// and log correlation.
///
/// # Example
///
/// ```
/// use pharos_core::RequestId;
///
/// let id = RequestId::new();
/// println!("Request ID: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Creates a new unique request ID using UUID v7.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `RequestId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity/token pair attached by the auth layer.
#[derive(Debug, Clone)]
struct AuthInfo {
    user: User,
    token: String,
}

/// Per-request state threaded through the handler chain.
///
/// One context is created per inbound HTTP request or gRPC call and discarded
/// when it completes; contexts are never shared across requests. The identity
/// and token are write-once: the first [`authenticate`](Self::authenticate)
/// wins and later calls are ignored.
///
/// # Example
///
/// ```
/// use pharos_core::{RequestContext, User};
///
/// let mut ctx = RequestContext::new();
/// assert!(!ctx.is_authenticated());
///
/// let user = User::new("idp", "u-1", "sub", "alice");
/// ctx.authenticate(user, "tok-abc");
/// assert_eq!(ctx.token(), Some("tok-abc"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request.
    request_id: RequestId,

    /// Remote peer, when known.
    remote_addr: Option<SocketAddr>,

    /// When the request started processing.
    started_at: Instant,

    /// Verified identity and raw token, set once by the auth layer.
    auth: Option<AuthInfo>,
}

impl RequestContext {
    /// Creates a new request context with a fresh request ID.
    #[must_use]
    pub fn new() -> Self {
        Self::with_request_id(RequestId::new())
    }

    /// Creates a new request context with the specified request ID.
    #[must_use]
    pub fn with_request_id(request_id: RequestId) -> Self {
        Self {
            request_id,
            remote_addr: None,
            started_at: Instant::now(),
            auth: None,
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub const fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the remote peer address, if known.
    #[must_use]
    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Sets the remote peer address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Returns how long this request has been in flight.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Attaches the verified identity and raw token to this context.
    ///
    /// The pair is write-once: if the context is already authenticated the
    /// call is a no-op and `false` is returned. The token is stored unchanged
    /// so downstream layers can forward it.
    pub fn authenticate(&mut self, user: User, token: impl Into<String>) -> bool {
        if self.auth.is_some() {
            tracing::warn!(
                request_id = %self.request_id,
                "context already authenticated, keeping first identity"
            );
            return false;
        }
        self.auth = Some(AuthInfo {
            user,
            token: token.into(),
        });
        true
    }

    /// Returns the verified identity, if the auth layer has run.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.auth.as_ref().map(|a| &a.user)
    }

    /// Returns the raw bearer token, if the auth layer has run.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.auth.as_ref().map(|a| a.token.as_str())
    }

    /// Returns `true` when an identity has been attached.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_request_id_display_matches_uuid() {
        let id = RequestId::new();
        assert_eq!(id.to_string(), id.as_uuid().to_string());
    }

    #[test]
    fn test_new_context_unauthenticated() {
        let ctx = RequestContext::new();
        assert!(!ctx.is_authenticated());
        assert!(ctx.user().is_none());
        assert!(ctx.token().is_none());
    }

    #[test]
    fn test_authenticate_attaches_pair() {
        let mut ctx = RequestContext::new();
        let user = User::new("idp", "u-1", "sub", "alice");
        assert!(ctx.authenticate(user.clone(), "tok"));

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.user(), Some(&user));
        assert_eq!(ctx.token(), Some("tok"));
    }

    #[test]
    fn test_authenticate_first_wins() {
        let mut ctx = RequestContext::new();
        let alice = User::new("idp", "u-1", "sub", "alice");
        let mallory = User::new("idp", "u-2", "sub", "mallory");

        assert!(ctx.authenticate(alice.clone(), "tok-a"));
        assert!(!ctx.authenticate(mallory, "tok-m"));

        assert_eq!(ctx.user(), Some(&alice));
        assert_eq!(ctx.token(), Some("tok-a"));
    }

    #[test]
    fn test_with_remote_addr() {
        let addr: SocketAddr = "127.0.0.1:9998".parse().unwrap();
        let ctx = RequestContext::new().with_remote_addr(addr);
        assert_eq!(ctx.remote_addr(), Some(addr));
    }
}
