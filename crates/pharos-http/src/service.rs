//! The HTTP service contract.

use async_trait::async_trait;

use crate::handler::ArcHandler;

/// A component exposing a request handler mounted at a fixed path prefix.
///
/// One instance lives for the whole server lifetime. The server strips the
/// prefix segment before invoking the handler, so a service sees paths
/// relative to its mount point and may run its own
/// [`shift_path`](crate::shift_path) sub-routing.
///
/// A service declaring the empty prefix becomes the root fallback: it
/// receives any request whose first segment matches no other mount, with the
/// original path reconstructed.
#[async_trait]
pub trait Service: Send + Sync {
    /// The mount path segment. Empty string mounts at the root.
    fn prefix(&self) -> &str;

    /// Returns the service's request handler.
    fn handler(&self) -> ArcHandler;

    /// Releases resources held by the service.
    ///
    /// Called once per instance at shutdown. Must be idempotent; a failure is
    /// logged by the server and never blocks closing sibling services.
    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
