//! Constructor registries for HTTP components.

use std::sync::Arc;

use serde_json::Value;

use pharos_core::Registry;

use crate::handler::Middleware;
use crate::service::Service;

/// Constructor signature services register under a name.
///
/// The argument is the opaque configuration blob for that service name.
pub type NewService = Arc<dyn Fn(&Value) -> anyhow::Result<Box<dyn Service>> + Send + Sync>;

/// Constructor signature middlewares register under a name.
///
/// Returns the middleware together with its chain priority (higher runs
/// earlier).
pub type NewMiddleware = Arc<dyn Fn(&Value) -> anyhow::Result<(Middleware, i32)> + Send + Sync>;

/// The registries an HTTP server resolves enabled component names against.
///
/// Built once at process init and handed to every [`Server`](crate::Server)
/// by reference; tests construct isolated instances.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pharos_http::{HttpRegistry, Middleware, NewMiddleware};
///
/// let registry = HttpRegistry::new();
/// let ctor: NewMiddleware = Arc::new(|_conf| {
///     let noop: Middleware = Arc::new(|next| next);
///     Ok((noop, 10))
/// });
/// registry.register_middleware("noop", ctor);
/// assert!(registry.middlewares().contains("noop"));
/// ```
#[derive(Debug)]
pub struct HttpRegistry {
    services: Registry<NewService>,
    middlewares: Registry<NewMiddleware>,
}

impl HttpRegistry {
    /// Creates an empty registry pair.
    #[must_use]
    pub fn new() -> Self {
        Self {
            services: Registry::new("http service"),
            middlewares: Registry::new("http middleware"),
        }
    }

    /// Registers a service constructor under `name`.
    pub fn register_service(&self, name: impl Into<String>, constructor: NewService) {
        self.services.register(name, constructor);
    }

    /// Registers a middleware constructor under `name`.
    pub fn register_middleware(&self, name: impl Into<String>, constructor: NewMiddleware) {
        self.middlewares.register(name, constructor);
    }

    /// The service constructor registry.
    #[must_use]
    pub const fn services(&self) -> &Registry<NewService> {
        &self.services
    }

    /// The middleware constructor registry.
    #[must_use]
    pub const fn middlewares(&self) -> &Registry<NewMiddleware> {
        &self.middlewares
    }
}

impl Default for HttpRegistry {
    fn default() -> Self {
        Self::new()
    }
}
