//! Server configuration.
//!
//! The server receives one opaque configuration document; everything below
//! `services.<name>` and `middlewares.<name>` stays an untyped blob that the
//! named component decodes itself.

use std::collections::HashMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::error::HttpError;

fn default_network() -> String {
    "tcp".to_string()
}

fn default_address() -> String {
    "localhost:9998".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    1
}

/// Configuration for an HTTP [`Server`](crate::Server).
///
/// # Example
///
/// ```
/// use pharos_http::ServerConfig;
///
/// let conf = ServerConfig::from_value(&serde_json::json!({
///     "address": "127.0.0.1:0",
///     "enabled_services": ["hello"],
/// })).unwrap();
/// assert_eq!(conf.network, "tcp");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listener network. Only `"tcp"` is supported.
    #[serde(default = "default_network")]
    pub network: String,

    /// Listener address.
    #[serde(default = "default_address")]
    pub address: String,

    /// Per-service configuration blobs, keyed by service name.
    #[serde(default)]
    pub services: HashMap<String, Value>,

    /// Names of services to mount. Enabling an unregistered name is a
    /// startup error.
    #[serde(default)]
    pub enabled_services: Vec<String>,

    /// Per-middleware configuration blobs, keyed by middleware name.
    #[serde(default)]
    pub middlewares: HashMap<String, Value>,

    /// Names of middlewares to chain around the router.
    #[serde(default)]
    pub enabled_middlewares: Vec<String>,

    /// Bound on the wait for in-flight requests at shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            address: default_address(),
            services: HashMap::new(),
            enabled_services: Vec::new(),
            middlewares: HashMap::new(),
            enabled_middlewares: Vec::new(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Decodes a configuration from an opaque document.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] when the document does not match the
    /// expected shape.
    pub fn from_value(value: &Value) -> Result<Self, HttpError> {
        serde_json::from_value(value.clone()).map_err(HttpError::Config)
    }

    /// Returns the configuration blob for `service`, or `Null` when absent.
    #[must_use]
    pub fn service_config(&self, service: &str) -> Value {
        self.services.get(service).cloned().unwrap_or(Value::Null)
    }

    /// Returns the configuration blob for `middleware`, or `Null` when absent.
    #[must_use]
    pub fn middleware_config(&self, middleware: &str) -> Value {
        self.middlewares
            .get(middleware)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Returns the shutdown deadline as a [`Duration`].
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
