//! HTTP server error types.

use pharos_core::RegistryError;
use thiserror::Error;

/// Errors produced while constructing or running an HTTP server.
///
/// Every variant raised during startup aborts the whole bring-up: there is
/// no partially-live server. Per-request failures never surface here.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The configuration document could not be decoded.
    #[error("failed to decode http server configuration")]
    Config(#[source] serde_json::Error),

    /// An enabled component has no registered constructor.
    #[error(transparent)]
    ComponentNotFound(#[from] RegistryError),

    /// A service constructor failed.
    #[error("http service {name} could not be constructed")]
    Service {
        /// The offending service name.
        name: String,
        /// The constructor's error.
        #[source]
        source: anyhow::Error,
    },

    /// A middleware constructor failed.
    #[error("http middleware {name} could not be constructed")]
    Middleware {
        /// The offending middleware name.
        name: String,
        /// The constructor's error.
        #[source]
        source: anyhow::Error,
    },

    /// The configured network is not supported.
    #[error("unsupported listener network: {0}")]
    UnsupportedNetwork(String),

    /// The listener could not be bound.
    #[error("failed to bind {address}")]
    Bind {
        /// The configured address.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while serving.
    #[error("i/o error while serving")]
    Io(#[from] std::io::Error),
}
