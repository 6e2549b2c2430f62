//! Error types for the gRPC layer.

use thiserror::Error;

use pharos_core::{RegistryError, TokenError};

/// Errors raised while assembling gRPC interceptors.
#[derive(Debug, Error)]
pub enum GrpcError {
    /// The interceptor configuration document could not be decoded.
    #[error("invalid interceptor configuration: {0}")]
    Config(#[source] serde_json::Error),

    /// An enabled component name is not registered.
    #[error(transparent)]
    ComponentNotFound(#[from] RegistryError),

    /// A token manager could not be constructed.
    #[error(transparent)]
    TokenManager(#[from] TokenError),

    /// An interceptor constructor failed.
    #[error("failed to construct interceptor {name}")]
    Interceptor {
        /// Name the interceptor was enabled under.
        name: String,
        /// Underlying constructor error.
        #[source]
        source: anyhow::Error,
    },
}
