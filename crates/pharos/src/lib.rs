//! # Pharos
//!
//! **Pluggable HTTP/gRPC gateway framework**
//!
//! Pharos is the request-handling skeleton of a federated gateway:
//!
//! - **Component registries** - services, middlewares, and interceptors are
//!   registered by name and resolved from configuration at startup
//! - **Segment routing** - the HTTP server peels one path segment per layer
//!   and hands the rooted tail to the mounted service
//! - **Priority-ordered chains** - middlewares and interceptors wrap the
//!   terminal handler with the highest priority outermost
//! - **Shared authentication** - one token-manager contract backs both the
//!   HTTP layer and the gRPC interceptor pair
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pharos::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     pharos::init_tracing();
//!
//!     let registry = Arc::new(HttpRegistry::new());
//!     // ... register services and middlewares by name ...
//!
//!     let conf = serde_json::json!({
//!         "address": "0.0.0.0:9998",
//!         "enabled_services": ["hello"],
//!     });
//!     Server::new(&conf, registry)?.run().await?;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/pharos/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the layer crates under stable names
pub use pharos_core as core;
pub use pharos_grpc as grpc;
pub use pharos_http as http;

/// Installs a JSON-formatted tracing subscriber honoring `RUST_LOG`.
///
/// Intended for binaries; libraries and tests should install their own
/// subscriber. Calling it twice is a no-op because the global default can
/// only be set once.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .json()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use pharos::prelude::*;
/// ```
pub mod prelude {
    pub use pharos_core::{
        RequestContext, RequestId, TokenManager, TokenManagerRegistry, User, UserId,
    };

    pub use pharos_http::{
        handler_fn, shift_path, ArcHandler, Handler, HttpRegistry, Middleware, Request, Response,
        ResponseExt, Server, Service, ShutdownSignal,
    };

    pub use pharos_grpc::{
        GrpcRegistry, ServerStream, StreamInterceptor, UnaryInterceptor, WrappedStream,
    };
}
