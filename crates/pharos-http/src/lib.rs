//! # Pharos HTTP
//!
//! HTTP front end of the Pharos gateway framework.
//!
//! This crate provides the pluggable server skeleton:
//!
//! - [`Server`] - config-driven HTTP server with graceful shutdown
//! - [`Service`] - a handler mounted at a fixed path prefix
//! - [`Middleware`] - a handler transform chained around the router by priority
//! - [`shift_path`] - the single-segment path dispatch primitive
//! - [`HttpRegistry`] - named constructors for services and middlewares
//!
//! Routing peels one path segment per layer: the server matches the first
//! segment against mounted service prefixes and hands the remaining rooted
//! tail to the winning service, which is free to call [`shift_path`] again
//! for its own sub-routing.

#![doc(html_root_url = "https://docs.rs/pharos-http/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod config;
mod error;
mod handler;
pub mod middleware;
mod path;
mod registry;
mod server;
mod service;
mod shutdown;

pub use chain::{build_chain, MiddlewareEntry};
pub use config::ServerConfig;
pub use error::HttpError;
pub use handler::{
    handler_fn, traced, ArcHandler, BoxFuture, Handler, Middleware, Request, Response, ResponseExt,
};
pub use path::{clean_path, shift_path};
pub use registry::{HttpRegistry, NewMiddleware, NewService};
pub use server::Server;
pub use service::Service;
pub use shutdown::{ConnectionToken, ConnectionTracker, ShutdownSignal};
