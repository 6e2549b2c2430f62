//! # Pharos gRPC
//!
//! gRPC interceptor framework of the Pharos gateway.
//!
//! The building blocks mirror the HTTP side:
//!
//! - [`UnaryInterceptor`] / [`StreamInterceptor`] - run around the next
//!   handler, short-circuit with a [`tonic::Status`], or augment the
//!   [`pharos_core::RequestContext`]
//! - [`chain_unary`] / [`chain_stream`] - priority-ordered composition,
//!   highest priority outermost
//! - [`GrpcRegistry`] - named constructors resolved from configuration
//! - [`auth`] - the authentication interceptor pair
//!
//! Streaming calls carry their context on the stream itself; interceptors
//! propagate an augmented context by wrapping the stream
//! ([`WrappedStream`]) rather than mutating shared state.

#![doc(html_root_url = "https://docs.rs/pharos-grpc/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
mod chain;
mod error;
mod interceptor;
mod registry;

pub use chain::{chain_stream, chain_unary, StreamEntry, UnaryEntry};
pub use error::GrpcError;
pub use interceptor::{
    stream_handler_fn, unary_handler_fn, ArcStreamHandler, ArcUnaryHandler, BoxFuture,
    BoxServerStream, ServerStream, StreamHandler, StreamInfo, StreamInterceptor, UnaryHandler,
    UnaryInfo, UnaryInterceptor, WrappedStream,
};
pub use registry::{register_auth, GrpcRegistry, NewStreamInterceptor, NewUnaryInterceptor};
