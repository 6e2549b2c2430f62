//! # Pharos Core
//!
//! Core types and traits for the Pharos gateway framework.
//!
//! This crate provides the foundational pieces shared by the HTTP and gRPC
//! front ends:
//!
//! - [`RequestContext`] - Per-request context carrying identity, token, and metadata
//! - [`RequestId`] - UUID v7 request identifier
//! - [`User`] / [`UserId`] - Verified caller identity produced by a token manager
//! - [`Registry`] - Named component registry with explicit lifetime
//! - [`TokenManager`] - Contract for dismantling a bearer token into an identity

#![doc(html_root_url = "https://docs.rs/pharos-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
pub mod fixtures;
mod identity;
mod registry;
mod token;

pub use context::{RequestContext, RequestId};
pub use identity::{User, UserId};
pub use registry::{Registry, RegistryError};
pub use token::{NewTokenManager, TokenError, TokenManager, TokenManagerRegistry};
