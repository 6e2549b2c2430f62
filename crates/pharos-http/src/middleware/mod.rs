//! Core middlewares.
//!
//! These two middlewares wrap every configured chain with implicit highest
//! priority and cannot be disabled: [`appctx`] opens the request-scoped
//! tracing context every downstream component relies on, and [`log`] emits
//! the access log line. The server appends them itself; they are not part of
//! the configurable middleware registry.

pub mod appctx;
pub mod log;
