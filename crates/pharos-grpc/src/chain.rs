//! Priority-ordered interceptor chaining.
//!
//! Mirrors the HTTP middleware chain: interceptors are sorted by priority
//! descending with a stable sort, then folded around the terminal handler
//! from the low-priority end, so the highest-priority interceptor ends up
//! outermost and runs first. Equal priorities keep their registration
//! order. Every interceptor boundary gets a tracing span named after the
//! component, matching the HTTP side.

use std::sync::Arc;

use tracing::Instrument;

use crate::interceptor::{
    stream_handler_fn, unary_handler_fn, ArcStreamHandler, ArcUnaryHandler, StreamInterceptor,
    UnaryInterceptor,
};

/// A named unary interceptor with its chain priority.
pub struct UnaryEntry {
    /// Name the interceptor was enabled under.
    pub name: String,
    /// Chain priority, higher runs earlier.
    pub priority: i32,
    /// The interceptor itself.
    pub interceptor: Arc<dyn UnaryInterceptor>,
}

impl UnaryEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        interceptor: Arc<dyn UnaryInterceptor>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            interceptor,
        }
    }
}

impl std::fmt::Debug for UnaryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnaryEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A named stream interceptor with its chain priority.
pub struct StreamEntry {
    /// Name the interceptor was enabled under.
    pub name: String,
    /// Chain priority, higher runs earlier.
    pub priority: i32,
    /// The interceptor itself.
    pub interceptor: Arc<dyn StreamInterceptor>,
}

impl StreamEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        priority: i32,
        interceptor: Arc<dyn StreamInterceptor>,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            interceptor,
        }
    }
}

impl std::fmt::Debug for StreamEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Folds unary interceptors around `terminal`, highest priority outermost.
#[must_use]
pub fn chain_unary(terminal: ArcUnaryHandler, mut entries: Vec<UnaryEntry>) -> ArcUnaryHandler {
    entries.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut handler = terminal;
    for entry in entries.iter().rev() {
        tracing::info!(name = %entry.name, priority = entry.priority, "chaining unary interceptor");
        let interceptor = Arc::clone(&entry.interceptor);
        let name = entry.name.clone();
        let next = handler;
        handler = unary_handler_fn(move |ctx, req, info| {
            let span = tracing::info_span!(
                "interceptor",
                name = name.as_str(),
                request_id = %ctx.request_id(),
            );
            let interceptor = Arc::clone(&interceptor);
            let next = Arc::clone(&next);
            async move { interceptor.intercept(ctx, req, info, next).await }.instrument(span)
        });
    }
    handler
}

/// Folds stream interceptors around `terminal`, highest priority outermost.
#[must_use]
pub fn chain_stream(terminal: ArcStreamHandler, mut entries: Vec<StreamEntry>) -> ArcStreamHandler {
    entries.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut handler = terminal;
    for entry in entries.iter().rev() {
        tracing::info!(name = %entry.name, priority = entry.priority, "chaining stream interceptor");
        let interceptor = Arc::clone(&entry.interceptor);
        let name = entry.name.clone();
        let next = handler;
        handler = stream_handler_fn(move |stream, info| {
            let span = tracing::info_span!(
                "interceptor",
                name = name.as_str(),
                request_id = %stream.context().request_id(),
            );
            let interceptor = Arc::clone(&interceptor);
            let next = Arc::clone(&next);
            async move { interceptor.intercept(stream, info, next).await }.instrument(span)
        });
    }
    handler
}
