//! Application context injection.
//!
//! Outermost middleware of every chain: it opens the request-scoped tracing
//! span carrying the request id, method, path, and remote peer, so every
//! downstream middleware, service, and handler logs and traces inside a
//! correlated scope without any nil-checks.

use std::sync::Arc;

use tracing::Instrument;

use crate::handler::{handler_fn, ArcHandler, Middleware};

/// Creates the application-context middleware.
#[must_use]
pub fn new() -> Middleware {
    Arc::new(|next: ArcHandler| {
        handler_fn(move |ctx, req| {
            let span = tracing::info_span!(
                "request",
                request_id = %ctx.request_id(),
                method = %req.method(),
                path = req.uri().path(),
                remote = ctx.remote_addr().map(tracing::field::display),
            );
            let next = Arc::clone(&next);
            async move { next.handle(ctx, req).await }.instrument(span)
        })
    })
}
