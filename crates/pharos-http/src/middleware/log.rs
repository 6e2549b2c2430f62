//! Access logging.
//!
//! Emits one structured line per completed request with method, path, status
//! and latency. Runs just inside [`appctx`](super::appctx) so the line lands
//! in the request span.

use std::sync::Arc;
use std::time::Instant;

use crate::handler::{handler_fn, ArcHandler, Middleware};

/// Creates the access-log middleware.
#[must_use]
pub fn new() -> Middleware {
    Arc::new(|next: ArcHandler| {
        handler_fn(move |ctx, req| {
            let method = req.method().clone();
            let path = req.uri().path().to_string();
            let next = Arc::clone(&next);
            async move {
                let start = Instant::now();
                let res = next.handle(ctx, req).await;
                tracing::info!(
                    method = %method,
                    path = %path,
                    status = res.status().as_u16(),
                    elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
                    "request handled"
                );
                res
            }
        })
    })
}
