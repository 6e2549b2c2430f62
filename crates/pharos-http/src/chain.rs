//! Middleware chain construction.
//!
//! The chain is built exactly once per server start. Ordering is by
//! priority, descending and stable: the highest-priority middleware ends up
//! outermost and observes the request first, and entries with equal priority
//! keep their discovery order so the chain shape is reproducible across
//! restarts with identical configuration.

use crate::handler::{traced, ArcHandler, Middleware};

/// A named middleware with its chain priority.
pub struct MiddlewareEntry {
    /// Component name, used for spans and logs.
    pub name: String,

    /// Chain priority; higher runs earlier.
    pub priority: i32,

    /// The handler transform.
    pub middleware: Middleware,
}

impl MiddlewareEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: i32, middleware: Middleware) -> Self {
        Self {
            name: name.into(),
            priority,
            middleware,
        }
    }
}

impl std::fmt::Debug for MiddlewareEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareEntry")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Folds `router` through `entries` into a single handler.
///
/// Entries are stable-sorted by priority descending, then applied
/// innermost-first from the low-priority end, leaving the highest-priority
/// middleware as the outermost wrapper. Every middleware boundary gets a
/// tracing span named after the component.
#[must_use]
pub fn build_chain(router: ArcHandler, mut entries: Vec<MiddlewareEntry>) -> ArcHandler {
    entries.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut handler = router;
    for entry in entries.iter().rev() {
        tracing::info!(
            name = %entry.name,
            priority = entry.priority,
            "chaining http middleware"
        );
        handler = (entry.middleware)(traced(entry.name.clone(), handler));
    }
    handler
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{handler_fn, Request, Response, ResponseExt};
    use bytes::Bytes;
    use http::StatusCode;
    use http_body_util::Full;
    use pharos_core::RequestContext;
    use std::sync::{Arc, Mutex};

    fn recording_entry(
        name: &str,
        priority: i32,
        seen: Arc<Mutex<Vec<String>>>,
    ) -> MiddlewareEntry {
        let label = name.to_string();
        let middleware: Middleware = Arc::new(move |next: ArcHandler| {
            let label = label.clone();
            let seen = Arc::clone(&seen);
            handler_fn(move |ctx, req| {
                seen.lock().unwrap().push(label.clone());
                let next = Arc::clone(&next);
                async move { next.handle(ctx, req).await }
            })
        });
        MiddlewareEntry::new(name, priority, middleware)
    }

    fn ok_router() -> ArcHandler {
        handler_fn(|_ctx, _req| async { Response::empty(StatusCode::OK) })
    }

    fn empty_request() -> Request {
        http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_highest_priority_runs_first() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let entries = vec![
            recording_entry("low", 10, Arc::clone(&seen)),
            recording_entry("high", 100, Arc::clone(&seen)),
            recording_entry("mid", 50, Arc::clone(&seen)),
        ];

        let chain = build_chain(ok_router(), entries);
        chain.handle(RequestContext::new(), empty_request()).await;

        assert_eq!(*seen.lock().unwrap(), vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_equal_priority_keeps_discovery_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let entries = vec![
            recording_entry("first", 50, Arc::clone(&seen)),
            recording_entry("second", 50, Arc::clone(&seen)),
            recording_entry("third", 50, Arc::clone(&seen)),
        ];

        let chain = build_chain(ok_router(), entries);
        chain.handle(RequestContext::new(), empty_request()).await;

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_mixed_priorities_non_increasing() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let entries = vec![
            recording_entry("a", 10, Arc::clone(&seen)),
            recording_entry("b", 100, Arc::clone(&seen)),
            recording_entry("c", 10, Arc::clone(&seen)),
            recording_entry("d", 100, Arc::clone(&seen)),
        ];

        let chain = build_chain(ok_router(), entries);
        chain.handle(RequestContext::new(), empty_request()).await;

        assert_eq!(*seen.lock().unwrap(), vec!["b", "d", "a", "c"]);
    }

    #[tokio::test]
    async fn test_empty_chain_is_router() {
        let chain = build_chain(ok_router(), Vec::new());
        let res = chain.handle(RequestContext::new(), empty_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let blocker: Middleware = Arc::new(|_next| {
            handler_fn(|_ctx, _req| async { Response::empty(StatusCode::UNAUTHORIZED) })
        });
        let entries = vec![MiddlewareEntry::new("blocker", 100, blocker)];

        let chain = build_chain(ok_router(), entries);
        let res = chain.handle(RequestContext::new(), empty_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
