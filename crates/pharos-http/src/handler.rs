//! Handler and middleware types.
//!
//! A [`Handler`] is the unit everything else composes: services expose one,
//! middlewares transform one into another, and the server folds the whole
//! chain into a single root handler at startup. Requests carry a collected
//! `Full<Bytes>` body so handlers and tests can treat them as plain values.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use tracing::Instrument;

use pharos_core::RequestContext;

/// The HTTP request type flowing through the handler chain.
pub type Request = http::Request<Full<Bytes>>;

/// The HTTP response type flowing through the handler chain.
pub type Response = http::Response<Full<Bytes>>;

/// A boxed future, the return type of handler invocations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An asynchronous request handler.
///
/// The [`RequestContext`] is passed by value alongside the request; a
/// middleware may augment it before handing both down the chain.
pub trait Handler: Send + Sync {
    /// Handles one request.
    fn handle(&self, ctx: RequestContext, req: Request) -> BoxFuture<'static, Response>;
}

/// A shared, type-erased handler.
pub type ArcHandler = Arc<dyn Handler>;

/// A middleware: a transform from one handler to another.
///
/// The transform runs once at chain-build time; the handler it returns runs
/// per request, wrapping (and free to short-circuit) the inner handler.
pub type Middleware = Arc<dyn Fn(ArcHandler) -> ArcHandler + Send + Sync>;

struct FnHandler<F>(F);

impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Response> + Send + 'static,
{
    fn handle(&self, ctx: RequestContext, req: Request) -> BoxFuture<'static, Response> {
        Box::pin((self.0)(ctx, req))
    }
}

/// Wraps an async closure into an [`ArcHandler`].
///
/// # Example
///
/// ```
/// use pharos_http::{handler_fn, Response, ResponseExt};
///
/// let handler = handler_fn(|_ctx, _req| async {
///     Response::text(http::StatusCode::OK, "hello")
/// });
/// ```
pub fn handler_fn<F, Fut>(f: F) -> ArcHandler
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

/// Wraps `inner` so every invocation runs inside a tracing span named after
/// the component.
///
/// The server applies this at every service and middleware boundary; the
/// spans exist regardless of whether a subscriber exports them.
#[must_use]
pub fn traced(name: impl Into<String>, inner: ArcHandler) -> ArcHandler {
    let name = name.into();
    handler_fn(move |ctx, req| {
        let span = tracing::info_span!("component", name = %name, request_id = %ctx.request_id());
        let inner = Arc::clone(&inner);
        async move { inner.handle(ctx, req).await }.instrument(span)
    })
}

/// Extension trait for building plain responses.
pub trait ResponseExt {
    /// Creates an empty response with the given status code.
    fn empty(status: http::StatusCode) -> Response;

    /// Creates a `text/plain` response with the given status code.
    fn text(status: http::StatusCode, message: &str) -> Response;
}

impl ResponseExt for Response {
    fn empty(status: http::StatusCode) -> Response {
        http::Response::builder()
            .status(status)
            .body(Full::new(Bytes::new()))
            .expect("failed to build empty response")
    }

    fn text(status: http::StatusCode, message: &str) -> Response {
        http::Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Full::new(Bytes::from(message.to_string())))
            .expect("failed to build text response")
    }
}
