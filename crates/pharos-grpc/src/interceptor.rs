//! Interceptor and handler types for the gRPC layer.
//!
//! Messages are type-erased as [`Bytes`] at interceptor boundaries: an
//! interceptor inspects metadata and the [`RequestContext`], never the
//! message payload, so the concrete protobuf types stay out of this crate.
//!
//! Unary calls flow through [`UnaryHandler`]s the same way HTTP requests
//! flow through handlers; streaming calls hand the interceptor the whole
//! [`ServerStream`], which it may wrap (see [`WrappedStream`]) to replace
//! the request context seen downstream.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tonic::metadata::MetadataMap;
use tonic::{Request, Response, Status};

use pharos_core::RequestContext;

/// A boxed future, the return type of handler invocations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Per-call information for a unary interception.
#[derive(Debug, Clone)]
pub struct UnaryInfo {
    /// Full method name, e.g. `/pharos.gateway.v1.Gateway/Stat`.
    pub full_method: String,
}

impl UnaryInfo {
    /// Creates info for the given full method name.
    #[must_use]
    pub fn new(full_method: impl Into<String>) -> Self {
        Self {
            full_method: full_method.into(),
        }
    }
}

/// Per-call information for a stream interception.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Full method name, e.g. `/pharos.gateway.v1.Gateway/ListRecursive`.
    pub full_method: String,
}

impl StreamInfo {
    /// Creates info for the given full method name.
    #[must_use]
    pub fn new(full_method: impl Into<String>) -> Self {
        Self {
            full_method: full_method.into(),
        }
    }
}

/// The terminal (or next) handler of a unary call.
pub trait UnaryHandler: Send + Sync {
    /// Handles one unary call.
    fn call(
        &self,
        ctx: RequestContext,
        req: Request<Bytes>,
        info: UnaryInfo,
    ) -> BoxFuture<'static, Result<Response<Bytes>, Status>>;
}

/// A shared, type-erased unary handler.
pub type ArcUnaryHandler = Arc<dyn UnaryHandler>;

struct FnUnaryHandler<F>(F);

impl<F, Fut> UnaryHandler for FnUnaryHandler<F>
where
    F: Fn(RequestContext, Request<Bytes>, UnaryInfo) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response<Bytes>, Status>> + Send + 'static,
{
    fn call(
        &self,
        ctx: RequestContext,
        req: Request<Bytes>,
        info: UnaryInfo,
    ) -> BoxFuture<'static, Result<Response<Bytes>, Status>> {
        Box::pin((self.0)(ctx, req, info))
    }
}

/// Wraps an async closure into an [`ArcUnaryHandler`].
pub fn unary_handler_fn<F, Fut>(f: F) -> ArcUnaryHandler
where
    F: Fn(RequestContext, Request<Bytes>, UnaryInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<Bytes>, Status>> + Send + 'static,
{
    Arc::new(FnUnaryHandler(f))
}

/// A unary interceptor: runs around the next handler and may short-circuit
/// with a [`Status`], mutate the request metadata, or augment the context.
#[async_trait]
pub trait UnaryInterceptor: Send + Sync {
    /// Intercepts one unary call.
    async fn intercept(
        &self,
        ctx: RequestContext,
        req: Request<Bytes>,
        info: UnaryInfo,
        next: ArcUnaryHandler,
    ) -> Result<Response<Bytes>, Status>;
}

impl std::fmt::Debug for dyn UnaryInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UnaryInterceptor")
    }
}

/// A server-side message stream as seen by interceptors and handlers.
///
/// Each stream carries its own [`RequestContext`] and the call metadata the
/// client sent. Interceptors that need to hand a different context to
/// downstream code wrap the stream instead of mutating it, see
/// [`WrappedStream`].
#[async_trait]
pub trait ServerStream: Send {
    /// The request context downstream handlers should observe.
    fn context(&self) -> &RequestContext;

    /// The metadata the client attached to the call.
    fn metadata(&self) -> &MetadataMap;

    /// Receives the next message, or `None` when the client half closes.
    async fn recv(&mut self) -> Result<Option<Bytes>, Status>;

    /// Sends one message to the client.
    async fn send(&mut self, msg: Bytes) -> Result<(), Status>;
}

/// A boxed, type-erased server stream.
pub type BoxServerStream = Box<dyn ServerStream>;

/// A stream decorator that overrides the context while delegating all
/// message traffic to the inner stream.
///
/// This is how an interceptor propagates an augmented context down a
/// streaming call: the stream type is otherwise opaque to it.
pub struct WrappedStream {
    inner: BoxServerStream,
    ctx: RequestContext,
}

impl WrappedStream {
    /// Wraps `inner` so downstream code observes `ctx` instead of the
    /// inner stream's context.
    #[must_use]
    pub fn new(inner: BoxServerStream, ctx: RequestContext) -> Self {
        Self { inner, ctx }
    }
}

#[async_trait]
impl ServerStream for WrappedStream {
    fn context(&self) -> &RequestContext {
        &self.ctx
    }

    fn metadata(&self) -> &MetadataMap {
        self.inner.metadata()
    }

    async fn recv(&mut self) -> Result<Option<Bytes>, Status> {
        self.inner.recv().await
    }

    async fn send(&mut self, msg: Bytes) -> Result<(), Status> {
        self.inner.send(msg).await
    }
}

/// The terminal (or next) handler of a streaming call.
pub trait StreamHandler: Send + Sync {
    /// Handles one streaming call to completion.
    fn call(
        &self,
        stream: BoxServerStream,
        info: StreamInfo,
    ) -> BoxFuture<'static, Result<(), Status>>;
}

/// A shared, type-erased stream handler.
pub type ArcStreamHandler = Arc<dyn StreamHandler>;

struct FnStreamHandler<F>(F);

impl<F, Fut> StreamHandler for FnStreamHandler<F>
where
    F: Fn(BoxServerStream, StreamInfo) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Status>> + Send + 'static,
{
    fn call(
        &self,
        stream: BoxServerStream,
        info: StreamInfo,
    ) -> BoxFuture<'static, Result<(), Status>> {
        Box::pin((self.0)(stream, info))
    }
}

/// Wraps an async closure into an [`ArcStreamHandler`].
pub fn stream_handler_fn<F, Fut>(f: F) -> ArcStreamHandler
where
    F: Fn(BoxServerStream, StreamInfo) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Status>> + Send + 'static,
{
    Arc::new(FnStreamHandler(f))
}

/// A stream interceptor: runs around the next handler and may wrap the
/// stream before passing it on.
#[async_trait]
pub trait StreamInterceptor: Send + Sync {
    /// Intercepts one streaming call.
    async fn intercept(
        &self,
        stream: BoxServerStream,
        info: StreamInfo,
        next: ArcStreamHandler,
    ) -> Result<(), Status>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_core::fixtures::demo_user;

    struct NullStream {
        ctx: RequestContext,
        metadata: MetadataMap,
    }

    #[async_trait]
    impl ServerStream for NullStream {
        fn context(&self) -> &RequestContext {
            &self.ctx
        }

        fn metadata(&self) -> &MetadataMap {
            &self.metadata
        }

        async fn recv(&mut self) -> Result<Option<Bytes>, Status> {
            Ok(None)
        }

        async fn send(&mut self, _msg: Bytes) -> Result<(), Status> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_wrapped_stream_overrides_context() {
        let inner = NullStream {
            ctx: RequestContext::new(),
            metadata: MetadataMap::new(),
        };

        let mut authed = RequestContext::new();
        assert!(authed.authenticate(demo_user(), "tok"));

        let wrapped = WrappedStream::new(Box::new(inner), authed);
        assert!(wrapped.context().is_authenticated());
    }

    #[tokio::test]
    async fn test_wrapped_stream_delegates_traffic() {
        let mut metadata = MetadataMap::new();
        metadata.insert("x-probe", "1".parse().unwrap());
        let inner = NullStream {
            ctx: RequestContext::new(),
            metadata,
        };

        let mut wrapped = WrappedStream::new(Box::new(inner), RequestContext::new());
        assert!(wrapped.metadata().contains_key("x-probe"));
        assert!(wrapped.recv().await.unwrap().is_none());
        wrapped.send(Bytes::from_static(b"ok")).await.unwrap();
    }
}
