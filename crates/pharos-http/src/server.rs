//! HTTP server.
//!
//! The server is configuration-driven: it resolves every enabled service and
//! middleware name against the [`HttpRegistry`], composes a single root
//! handler once, then serves it until the shutdown signal fires. Any failure
//! while instantiating a component aborts startup entirely; there is no
//! partially-live server.
//!
//! Routing peels exactly one path segment: a request for `/webdav/files/x`
//! reaches the service mounted at `webdav` with its path rewritten to
//! `/files/x`. A service mounted at the empty prefix receives everything no
//! other mount claims, with the original path reconstructed.

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use pharos_core::RequestContext;

use crate::chain::{build_chain, MiddlewareEntry};
use crate::config::ServerConfig;
use crate::error::HttpError;
use crate::handler::{handler_fn, traced, ArcHandler, Request, Response, ResponseExt};
use crate::middleware;
use crate::path::shift_path;
use crate::registry::HttpRegistry;
use crate::service::Service;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// The Pharos HTTP server.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use pharos_http::{HttpRegistry, Server, ShutdownSignal};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let registry = Arc::new(HttpRegistry::new());
///     // ... register services and middlewares ...
///
///     let conf = serde_json::json!({
///         "address": "127.0.0.1:9998",
///         "enabled_services": ["hello"],
///     });
///     let server = Server::new(&conf, registry)?;
///     server.serve(ShutdownSignal::with_os_signals()).await?;
///     Ok(())
/// }
/// ```
pub struct Server {
    conf: ServerConfig,
    registry: Arc<HttpRegistry>,
}

/// A constructed service together with the name it was enabled under.
struct MountedService {
    name: String,
    service: Arc<dyn Service>,
}

/// Everything `build` produces: the composed root handler and the service
/// instances to close at shutdown.
struct Built {
    handler: ArcHandler,
    services: Vec<MountedService>,
}

impl std::fmt::Debug for Built {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Built").finish_non_exhaustive()
    }
}

impl Server {
    /// Creates a server from an opaque configuration document.
    ///
    /// Only the configuration is decoded here; components are instantiated
    /// when serving starts.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Config`] when the document cannot be decoded.
    pub fn new(conf: &serde_json::Value, registry: Arc<HttpRegistry>) -> Result<Self, HttpError> {
        Ok(Self::from_config(ServerConfig::from_value(conf)?, registry))
    }

    /// Creates a server from an already-decoded configuration.
    #[must_use]
    pub fn from_config(conf: ServerConfig, registry: Arc<HttpRegistry>) -> Self {
        Self { conf, registry }
    }

    /// Returns the configured listener network.
    #[must_use]
    pub fn network(&self) -> &str {
        &self.conf.network
    }

    /// Returns the configured listener address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.conf.address
    }

    /// Binds the configured address and serves until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Fails fast if any enabled component cannot be constructed, if the
    /// network is unsupported, or if the listener cannot be bound.
    pub async fn serve(self, shutdown: ShutdownSignal) -> Result<(), HttpError> {
        if self.conf.network != "tcp" {
            return Err(HttpError::UnsupportedNetwork(self.conf.network.clone()));
        }
        let listener =
            TcpListener::bind(&self.conf.address)
                .await
                .map_err(|source| HttpError::Bind {
                    address: self.conf.address.clone(),
                    source,
                })?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on OS signals (SIGTERM/SIGINT) until told to stop.
    ///
    /// # Errors
    ///
    /// Same as [`serve`](Self::serve).
    pub async fn run(self) -> Result<(), HttpError> {
        self.serve(ShutdownSignal::with_os_signals()).await
    }

    /// Serves on an existing listener until `shutdown` fires.
    ///
    /// The handler chain is built first, so an enabled-but-unregistered
    /// component name fails before any connection is accepted. At shutdown
    /// every constructed service is closed best-effort, then in-flight
    /// connections get up to the configured deadline to finish.
    ///
    /// # Errors
    ///
    /// Fails fast on component construction errors; afterwards only logs
    /// per-connection failures.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), HttpError> {
        let built = self.build()?;
        let tracker = ConnectionTracker::new();

        tracing::info!(
            network = %self.conf.network,
            address = %self.conf.address,
            "http server listening"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote)) => {
                            let root = Arc::clone(&built.handler);
                            let token = tracker.acquire();
                            let conn_shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                if let Err(e) =
                                    handle_connection(root, stream, remote, conn_shutdown).await
                                {
                                    tracing::debug!(remote = %remote, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => tracing::error!(error = %e, "failed to accept connection"),
                    }
                }
                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received, stopping http server");
                    break;
                }
            }
        }

        drop(listener);
        close_services(&built.services).await;

        let deadline = self.conf.shutdown_timeout();
        tokio::select! {
            () = tracker.wait_idle() => {
                tracing::info!("all connections closed");
            }
            () = tokio::time::sleep(deadline) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "shutdown deadline reached, abandoning remaining connections"
                );
            }
        }

        Ok(())
    }

    /// Instantiates enabled components and composes the root handler.
    fn build(&self) -> Result<Built, HttpError> {
        let (handlers, services) = self.mount_services()?;
        let entries = self.build_middlewares()?;

        let mut handler = build_chain(router(Arc::new(handlers)), entries);

        // Core middlewares carry implicit top priority and are not
        // configurable: appctx ends up outermost, log directly inside it.
        handler = (middleware::log::new())(traced("log", handler));
        handler = (middleware::appctx::new())(traced("appctx", handler));

        Ok(Built { handler, services })
    }

    fn mount_services(
        &self,
    ) -> Result<(HashMap<String, ArcHandler>, Vec<MountedService>), HttpError> {
        let mut handlers = HashMap::new();
        let mut services = Vec::new();

        for name in &self.conf.enabled_services {
            let ctor = self.registry.services().lookup(name)?;
            let service = ctor(&self.conf.service_config(name)).map_err(|source| {
                HttpError::Service {
                    name: name.clone(),
                    source,
                }
            })?;
            let service: Arc<dyn Service> = Arc::from(service);
            let prefix = service.prefix().to_string();

            handlers.insert(prefix.clone(), traced(name.clone(), service.handler()));
            tracing::info!(service = %name, prefix = %prefix, "http service enabled");
            services.push(MountedService {
                name: name.clone(),
                service,
            });
        }

        Ok((handlers, services))
    }

    fn build_middlewares(&self) -> Result<Vec<MiddlewareEntry>, HttpError> {
        let mut entries = Vec::new();

        for name in &self.conf.enabled_middlewares {
            let ctor = self.registry.middlewares().lookup(name)?;
            let (mw, priority) = ctor(&self.conf.middleware_config(name)).map_err(|source| {
                HttpError::Middleware {
                    name: name.clone(),
                    source,
                }
            })?;
            tracing::info!(middleware = %name, priority, "http middleware enabled");
            entries.push(MiddlewareEntry::new(name.clone(), priority, mw));
        }

        Ok(entries)
    }
}

/// Builds the single-level mount-point router.
fn router(handlers: Arc<HashMap<String, ArcHandler>>) -> ArcHandler {
    handler_fn(move |ctx, mut req: Request| {
        let handlers = Arc::clone(&handlers);
        async move {
            let (head, tail) = shift_path(req.uri().path());

            if let Some(handler) = handlers.get(&head) {
                tracing::debug!(head = %head, tail = %tail, "routing to mounted service");
                set_path(&mut req, &tail);
                return handler.handle(ctx, req).await;
            }

            // A service exposed at the root sees the original path.
            if let Some(handler) = handlers.get("") {
                let original = format!("/{head}{tail}");
                tracing::debug!(path = %original, "routing to root service");
                set_path(&mut req, &original);
                return handler.handle(ctx, req).await;
            }

            tracing::debug!(head = %head, tail = %tail, "no service mounted");
            Response::empty(StatusCode::NOT_FOUND)
        }
    })
}

/// Rewrites the request path, preserving the query string.
fn set_path(req: &mut Request, path: &str) {
    let mut parts = req.uri().clone().into_parts();
    let pq = match req.uri().query() {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    };
    match pq.parse() {
        Ok(pq) => {
            parts.path_and_query = Some(pq);
            if let Ok(uri) = http::Uri::from_parts(parts) {
                *req.uri_mut() = uri;
            }
        }
        Err(e) => tracing::warn!(error = %e, path = %path, "failed to rewrite request path"),
    }
}

/// Closes every constructed service, best-effort.
///
/// A close failure is logged and never blocks closing the remaining
/// services; shutdown must always complete.
async fn close_services(services: &[MountedService]) {
    for mounted in services {
        match mounted.service.close().await {
            Ok(()) => tracing::info!(service = %mounted.name, "http service closed"),
            Err(e) => {
                tracing::error!(service = %mounted.name, error = %e, "error closing http service");
            }
        }
    }
}

/// Serves one client connection, collecting each request body before
/// dispatching to the composed handler.
async fn handle_connection(
    root: ArcHandler,
    stream: TcpStream,
    remote: SocketAddr,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);

    let service = service_fn(move |req: http::Request<Incoming>| {
        let root = Arc::clone(&root);
        async move {
            let ctx = RequestContext::new().with_remote_addr(remote);
            let (parts, body) = req.into_parts();
            let bytes = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read request body");
                    return Ok::<_, Infallible>(Response::text(
                        StatusCode::BAD_REQUEST,
                        "failed to read request body",
                    ));
                }
            };
            let req = http::Request::from_parts(parts, Full::new(bytes));
            Ok(root.handle(ctx, req).await)
        }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        res = conn.as_mut() => res,
        () = shutdown.recv() => {
            // Let in-flight requests on this connection finish; the server's
            // deadline bounds the overall wait.
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    }
}
