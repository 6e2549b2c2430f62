//! End-to-end tests driving the HTTP server over real TCP connections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::StatusCode;
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use pharos_http::{
    handler_fn, ArcHandler, HttpRegistry, NewService, Response, ResponseExt, Server, Service,
    ShutdownSignal,
};

struct HelloService {
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Service for HelloService {
    fn prefix(&self) -> &str {
        "hello"
    }

    fn handler(&self) -> ArcHandler {
        handler_fn(|_ctx, req| async move {
            Response::text(StatusCode::OK, &format!("hello from {}", req.uri().path()))
        })
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct GrumpyService {
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Service for GrumpyService {
    fn prefix(&self) -> &str {
        "grumpy"
    }

    fn handler(&self) -> ArcHandler {
        handler_fn(|_ctx, _req| async { Response::empty(StatusCode::OK) })
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("refusing to close")
    }
}

fn hello_ctor(closed: Arc<AtomicUsize>) -> NewService {
    Arc::new(move |_conf| {
        Ok(Box::new(HelloService {
            closed: Arc::clone(&closed),
        }) as Box<dyn Service>)
    })
}

fn grumpy_ctor(closed: Arc<AtomicUsize>) -> NewService {
    Arc::new(move |_conf| {
        Ok(Box::new(GrumpyService {
            closed: Arc::clone(&closed),
        }) as Box<dyn Service>)
    })
}

async fn raw_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn test_serves_requests_and_closes_services_once() {
    let closed = Arc::new(AtomicUsize::new(0));
    let registry = HttpRegistry::new();
    registry.register_service("hello", hello_ctor(Arc::clone(&closed)));

    let conf = json!({ "enabled_services": ["hello"] });
    let server = Server::new(&conf, Arc::new(registry)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.serve_on(listener, shutdown).await })
    };

    let response = raw_get(addr, "/hello/world").await;
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("hello from /world"), "got: {response}");

    let missing = raw_get(addr, "/nowhere").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "got: {missing}");

    shutdown.trigger();
    handle.await.unwrap().unwrap();
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_close_failure_does_not_block_other_services() {
    let hello_closed = Arc::new(AtomicUsize::new(0));
    let grumpy_closed = Arc::new(AtomicUsize::new(0));

    let registry = HttpRegistry::new();
    registry.register_service("hello", hello_ctor(Arc::clone(&hello_closed)));
    registry.register_service("grumpy", grumpy_ctor(Arc::clone(&grumpy_closed)));

    let conf = json!({ "enabled_services": ["grumpy", "hello"] });
    let server = Server::new(&conf, Arc::new(registry)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = ShutdownSignal::new();
    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.serve_on(listener, shutdown).await })
    };

    shutdown.trigger();
    handle.await.unwrap().unwrap();

    // grumpy failed to close but hello still got its turn
    assert_eq!(grumpy_closed.load(Ordering::SeqCst), 1);
    assert_eq!(hello_closed.load(Ordering::SeqCst), 1);
}

struct SlowService {
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Service for SlowService {
    fn prefix(&self) -> &str {
        "slow"
    }

    fn handler(&self) -> ArcHandler {
        handler_fn(|_ctx, _req| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Response::empty(StatusCode::OK)
        })
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn test_shutdown_with_request_in_flight_respects_deadline() {
    let closed = Arc::new(AtomicUsize::new(0));
    let registry = HttpRegistry::new();
    {
        let closed = Arc::clone(&closed);
        let ctor: NewService = Arc::new(move |_conf| {
            Ok(Box::new(SlowService {
                closed: Arc::clone(&closed),
            }) as Box<dyn Service>)
        });
        registry.register_service("slow", ctor);
    }

    let conf = json!({
        "enabled_services": ["slow"],
        "shutdown_timeout_secs": 1,
    });
    let server = Server::new(&conf, Arc::new(registry)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownSignal::new();
    let handle = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { server.serve_on(listener, shutdown).await })
    };

    // park a request inside the slow handler, then shut down around it
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /slow/x HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("serve_on did not return within the deadline")
        .unwrap()
        .unwrap();

    // returned once the 1s drain deadline expired, not after the 30s handler
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(started.elapsed() >= Duration::from_millis(900));
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_startup_fails_before_listening_work() {
    let registry = HttpRegistry::new();
    let conf = json!({ "enabled_services": ["unregistered"] });
    let server = Server::new(&conf, Arc::new(registry)).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let result = server.serve_on(listener, ShutdownSignal::new()).await;
    assert!(result.is_err());
}
