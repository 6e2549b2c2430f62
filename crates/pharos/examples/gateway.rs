//! Minimal gateway: one HTTP service behind the configured middleware chain.
//!
//! Run with `cargo run --example gateway`, then:
//!
//! ```text
//! curl http://127.0.0.1:9998/hello/world
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;

use pharos::prelude::*;
use pharos_http::NewService;

struct HelloService;

#[async_trait]
impl Service for HelloService {
    fn prefix(&self) -> &str {
        "hello"
    }

    fn handler(&self) -> ArcHandler {
        handler_fn(|_ctx, req| async move {
            let (name, _) = shift_path(req.uri().path());
            let name = if name.is_empty() { "world".to_string() } else { name };
            Response::text(StatusCode::OK, &format!("hello, {name}\n"))
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pharos::init_tracing();

    let registry = Arc::new(HttpRegistry::new());
    let hello: NewService = Arc::new(|_conf| Ok(Box::new(HelloService) as Box<dyn Service>));
    registry.register_service("hello", hello);

    let conf = serde_json::json!({
        "address": "127.0.0.1:9998",
        "enabled_services": ["hello"],
    });

    Server::new(&conf, registry)?.run().await?;
    Ok(())
}
