//! A pair of pretend backends for trying the proxy locally. Both answer
//! health probes with "OK" on /health, so the default config picks them up.

use axum::{routing::get, Router};
use std::net::SocketAddr;

fn backend_app(name: &'static str) -> Router {
    Router::new()
        .route("/", get(move || async move { format!("Hello from {name}!") }))
        .route("/health", get(|| async { "OK" }))
}

#[tokio::main]
async fn main() {
    let mut handles = Vec::new();
    for (name, port) in [("backend-one", 9000u16), ("backend-two", 9001u16)] {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let app = backend_app(name);
        println!("{} is listening on http://{}", name, addr);

        handles.push(tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
            axum::serve(listener, app).await.unwrap();
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }
}
