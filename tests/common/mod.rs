//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use switchboard::config::EdgeConfig;
use switchboard::engine::{RoutingEngine, ServiceRegistry};
use switchboard::health::{build_probe, HealthProber, HealthRegistry};
use switchboard::http::HttpServer;
use switchboard::lifecycle::Shutdown;
use switchboard::load_balancer::{build_strategy, StaticServerList};
use switchboard::routing::{DynamicRoutes, RouteTable};

/// Start a mock backend on an ephemeral port that returns a fixed 200 response.
#[allow(dead_code)]
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, response.to_string()) }).await
}

/// Start a programmable mock backend on an ephemeral port.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Build the full decision core from a config and serve it on an ephemeral
/// port, mirroring the wiring in the binary. Returns the proxy address plus
/// the handles tests poke at.
#[allow(dead_code)]
pub async fn spawn_edge(
    config: EdgeConfig,
) -> (SocketAddr, Arc<RoutingEngine>, Arc<DynamicRoutes>, Shutdown) {
    let provider = Arc::new(StaticServerList::from_config(&config.services));
    let health = Arc::new(HealthRegistry::new(config.circuit.trip_threshold));
    let registry = Arc::new(ServiceRegistry::new(provider, health));

    let dynamic = Arc::new(DynamicRoutes::new());
    let table = Arc::new(RouteTable::new(config.routes.clone(), dynamic.clone()));

    let strategy = build_strategy(&config.load_balancer.strategy).unwrap();
    let engine = Arc::new(RoutingEngine::new(table, registry.clone(), strategy));

    let shutdown = Shutdown::new();

    if config.probe.enabled {
        let probe = build_probe(&config.probe).unwrap();
        let prober = HealthProber::new(registry, probe, config.probe.clone());
        tokio::spawn(prober.run(shutdown.subscribe()));
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(engine.clone(), &config);
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, engine, dynamic, shutdown)
}
