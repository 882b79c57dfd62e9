//! Admin API tests: bearer auth, status reporting, and dynamic route updates
//! taking effect on live traffic.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use switchboard::admin::{setup_admin_router, AdminState};
use switchboard::config::{EdgeConfig, RouteEntry, ServiceConfig};
use switchboard::engine::RoutingEngine;
use switchboard::lifecycle::{signalled, Shutdown};
use switchboard::load_balancer::ServiceId;
use switchboard::routing::DynamicRoutes;

mod common;

async fn spawn_admin(
    engine: Arc<RoutingEngine>,
    dynamic: Arc<DynamicRoutes>,
    key: &str,
    shutdown: &Shutdown,
) -> SocketAddr {
    let state = AdminState {
        engine,
        dynamic,
        api_key: key.into(),
    };
    let router = setup_admin_router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let rx = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = axum::serve(listener, router)
            .with_graceful_shutdown(signalled(rx))
            .await;
    });

    addr
}

fn two_service_config(alpha: SocketAddr, beta: SocketAddr) -> EdgeConfig {
    let mut config = EdgeConfig::default();
    config.probe.enabled = false;
    config.routes.push(RouteEntry {
        pattern: "/**".into(),
        service: ServiceId::from("alpha"),
    });
    config.services.push(ServiceConfig {
        name: ServiceId::from("alpha"),
        servers: vec![alpha.to_string()],
    });
    config.services.push(ServiceConfig {
        name: ServiceId::from("beta"),
        servers: vec![beta.to_string()],
    });
    config
}

#[tokio::test]
async fn test_admin_rejects_missing_or_wrong_key() {
    let alpha = common::start_mock_backend("alpha").await;
    let beta = common::start_mock_backend("beta").await;

    let config = two_service_config(alpha, beta);
    let (_proxy, engine, dynamic, shutdown) = common::spawn_edge(config).await;
    let admin = spawn_admin(engine, dynamic, "secret", &shutdown).await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let url = format!("http://{}/admin/status", admin);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(&url).bearer_auth("wrong").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(&url).bearer_auth("secret").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
}

#[tokio::test]
async fn test_status_reports_routes_and_health() {
    let alpha = common::start_mock_backend("alpha").await;
    let beta = common::start_mock_backend("beta").await;

    let config = two_service_config(alpha, beta);
    let (_proxy, engine, dynamic, shutdown) = common::spawn_edge(config).await;
    let admin = spawn_admin(engine, dynamic, "secret", &shutdown).await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let status: Value = client
        .get(format!("http://{}/admin/status", admin))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(status["routes"][0]["pattern"], "/**");
    assert_eq!(status["routes"][0]["service"], "alpha");
    assert_eq!(status["routes"][0]["source"], "static");

    let services = status["services"].as_array().unwrap();
    assert_eq!(services.len(), 2);
    assert_eq!(services[0]["name"], "alpha");
    assert_eq!(services[0]["backends"][0]["alive"], true);
    assert_eq!(services[0]["backends"][0]["circuit_open"], false);

    shutdown.trigger();
}

#[tokio::test]
async fn test_dynamic_route_overrides_static_in_place() {
    let alpha = common::start_mock_backend("alpha").await;
    let beta = common::start_mock_backend("beta").await;

    let config = two_service_config(alpha, beta);
    let (proxy, engine, dynamic, shutdown) = common::spawn_edge(config).await;
    let admin = spawn_admin(engine, dynamic, "secret", &shutdown).await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let body = client
        .get(format!("http://{}/", proxy))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "alpha");

    let summary: Value = client
        .put(format!("http://{}/admin/routes", admin))
        .bearer_auth("secret")
        .json(&json!([{"pattern": "/**", "service": "beta"}]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // Same pattern replaces the static entry instead of appending.
    assert_eq!(summary["routes"], 1);

    let body = client
        .get(format!("http://{}/", proxy))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "beta");

    let status: Value = client
        .get(format!("http://{}/admin/status", admin))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["routes"][0]["source"], "dynamic");

    shutdown.trigger();
}

#[tokio::test]
async fn test_put_routes_rejects_bad_patterns() {
    let alpha = common::start_mock_backend("alpha").await;
    let beta = common::start_mock_backend("beta").await;

    let config = two_service_config(alpha, beta);
    let (proxy, engine, dynamic, shutdown) = common::spawn_edge(config).await;
    let admin = spawn_admin(engine, dynamic, "secret", &shutdown).await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .put(format!("http://{}/admin/routes", admin))
        .bearer_auth("secret")
        .json(&json!([{"pattern": "no-slash", "service": "beta"}]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let rejection: Value = res.json().await.unwrap();
    assert_eq!(rejection["invalid_patterns"][0], "no-slash");

    // The table keeps serving the previous routes.
    let body = client
        .get(format!("http://{}/", proxy))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "alpha");

    shutdown.trigger();
}

#[tokio::test]
async fn test_refresh_reports_table_counts() {
    let alpha = common::start_mock_backend("alpha").await;
    let beta = common::start_mock_backend("beta").await;

    let config = two_service_config(alpha, beta);
    let (_proxy, engine, dynamic, shutdown) = common::spawn_edge(config).await;
    let admin = spawn_admin(engine, dynamic, "secret", &shutdown).await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let summary: Value = client
        .post(format!("http://{}/admin/refresh", admin))
        .bearer_auth("secret")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(summary["routes"], 1);
    assert_eq!(summary["services"], 2);
    assert_eq!(summary["backends"], 2);

    shutdown.trigger();
}
