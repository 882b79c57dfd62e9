//! HTTP server setup and forwarding.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Ask the routing engine for a backend and forward the request
//! - Feed forwarded-request outcomes back into the circuit state
//! - Observability (metrics, correlation IDs)

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::uri::{Authority, PathAndQuery, Scheme},
    http::{Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::EdgeConfig;
use crate::engine::{RouteError, RoutingEngine};
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::lifecycle::signalled;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RoutingEngine>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the edge proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around a routing engine.
    pub fn new(engine: Arc<RoutingEngine>, config: &EdgeConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState { engine, client };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Asks the engine for a backend, rewrites the URI and forwards.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let path = request.uri().path().to_string();
    let method_str = request.method().to_string();

    let decision = match state.engine.route(&path, addr.ip()) {
        Ok(decision) => decision,
        Err(RouteError::NoRoute { .. }) => {
            tracing::warn!(request_id = %request_id, path = %path, "No route matched");
            metrics::record_request(&method_str, 404, "none", start_time);
            return (StatusCode::NOT_FOUND, "No matching route found").into_response();
        }
        Err(RouteError::NoBackend { service }) => {
            tracing::warn!(
                request_id = %request_id,
                path = %path,
                service = %service,
                "No usable backend"
            );
            metrics::record_request(&method_str, 503, "none", start_time);
            return (StatusCode::SERVICE_UNAVAILABLE, "No usable backend").into_response();
        }
    };

    let backend_id = decision.backend.id().to_string();
    tracing::debug!(
        request_id = %request_id,
        method = %method_str,
        path = %path,
        backend = %backend_id,
        "Forwarding request"
    );

    // URI rewrite: point at the backend, keep path and query
    let (mut parts, body) = request.into_parts();
    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    match Authority::from_str(decision.backend.authority()) {
        Ok(authority) => uri_parts.authority = Some(authority),
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                backend = %backend_id,
                error = %e,
                "Backend authority is not a valid URI authority"
            );
            metrics::record_request(&method_str, 502, &backend_id, start_time);
            return (StatusCode::BAD_GATEWAY, "Invalid backend address").into_response();
        }
    }
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream URI");
            metrics::record_request(&method_str, 502, &backend_id, start_time);
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };

    let outbound = Request::from_parts(parts, body);

    match state.client.request(outbound).await {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(&method_str, status.as_u16(), &backend_id, start_time);

            // gateway-ish errors count against the backend, anything it
            // answered on its own behalf counts as reachable
            match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => state.engine.report_failure(&backend_id),
                _ => state.engine.report_success(&backend_id),
            }

            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                backend = %backend_id,
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&method_str, 502, &backend_id, start_time);
            state.engine.report_failure(&backend_id);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
