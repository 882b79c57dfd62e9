use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::admin::AdminState;
use crate::config::RouteEntry;
use crate::load_balancer::ServiceId;
use crate::routing::{PathPattern, RouteSource};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub strategy: &'static str,
    pub routes: Vec<RouteStatus>,
    pub services: Vec<ServiceStatus>,
}

#[derive(Serialize)]
pub struct RouteStatus {
    pub pattern: String,
    pub service: ServiceId,
    pub source: RouteSource,
}

#[derive(Serialize)]
pub struct ServiceStatus {
    pub name: ServiceId,
    pub backends: Vec<BackendStatus>,
}

#[derive(Serialize)]
pub struct BackendStatus {
    pub id: String,
    pub alive: bool,
    pub last_checked_ms: u64,
    pub consecutive_failures: u32,
    pub circuit_open: bool,
    pub last_failure_ms: u64,
}

#[derive(Serialize)]
pub struct RefreshSummary {
    pub routes: usize,
    pub services: usize,
    pub backends: usize,
}

#[derive(Serialize)]
pub struct RouteUpdateRejection {
    pub invalid_patterns: Vec<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let engine = &state.engine;

    let routes = engine
        .table()
        .snapshot()
        .iter()
        .map(|route| RouteStatus {
            pattern: route.pattern().to_string(),
            service: route.service().clone(),
            source: route.source(),
        })
        .collect();

    let registry = engine.registry();
    let health = registry.health();
    let mut service_ids = registry.services();
    service_ids.sort();

    let services = service_ids
        .into_iter()
        .map(|name| {
            let backends = registry
                .backends(&name)
                .iter()
                .map(|backend| {
                    let entry = health.entry(backend.id());
                    let stats = entry.stats.snapshot();
                    BackendStatus {
                        id: backend.id().to_string(),
                        alive: entry.state.is_alive(),
                        last_checked_ms: entry.state.last_checked_ms(),
                        consecutive_failures: stats.consecutive_failures,
                        circuit_open: stats.circuit_open,
                        last_failure_ms: stats.last_failure_ms,
                    }
                })
                .collect();
            ServiceStatus { name, backends }
        })
        .collect();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        strategy: engine.strategy_name(),
        routes,
        services,
    })
}

pub async fn post_refresh(State(state): State<AdminState>) -> Json<RefreshSummary> {
    state.engine.refresh();

    let registry = state.engine.registry();
    Json(RefreshSummary {
        routes: state.engine.table().snapshot().len(),
        services: registry.services().len(),
        backends: registry.all_backends().len(),
    })
}

pub async fn put_routes(
    State(state): State<AdminState>,
    Json(entries): Json<Vec<RouteEntry>>,
) -> Result<Json<RefreshSummary>, (StatusCode, Json<RouteUpdateRejection>)> {
    let invalid: Vec<String> = entries
        .iter()
        .filter(|e| PathPattern::parse(&e.pattern).is_err())
        .map(|e| e.pattern.clone())
        .collect();

    if !invalid.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(RouteUpdateRejection {
                invalid_patterns: invalid,
            }),
        ));
    }

    tracing::info!(routes = entries.len(), "Dynamic routes replaced via admin API");
    state.dynamic.replace(entries);
    state.engine.table().refresh();

    let registry = state.engine.registry();
    Ok(Json(RefreshSummary {
        routes: state.engine.table().snapshot().len(),
        services: registry.services().len(),
        backends: registry.all_backends().len(),
    }))
}
