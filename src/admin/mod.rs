//! Admin API: status, refresh trigger, dynamic route updates.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::engine::RoutingEngine;
use crate::routing::DynamicRoutes;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State injected into admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub engine: Arc<RoutingEngine>,
    pub dynamic: Arc<DynamicRoutes>,
    pub api_key: String,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/refresh", post(post_refresh))
        .route("/admin/routes", put(put_routes))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
