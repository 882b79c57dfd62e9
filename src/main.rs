//! Switchboard edge proxy.
//!
//! A client-affine routing proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 SWITCHBOARD                   │
//!                       │                                               │
//!     Client Request    │  ┌─────────┐    ┌──────────────────────────┐ │
//!     ──────────────────┼─▶│  http   │───▶│      routing engine       │ │
//!                       │  │ server  │    │  route table → registry   │ │
//!                       │  └─────────┘    │  → strategy (client hash) │ │
//!                       │                 │  → circuit breaker        │ │
//!                       │                 └────────────┬─────────────┘ │
//!                       │                              │                │
//!     Client Response   │  ┌─────────┐    ┌────────────▼─────────────┐ │
//!     ◀─────────────────┼──│ stream  │◀───│      http client          │◀┼── Backend
//!                       │  │  back   │    │   (single forward)        │ │    Server
//!                       │  └─────────┘    └──────────────────────────┘ │
//!                       │                                               │
//!                       │  ┌─────────────────────────────────────────┐ │
//!                       │  │           Cross-Cutting Concerns         │ │
//!                       │  │  config + hot reload │ liveness prober   │ │
//!                       │  │  metrics + tracing   │ admin API         │ │
//!                       │  └─────────────────────────────────────────┘ │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use switchboard::admin::{setup_admin_router, AdminState};
use switchboard::config::{load_config, ConfigWatcher, EdgeConfig};
use switchboard::engine::{RoutingEngine, ServiceRegistry};
use switchboard::health::{build_probe, HealthProber, HealthRegistry};
use switchboard::http::HttpServer;
use switchboard::lifecycle::{signalled, Shutdown};
use switchboard::load_balancer::{build_strategy, ServerProvider, StaticServerList};
use switchboard::observability::metrics;
use switchboard::routing::{DynamicRoutes, RouteSupplier, RouteTable};

#[derive(Parser)]
#[command(name = "switchboard", version, about = "Edge proxy with client-affine routing")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration; an explicit path that fails to load is fatal
    let config = match &args.config {
        Some(path) => Some(load_config(path)?),
        None => None,
    };

    // Initialize tracing: RUST_LOG wins, the config level is the default
    let default_level = config
        .as_ref()
        .map(|c| c.observability.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("switchboard={default_level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "switchboard starting");

    let config = config.unwrap_or_else(|| {
        tracing::warn!("No config file given, using built-in defaults");
        EdgeConfig::default()
    });

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        services = config.services.len(),
        strategy = %config.load_balancer.strategy,
        "Configuration loaded"
    );

    // Metrics exporter
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Decision core wiring
    let provider = Arc::new(StaticServerList::from_config(&config.services));
    let health = Arc::new(HealthRegistry::new(config.circuit.trip_threshold));
    let registry = Arc::new(ServiceRegistry::new(
        Arc::clone(&provider) as Arc<dyn ServerProvider>,
        health,
    ));
    let dynamic = Arc::new(DynamicRoutes::new());
    let table = Arc::new(RouteTable::new(
        config.routes.clone(),
        Arc::clone(&dynamic) as Arc<dyn RouteSupplier>,
    ));
    let strategy = build_strategy(&config.load_balancer.strategy)?;
    let engine = Arc::new(RoutingEngine::new(table, Arc::clone(&registry), strategy));

    let shutdown = Arc::new(Shutdown::new());

    // Liveness prober
    if config.probe.enabled {
        let probe = build_probe(&config.probe)?;
        let prober = HealthProber::new(Arc::clone(&registry), probe, config.probe.clone());
        tokio::spawn(prober.run(shutdown.subscribe()));
    } else {
        tracing::info!("Liveness probing disabled");
    }

    // Config hot reload: routes and servers apply live
    // TODO: apply probe and circuit settings on reload (currently requires restart)
    let mut _watcher_guard = None;
    if let Some(path) = &args.config {
        let (watcher, mut updates) = ConfigWatcher::new(path);
        _watcher_guard = Some(watcher.run()?);

        let engine_for_reload = Arc::clone(&engine);
        let provider_for_reload = Arc::clone(&provider);
        let mut reload_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe_config = updates.recv() => {
                        let Some(new_config) = maybe_config else { break };
                        provider_for_reload.replace(&new_config.services);
                        engine_for_reload.table().reload_static(new_config.routes.clone());
                        engine_for_reload.registry().refresh();
                        tracing::info!("Configuration reload applied");
                    }
                    _ = reload_shutdown.recv() => break,
                }
            }
        });
    }

    // Admin API
    if config.admin.enabled {
        let admin_state = AdminState {
            engine: Arc::clone(&engine),
            dynamic: Arc::clone(&dynamic),
            api_key: config.admin.api_key.clone(),
        };
        let admin_router = setup_admin_router(admin_state);
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %config.admin.bind_address, "Admin API listening");

        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = axum::serve(admin_listener, admin_router)
                .with_graceful_shutdown(signalled(admin_shutdown))
                .await
            {
                tracing::error!(error = %e, "Admin server error");
            }
        });
    }

    // Ctrl-C fans out through the shutdown coordinator
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Shutdown signal received"),
                Err(e) => tracing::error!(error = %e, "Failed to listen for shutdown signal"),
            }
            shutdown.trigger();
        });
    }

    // HTTP server runs until shutdown
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(Arc::clone(&engine), &config);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
