//! Periodic liveness probing.
//!
//! # Responsibilities
//! - Probe every registered backend on a fixed interval
//! - Feed verdicts into the shared health registry
//! - Keep probing dead and tripped backends so they can recover
//!
//! # Design Decisions
//! - Probes are a trait, built from a static kind table at startup;
//!   HTTP and TCP ship, others plug in without touching the loop
//! - A sweep probes all backends concurrently and applies verdicts
//!   afterwards, so one slow backend cannot starve the rest
//! - An HTTP backend is alive only on status 200, and when an expected
//!   body is configured it must match exactly

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time;

use crate::config::schema::ProbeConfig;
use crate::engine::ServiceRegistry;
use crate::load_balancer::BackendDescriptor;
use crate::observability::metrics;

/// Verdict from probing one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub alive: bool,
    pub content: Option<String>,
}

/// A liveness probe for a single backend.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, backend: &BackendDescriptor) -> ProbeReport;
}

/// HTTP GET probe.
pub struct HttpProbe {
    client: reqwest::Client,
    secure: bool,
    path: String,
    expected_content: Option<String>,
}

impl HttpProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            secure: config.secure,
            path: config.path.clone(),
            expected_content: config.expected_content.clone(),
        })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, backend: &BackendDescriptor) -> ProbeReport {
        let url = backend.probe_url(self.secure, &self.path);
        match self.client.get(&url).send().await {
            Ok(response) => {
                let status = response.status();
                let content = response.text().await.ok();
                let content_ok = match (&self.expected_content, content.as_deref()) {
                    (None, _) => true,
                    (Some(want), Some(got)) => want == got,
                    (Some(_), None) => false,
                };
                let alive = status == StatusCode::OK && content_ok;

                if status != StatusCode::OK {
                    tracing::warn!(
                        backend = %backend.id(),
                        status = %status,
                        "Probe failed: non-200 status"
                    );
                } else if !content_ok {
                    tracing::warn!(backend = %backend.id(), "Probe failed: unexpected body");
                }

                ProbeReport { alive, content }
            }
            Err(e) => {
                tracing::warn!(backend = %backend.id(), error = %e, "Probe failed: request error");
                ProbeReport {
                    alive: false,
                    content: None,
                }
            }
        }
    }
}

/// TCP connect probe. Useful for backends without an HTTP health path.
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl HealthProbe for TcpProbe {
    async fn probe(&self, backend: &BackendDescriptor) -> ProbeReport {
        let alive = match time::timeout(self.timeout, TcpStream::connect(backend.authority())).await
        {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                tracing::warn!(backend = %backend.id(), error = %e, "Probe failed: connect error");
                false
            }
            Err(_) => {
                tracing::warn!(backend = %backend.id(), "Probe failed: timeout");
                false
            }
        };
        ProbeReport {
            alive,
            content: None,
        }
    }
}

/// Error building a probe from configuration.
#[derive(Debug, Error)]
pub enum ProbeInitError {
    #[error("unknown probe kind {0:?}")]
    UnknownKind(String),

    #[error("failed to build probe client: {0}")]
    Client(#[from] reqwest::Error),
}

fn http_probe(config: &ProbeConfig) -> Result<Arc<dyn HealthProbe>, ProbeInitError> {
    Ok(Arc::new(HttpProbe::new(config)?))
}

fn tcp_probe(config: &ProbeConfig) -> Result<Arc<dyn HealthProbe>, ProbeInitError> {
    Ok(Arc::new(TcpProbe::new(config)))
}

/// Probe constructors, looked up by config kind at startup.
static PROBES: &[(
    &str,
    fn(&ProbeConfig) -> Result<Arc<dyn HealthProbe>, ProbeInitError>,
)] = &[("http", http_probe), ("tcp", tcp_probe)];

/// Whether a probe kind has a constructor.
pub fn known_probe_kind(kind: &str) -> bool {
    PROBES.iter().any(|(k, _)| *k == kind)
}

/// Build the probe configured under the given kind.
pub fn build_probe(config: &ProbeConfig) -> Result<Arc<dyn HealthProbe>, ProbeInitError> {
    PROBES
        .iter()
        .find(|(k, _)| *k == config.kind)
        .map(|(_, ctor)| ctor(config))
        .unwrap_or_else(|| Err(ProbeInitError::UnknownKind(config.kind.clone())))
}

/// Drives periodic sweeps over every registered backend.
pub struct HealthProber {
    registry: Arc<ServiceRegistry>,
    probe: Arc<dyn HealthProbe>,
    config: ProbeConfig,
}

impl HealthProber {
    pub fn new(
        registry: Arc<ServiceRegistry>,
        probe: Arc<dyn HealthProbe>,
        config: ProbeConfig,
    ) -> Self {
        Self {
            registry,
            probe,
            config,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Liveness probing disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            kind = %self.config.kind,
            "Health prober starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health prober received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once and apply the verdicts.
    async fn sweep(&self) {
        let backends = self.registry.all_backends();
        let reports = futures_util::future::join_all(backends.iter().map(|backend| {
            let probe = Arc::clone(&self.probe);
            async move { probe.probe(backend).await }
        }))
        .await;

        let health = self.registry.health();
        for (backend, report) in backends.iter().zip(reports) {
            let flipped = health.apply_probe(backend.id(), report.alive, report.content);
            if flipped {
                if report.alive {
                    tracing::info!(backend = %backend.id(), "Backend recovered, circuit closed");
                } else {
                    tracing::warn!(
                        backend = %backend.id(),
                        "Backend tripped after repeated probe failures"
                    );
                }
            }
            metrics::record_backend_health(backend.id(), report.alive);
        }
    }
}
