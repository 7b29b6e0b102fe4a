//! Startup wiring.
//!
//! # Responsibilities
//! - Turn the supplied services and the server config into listener slots
//! - Attach the per-listener middleware (request timeout, tracing)
//! - Hand the slots to an [`Orchestrator`]
//!
//! # Design Decisions
//! - A slot is enabled only when its service was supplied
//! - The health check slot is enabled by a non-empty path, not by a service
//! - Without an explicit bridge router, the bridge serves the RPC routes over grpc-web

use std::sync::Arc;

use axum::Router;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{EnvLookup, ServerConfig};
use crate::http::{grpc_web, HttpServer};
use crate::lifecycle::orchestrator::{Orchestrator, Timing};

/// Externally supplied handlers. `None` disables that listener for the run.
#[derive(Default)]
pub struct Services {
    /// Primary REST API.
    pub api: Option<Router>,
    /// RPC services.
    pub rpc: Option<tonic::service::Routes>,
    /// RPC exposed over a browser-friendly transport. Derived from `rpc` when unset.
    pub bridge: Option<Router>,
}

/// Build the orchestrator with timings taken from `cfg`.
pub fn assemble(cfg: &ServerConfig, services: Services, env: Arc<dyn EnvLookup>) -> Orchestrator {
    assemble_with(cfg, services, env, Timing::from_config(cfg))
}

#[allow(deprecated)]
pub fn assemble_with(
    cfg: &ServerConfig,
    services: Services,
    env: Arc<dyn EnvLookup>,
    timing: Timing,
) -> Orchestrator {
    let mut orchestrator = Orchestrator::new(timing);

    if !cfg.health_check_path.is_empty() {
        orchestrator = orchestrator.with_listener(Arc::new(HttpServer::health_check(cfg)));
    }

    if let Some(router) = services.api {
        let router = router
            .layer(TimeoutLayer::new(cfg.request_timeout()))
            .layer(TraceLayer::new_for_http());
        orchestrator = orchestrator.with_listener(Arc::new(HttpServer::api(cfg, router, Arc::clone(&env))));
    }

    let bridge = services
        .bridge
        .or_else(|| services.rpc.clone().map(grpc_web::router));

    if let Some(routes) = services.rpc {
        let server = HttpServer::rpc(cfg, routes, Arc::clone(&env));
        orchestrator = orchestrator.with_listener(Arc::new(server));
    }

    if let Some(router) = bridge {
        let router = router.layer(TraceLayer::new_for_http());
        orchestrator = orchestrator.with_listener(Arc::new(HttpServer::bridge(cfg, router, env)));
    }

    tracing::info!(
        listeners = ?orchestrator.enabled(),
        tls = cfg.tls.enabled,
        "Server assembled"
    );
    orchestrator
}
