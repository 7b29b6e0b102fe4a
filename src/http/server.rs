//! HTTP listener backed by axum-server.
//!
//! # Responsibilities
//! - Host one axum `Router` on one TCP address, plaintext or TLS
//! - Serve HTTP/1.1 and HTTP/2 (h2 via ALPN, h2c on plaintext)
//! - Toggle keep-alive for responses written after shutdown begins
//! - Graceful stop through an axum-server `Handle`, bounded or unbounded

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Version},
    middleware::{self, Next},
    response::Response,
    Router,
};
use axum_server::tls_rustls::{from_tcp_rustls, RustlsConfig};
use axum_server::Handle;
use tokio::sync::watch;

use crate::config::{EnvLookup, ProcessEnv, ServerConfig, TlsConfig};
use crate::health;
use crate::lifecycle::{Listener, ListenerKind, ServeError};
use crate::net::{listener, tls};

/// A single listener slot serving an axum router.
pub struct HttpServer {
    kind: ListenerKind,
    addr: SocketAddr,
    router: Mutex<Option<Router>>,
    tls: Option<TlsConfig>,
    env: Arc<dyn EnvLookup>,
    handle: Handle,
    keep_alive: Arc<AtomicBool>,
    stop_requested: AtomicBool,
    stopped: watch::Sender<bool>,
}

impl HttpServer {
    /// Create a listener. TLS material is resolved through `env` when `serve` runs.
    pub fn new(
        kind: ListenerKind,
        addr: SocketAddr,
        router: Router,
        tls: Option<TlsConfig>,
        env: Arc<dyn EnvLookup>,
    ) -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            kind,
            addr,
            router: Mutex::new(Some(router)),
            tls,
            env,
            handle: Handle::new(),
            keep_alive: Arc::new(AtomicBool::new(true)),
            stop_requested: AtomicBool::new(false),
            stopped,
        }
    }

    pub fn api(cfg: &ServerConfig, router: Router, env: Arc<dyn EnvLookup>) -> Self {
        Self::new(ListenerKind::Api, cfg.api_addr(), router, tls_settings(cfg), env)
    }

    /// RPC listener. Plaintext RPC relies on h2c prior knowledge.
    pub fn rpc(cfg: &ServerConfig, routes: tonic::service::Routes, env: Arc<dyn EnvLookup>) -> Self {
        Self::new(
            ListenerKind::Rpc,
            cfg.rpc_addr(),
            routes.into_axum_router(),
            tls_settings(cfg),
            env,
        )
    }

    pub fn bridge(cfg: &ServerConfig, router: Router, env: Arc<dyn EnvLookup>) -> Self {
        Self::new(ListenerKind::Bridge, cfg.bridge_addr(), router, tls_settings(cfg), env)
    }

    /// Health check listener. Always plaintext.
    pub fn health_check(cfg: &ServerConfig) -> Self {
        Self::new(
            ListenerKind::HealthCheck,
            cfg.health_check_addr(),
            health::router(&cfg.health_check_path),
            None,
            Arc::new(ProcessEnv),
        )
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Bound address once serving, `None` if the listener exited before binding.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        let mut stopped = self.stopped.subscribe();
        tokio::select! {
            biased;
            addr = self.handle.listening() => addr,
            _ = async { let _ = stopped.wait_for(|done| *done).await; } => None,
        }
    }

    /// Open connections, including ones draining.
    pub fn connection_count(&self) -> usize {
        self.handle.connection_count()
    }

    fn take_router(&self) -> Option<Router> {
        self.router
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn run(&self, router: Router) -> Result<(), ServeError> {
        let kind = self.kind;
        let app = router.layer(middleware::from_fn_with_state(
            Arc::clone(&self.keep_alive),
            keep_alive_gate,
        ));

        let tls = match &self.tls {
            Some(cfg) => Some(
                tls::build(cfg, &*self.env).map_err(|source| ServeError::Tls { kind, source })?,
            ),
            None => None,
        };

        let tcp = listener::bind(self.addr).map_err(|source| ServeError::Listen { kind, source })?;

        tracing::info!(
            kind = %kind,
            address = %self.addr,
            tls = tls.is_some(),
            mutual_tls = tls.as_ref().is_some_and(|ctx| ctx.requires_client_auth()),
            "Listener serving"
        );

        let served = match tls {
            Some(ctx) => {
                from_tcp_rustls(tcp, RustlsConfig::from_config(ctx.server_config()))
                    .handle(self.handle.clone())
                    .serve(app.into_make_service())
                    .await
            }
            None => {
                axum_server::from_tcp(tcp)
                    .handle(self.handle.clone())
                    .serve(app.into_make_service())
                    .await
            }
        };
        served.map_err(|source| ServeError::Serve { kind, source })
    }
}

#[async_trait]
impl Listener for HttpServer {
    fn kind(&self) -> ListenerKind {
        self.kind
    }

    async fn serve(self: Arc<Self>) -> Result<(), ServeError> {
        let Some(router) = self.take_router() else {
            return Err(ServeError::AlreadyServed { kind: self.kind });
        };

        let result = self.run(router).await;
        self.stopped.send_replace(true);
        tracing::debug!(kind = %self.kind, ok = result.is_ok(), "Listener exited");
        result
    }

    fn set_keep_alives_enabled(&self, enabled: bool) {
        self.keep_alive.store(enabled, Ordering::Relaxed);
    }

    async fn shutdown(&self, deadline: Option<Duration>) -> Result<(), ServeError> {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let mut stopped = self.stopped.subscribe();
        let drained = async move {
            let _ = stopped.wait_for(|done| *done).await;
        };
        self.handle.graceful_shutdown(None);

        let Some(timeout) = deadline else {
            drained.await;
            return Ok(());
        };

        if tokio::time::timeout(timeout, drained).await.is_err() {
            tracing::warn!(
                kind = %self.kind,
                connections = self.handle.connection_count(),
                "Graceful stop timed out, closing connections"
            );
            self.handle.shutdown();
            return Err(ServeError::ShutdownTimeout {
                kind: self.kind,
                timeout,
            });
        }
        Ok(())
    }
}

fn tls_settings(cfg: &ServerConfig) -> Option<TlsConfig> {
    cfg.tls.enabled.then(|| cfg.tls.clone())
}

/// Ask HTTP/1 clients to close once keep-alive is off. HTTP/2 drains via GOAWAY.
async fn keep_alive_gate(State(enabled): State<Arc<AtomicBool>>, request: Request, next: Next) -> Response {
    let http1 = request.version() <= Version::HTTP_11;
    let mut response = next.run(request).await;
    if http1 && !enabled.load(Ordering::Relaxed) {
        response
            .headers_mut()
            .insert(header::CONNECTION, HeaderValue::from_static("close"));
    }
    response
}
