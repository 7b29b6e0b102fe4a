//! Listener slots managed by the orchestrator.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::lifecycle::error::ServeError;

/// The four listener slots.
///
/// The declaration order is the shutdown order: health check first so load
/// balancers stop routing before anything else starts draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerKind {
    /// Liveness endpoint.
    HealthCheck,
    /// Primary REST API.
    Api,
    /// Secondary RPC protocol.
    Rpc,
    /// RPC bridged to a browser-friendly transport.
    Bridge,
}

impl ListenerKind {
    /// All kinds in shutdown order.
    pub const ALL: [ListenerKind; 4] = [
        ListenerKind::HealthCheck,
        ListenerKind::Api,
        ListenerKind::Rpc,
        ListenerKind::Bridge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerKind::HealthCheck => "health-check",
            ListenerKind::Api => "api",
            ListenerKind::Rpc => "rpc",
            ListenerKind::Bridge => "bridge",
        }
    }
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One independently serving network endpoint.
///
/// `serve` runs on its own task until the listener stops; `shutdown` is
/// called from the orchestrator's task while `serve` is still running.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    fn kind(&self) -> ListenerKind;

    /// Bind and serve until stopped. Resolves exactly once with the terminal outcome.
    async fn serve(self: Arc<Self>) -> Result<(), ServeError>;

    /// Toggle HTTP keep-alive for subsequent responses.
    fn set_keep_alives_enabled(&self, enabled: bool);

    /// Stop accepting and drain in-flight work.
    ///
    /// With a deadline, gives up after it elapses and reports
    /// [`ServeError::ShutdownTimeout`]. Without one, waits for the drain to finish.
    /// Calls after the first are no-ops.
    async fn shutdown(&self, deadline: Option<Duration>) -> Result<(), ServeError>;
}
