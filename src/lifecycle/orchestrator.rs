//! Multi-listener lifecycle orchestration.
//!
//! # States
//! ```text
//! Idle → Starting → Running → Stopping → Stopped
//! ```
//!
//! # Data Flow
//! ```text
//! run():
//!     spawn one task per enabled listener ──┐ (kind, Result) per exit
//!     sleep LAUNCH_GRACE                    │
//!     select! { shutdown.cancelled(), first completion }
//!     stop the listeners still running, in ListenerKind order:
//!         health-check: keep-alive off → shutdown(shutdown_duration)
//!         api, bridge:  probe wait → keep-alive off → shutdown(shutdown_duration)
//!         rpc:          probe wait → shutdown(drain, no deadline)
//!     collect the exits of the stopped listeners
//!     deliver Vec<ServeError> once (cancellation appended last)
//! ```
//!
//! # Design Decisions
//! - The launch grace is a fixed delay, not a readiness proof; a listener
//!   that fails to bind is still reported, only later
//! - Stop steps run one after another; a failing step is recorded and the
//!   next one still runs
//! - Every listener's own exit error is reported, not only the first one;
//!   a listener that already exited is not stopped again
//! - `run` consumes the orchestrator, so the stop sequence and the result
//!   delivery can only happen once

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::config::ServerConfig;
use crate::lifecycle::error::ServeError;
use crate::lifecycle::listener::{Listener, ListenerKind};
use crate::lifecycle::shutdown::Shutdown;

/// Delay between launching listeners and watching for their exit.
pub const LAUNCH_GRACE: Duration = Duration::from_secs(1);

/// Delays and bounds applied while starting and stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Bound for each graceful stop that has one.
    pub shutdown_duration: Duration,
    /// Wait before stopping anything but the health check listener.
    pub probe_wait: Duration,
    /// Wait after launch before exits and cancellation are evaluated.
    pub launch_grace: Duration,
}

impl Timing {
    pub fn from_config(cfg: &ServerConfig) -> Self {
        Self {
            shutdown_duration: cfg.shutdown_duration(),
            probe_wait: cfg.probe_wait_time(),
            launch_grace: LAUNCH_GRACE,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// Orchestrator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
}

type Completion = (ListenerKind, Result<(), ServeError>);

enum Trigger {
    Cancelled,
    Exited(ListenerKind, Result<(), ServeError>),
}

/// Listeners that have not reported an exit yet, and the errors gathered so far.
struct Exits {
    running: BTreeSet<ListenerKind>,
    errors: Vec<ServeError>,
}

impl Exits {
    fn new(kinds: impl IntoIterator<Item = ListenerKind>) -> Self {
        Self {
            running: kinds.into_iter().collect(),
            errors: Vec::new(),
        }
    }

    fn is_running(&self, kind: ListenerKind) -> bool {
        self.running.contains(&kind)
    }

    fn record(&mut self, kind: ListenerKind, result: Result<(), ServeError>) {
        self.running.remove(&kind);
        if let Err(e) = result {
            tracing::error!(kind = %kind, error = %e, "Listener failed");
            self.errors.push(e);
        }
    }

    fn drain_ready(&mut self, completions: &mut mpsc::Receiver<Completion>) {
        while let Ok((kind, result)) = completions.try_recv() {
            self.record(kind, result);
        }
    }
}

/// Starts every enabled listener and stops them all together.
pub struct Orchestrator {
    listeners: BTreeMap<ListenerKind, Arc<dyn Listener>>,
    timing: Timing,
    phase: watch::Sender<Phase>,
}

impl Orchestrator {
    pub fn new(timing: Timing) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            listeners: BTreeMap::new(),
            timing,
            phase,
        }
    }

    /// Enable a listener slot. A second listener of the same kind replaces the first.
    pub fn with_listener(mut self, listener: Arc<dyn Listener>) -> Self {
        let kind = listener.kind();
        if self.listeners.insert(kind, listener).is_some() {
            tracing::warn!(kind = %kind, "Listener slot replaced");
        }
        self
    }

    pub fn is_enabled(&self, kind: ListenerKind) -> bool {
        self.listeners.contains_key(&kind)
    }

    /// Enabled slots in shutdown order.
    pub fn enabled(&self) -> Vec<ListenerKind> {
        self.listeners.keys().copied().collect()
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Observe phase transitions.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Run on a background task. The receiver yields the aggregated result once.
    pub fn listen_and_serve(self, shutdown: Shutdown) -> oneshot::Receiver<Vec<ServeError>> {
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let errors = self.run(shutdown).await;
            if tx.send(errors).is_err() {
                tracing::debug!("Result receiver dropped before delivery");
            }
        });
        rx
    }

    /// Serve until `shutdown` fires or any listener exits, then stop the rest.
    pub async fn run(self, shutdown: Shutdown) -> Vec<ServeError> {
        self.set_phase(Phase::Starting);
        let mut completions = self.launch();

        tokio::time::sleep(self.timing.launch_grace).await;
        self.set_phase(Phase::Running);
        tracing::info!(listeners = ?self.enabled(), "Listeners running");

        let trigger = tokio::select! {
            _ = shutdown.cancelled() => Trigger::Cancelled,
            Some((kind, result)) = completions.recv() => Trigger::Exited(kind, result),
        };

        self.set_phase(Phase::Stopping);
        let mut exits = Exits::new(self.listeners.keys().copied());
        let cancelled = match trigger {
            Trigger::Cancelled => {
                tracing::info!("Stopping listeners: shutdown requested");
                true
            }
            Trigger::Exited(kind, result) => {
                if result.is_ok() {
                    tracing::warn!(kind = %kind, "Listener exited, stopping the others");
                }
                exits.record(kind, result);
                false
            }
        };

        for (&kind, listener) in &self.listeners {
            exits.drain_ready(&mut completions);
            if !exits.is_running(kind) {
                continue;
            }
            if let Err(e) = self.stop(listener.as_ref()).await {
                tracing::warn!(kind = %kind, error = %e, "Listener shutdown failed");
                exits.errors.push(e);
            }
        }

        self.await_exits(&mut completions, &mut exits).await;

        let mut errors = exits.errors;
        if cancelled {
            errors.push(ServeError::Cancelled);
        }

        self.set_phase(Phase::Stopped);
        tracing::info!(errors = errors.len(), "All listeners stopped");
        errors
    }

    /// Collect the outcome of every stopped listener, bounded by the shutdown duration per wait.
    async fn await_exits(&self, completions: &mut mpsc::Receiver<Completion>, exits: &mut Exits) {
        while !exits.running.is_empty() {
            match tokio::time::timeout(self.timing.shutdown_duration, completions.recv()).await {
                Ok(Some((kind, result))) => exits.record(kind, result),
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(listeners = ?exits.running, "Listeners still running after shutdown");
                    break;
                }
            }
        }
    }

    fn launch(&self) -> mpsc::Receiver<Completion> {
        let (tx, rx) = mpsc::channel(self.listeners.len().max(1));

        for (&kind, listener) in &self.listeners {
            let serving = tokio::spawn(Arc::clone(listener).serve());
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = match serving.await {
                    Ok(result) => result,
                    Err(e) => Err(ServeError::Aborted {
                        kind,
                        reason: e.to_string(),
                    }),
                };
                match &result {
                    Ok(()) => tracing::info!(kind = %kind, "Listener stopped"),
                    Err(e) => tracing::debug!(kind = %kind, error = %e, "Listener exited with error"),
                }
                let _ = tx.send((kind, result)).await;
            });
            tracing::debug!(kind = %kind, "Listener launched");
        }

        rx
    }

    async fn stop(&self, listener: &dyn Listener) -> Result<(), ServeError> {
        let kind = listener.kind();
        if kind != ListenerKind::HealthCheck {
            tracing::debug!(kind = %kind, wait = ?self.timing.probe_wait, "Waiting for probes to settle");
            tokio::time::sleep(self.timing.probe_wait).await;
        }

        let deadline = match kind {
            ListenerKind::Rpc => None,
            _ => {
                listener.set_keep_alives_enabled(false);
                Some(self.timing.shutdown_duration)
            }
        };

        tracing::info!(kind = %kind, deadline = ?deadline, "Stopping listener");
        listener.shutdown(deadline).await
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.send_replace(phase);
        tracing::debug!(phase = ?phase, "Orchestrator phase");
    }
}
