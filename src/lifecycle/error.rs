//! Entries of the aggregated result.

use std::time::Duration;

use thiserror::Error;

use crate::lifecycle::listener::ListenerKind;
use crate::net::{ListenerError, TlsError};

/// An error reported by a listener or by the orchestrator itself.
#[derive(Debug, Error)]
pub enum ServeError {
    /// TLS context could not be built; the listener never bound.
    #[error("{kind} listener TLS setup failed: {source}")]
    Tls {
        kind: ListenerKind,
        #[source]
        source: TlsError,
    },

    #[error("{kind} listener: {source}")]
    Listen {
        kind: ListenerKind,
        #[source]
        source: ListenerError,
    },

    /// The serve loop failed after binding.
    #[error("{kind} listener stopped with error: {source}")]
    Serve {
        kind: ListenerKind,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} listener did not stop within {timeout:?}")]
    ShutdownTimeout { kind: ListenerKind, timeout: Duration },

    /// The listener task panicked or was cancelled by the runtime.
    #[error("{kind} listener task aborted: {reason}")]
    Aborted { kind: ListenerKind, reason: String },

    #[error("{kind} listener was already served")]
    AlreadyServed { kind: ListenerKind },

    /// The external shutdown signal fired.
    #[error("context closed")]
    Cancelled,
}

impl ServeError {
    /// Listener the error belongs to, `None` for cancellation.
    pub fn kind(&self) -> Option<ListenerKind> {
        match self {
            ServeError::Tls { kind, .. }
            | ServeError::Listen { kind, .. }
            | ServeError::Serve { kind, .. }
            | ServeError::ShutdownTimeout { kind, .. }
            | ServeError::Aborted { kind, .. }
            | ServeError::AlreadyServed { kind } => Some(*kind),
            ServeError::Cancelled => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServeError::Cancelled)
    }
}

/// True when the aggregated result holds anything besides cancellation.
pub fn has_failures(errors: &[ServeError]) -> bool {
    errors.iter().any(|e| !e.is_cancelled())
}
