//! TCP binding for listener slots.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Surface bind failures (address in use, permission) as typed errors
//! - Hand a non-blocking std listener to the serving layer

use std::net::SocketAddr;

use thiserror::Error;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl ListenerError {
    pub fn io_kind(&self) -> std::io::ErrorKind {
        match self {
            ListenerError::Bind { source, .. } => source.kind(),
        }
    }
}

/// Bind a TCP listener ready to be driven by tokio.
pub fn bind(addr: SocketAddr) -> Result<std::net::TcpListener, ListenerError> {
    let to_err = |source| ListenerError::Bind { addr, source };

    let listener = std::net::TcpListener::bind(addr).map_err(to_err)?;
    listener.set_nonblocking(true).map_err(to_err)?;

    let local_addr = listener.local_addr().map_err(to_err)?;
    tracing::debug!(address = %local_addr, "Listener bound");

    Ok(listener)
}
