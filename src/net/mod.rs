//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig port
//!     → listener.rs (bind, typed bind errors)
//!     → tls.rs (optional TLS context from env-indirected material)
//!     → Hand off to the HTTP layer (axum-server)
//! ```
//!
//! # Design Decisions
//! - TLS contexts are built per listener at serve time, never cached
//! - Bind failures are listener-local and reported, never panicked on

pub mod listener;
pub mod tls;

pub use listener::ListenerError;
pub use tls::{TlsContext, TlsError};
