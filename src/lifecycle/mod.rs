//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     ServerConfig + Services → HttpServer per enabled slot → Orchestrator
//!
//! Run (orchestrator.rs):
//!     spawn every listener → first exit or Shutdown → ordered stop
//!     → Vec<ServeError> delivered once
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - Any listener exit ends the run; failed listeners are never restarted
//! - Ordered shutdown: health check first, then api, rpc, bridge
//! - Each bounded stop has its own deadline

pub mod error;
pub mod listener;
pub mod orchestrator;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use error::{has_failures, ServeError};
pub use listener::{Listener, ListenerKind};
pub use orchestrator::{Orchestrator, Phase, Timing, LAUNCH_GRACE};
pub use shutdown::Shutdown;
pub use startup::{assemble, assemble_with, Services};
