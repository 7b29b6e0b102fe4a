//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events
//!     → logging.rs (EnvFilter + fmt layer)
//!     → stdout
//! ```

pub mod logging;
