//! Multi-listener server lifecycle.
//!
//! Runs an API listener, an RPC listener, a bridged RPC listener and a
//! health check listener under one shared lifecycle, and stops them in a
//! fixed, time-bounded order when any of them exits or the process is asked
//! to stop.
//!
//! # Architecture Overview
//!
//! ```text
//!   config ──▶ lifecycle::startup ──▶ Orchestrator
//!                                        │ spawn
//!              ┌────────────┬────────────┼────────────┐
//!              ▼            ▼            ▼            ▼
//!         health-check     api          rpc        bridge     (http::HttpServer)
//!              │            │  net::tls  │            │
//!              └────────────┴─────┬──────┴────────────┘
//!                                 │ first exit / Shutdown
//!                                 ▼
//!                      ordered stop → Vec<ServeError>
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// Endpoints
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::Config;
pub use http::HttpServer;
pub use lifecycle::{Orchestrator, ServeError, Services, Shutdown};
