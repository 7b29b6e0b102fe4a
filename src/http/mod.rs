//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! Router (api) or tonic Routes (rpc, and grpc_web.rs for the bridge)
//!     → server.rs (keep-alive gate, TLS from net::tls, bind from net::listener)
//!     → axum-server (HTTP/1.1 + HTTP/2)
//!     → Handle (graceful stop driven by the orchestrator)
//! ```

pub mod grpc_web;
pub mod server;

pub use server::HttpServer;
