//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (resolve `_NAME_` placeholders)
//!     → validation.rs (semantic checks)
//!     → Config (validated, immutable)
//!
//! At listener start:
//!     TlsConfig indirection keys
//!     → env.rs (EnvLookup)
//!     → concrete certificate / key / CA paths
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Durations are kept as strings; malformed values fall back to defaults
//!   with a warning instead of failing the load

pub mod duration;
pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::{EnvLookup, ProcessEnv};
pub use loader::{load_config, ConfigError};
pub use schema::{Config, ObservabilityConfig, ServerConfig, TlsConfig};

/// Configuration file version understood by this build.
pub const CURRENT_VERSION: &str = "v1.0.0";

/// Returns the configuration version this server accepts.
pub fn version() -> &'static str {
    CURRENT_VERSION
}
