//! Environment indirection.
//!
//! Configuration never carries secrets or deployment paths directly. It names
//! environment variables instead, and the value is looked up when needed
//! through an [`EnvLookup`], so tests can swap the process environment for a map.

use std::collections::HashMap;

/// Resolves a symbolic key to a value.
pub trait EnvLookup: Send + Sync {
    /// Returns the value for `key`, `None` when it is unset.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Returns the value for `key`, treating unset, empty keys and empty values alike.
    fn resolve(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        self.lookup(key).filter(|value| !value.is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Returns the value of env var `NAME` when `value` is written as `_NAME_`,
/// otherwise `value` unchanged.
pub fn actual_value(value: &str, env: &dyn EnvLookup) -> String {
    match value
        .strip_prefix('_')
        .and_then(|inner| inner.strip_suffix('_'))
    {
        Some(name) if !name.is_empty() => env.lookup(name).unwrap_or_default(),
        _ => value.to_string(),
    }
}
