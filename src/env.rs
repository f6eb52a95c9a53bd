//! Environment variable names read by [`crate::init`] helpers.
//!
//! The formatting pipeline itself never touches the environment; these only
//! make it convenient to pick an output style from a service's deployment.

/// Output style of emitted records: `compact` (default) or `pretty`.
pub const LOG_LINKER_STYLE_ENV: &str = "LOG_LINKER_STYLE";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
