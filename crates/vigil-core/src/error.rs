//! Error types for configuration loading.

use thiserror::Error;

/// Errors that can occur while loading the config document.
///
/// Both variants are fatal: the daemon refuses to start without a
/// well-formed config (exit code is non-zero in that case).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
