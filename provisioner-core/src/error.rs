//! Error types for provisioner-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading the provisioning config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file did not exist at the given path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure other than a missing file.
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error: includes file path and line/column from serde_json.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
