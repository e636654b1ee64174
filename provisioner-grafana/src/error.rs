//! Error types for provisioner-grafana.

use thiserror::Error;

/// All errors that can arise from a Grafana API call.
///
/// A lookup that finds nothing is not an error: lookups return `Ok(None)` on
/// HTTP 404. Any variant here means the state of the resource is unknown.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Grafana answered with a non-success status.
    #[error("{method} {path} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        path: String,
        status: u16,
        body: String,
    },

    /// The request never produced an HTTP response (DNS, connect, timeout...).
    #[error("{method} {path} failed: {source}")]
    Transport {
        method: &'static str,
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The response body was not the JSON we expected.
    #[error("failed to decode response of {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status code, when Grafana produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
