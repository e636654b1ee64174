//! Error types for provisioner-telemetry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// An OTLP exporter could not be built.
    #[error("failed to build OTLP {signal} exporter: {source}")]
    Exporter {
        signal: &'static str,
        #[source]
        source: opentelemetry_otlp::ExporterBuildError,
    },

    /// A global tracing subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    /// One or more providers failed to shut down.
    #[error("telemetry shutdown failed: {}", .0.join("; "))]
    Shutdown(Vec<String>),
}
