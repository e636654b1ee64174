//! # provisioner-telemetry
//!
//! Console logging plus OpenTelemetry export of traces, metrics and logs.
//!
//! Call [`init`] once at startup and keep the returned [`TelemetryGuard`]
//! alive for the whole run; call [`TelemetryGuard::shutdown`] before exit so
//! batched telemetry is flushed.

pub mod error;
pub mod providers;

use opentelemetry::global;
use opentelemetry::metrics::Meter;
use opentelemetry::propagation::TextMapCompositePropagator;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use provisioner_core::Settings;

pub use error::TelemetryError;

use crate::providers::Providers;

/// Instrumentation scope name for tracers and meters.
pub const SCOPE: &str = "grafana-provisioner";

/// Log records from the exporters' own HTTP stack must not be fed back into
/// the log exporter.
const BRIDGE_FILTER: &str = "info,hyper=off,h2=off,reqwest=off,opentelemetry=off";

/// Keeps the providers alive; flushes them on [`TelemetryGuard::shutdown`].
pub struct TelemetryGuard {
    providers: Option<Providers>,
}

impl TelemetryGuard {
    /// `true` when OTLP export is active.
    pub fn exporting(&self) -> bool {
        self.providers.is_some()
    }

    /// Meter for run metrics. A no-op meter when export is disabled.
    pub fn meter(&self) -> Meter {
        global::meter(SCOPE)
    }

    /// Shut every provider down, traces first, and join their errors.
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        let Some(providers) = self.providers else {
            return Ok(());
        };
        let errors = providers.shutdown();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TelemetryError::Shutdown(errors))
        }
    }
}

/// Install the global subscriber, propagator and providers.
///
/// With `settings.telemetry_enabled` unset only console logging is
/// installed. `RUST_LOG` controls the console filter (default `info`).
pub fn init(settings: &Settings) -> Result<TelemetryGuard, TelemetryError> {
    global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
        Box::new(TraceContextPropagator::new()),
        Box::new(BaggagePropagator::new()),
    ]));

    let providers = if settings.telemetry_enabled {
        let providers = Providers::build(providers::resource(settings))?;
        global::set_tracer_provider(providers.tracer.clone());
        global::set_meter_provider(providers.meter.clone());
        Some(providers)
    } else {
        None
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let spans = providers
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer.tracer(SCOPE)));
    let logs = providers.as_ref().map(|p| {
        OpenTelemetryTracingBridge::new(&p.logger).with_filter(EnvFilter::new(BRIDGE_FILTER))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(spans)
        .with(logs)
        .try_init()?;

    tracing::debug!(
        service = %settings.service_name,
        exporting = providers.is_some(),
        "telemetry initialized"
    );
    Ok(TelemetryGuard { providers })
}
