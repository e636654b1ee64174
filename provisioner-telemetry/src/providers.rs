//! OTLP providers for traces, metrics and logs.
//!
//! Exporters use HTTP/protobuf with a blocking client, so no async runtime
//! is needed. Endpoints and headers come from the standard
//! `OTEL_EXPORTER_OTLP_*` variables.

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_otlp::{LogExporter, MetricExporter, SpanExporter};
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;

use provisioner_core::Settings;

use crate::error::TelemetryError;

pub const SPAN_EXPORT_DELAY: Duration = Duration::from_secs(1);
pub const METRIC_EXPORT_INTERVAL: Duration = Duration::from_secs(3);

/// Resource attributes shared by every signal.
pub fn resource(settings: &Settings) -> Resource {
    Resource::builder()
        .with_service_name(settings.service_name.clone())
        .with_attributes([
            KeyValue::new("service.instance.id", uuid::Uuid::new_v4().to_string()),
            KeyValue::new(
                "deployment.environment",
                settings.deployment_environment.clone(),
            ),
        ])
        .build()
}

pub(crate) struct Providers {
    pub tracer: SdkTracerProvider,
    pub meter: SdkMeterProvider,
    pub logger: SdkLoggerProvider,
}

impl Providers {
    pub fn build(resource: Resource) -> Result<Self, TelemetryError> {
        let span_exporter = SpanExporter::builder()
            .with_http()
            .build()
            .map_err(|source| TelemetryError::Exporter { signal: "trace", source })?;
        let batch = BatchConfigBuilder::default()
            .with_scheduled_delay(SPAN_EXPORT_DELAY)
            .build();
        let tracer = SdkTracerProvider::builder()
            .with_span_processor(
                BatchSpanProcessor::builder(span_exporter)
                    .with_batch_config(batch)
                    .build(),
            )
            .with_resource(resource.clone())
            .build();

        let metric_exporter = MetricExporter::builder()
            .with_http()
            .build()
            .map_err(|source| TelemetryError::Exporter { signal: "metric", source })?;
        let reader = PeriodicReader::builder(metric_exporter)
            .with_interval(METRIC_EXPORT_INTERVAL)
            .build();
        let meter = SdkMeterProvider::builder()
            .with_reader(reader)
            .with_resource(resource.clone())
            .build();

        let log_exporter = LogExporter::builder()
            .with_http()
            .build()
            .map_err(|source| TelemetryError::Exporter { signal: "log", source })?;
        let logger = SdkLoggerProvider::builder()
            .with_batch_exporter(log_exporter)
            .with_resource(resource)
            .build();

        Ok(Self { tracer, meter, logger })
    }

    /// Flush and shut down traces, then metrics, then logs.
    pub fn shutdown(&self) -> Vec<String> {
        let results = [
            ("traces", self.tracer.shutdown()),
            ("metrics", self.meter.shutdown()),
            ("logs", self.logger.shutdown()),
        ];
        results
            .into_iter()
            .filter_map(|(signal, result)| result.err().map(|err| format!("{signal}: {err}")))
            .collect()
    }
}
