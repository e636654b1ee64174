//! Run metrics.

use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;

use crate::outcome::OrgReport;

/// Instruments recorded by the pipeline.
#[derive(Clone)]
pub struct ReconcileMetrics {
    resources: Counter<u64>,
    run_duration: Histogram<f64>,
}

impl ReconcileMetrics {
    pub fn new(meter: &Meter) -> Self {
        let resources = meter
            .u64_counter("grafana_provisioner.resources")
            .with_description("Resources reconciled, by kind and outcome")
            .build();

        let run_duration = meter
            .f64_histogram("grafana_provisioner.run.duration")
            .with_description("Duration of a provisioning run in seconds")
            .with_unit("s")
            .build();

        Self {
            resources,
            run_duration,
        }
    }

    /// Count every resource outcome of one organization.
    pub fn record_org(&self, report: &OrgReport) {
        for resource in &report.resources {
            self.resources.add(
                1,
                &[
                    KeyValue::new("resource.kind", resource.kind.as_str()),
                    KeyValue::new("outcome", resource.outcome.label()),
                ],
            );
        }
    }

    pub fn record_run(&self, elapsed: Duration, dry_run: bool) {
        self.run_duration
            .record(elapsed.as_secs_f64(), &[KeyValue::new("dry_run", dry_run)]);
    }
}
