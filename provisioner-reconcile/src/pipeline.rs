//! Provisioning pipeline entrypoint used by the CLI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use provisioner_core::{Config, Organization};
use provisioner_grafana::GrafanaApi;

use crate::dashboard::HOME_DASHBOARD_UID;
use crate::metrics::ReconcileMetrics;
use crate::outcome::{OrgReport, Outcome, ProvisionReport, ResourceKind, ResourceOutcome};
use crate::{dashboard, datasource, folder, organization};

/// Options for a pipeline run.
#[derive(Clone, Default)]
pub struct RunOptions {
    /// Look everything up but never mutate.
    pub dry_run: bool,
    /// Checked before each organization; once set, no further org starts.
    pub stop: Arc<AtomicBool>,
    pub metrics: Option<ReconcileMetrics>,
}

/// Provision every organization in `config`, in order.
///
/// Per-resource failures are logged and recorded in the report; this never
/// fails as a whole.
pub fn run<A: GrafanaApi>(api: &A, config: &Config, options: &RunOptions) -> ProvisionReport {
    let span = tracing::info_span!(
        "provision",
        organizations = config.organizations.len(),
        dry_run = options.dry_run
    );
    let _guard = span.enter();
    let started = Instant::now();

    let mut report = ProvisionReport::default();
    for (index, organization) in config.organizations.iter().enumerate() {
        if options.stop.load(Ordering::SeqCst) {
            let remaining = config.organizations.len() - index;
            tracing::warn!(remaining, "interrupted, not starting remaining organizations");
            report.interrupted = true;
            break;
        }

        let org_report = provision_organization(api, organization, config, options.dry_run);
        if let Some(metrics) = &options.metrics {
            metrics.record_org(&org_report);
        }
        report.organizations.push(org_report);
    }

    if let Some(metrics) = &options.metrics {
        metrics.record_run(started.elapsed(), options.dry_run);
    }
    tracing::info!(
        created = report.created(),
        updated = report.updated(),
        failed = report.failed(),
        "provisioning finished"
    );
    report
}

/// Reconcile one organization and everything provisioned under it.
pub fn provision_organization<A: GrafanaApi>(
    api: &A,
    organization: &Organization,
    config: &Config,
    dry_run: bool,
) -> OrgReport {
    let span = tracing::info_span!("provision organization", organization = %organization.name);
    let _guard = span.enter();

    let session = organization::reconcile(api, organization, dry_run);
    let mut resources = vec![session.outcome];

    match &session.api {
        Some(scoped) => {
            resources.extend(datasource::reconcile_all(
                scoped,
                &organization.name,
                &config.data_sources,
                dry_run,
            ));
            resources.extend(folder::reconcile_all(scoped, &config.folders, dry_run));
            resources.extend(dashboard::reconcile_all(scoped, &config.dashboards, dry_run));
        }
        None => {
            let reason = match &resources[0].outcome {
                Outcome::WouldCreate => "organization does not exist yet",
                _ => "organization could not be provisioned",
            };
            resources.extend(skipped_dependents(config, reason));
        }
    }

    OrgReport {
        organization: organization.name.clone(),
        org_id: session.org_id,
        resources,
    }
}

/// Entries for every dependent item of an organization that was not reached.
fn skipped_dependents(config: &Config, reason: &str) -> Vec<ResourceOutcome> {
    let skip = |kind, key: &str| ResourceOutcome::new(kind, key, Outcome::skipped(reason));

    let mut skipped = Vec::new();
    for data_source in &config.data_sources {
        skipped.push(skip(ResourceKind::DataSource, data_source.uid.as_str()));
    }
    for folder in &config.folders {
        skipped.push(skip(ResourceKind::Folder, folder.uid.as_str()));
        skipped.push(skip(ResourceKind::FolderPermissions, folder.uid.as_str()));
    }
    for dashboard in &config.dashboards {
        let uid = dashboard.uid();
        let key = uid
            .as_ref()
            .map(|u| u.as_str())
            .or_else(|| dashboard.dashboard.title())
            .unwrap_or("<untitled>");
        skipped.push(skip(ResourceKind::Dashboard, key));
        if key == HOME_DASHBOARD_UID && uid.is_some() {
            skipped.push(skip(ResourceKind::HomeDashboard, key));
        }
    }
    skipped
}
