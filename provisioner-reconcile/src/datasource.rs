//! Data source reconciler.
//!
//! Every data source gets the organization name injected as the secret
//! header value, so one data source definition can serve every tenant of a
//! multi-tenant backend (e.g. Loki/Mimir `X-Scope-OrgID`).

use provisioner_core::{DataSource, OrgName};
use provisioner_grafana::{GrafanaApi, UpdateDataSource};

use crate::outcome::{Outcome, ResourceKind, ResourceOutcome};

/// `secureJsonData` key that receives the organization name.
pub const SECRET_HEADER_FIELD: &str = "httpHeaderValue1";

/// Copy of `data_source` carrying the organization's secret header value.
/// Other configured secrets are kept.
pub fn with_org_secret(data_source: &DataSource, org: &OrgName) -> DataSource {
    let mut data_source = data_source.clone();
    data_source
        .secure_json_data
        .insert(SECRET_HEADER_FIELD.to_owned(), org.0.clone());
    data_source
}

/// Reconcile every data source under the org `api` is scoped to.
pub fn reconcile_all<A: GrafanaApi>(
    api: &A,
    org: &OrgName,
    data_sources: &[DataSource],
    dry_run: bool,
) -> Vec<ResourceOutcome> {
    let span = tracing::info_span!("provision data sources", count = data_sources.len());
    let _guard = span.enter();

    data_sources
        .iter()
        .map(|data_source| {
            let outcome = reconcile_one(api, &with_org_secret(data_source, org), dry_run);
            ResourceOutcome::new(ResourceKind::DataSource, data_source.uid.0.clone(), outcome)
        })
        .collect()
}

fn reconcile_one<A: GrafanaApi>(api: &A, data_source: &DataSource, dry_run: bool) -> Outcome {
    let uid = &data_source.uid;
    match api.get_data_source_by_uid(uid) {
        Err(err) => {
            tracing::error!(data_source = %uid, error = %err, "error looking up data source");
            Outcome::failed(err)
        }
        Ok(None) if dry_run => {
            tracing::info!(data_source = %uid, "[dry-run] would create data source");
            Outcome::WouldCreate
        }
        Ok(None) => match api.add_data_source(data_source) {
            Ok(()) => {
                tracing::info!(data_source = %uid, "created data source");
                Outcome::Created
            }
            Err(err) => {
                tracing::error!(data_source = %uid, error = %err, "error creating data source");
                Outcome::failed(err)
            }
        },
        Ok(Some(_)) if dry_run => {
            tracing::info!(data_source = %uid, "[dry-run] would update data source");
            Outcome::WouldUpdate
        }
        Ok(Some(_)) => match api.update_data_source_by_uid(uid, &UpdateDataSource::from(data_source)) {
            Ok(()) => {
                tracing::info!(data_source = %uid, "updated data source");
                Outcome::Updated
            }
            Err(err) => {
                tracing::error!(data_source = %uid, error = %err, "error updating data source");
                Outcome::failed(err)
            }
        },
    }
}
