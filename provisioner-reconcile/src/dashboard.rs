//! Dashboard reconciler.
//!
//! Grafana saves dashboards with one create-or-update call. Before posting,
//! the outgoing document takes the server's current version when the
//! dashboard exists, or has its version removed when it does not, so a
//! stale version in the config never collides with the server.
//!
//! The `home` preference is patched once the post has been attempted, even
//! if the post failed: the dashboard may well exist already. Only a failed
//! lookup, where nothing was posted, skips it.

use provisioner_core::{Dashboard, Uid};
use provisioner_grafana::{GrafanaApi, PatchPreferences};

use crate::outcome::{Outcome, ResourceKind, ResourceOutcome};

/// A dashboard with this UID becomes the organization's home dashboard.
pub const HOME_DASHBOARD_UID: &str = "home";

pub fn reconcile_all<A: GrafanaApi>(
    api: &A,
    dashboards: &[Dashboard],
    dry_run: bool,
) -> Vec<ResourceOutcome> {
    let span = tracing::info_span!("provision dashboards", count = dashboards.len());
    let _guard = span.enter();

    let mut outcomes = Vec::with_capacity(dashboards.len());
    for dashboard in dashboards {
        let Some(uid) = dashboard.uid() else {
            let title = dashboard.dashboard.title().unwrap_or("<untitled>");
            tracing::error!(dashboard = title, "dashboard document has no uid");
            outcomes.push(ResourceOutcome::new(
                ResourceKind::Dashboard,
                title,
                Outcome::failed("dashboard document has no uid"),
            ));
            continue;
        };

        let (outcome, posted) = reconcile_one(api, &uid, dashboard, dry_run);
        outcomes.push(ResourceOutcome::new(ResourceKind::Dashboard, uid.0.clone(), outcome));

        if uid.as_str() == HOME_DASHBOARD_UID {
            let home = if !posted {
                Outcome::skipped("dashboard lookup failed")
            } else if dry_run {
                Outcome::WouldUpdate
            } else {
                set_home(api, &uid)
            };
            outcomes.push(ResourceOutcome::new(ResourceKind::HomeDashboard, uid.0, home));
        }
    }
    outcomes
}

/// Returns the dashboard outcome and whether the post was reached (or, in
/// dry-run, would have been).
fn reconcile_one<A: GrafanaApi>(
    api: &A,
    uid: &Uid,
    dashboard: &Dashboard,
    dry_run: bool,
) -> (Outcome, bool) {
    let current = match api.get_dashboard_by_uid(uid) {
        Ok(current) => current,
        Err(err) => {
            tracing::error!(dashboard = %uid, error = %err, "error looking up dashboard");
            return (Outcome::failed(err), false);
        }
    };
    let exists = current.is_some();

    if dry_run {
        tracing::info!(dashboard = %uid, exists, "[dry-run] would save dashboard");
        let outcome = if exists {
            Outcome::WouldUpdate
        } else {
            Outcome::WouldCreate
        };
        return (outcome, true);
    }

    let mut outgoing = dashboard.clone();
    match current.as_ref().and_then(|c| c.dashboard.version()) {
        Some(version) => outgoing.dashboard.set_version(version),
        None => outgoing.dashboard.clear_version(),
    }

    let outcome = match api.post_dashboard(&outgoing) {
        Ok(saved) => {
            tracing::info!(dashboard = %uid, version = saved.version, status = %saved.status, "saved dashboard");
            if exists {
                Outcome::Updated
            } else {
                Outcome::Created
            }
        }
        Err(err) => {
            tracing::error!(dashboard = %uid, error = %err, "error saving dashboard");
            Outcome::failed(err)
        }
    };
    (outcome, true)
}

fn set_home<A: GrafanaApi>(api: &A, uid: &Uid) -> Outcome {
    let prefs = PatchPreferences {
        home_dashboard_uid: uid.clone(),
    };
    match api.patch_org_preferences(&prefs) {
        Ok(()) => {
            tracing::info!(dashboard = %uid, "set home dashboard");
            Outcome::Updated
        }
        Err(err) => {
            tracing::error!(dashboard = %uid, error = %err, "error setting home dashboard");
            Outcome::failed(err)
        }
    }
}
