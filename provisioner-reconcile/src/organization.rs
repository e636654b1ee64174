//! Organization reconciler: lookup by name, create if absent, scope the client.

use provisioner_core::{OrgId, Organization};
use provisioner_grafana::GrafanaApi;

use crate::outcome::{Outcome, ResourceKind, ResourceOutcome};

/// Result of reconciling one organization.
///
/// `api` is the org-scoped handle the dependent reconcilers must use. It is
/// `None` when the organization could not be established (or, in dry-run,
/// does not exist yet), in which case nothing else runs for this org.
#[derive(Debug)]
pub struct OrgSession<A> {
    pub outcome: ResourceOutcome,
    pub org_id: Option<OrgId>,
    pub api: Option<A>,
}

impl<A> OrgSession<A> {
    fn unscoped(organization: &Organization, outcome: Outcome) -> Self {
        Self {
            outcome: ResourceOutcome::new(
                ResourceKind::Organization,
                organization.name.0.clone(),
                outcome,
            ),
            org_id: None,
            api: None,
        }
    }
}

/// Ensure `organization` exists and return a handle scoped to it.
///
/// Only a definite "not found" leads to a create. A lookup that fails for any
/// other reason, or a failed create, ends this organization's iteration.
pub fn reconcile<A: GrafanaApi>(
    api: &A,
    organization: &Organization,
    dry_run: bool,
) -> OrgSession<A> {
    let name = &organization.name;

    let existing = match api.get_org_by_name(name) {
        Ok(existing) => existing,
        Err(err) => {
            tracing::error!(organization = %name, error = %err, "error looking up organization");
            return OrgSession::unscoped(organization, Outcome::failed(err));
        }
    };

    let (org_id, outcome) = match existing {
        Some(details) => {
            tracing::debug!(organization = %name, org.id = %details.id, "organization exists");
            (details.id, Outcome::Unchanged)
        }
        None if dry_run => {
            tracing::info!(organization = %name, "[dry-run] would create organization");
            return OrgSession::unscoped(organization, Outcome::WouldCreate);
        }
        None => match api.create_org(organization) {
            Ok(id) => {
                tracing::info!(organization = %name, org.id = %id, "created organization");
                (id, Outcome::Created)
            }
            Err(err) => {
                tracing::error!(organization = %name, error = %err, "error creating organization");
                return OrgSession::unscoped(organization, Outcome::failed(err));
            }
        },
    };

    OrgSession {
        outcome: ResourceOutcome::new(ResourceKind::Organization, name.0.clone(), outcome),
        org_id: Some(org_id),
        api: Some(api.for_org(org_id)),
    }
}
