//! Per-resource outcomes and the run report.

use std::fmt;

use serde::Serialize;

use provisioner_core::{OrgId, OrgName};

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What a reconciler step touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Organization,
    DataSource,
    Folder,
    FolderPermissions,
    Dashboard,
    HomeDashboard,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Organization => "organization",
            ResourceKind::DataSource => "data source",
            ResourceKind::Folder => "folder",
            ResourceKind::FolderPermissions => "folder permissions",
            ResourceKind::Dashboard => "dashboard",
            ResourceKind::HomeDashboard => "home dashboard",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of reconciling one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Resource was absent and has been created.
    Created,
    /// Resource was present and has been updated.
    Updated,
    /// Resource was present and nothing needed to change.
    Unchanged,
    /// `--dry-run`: the resource *would* have been created.
    WouldCreate,
    /// `--dry-run`: the resource *would* have been updated.
    WouldUpdate,
    /// Not attempted because a step it depends on did not complete.
    Skipped { reason: String },
    /// The step failed; the error has already been logged.
    Failed { error: String },
}

impl Outcome {
    pub fn failed(error: impl fmt::Display) -> Self {
        Outcome::Failed {
            error: error.to_string(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Outcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    /// The resource exists (or would exist) in the desired shape afterwards.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Created
                | Outcome::Updated
                | Outcome::Unchanged
                | Outcome::WouldCreate
                | Outcome::WouldUpdate
        )
    }

    /// Short machine-friendly label, also used as a metric attribute.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::Updated => "updated",
            Outcome::Unchanged => "unchanged",
            Outcome::WouldCreate => "would_create",
            Outcome::WouldUpdate => "would_update",
            Outcome::Skipped { .. } => "skipped",
            Outcome::Failed { .. } => "failed",
        }
    }
}

/// Outcome of one resource, keyed by kind + name/uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceOutcome {
    pub kind: ResourceKind,
    pub key: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ResourceOutcome {
    pub fn new(kind: ResourceKind, key: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            kind,
            key: key.into(),
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Everything done for one organization, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgReport {
    pub organization: OrgName,
    /// `None` when the organization neither existed nor could be created.
    pub org_id: Option<OrgId>,
    pub resources: Vec<ResourceOutcome>,
}

impl OrgReport {
    pub fn outcome_of(&self, kind: ResourceKind, key: &str) -> Option<&Outcome> {
        self.resources
            .iter()
            .find(|r| r.kind == kind && r.key == key)
            .map(|r| &r.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceOutcome> {
        self.resources.iter().filter(|r| r.outcome.is_failure())
    }
}

/// Outcome of a whole provisioning run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub organizations: Vec<OrgReport>,
    /// The run stopped early on an interrupt.
    pub interrupted: bool,
}

impl ProvisionReport {
    pub fn org(&self, name: &str) -> Option<&OrgReport> {
        self.organizations.iter().find(|o| o.organization.0 == name)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.organizations
            .iter()
            .flat_map(|o| &o.resources)
            .filter(|r| pred(&r.outcome))
            .count()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created))
    }

    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Updated))
    }

    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}
