//! # provisioner-reconcile
//!
//! Idempotent reconcilers for organizations, data sources, folders and
//! dashboards, and the [`pipeline`] that runs them per organization.
//!
//! Reconcilers never return errors: every failure is logged and recorded as
//! an [`Outcome`] so one broken resource never stops the rest of the run.

pub mod dashboard;
pub mod datasource;
pub mod folder;
pub mod metrics;
pub mod organization;
pub mod outcome;
pub mod pipeline;

pub use metrics::ReconcileMetrics;
pub use outcome::{OrgReport, Outcome, ProvisionReport, ResourceKind, ResourceOutcome};
pub use pipeline::{run, RunOptions};
