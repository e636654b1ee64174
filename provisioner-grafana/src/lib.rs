//! # provisioner-grafana
//!
//! The slice of the Grafana HTTP API the provisioner uses.
//!
//! [`GrafanaApi`] is the seam the reconcilers are written against;
//! [`HttpClient`] implements it over blocking `ureq`. With the `fake` feature
//! an in-memory implementation is available for tests.

pub mod api;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "fake"))]
pub mod fake;
pub mod models;

pub use api::GrafanaApi;
pub use client::HttpClient;
pub use error::ApiError;
pub use models::{
    DashboardFull, DataSourceDetails, FolderDetails, OrgDetails, PatchPreferences, Permission,
    PermissionItem, PostDashboardResponse, Role, UpdateDataSource, UpdateFolder,
};
