//! The remote operations the reconcilers need, as a trait.
//!
//! [`crate::HttpClient`] is the real implementation. Every handle is bound to
//! at most one organization; [`GrafanaApi::for_org`] returns a new handle
//! instead of mutating the existing one, so an org context can never leak
//! from one iteration into the next.

use provisioner_core::{Dashboard, DataSource, Folder, OrgId, OrgName, Organization, Uid};

use crate::error::ApiError;
use crate::models::{
    DashboardFull, DataSourceDetails, FolderDetails, OrgDetails, PatchPreferences,
    PermissionItem, PostDashboardResponse, UpdateDataSource, UpdateFolder,
};

pub trait GrafanaApi {
    /// A handle whose calls all run against organization `org`.
    fn for_org(&self, org: OrgId) -> Self
    where
        Self: Sized;

    /// The organization this handle is bound to, if any.
    fn org(&self) -> Option<OrgId>;

    fn get_org_by_name(&self, name: &OrgName) -> Result<Option<OrgDetails>, ApiError>;

    fn create_org(&self, org: &Organization) -> Result<OrgId, ApiError>;

    fn get_data_source_by_uid(&self, uid: &Uid) -> Result<Option<DataSourceDetails>, ApiError>;

    fn add_data_source(&self, data_source: &DataSource) -> Result<(), ApiError>;

    fn update_data_source_by_uid(
        &self,
        uid: &Uid,
        update: &UpdateDataSource,
    ) -> Result<(), ApiError>;

    fn get_folder_by_uid(&self, uid: &Uid) -> Result<Option<FolderDetails>, ApiError>;

    fn create_folder(&self, folder: &Folder) -> Result<FolderDetails, ApiError>;

    fn update_folder(&self, uid: &Uid, update: &UpdateFolder) -> Result<FolderDetails, ApiError>;

    /// Replace the folder's permission list with `items`.
    fn update_folder_permissions(
        &self,
        uid: &Uid,
        items: &[PermissionItem],
    ) -> Result<(), ApiError>;

    fn get_dashboard_by_uid(&self, uid: &Uid) -> Result<Option<DashboardFull>, ApiError>;

    /// Create or update, depending on whether the document's uid exists.
    fn post_dashboard(&self, dashboard: &Dashboard) -> Result<PostDashboardResponse, ApiError>;

    fn patch_org_preferences(&self, prefs: &PatchPreferences) -> Result<(), ApiError>;
}
