//! Request and response bodies for the Grafana HTTP API endpoints we call.
//!
//! Only the fields the reconcilers read are modelled on responses; serde
//! ignores the rest.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use provisioner_core::{DashboardDocument, DataSource, OrgId, OrgName, Uid};

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

/// `GET /orgs/name/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrgDetails {
    pub id: OrgId,
    pub name: OrgName,
}

/// `POST /orgs`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateOrgResponse {
    pub org_id: OrgId,
}

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// `GET /datasources/uid/{uid}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceDetails {
    #[serde(default)]
    pub id: i64,
    pub uid: Uid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: i64,
}

/// `PUT /datasources/uid/{uid}`: replaces the stored data source with exactly
/// these fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDataSource {
    pub access: String,
    pub is_default: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_data: Option<Value>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub uid: Uid,
    pub url: String,
}

impl From<&DataSource> for UpdateDataSource {
    fn from(ds: &DataSource) -> Self {
        Self {
            access: ds.access.clone(),
            is_default: ds.is_default,
            json_data: ds.json_data.clone(),
            name: ds.name.clone(),
            kind: ds.kind.clone(),
            uid: ds.uid.clone(),
            url: ds.url.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Folders
// ---------------------------------------------------------------------------

/// `GET /folders/{uid}`, and the body returned by create/update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FolderDetails {
    pub uid: Uid,
    pub title: String,
    #[serde(default)]
    pub version: i64,
}

/// `PUT /folders/{uid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateFolder {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Must equal the version Grafana currently holds.
    pub version: i64,
}

/// Built-in Grafana role a folder permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

/// Folder permission level. Serialized as Grafana's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    View = 1,
    Edit = 2,
    Admin = 4,
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// One role → permission entry of `POST /folders/{uid}/permissions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionItem {
    pub role: Role,
    pub permission: Permission,
}

#[derive(Debug, Serialize)]
pub(crate) struct UpdatePermissions<'a> {
    pub items: &'a [PermissionItem],
}

// ---------------------------------------------------------------------------
// Dashboards and preferences
// ---------------------------------------------------------------------------

/// `GET /dashboards/uid/{uid}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardFull {
    pub dashboard: DashboardDocument,
    #[serde(default)]
    pub meta: Value,
}

/// `POST /dashboards/db`
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct PostDashboardResponse {
    #[serde(default)]
    pub uid: Option<Uid>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub version: i64,
}

/// `PATCH /org/preferences`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchPreferences {
    #[serde(rename = "homeDashboardUID")]
    pub home_dashboard_uid: Uid,
}
