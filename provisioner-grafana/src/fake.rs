//! In-memory [`GrafanaApi`] for tests.
//!
//! Behaves like a single Grafana instance: organizations are global, every
//! other resource lives under an org id. Unscoped handles act on the main
//! org (id 1), as Grafana does for a basic-auth admin without
//! `X-Grafana-Org-Id`.
//!
//! Folder and dashboard versions start at 1 and increase on every write;
//! writes carrying a stale version are rejected with HTTP 412, duplicate
//! creates with HTTP 409.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use serde_json::Value;

use provisioner_core::{
    Dashboard, DashboardDocument, DataSource, Folder, OrgId, OrgName, Organization, Uid,
};

use crate::api::GrafanaApi;
use crate::error::ApiError;
use crate::models::{
    DashboardFull, DataSourceDetails, FolderDetails, OrgDetails, PatchPreferences,
    PermissionItem, PostDashboardResponse, UpdateDataSource, UpdateFolder,
};

pub const MAIN_ORG: OrgId = OrgId(1);

/// Every operation the fake can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    GetOrgByName,
    CreateOrg,
    GetDataSource,
    AddDataSource,
    UpdateDataSource,
    GetFolder,
    CreateFolder,
    UpdateFolder,
    UpdateFolderPermissions,
    GetDashboard,
    PostDashboard,
    PatchOrgPreferences,
}

impl Op {
    fn method(self) -> &'static str {
        match self {
            Op::GetOrgByName | Op::GetDataSource | Op::GetFolder | Op::GetDashboard => "GET",
            Op::UpdateDataSource | Op::UpdateFolder => "PUT",
            Op::PatchOrgPreferences => "PATCH",
            _ => "POST",
        }
    }
}

/// One recorded call, with its request body when there was one.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub org: OrgId,
    pub op: Op,
    pub key: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
struct StoredDataSource {
    name: String,
    kind: String,
    secure_json_data: BTreeMap<String, String>,
    version: i64,
}

#[derive(Debug, Clone)]
struct StoredFolder {
    title: String,
    version: i64,
}

#[derive(Debug, Default)]
struct State {
    next_org_id: i64,
    orgs: BTreeMap<String, OrgId>,
    data_sources: BTreeMap<(i64, Uid), StoredDataSource>,
    folders: BTreeMap<(i64, Uid), StoredFolder>,
    permissions: BTreeMap<(i64, Uid), Vec<PermissionItem>>,
    dashboards: BTreeMap<(i64, Uid), DashboardDocument>,
    home_dashboards: BTreeMap<i64, Uid>,
    failures: BTreeMap<(Op, String), u16>,
    down: HashSet<Op>,
    calls: Vec<Call>,
}

#[derive(Debug, Clone)]
pub struct InMemoryGrafana {
    state: Rc<RefCell<State>>,
    org: Option<OrgId>,
}

impl Default for InMemoryGrafana {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGrafana {
    pub fn new() -> Self {
        let mut state = State {
            next_org_id: MAIN_ORG.0 + 1,
            ..State::default()
        };
        state.orgs.insert("Main Org.".to_owned(), MAIN_ORG);
        Self {
            state: Rc::new(RefCell::new(state)),
            org: None,
        }
    }

    // -- setup ---------------------------------------------------------------

    /// Make `op` on `key` answer with HTTP `status`.
    pub fn fail(&self, op: Op, key: &str, status: u16) {
        self.state
            .borrow_mut()
            .failures
            .insert((op, key.to_owned()), status);
    }

    /// Make every `op` fail at the transport level (no HTTP response).
    pub fn take_down(&self, op: Op) {
        self.state.borrow_mut().down.insert(op);
    }

    pub fn seed_org(&self, name: &str) -> OrgId {
        let mut state = self.state.borrow_mut();
        let id = OrgId(state.next_org_id);
        state.next_org_id += 1;
        state.orgs.insert(name.to_owned(), id);
        id
    }

    pub fn seed_folder(&self, org: OrgId, uid: &str, title: &str, version: i64) {
        self.state.borrow_mut().folders.insert(
            (org.0, Uid::from(uid)),
            StoredFolder { title: title.to_owned(), version },
        );
    }

    pub fn seed_dashboard(&self, org: OrgId, document: DashboardDocument) {
        let uid = Uid::from(document.uid().unwrap_or_default());
        self.state.borrow_mut().dashboards.insert((org.0, uid), document);
    }

    // -- inspection ----------------------------------------------------------

    pub fn org_id(&self, name: &str) -> Option<OrgId> {
        self.state.borrow().orgs.get(name).copied()
    }

    pub fn org_count(&self) -> usize {
        self.state.borrow().orgs.len()
    }

    pub fn data_source_count(&self, org: OrgId) -> usize {
        self.state
            .borrow()
            .data_sources
            .keys()
            .filter(|(o, _)| *o == org.0)
            .count()
    }

    /// Secrets stored for a data source at creation time.
    pub fn data_source_secrets(&self, org: OrgId, uid: &str) -> Option<BTreeMap<String, String>> {
        self.state
            .borrow()
            .data_sources
            .get(&(org.0, Uid::from(uid)))
            .map(|ds| ds.secure_json_data.clone())
    }

    pub fn data_source_name(&self, org: OrgId, uid: &str) -> Option<String> {
        self.state
            .borrow()
            .data_sources
            .get(&(org.0, Uid::from(uid)))
            .map(|ds| ds.name.clone())
    }

    /// `(title, version)` of a stored folder.
    pub fn folder(&self, org: OrgId, uid: &str) -> Option<(String, i64)> {
        self.state
            .borrow()
            .folders
            .get(&(org.0, Uid::from(uid)))
            .map(|f| (f.title.clone(), f.version))
    }

    pub fn permissions(&self, org: OrgId, uid: &str) -> Vec<PermissionItem> {
        self.state
            .borrow()
            .permissions
            .get(&(org.0, Uid::from(uid)))
            .cloned()
            .unwrap_or_default()
    }

    pub fn dashboard(&self, org: OrgId, uid: &str) -> Option<DashboardDocument> {
        self.state
            .borrow()
            .dashboards
            .get(&(org.0, Uid::from(uid)))
            .cloned()
    }

    pub fn dashboard_count(&self, org: OrgId) -> usize {
        self.state
            .borrow()
            .dashboards
            .keys()
            .filter(|(o, _)| *o == org.0)
            .count()
    }

    pub fn home_dashboard(&self, org: OrgId) -> Option<Uid> {
        self.state.borrow().home_dashboards.get(&org.0).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn calls_to(&self, op: Op) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    /// `true` if any create/update/post/patch was issued.
    pub fn mutated(&self) -> bool {
        self.calls()
            .iter()
            .any(|c| c.op.method() != "GET")
    }

    // -- internals -----------------------------------------------------------

    fn scope(&self) -> i64 {
        self.org.unwrap_or(MAIN_ORG).0
    }

    /// Record the call and apply any injected failure.
    fn enter<B: serde::Serialize>(
        &self,
        op: Op,
        key: &str,
        body: Option<&B>,
    ) -> Result<(), ApiError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call {
            org: OrgId(self.scope()),
            op,
            key: key.to_owned(),
            body: body.and_then(|b| serde_json::to_value(b).ok()),
        });
        if state.down.contains(&op) {
            return Err(ApiError::Transport {
                method: op.method(),
                path: key.to_owned(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )),
            });
        }
        if let Some(status) = state.failures.get(&(op, key.to_owned())) {
            return Err(status_error(op, key, *status, "injected failure"));
        }
        Ok(())
    }
}

fn status_error(op: Op, key: &str, status: u16, body: &str) -> ApiError {
    ApiError::Status {
        method: op.method(),
        path: key.to_owned(),
        status,
        body: body.to_owned(),
    }
}

impl GrafanaApi for InMemoryGrafana {
    fn for_org(&self, org: OrgId) -> Self {
        Self {
            state: Rc::clone(&self.state),
            org: Some(org),
        }
    }

    fn org(&self) -> Option<OrgId> {
        self.org
    }

    fn get_org_by_name(&self, name: &OrgName) -> Result<Option<OrgDetails>, ApiError> {
        self.enter::<()>(Op::GetOrgByName, &name.0, None)?;
        Ok(self.org_id(&name.0).map(|id| OrgDetails {
            id,
            name: name.clone(),
        }))
    }

    fn create_org(&self, org: &Organization) -> Result<OrgId, ApiError> {
        self.enter(Op::CreateOrg, &org.name.0, Some(org))?;
        if self.org_id(&org.name.0).is_some() {
            return Err(status_error(Op::CreateOrg, &org.name.0, 409, "Organization name taken"));
        }
        Ok(self.seed_org(&org.name.0))
    }

    fn get_data_source_by_uid(&self, uid: &Uid) -> Result<Option<DataSourceDetails>, ApiError> {
        self.enter::<()>(Op::GetDataSource, uid.as_str(), None)?;
        let state = self.state.borrow();
        Ok(state
            .data_sources
            .get(&(self.scope(), uid.clone()))
            .map(|ds| DataSourceDetails {
                id: 0,
                uid: uid.clone(),
                name: ds.name.clone(),
                kind: ds.kind.clone(),
                version: ds.version,
            }))
    }

    fn add_data_source(&self, data_source: &DataSource) -> Result<(), ApiError> {
        self.enter(Op::AddDataSource, data_source.uid.as_str(), Some(data_source))?;
        let key = (self.scope(), data_source.uid.clone());
        let mut state = self.state.borrow_mut();
        if state.data_sources.contains_key(&key) {
            return Err(status_error(
                Op::AddDataSource,
                data_source.uid.as_str(),
                409,
                "data source with the same uid already exists",
            ));
        }
        state.data_sources.insert(
            key,
            StoredDataSource {
                name: data_source.name.clone(),
                kind: data_source.kind.clone(),
                secure_json_data: data_source.secure_json_data.clone(),
                version: 1,
            },
        );
        Ok(())
    }

    fn update_data_source_by_uid(
        &self,
        uid: &Uid,
        update: &UpdateDataSource,
    ) -> Result<(), ApiError> {
        self.enter(Op::UpdateDataSource, uid.as_str(), Some(update))?;
        let mut state = self.state.borrow_mut();
        let Some(stored) = state.data_sources.get_mut(&(self.scope(), uid.clone())) else {
            return Err(status_error(Op::UpdateDataSource, uid.as_str(), 404, "Data source not found"));
        };
        stored.name = update.name.clone();
        stored.kind = update.kind.clone();
        stored.version += 1;
        Ok(())
    }

    fn get_folder_by_uid(&self, uid: &Uid) -> Result<Option<FolderDetails>, ApiError> {
        self.enter::<()>(Op::GetFolder, uid.as_str(), None)?;
        Ok(self.folder(OrgId(self.scope()), uid.as_str()).map(|(title, version)| {
            FolderDetails {
                uid: uid.clone(),
                title,
                version,
            }
        }))
    }

    fn create_folder(&self, folder: &Folder) -> Result<FolderDetails, ApiError> {
        self.enter(Op::CreateFolder, folder.uid.as_str(), Some(folder))?;
        let key = (self.scope(), folder.uid.clone());
        let mut state = self.state.borrow_mut();
        if state.folders.contains_key(&key) {
            return Err(status_error(
                Op::CreateFolder,
                folder.uid.as_str(),
                409,
                "a folder with the same uid already exists",
            ));
        }
        state.folders.insert(
            key,
            StoredFolder {
                title: folder.title.clone(),
                version: 1,
            },
        );
        Ok(FolderDetails {
            uid: folder.uid.clone(),
            title: folder.title.clone(),
            version: 1,
        })
    }

    fn update_folder(&self, uid: &Uid, update: &UpdateFolder) -> Result<FolderDetails, ApiError> {
        self.enter(Op::UpdateFolder, uid.as_str(), Some(update))?;
        let mut state = self.state.borrow_mut();
        let Some(stored) = state.folders.get_mut(&(self.scope(), uid.clone())) else {
            return Err(status_error(Op::UpdateFolder, uid.as_str(), 404, "folder not found"));
        };
        if stored.version != update.version {
            return Err(status_error(
                Op::UpdateFolder,
                uid.as_str(),
                412,
                "the folder has been changed by someone else",
            ));
        }
        stored.title = update.title.clone();
        stored.version += 1;
        Ok(FolderDetails {
            uid: uid.clone(),
            title: stored.title.clone(),
            version: stored.version,
        })
    }

    fn update_folder_permissions(
        &self,
        uid: &Uid,
        items: &[PermissionItem],
    ) -> Result<(), ApiError> {
        self.enter(Op::UpdateFolderPermissions, uid.as_str(), Some(&items))?;
        let key = (self.scope(), uid.clone());
        let mut state = self.state.borrow_mut();
        if !state.folders.contains_key(&key) {
            return Err(status_error(
                Op::UpdateFolderPermissions,
                uid.as_str(),
                404,
                "folder not found",
            ));
        }
        state.permissions.insert(key, items.to_vec());
        Ok(())
    }

    fn get_dashboard_by_uid(&self, uid: &Uid) -> Result<Option<DashboardFull>, ApiError> {
        self.enter::<()>(Op::GetDashboard, uid.as_str(), None)?;
        Ok(self
            .dashboard(OrgId(self.scope()), uid.as_str())
            .map(|dashboard| DashboardFull {
                dashboard,
                meta: Value::Null,
            }))
    }

    fn post_dashboard(&self, dashboard: &Dashboard) -> Result<PostDashboardResponse, ApiError> {
        let uid = dashboard.uid().unwrap_or_else(|| Uid::from(""));
        self.enter(Op::PostDashboard, uid.as_str(), Some(dashboard))?;
        let key = (self.scope(), uid.clone());
        let mut state = self.state.borrow_mut();
        let mut document = dashboard.dashboard.clone();
        let next_version = match state.dashboards.get(&key) {
            Some(existing) => {
                if !dashboard.overwrite && existing.version() != document.version() {
                    return Err(status_error(
                        Op::PostDashboard,
                        uid.as_str(),
                        412,
                        "The dashboard has been changed by someone else",
                    ));
                }
                existing.version().unwrap_or(0) + 1
            }
            None => 1,
        };
        document.set_version(next_version);
        state.dashboards.insert(key, document);
        Ok(PostDashboardResponse {
            uid: Some(uid),
            status: "success".to_owned(),
            version: next_version,
        })
    }

    fn patch_org_preferences(&self, prefs: &PatchPreferences) -> Result<(), ApiError> {
        self.enter(Op::PatchOrgPreferences, prefs.home_dashboard_uid.as_str(), Some(prefs))?;
        self.state
            .borrow_mut()
            .home_dashboards
            .insert(self.scope(), prefs.home_dashboard_uid.clone());
        Ok(())
    }
}
