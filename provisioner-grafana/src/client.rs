//! Blocking `ureq` implementation of [`GrafanaApi`].
//!
//! Every request carries:
//! - HTTP basic auth built from [`Settings`]
//! - `X-Grafana-Org-Id` when the handle is org-scoped
//! - W3C `traceparent` / `baggage` from the current `tracing` span
//!
//! Requests time out after [`REQUEST_TIMEOUT`].

use std::collections::HashMap;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use opentelemetry::global;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use provisioner_core::{Dashboard, DataSource, Folder, OrgId, OrgName, Organization, Settings, Uid};

use crate::api::GrafanaApi;
use crate::error::ApiError;
use crate::models::{
    CreateOrgResponse, DashboardFull, DataSourceDetails, FolderDetails, OrgDetails,
    PatchPreferences, PermissionItem, PostDashboardResponse, UpdateDataSource, UpdateFolder,
    UpdatePermissions,
};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const ORG_ID_HEADER: &str = "X-Grafana-Org-Id";

#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    authorization: String,
    org: Option<OrgId>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("org", &self.org)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Client for the Grafana instance described by `settings`, not bound to
    /// any organization.
    pub fn new(settings: &Settings) -> Self {
        Self::from_parts(
            settings.api_base_url(),
            &settings.grafana_username,
            &settings.grafana_password,
        )
    }

    /// `base_url` is the API root including `/api`, without trailing slash.
    pub fn from_parts(base_url: impl Into<String>, username: &str, password: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        Self {
            agent,
            base_url: base_url.into(),
            authorization: format!("Basic {credentials}"),
            org: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: &'static str, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .agent
            .request(method, &url)
            .set("Authorization", &self.authorization)
            .set("Accept", "application/json");
        if let Some(org) = self.org {
            request = request.set(ORG_ID_HEADER, &org.to_string());
        }
        for (name, value) in trace_headers() {
            request = request.set(&name, &value);
        }
        request
    }

    /// Issue one request; the raw outcome before status interpretation.
    fn send<B: Serialize>(
        &self,
        method: &'static str,
        path: &str,
        body: Option<&B>,
    ) -> Result<Result<ureq::Response, (u16, ureq::Response)>, ApiError> {
        let span = tracing::debug_span!(
            "grafana request",
            http.request.method = method,
            url.path = %path,
            http.response.status_code = tracing::field::Empty,
        );
        let _guard = span.enter();

        let request = self.request(method, path);
        let result = match body {
            Some(body) => request.send_json(serde_json::to_value(body)?),
            None => request.call(),
        };
        match result {
            Ok(response) => {
                span.record("http.response.status_code", response.status());
                Ok(Ok(response))
            }
            Err(ureq::Error::Status(status, response)) => {
                span.record("http.response.status_code", status);
                Ok(Err((status, response)))
            }
            Err(ureq::Error::Transport(source)) => Err(ApiError::Transport {
                method,
                path: path.to_owned(),
                source: Box::new(source),
            }),
        }
    }

    /// GET that maps 404 to `None`.
    fn lookup<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        match self.send::<()>("GET", path, None)? {
            Ok(response) => decode(path, response).map(Some),
            Err((404, _)) => Ok(None),
            Err((status, response)) => Err(status_error("GET", path, status, response)),
        }
    }

    /// Mutating call whose response body we decode.
    fn execute<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        match self.send(method, path, Some(body))? {
            Ok(response) => decode(path, response),
            Err((status, response)) => Err(status_error(method, path, status, response)),
        }
    }

    /// Mutating call whose response body we ignore.
    fn execute_unit<B: Serialize>(
        &self,
        method: &'static str,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        match self.send(method, path, Some(body))? {
            Ok(_) => Ok(()),
            Err((status, response)) => Err(status_error(method, path, status, response)),
        }
    }
}

impl GrafanaApi for HttpClient {
    fn for_org(&self, org: OrgId) -> Self {
        Self {
            org: Some(org),
            ..self.clone()
        }
    }

    fn org(&self) -> Option<OrgId> {
        self.org
    }

    fn get_org_by_name(&self, name: &OrgName) -> Result<Option<OrgDetails>, ApiError> {
        self.lookup(&format!("/orgs/name/{}", urlencoding::encode(&name.0)))
    }

    fn create_org(&self, org: &Organization) -> Result<OrgId, ApiError> {
        let created: CreateOrgResponse = self.execute("POST", "/orgs", org)?;
        Ok(created.org_id)
    }

    fn get_data_source_by_uid(&self, uid: &Uid) -> Result<Option<DataSourceDetails>, ApiError> {
        self.lookup(&format!("/datasources/uid/{}", encode_uid(uid)))
    }

    fn add_data_source(&self, data_source: &DataSource) -> Result<(), ApiError> {
        self.execute_unit("POST", "/datasources", data_source)
    }

    fn update_data_source_by_uid(
        &self,
        uid: &Uid,
        update: &UpdateDataSource,
    ) -> Result<(), ApiError> {
        self.execute_unit("PUT", &format!("/datasources/uid/{}", encode_uid(uid)), update)
    }

    fn get_folder_by_uid(&self, uid: &Uid) -> Result<Option<FolderDetails>, ApiError> {
        self.lookup(&format!("/folders/{}", encode_uid(uid)))
    }

    fn create_folder(&self, folder: &Folder) -> Result<FolderDetails, ApiError> {
        self.execute("POST", "/folders", folder)
    }

    fn update_folder(&self, uid: &Uid, update: &UpdateFolder) -> Result<FolderDetails, ApiError> {
        self.execute("PUT", &format!("/folders/{}", encode_uid(uid)), update)
    }

    fn update_folder_permissions(
        &self,
        uid: &Uid,
        items: &[PermissionItem],
    ) -> Result<(), ApiError> {
        self.execute_unit(
            "POST",
            &format!("/folders/{}/permissions", encode_uid(uid)),
            &UpdatePermissions { items },
        )
    }

    fn get_dashboard_by_uid(&self, uid: &Uid) -> Result<Option<DashboardFull>, ApiError> {
        self.lookup(&format!("/dashboards/uid/{}", encode_uid(uid)))
    }

    fn post_dashboard(&self, dashboard: &Dashboard) -> Result<PostDashboardResponse, ApiError> {
        self.execute("POST", "/dashboards/db", dashboard)
    }

    fn patch_org_preferences(&self, prefs: &PatchPreferences) -> Result<(), ApiError> {
        self.execute_unit("PATCH", "/org/preferences", prefs)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn encode_uid(uid: &Uid) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(uid.as_str())
}

fn decode<T: DeserializeOwned>(path: &str, response: ureq::Response) -> Result<T, ApiError> {
    response.into_json().map_err(|source| ApiError::Decode {
        path: path.to_owned(),
        source,
    })
}

fn status_error(method: &'static str, path: &str, status: u16, response: ureq::Response) -> ApiError {
    ApiError::Status {
        method,
        path: path.to_owned(),
        status,
        body: response.into_string().unwrap_or_default().trim().to_owned(),
    }
}

/// Propagation headers for the current span, via the global propagator.
fn trace_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    let context = tracing::Span::current().context();
    global::get_text_map_propagator(|propagator| propagator.inject_context(&context, &mut headers));
    headers
}
