//! Domain types for the provisioning configuration.
//!
//! Field names follow the Grafana HTTP API command schemas (camelCase on the
//! wire) so a config file can be written straight from the Grafana docs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a Grafana organization. Unique per Grafana instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgName(pub String);

impl fmt::Display for OrgName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for OrgName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrgName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Unique identifier of a data source, folder or dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uid(pub String);

impl Uid {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Uid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Uid {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Numeric organization id assigned by Grafana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub i64);

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Access mode used when a data source omits `access`.
pub const DEFAULT_ACCESS: &str = "proxy";

fn default_access() -> String {
    DEFAULT_ACCESS.to_owned()
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// An organization to ensure exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub name: OrgName,
}

/// A data source to ensure exists in every configured organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub uid: Uid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    /// Passed to Grafana as-is (`proxy`, `direct`, ...).
    #[serde(default = "default_access")]
    pub access: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<Value>,
    /// Write-only secrets. Grafana never returns these on lookup.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub secure_json_data: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default)]
    pub basic_auth: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_auth_user: Option<String>,
    #[serde(default)]
    pub with_credentials: bool,
}

/// A dashboard folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub uid: Uid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_uid: Option<Uid>,
}

/// The embedded dashboard JSON model.
///
/// Only `uid`, `version` and `title` are interpreted; every other field is
/// carried through to Grafana unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DashboardDocument(Map<String, Value>);

impl DashboardDocument {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn uid(&self) -> Option<&str> {
        self.0.get("uid").and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.0.get("title").and_then(Value::as_str)
    }

    /// Optimistic-concurrency version, if the document carries an integer one.
    pub fn version(&self) -> Option<i64> {
        self.0.get("version").and_then(Value::as_i64)
    }

    pub fn set_version(&mut self, version: i64) {
        self.0.insert("version".to_owned(), Value::from(version));
    }

    pub fn clear_version(&mut self) {
        self.0.remove("version");
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// A dashboard save command: the document plus where and how to store it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub dashboard: DashboardDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_uid: Option<Uid>,
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Dashboard {
    pub fn uid(&self) -> Option<Uid> {
        self.dashboard.uid().map(Uid::from)
    }
}

/// Root of the provisioning config file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub data_sources: Vec<DataSource>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub dashboards: Vec<Dashboard>,
}

impl Config {
    /// `true` when no organization is configured. Every other section is
    /// applied per organization, so such a config provisions nothing even if
    /// it lists data sources, folders or dashboards.
    pub fn has_no_organizations(&self) -> bool {
        self.organizations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn newtype_display() {
        assert_eq!(OrgName::from("Team A").to_string(), "Team A");
        assert_eq!(Uid::from("ds-1").to_string(), "ds-1");
        assert_eq!(OrgId(7).to_string(), "7");
    }

    #[test]
    fn data_source_reads_camel_case_fields() {
        let ds: DataSource = serde_json::from_value(json!({
            "uid": "ds-1",
            "name": "Loki",
            "type": "loki",
            "url": "http://loki:3100",
            "access": "proxy",
            "isDefault": true,
            "jsonData": { "httpHeaderName1": "X-Scope-OrgID" }
        }))
        .expect("deserialize");
        assert_eq!(ds.kind, "loki");
        assert!(ds.is_default);
        assert_eq!(ds.access, "proxy");
        assert!(ds.secure_json_data.is_empty());
    }

    #[test]
    fn access_defaults_to_proxy_and_keeps_other_values() {
        let omitted: DataSource =
            serde_json::from_value(json!({ "uid": "a", "name": "A", "type": "loki" })).expect("omitted");
        assert_eq!(omitted.access, DEFAULT_ACCESS);

        let custom: DataSource = serde_json::from_value(
            json!({ "uid": "b", "name": "B", "type": "loki", "access": "tunnel" }),
        )
        .expect("custom");
        assert_eq!(custom.access, "tunnel");
        assert_eq!(serde_json::to_value(&custom).expect("serialize")["access"], json!("tunnel"));
    }

    #[test]
    fn config_without_organizations_provisions_nothing() {
        let config: Config = serde_json::from_value(json!({
            "dataSources": [{ "uid": "ds-1", "name": "Loki", "type": "loki" }],
            "folders": [{ "uid": "fld-1", "title": "Services" }],
            "dashboards": [{ "dashboard": { "uid": "home" } }]
        }))
        .expect("deserialize");
        assert!(config.has_no_organizations());

        let with_org: Config =
            serde_json::from_value(json!({ "organizations": [{ "name": "Team A" }] })).expect("org");
        assert!(!with_org.has_no_organizations());
    }

    #[test]
    fn dashboard_document_accessors() {
        let mut doc: DashboardDocument =
            serde_json::from_value(json!({ "uid": "home", "title": "Home", "panels": [] }))
                .expect("deserialize");
        assert_eq!(doc.uid(), Some("home"));
        assert_eq!(doc.title(), Some("Home"));
        assert_eq!(doc.version(), None);

        doc.set_version(12);
        assert_eq!(doc.version(), Some(12));
        doc.clear_version();
        assert_eq!(doc.version(), None);
    }

    #[test]
    fn dashboard_document_keeps_unknown_fields() {
        let raw = json!({ "uid": "x", "panels": [{ "id": 1 }], "schemaVersion": 39 });
        let doc: DashboardDocument = serde_json::from_value(raw.clone()).expect("deserialize");
        assert_eq!(serde_json::to_value(&doc).expect("serialize"), raw);
    }

    #[test]
    fn dashboard_document_rejects_non_object() {
        let result = serde_json::from_value::<DashboardDocument>(json!([1, 2, 3]));
        assert!(result.is_err());
    }

    #[test]
    fn non_integer_version_reads_as_none() {
        let doc: DashboardDocument =
            serde_json::from_value(json!({ "uid": "x", "version": "3" })).expect("deserialize");
        assert_eq!(doc.version(), None);
    }
}
