//! Provisioning config file loading.
//!
//! The file is a single JSON document:
//!
//! ```text
//! {
//!   "organizations": [ { "name": "Team A" } ],
//!   "dataSources":   [ { "uid": "ds-1", "name": "Loki", "type": "loki", ... } ],
//!   "folders":       [ { "uid": "fld-1", "title": "Services" } ],
//!   "dashboards":    [ { "dashboard": { "uid": "home", ... }, "folderUid": "fld-1" } ]
//! }
//! ```
//!
//! Missing arrays are treated as empty. Nothing beyond deserialization is
//! validated.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::types::Config;

/// File name looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// `./config.json` relative to the working directory.
pub fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load and parse the config at `path`.
///
/// Returns `ConfigError::NotFound` if absent and `ConfigError::Parse` (with
/// path + line context) if the JSON is malformed or has the wrong shape.
pub fn load_at(path: &Path) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// `load_at` convenience wrapper for [`default_path`].
pub fn load() -> Result<Config, ConfigError> {
    load_at(&default_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_arrays_default_to_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "organizations": [ { "name": "Team A" } ] }"#).unwrap();

        let config = load_at(&path).expect("load");
        assert_eq!(config.organizations.len(), 1);
        assert!(config.data_sources.is_empty());
        assert!(config.folders.is_empty());
        assert!(config.dashboards.is_empty());
    }

    #[test]
    fn unknown_top_level_keys_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "organizations": [], "alerts": [1, 2] }"#).unwrap();
        assert!(load_at(&path).expect("load").has_no_organizations());
    }
}
