//! Runtime settings read once from the environment.
//!
//! | Variable                 | Default               |
//! |--------------------------|-----------------------|
//! | `SERVICE_NAME`           | `grafana-provisioner` |
//! | `DEPLOYMENT_ENVIRONMENT` | `Development`         |
//! | `GRAFANA_URL`            | `localhost:3000`      |
//! | `GRAFANA_USERNAME`       | `admin`               |
//! | `GRAFANA_PASSWORD`       | `admin`               |
//! | `OTEL_SDK_DISABLED`      | unset (export on)     |
//!
//! A variable that is set overrides its default even when empty.
//! [`Settings::from_lookup`] takes the lookup as a closure so tests never touch
//! the process environment.

use std::fmt;

pub const DEFAULT_SERVICE_NAME: &str = "grafana-provisioner";
pub const DEFAULT_DEPLOYMENT_ENVIRONMENT: &str = "Development";
pub const DEFAULT_GRAFANA_URL: &str = "localhost:3000";
pub const DEFAULT_GRAFANA_USERNAME: &str = "admin";
pub const DEFAULT_GRAFANA_PASSWORD: &str = "admin";

/// Immutable process settings, passed by reference to whatever needs them.
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub service_name: String,
    pub deployment_environment: String,
    /// `host:port` or a full `http(s)://` URL of the Grafana server.
    pub grafana_url: String,
    pub grafana_username: String,
    pub grafana_password: String,
    /// Export traces, metrics and logs over OTLP.
    pub telemetry_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_owned(),
            deployment_environment: DEFAULT_DEPLOYMENT_ENVIRONMENT.to_owned(),
            grafana_url: DEFAULT_GRAFANA_URL.to_owned(),
            grafana_username: DEFAULT_GRAFANA_USERNAME.to_owned(),
            grafana_password: DEFAULT_GRAFANA_PASSWORD.to_owned(),
            telemetry_enabled: true,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let telemetry_enabled = !lookup("OTEL_SDK_DISABLED")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            service_name: lookup("SERVICE_NAME").unwrap_or(defaults.service_name),
            deployment_environment: lookup("DEPLOYMENT_ENVIRONMENT")
                .unwrap_or(defaults.deployment_environment),
            grafana_url: lookup("GRAFANA_URL").unwrap_or(defaults.grafana_url),
            grafana_username: lookup("GRAFANA_USERNAME").unwrap_or(defaults.grafana_username),
            grafana_password: lookup("GRAFANA_PASSWORD").unwrap_or(defaults.grafana_password),
            telemetry_enabled,
        }
    }

    /// Base URL of the Grafana HTTP API, e.g. `http://localhost:3000/api`.
    ///
    /// A bare `host:port` is assumed to be plain HTTP.
    pub fn api_base_url(&self) -> String {
        let trimmed = self.grafana_url.trim().trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            format!("{trimmed}/api")
        } else {
            format!("http://{trimmed}/api")
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("service_name", &self.service_name)
            .field("deployment_environment", &self.deployment_environment)
            .field("grafana_url", &self.grafana_url)
            .field("grafana_username", &self.grafana_username)
            .field("grafana_password", &"<redacted>")
            .field("telemetry_enabled", &self.telemetry_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let settings = Settings::from_lookup(|_| None);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.service_name, "grafana-provisioner");
        assert_eq!(settings.deployment_environment, "Development");
        assert!(settings.telemetry_enabled);
    }

    #[test]
    fn set_variables_override_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("GRAFANA_URL", "grafana.internal:3000"),
            ("GRAFANA_USERNAME", "provisioner"),
            ("GRAFANA_PASSWORD", "s3cret"),
        ]));
        assert_eq!(settings.grafana_url, "grafana.internal:3000");
        assert_eq!(settings.grafana_username, "provisioner");
        assert_eq!(settings.grafana_password, "s3cret");
        assert_eq!(settings.service_name, DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn otel_sdk_disabled_turns_export_off() {
        let settings = Settings::from_lookup(lookup_from(&[("OTEL_SDK_DISABLED", " TRUE ")]));
        assert!(!settings.telemetry_enabled);

        let settings = Settings::from_lookup(lookup_from(&[("OTEL_SDK_DISABLED", "false")]));
        assert!(settings.telemetry_enabled);
    }

    #[test]
    fn debug_redacts_password() {
        let settings = Settings::from_lookup(lookup_from(&[("GRAFANA_PASSWORD", "hunter2")]));
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
