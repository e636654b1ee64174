//! Provisioner core library: domain types, config loading, settings, errors.
//!
//! - [`types`]: newtypes and the config document
//! - [`config`]: load the JSON config file
//! - [`settings`]: environment-derived runtime settings
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod settings;
pub mod types;

pub use error::ConfigError;
pub use settings::Settings;
pub use types::{
    Config, Dashboard, DashboardDocument, DataSource, Folder, OrgId, OrgName,
    Organization, Uid,
};
