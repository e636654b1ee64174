pub mod provision;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};

use provisioner_core::{config, Config};

/// Load the config from `path`, or `config.json` in the working directory.
pub fn load_config(path: Option<&PathBuf>) -> Result<(PathBuf, Config)> {
    let (path, loaded) = match path {
        Some(path) => (path.clone(), config::load_at(path)),
        None => (config::default_path(), config::load()),
    };
    let config = loaded.context("failed to load provisioning config")?;
    Ok((path, config))
}
