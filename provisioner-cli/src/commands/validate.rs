//! `grafana-provisioner validate`: parse the config and count its items.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use provisioner_core::Config;

use super::load_config;

/// Arguments for `grafana-provisioner validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the provisioning config (default: ./config.json).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "resource")]
    resource: &'static str,
    #[tabled(rename = "count")]
    count: usize,
}

impl ValidateArgs {
    pub fn run(self) -> Result<()> {
        let (path, config) = load_config(self.config.as_ref())?;

        println!("{} {} is valid", "✓".green().bold(), path.display());
        let mut table = Table::new(count_rows(&config));
        table.with(Style::rounded());
        println!("{table}");

        if config.has_no_organizations() {
            println!("{}", "No organizations configured; provision would do nothing".yellow());
        }
        Ok(())
    }
}

fn count_rows(config: &Config) -> Vec<CountRow> {
    vec![
        CountRow { resource: "organizations", count: config.organizations.len() },
        CountRow { resource: "data sources", count: config.data_sources.len() },
        CountRow { resource: "folders", count: config.folders.len() },
        CountRow { resource: "dashboards", count: config.dashboards.len() },
    ]
}
