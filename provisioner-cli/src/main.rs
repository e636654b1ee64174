//! grafana-provisioner: declarative Grafana multi-tenant provisioning.
//!
//! # Usage
//!
//! ```text
//! grafana-provisioner provision [--config <path>] [--dry-run] [--no-telemetry] [--json]
//! grafana-provisioner validate [--config <path>]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{provision::ProvisionArgs, validate::ValidateArgs};

#[derive(Parser, Debug)]
#[command(
    name = "grafana-provisioner",
    version,
    about = "Provision Grafana organizations, data sources, folders and dashboards",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile every configured organization against Grafana.
    Provision(ProvisionArgs),

    /// Load and check the config file without contacting Grafana.
    Validate(ValidateArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Provision(args) => args.run(),
        Commands::Validate(args) => args.run(),
    }
}
