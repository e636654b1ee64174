//! `grafana-provisioner provision`: reconcile the config against Grafana.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use provisioner_core::Settings;
use provisioner_grafana::HttpClient;
use provisioner_reconcile::{run, OrgReport, Outcome, ProvisionReport, ReconcileMetrics, RunOptions};

use super::load_config;

/// Arguments for `grafana-provisioner provision`.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Path to the provisioning config (default: ./config.json).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Look everything up and report what would change, without writing.
    #[arg(long)]
    pub dry_run: bool,

    /// Disable OTLP export; console logging only.
    #[arg(long)]
    pub no_telemetry: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl ProvisionArgs {
    pub fn run(self) -> Result<()> {
        let mut settings = Settings::from_env();
        if self.no_telemetry {
            settings.telemetry_enabled = false;
        }

        let telemetry =
            provisioner_telemetry::init(&settings).context("failed to initialize telemetry")?;
        let metrics = ReconcileMetrics::new(&telemetry.meter());

        let result = self.provision(&settings, metrics);

        if let Err(err) = telemetry.shutdown() {
            tracing::warn!(error = %err, "telemetry did not shut down cleanly");
        }
        result
    }

    fn provision(&self, settings: &Settings, metrics: ReconcileMetrics) -> Result<()> {
        let (path, config) = load_config(self.config.as_ref())?;
        tracing::info!(
            config = %path.display(),
            organizations = config.organizations.len(),
            grafana = %settings.api_base_url(),
            "loaded provisioning config"
        );

        let stop = Arc::new(AtomicBool::new(false));
        let handler_stop = Arc::clone(&stop);
        ctrlc::set_handler(move || {
            handler_stop.store(true, Ordering::SeqCst);
        })
        .context("failed to install interrupt handler")?;

        let client = HttpClient::new(settings);
        let options = RunOptions {
            dry_run: self.dry_run,
            stop,
            metrics: Some(metrics),
        };
        let report = run(&client, &config, &options);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize report")?
            );
        } else {
            print_report(&report, self.dry_run);
        }
        Ok(())
    }
}

fn print_report(report: &ProvisionReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };

    if report.organizations.is_empty() && !report.interrupted {
        println!("{prefix}No organizations configured — nothing to do");
        return;
    }

    for org in &report.organizations {
        print_org(org, prefix);
    }

    println!(
        "{prefix}{} created, {} updated, {} failed",
        report.created(),
        report.updated(),
        report.failed()
    );
    if report.interrupted {
        println!("{}", "Interrupted: remaining organizations were not provisioned".yellow());
    }
}

fn print_org(org: &OrgReport, prefix: &str) {
    let failures = org.failures().count();
    let mark = if failures == 0 {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    let id = org
        .org_id
        .map(|id| format!(" (org {id})"))
        .unwrap_or_default();
    println!("{prefix}{mark} '{}'{id}", org.organization);

    for resource in &org.resources {
        let symbol = match &resource.outcome {
            Outcome::Created => "+".green(),
            Outcome::Updated => "✎".cyan(),
            Outcome::Unchanged => "·".bright_black(),
            Outcome::WouldCreate => "+".bright_black(),
            Outcome::WouldUpdate => "~".bright_black(),
            Outcome::Skipped { .. } => "-".yellow(),
            Outcome::Failed { .. } => "!".red(),
        };
        let detail = match &resource.outcome {
            Outcome::Skipped { reason } => format!(" ({reason})"),
            Outcome::Failed { error } => format!(" — {error}"),
            _ => String::new(),
        };
        println!("  {symbol}  {} {}{detail}", resource.kind, resource.key);
    }
}
