use clap::Args;
use colored::Colorize;
use scry_core::transport::DEFAULT_BASE_URL;
use scry_core::{FlushOutcome, HttpTransport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use super::check_config::load_settings;
use super::script::{run_script, PageScript, SimulationReport};

#[derive(Args)]
pub struct SimulateCommand {
    /// Page script (JSON) describing the page and the steps to run
    #[arg(long)]
    pub script: PathBuf,

    /// Settings document (JSON), defaults apply when omitted
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Collection endpoint base URL
    #[arg(long, env = "SCRY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Public token identifying the site
    #[arg(long, env = "SCRY_PUBLIC_TOKEN")]
    pub public_token: String,

    /// Override the masking level from the settings document
    #[arg(long, env = "SCRY_MASKING_LEVEL")]
    pub masking_level: Option<String>,
}

impl SimulateCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let contents = std::fs::read_to_string(&self.script)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", self.script.display(), e))?;
        let script: PageScript = serde_json::from_str(&contents)
            .map_err(|e| anyhow::anyhow!("Invalid page script {}: {}", self.script.display(), e))?;
        let settings = load_settings(self.settings.as_deref(), self.masking_level.as_deref(), false)?;
        let transport = Arc::new(HttpTransport::new(&self.base_url)?);

        debug!("Simulating {} against {}", script.url, self.base_url);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(run_script(&script, settings, transport, &self.public_token))?;

        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &SimulationReport) {
    println!();
    match report.session_id() {
        Some(id) => println!("{} {}", "Session:".bright_white().bold(), id.to_string().bright_cyan()),
        None => println!("{} {}", "Session:".bright_white().bold(), "not created".bright_red()),
    }
    println!("{} {}", "Steps:".bright_white().bold(), report.steps_run);

    for (stream, outcome) in &report.flushes {
        let line = match outcome {
            FlushOutcome::Skipped => "skipped".dimmed().to_string(),
            FlushOutcome::Delivered { events, status } => {
                format!("{} events delivered (HTTP {})", events, status).bright_green().to_string()
            }
            FlushOutcome::Failed { events, retained } => {
                let retained = if *retained { ", retained" } else { "" };
                format!("{} events failed{}", events, retained).bright_red().to_string()
            }
        };
        println!("  {:<12} {}", stream, line);
    }
    println!();
}
