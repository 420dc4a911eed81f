//! Scry CLI
//!
//! Operator tooling around the recorder: validate a settings document, check
//! what the URL sanitizer keeps, and drive a scripted page session against a
//! collection endpoint.

mod commands;

use clap::{Parser, Subcommand};
use commands::{CheckConfigCommand, SanitizeUrlCommand, SimulateCommand};
use tracing_subscriber::{layer::SubscriberExt, Layer};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "SCRY_LOG_LEVEL", global = true)]
    log_level: String,

    /// Log format: compact, full
    #[arg(
        long,
        default_value = "compact",
        env = "SCRY_LOG_FORMAT",
        global = true
    )]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged recorder settings
    CheckConfig(CheckConfigCommand),
    /// Print a URL as the recorder would capture it
    SanitizeUrl(SanitizeUrlCommand),
    /// Run a scripted page session against the collection endpoint
    Simulate(SimulateCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins when set; otherwise scry crates log at --log-level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .map_err(|e| anyhow::anyhow!("Invalid RUST_LOG environment variable: {}", e))?
    } else {
        tracing_subscriber::EnvFilter::new(format!(
            "scry={level},\
             scry_cli={level},\
             scry_core={level},\
             scry_privacy={level},\
             scry_events={level},\
             scry_error_tracking={level},\
             scry_network={level},\
             scry_session_replay={level},\
             scry_recorder={level},\
             h2=warn,\
             hyper=warn,\
             reqwest=warn,\
             rustls=warn",
            level = cli.log_level
        ))
    };

    let fmt_layer = match cli.log_format.as_str() {
        "full" => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global default subscriber: {}", e))?;

    match cli.command {
        Commands::CheckConfig(cmd) => cmd.execute(),
        Commands::SanitizeUrl(cmd) => cmd.execute(),
        Commands::Simulate(cmd) => cmd.execute(),
    }
}
