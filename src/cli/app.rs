//! Main CLI application structure

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use super::measure::{self, MeasureCommands};
use super::output::{Output, OutputFormat};
use super::{catalog_cmd, session};
use crate::store::Config;

#[derive(Parser)]
#[command(name = "pole")]
#[command(author, version, about = "Utility pole configuration editor")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the config file's `default_format`)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Log store activity to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Configuration file to use instead of the user default
    #[arg(long, global = true, env = "POLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the session state
    Show {
        /// Start empty instead of with the default utility pole
        #[arg(long)]
        no_seed: bool,
    },

    /// Run a session script (TOML, YAML or JSON) and show the result
    Run {
        /// Path to the script
        script: PathBuf,

        /// Start empty instead of with the default utility pole
        #[arg(long)]
        no_seed: bool,
    },

    /// Show the catalog template for a component kind
    Defaults {
        /// Component kind (pole, crossarm, insulator, ...)
        kind: String,

        /// Build the company-data template for this data id
        #[arg(long)]
        data_id: Option<String>,
    },

    /// Convert between imperial text, meters and polar placement
    #[command(subcommand)]
    Measure(MeasureCommands),

    /// Show the effective configuration
    Config,
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(cli.verbose, &config.log_filter);

    let format = cli.format.unwrap_or_else(|| config.default_format.into());
    let output = Output::new(format);

    tracing::debug!(?format, seed = config.seed_default_configuration, "pole starting");

    match cli.command {
        Commands::Show { no_seed } => session::show(&output, &config, !no_seed)?,
        Commands::Run { script, no_seed } => session::run_script(&output, &config, &script, !no_seed)?,
        Commands::Defaults { kind, data_id } => catalog_cmd::defaults(&output, &kind, data_id.as_deref())?,
        Commands::Measure(cmd) => measure::run(cmd, &output)?,
        Commands::Config => show_config(&output, &config, cli.config)?,
    }

    Ok(())
}

/// Installs the stderr log subscriber
///
/// `--verbose` wins over `RUST_LOG`, which wins over the config file filter.
fn init_tracing(verbose: bool, fallback: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    // A subscriber may already be installed when embedded in tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn show_config(output: &Output, config: &Config, explicit: Option<PathBuf>) -> Result<()> {
    let path = explicit.or_else(|| Config::default_path().filter(|p| p.exists()));

    if output.is_json() {
        output.data(&serde_json::json!({
            "path": path,
            "config": config,
        }));
        return Ok(());
    }

    match &path {
        Some(p) => println!("# {}", p.display()),
        None => println!("# defaults (no config file)"),
    }
    let rendered = toml::to_string_pretty(config).context("Failed to serialize configuration")?;
    print!("{}", rendered);

    Ok(())
}
