//! # typebridge
//!
//! CLI tool for planning where generated types go.
//!
//! ## Usage
//!
//! ```bash
//! # Build the plan and print every artifact
//! typebridge plan --manifest universe.json
//!
//! # Machine-readable output
//! typebridge plan --manifest universe.json --format json
//!
//! # Check a configuration without printing the plan
//! typebridge check --manifest universe.json --config typebridge.toml
//!
//! # Initialize configuration
//! typebridge init
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use typebridge_cli::{
    config::{CliArgs, ConfigManager, OutputFormat},
    error::CliError,
    pipeline, report,
};

#[derive(Parser)]
#[command(name = "typebridge")]
#[command(author, version, about = "Plan cross-language type generation", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the generation plan and print every artifact descriptor
    Plan {
        /// Universe manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Disable the exchangeable set
        #[arg(long)]
        no_exchange: bool,
    },

    /// Check that the manifest and configuration produce a valid plan
    Check {
        /// Universe manifest (JSON)
        #[arg(short, long)]
        manifest: PathBuf,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Initialize a new typebridge configuration file
    Init {
        /// Output path for configuration file
        #[arg(short, long, default_value = "typebridge.toml")]
        output: PathBuf,

        /// Overwrite existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            match e {
                CliError::Validation(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

/// Install the stderr log subscriber. `TYPEBRIDGE_LOG` overrides the level.
fn setup_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("TYPEBRIDGE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Plan {
            manifest,
            config,
            format,
            no_exchange,
        } => cmd_plan(manifest, config, format, no_exchange),

        Commands::Check { manifest, config } => cmd_check(manifest, config),

        Commands::Init { output, force } => cmd_init(output, force),
    }
}

/// Plan command implementation.
fn cmd_plan(
    manifest: PathBuf,
    config_path: Option<PathBuf>,
    format: Option<OutputFormat>,
    no_exchange: bool,
) -> Result<(), CliError> {
    let config = ConfigManager::load(config_path.as_deref())?;
    let config = ConfigManager::merge_cli_args(
        config,
        &CliArgs {
            format,
            no_exchange,
        },
    );

    let outcome = pipeline::run(&manifest, &config)?;
    println!("{}", report::render(&outcome, config.output.format)?);

    if outcome.is_success() {
        Ok(())
    } else {
        Err(CliError::Resolution {
            failed: outcome.report.failed.len(),
        })
    }
}

/// Check command implementation.
fn cmd_check(manifest: PathBuf, config_path: Option<PathBuf>) -> Result<(), CliError> {
    println!("{}", "Checking generation plan...".cyan());

    let config = ConfigManager::load(config_path.as_deref())?;
    let outcome = match pipeline::run(&manifest, &config) {
        Ok(outcome) => outcome,
        Err(CliError::Plan(e)) => {
            println!("{} Configuration is invalid", "✗".red());
            return Err(CliError::Validation(e.to_string()));
        }
        Err(e) => return Err(e),
    };

    if outcome.is_success() {
        println!(
            "{} {} type(s) resolved",
            "✓".green(),
            outcome.report.resolved.len()
        );
        Ok(())
    } else {
        println!("{} Some types cannot be resolved", "✗".red());
        for (source, err) in &outcome.report.failed {
            println!("  {}: {}", source, err);
        }
        Err(CliError::Validation(format!(
            "{} type(s) failed to resolve",
            outcome.report.failed.len()
        )))
    }
}

/// Init command implementation.
fn cmd_init(output: PathBuf, force: bool) -> Result<(), CliError> {
    if output.exists() && !force {
        println!(
            "{} Configuration file already exists: {}",
            "Error:".red(),
            output.display()
        );
        println!("  Use --force to overwrite");
        return Err(CliError::Validation(
            "Configuration file already exists".to_string(),
        ));
    }

    let content = ConfigManager::default_config_content();
    std::fs::write(&output, content)?;

    println!(
        "{} Created configuration file: {}",
        "✓".green(),
        output.display()
    );

    Ok(())
}

/// Print an error with formatting.
fn print_error(error: &CliError) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}
