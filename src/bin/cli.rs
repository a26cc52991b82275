//! gov.il Service Page Tracker CLI
//!
//! Counts service pages per department and language and writes them to CSV.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use service_tracker::{
    error::Result,
    models::{Config, Language},
    pipeline::{self, RunOptions},
};

/// Exit code used when the user interrupts a scan.
const INTERRUPTED: u8 = 130;

/// Config file read when `--config` is not given.
const DEFAULT_CONFIG: &str = "data/config.toml";

/// service-tracker - gov.il service page counter
#[derive(Parser, Debug)]
#[command(
    name = "service-tracker",
    version,
    about = "Counts localized gov.il service pages per department"
)]
struct Cli {
    /// Path to the TOML configuration file [default: data/config.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Less output: warnings only, no summary
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(flatten)]
    scan: ScanArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Output CSV file (default: {output.dir}/{output.file_prefix}_YYYYmmdd_HHMM.csv)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Only scan the first N departments
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    sample: Option<u32>,

    /// Seed for delay jitter and identity rotation
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan all departments and export the counts (default)
    Scan,

    /// Validate the configuration file
    Validate,

    /// List configured departments
    Departments,
}

/// Initialize logging based on verbosity flags.
fn init_logging(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "warn",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let explicit = cli.config.is_some();
    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    match cli.command.unwrap_or(Command::Scan) {
        Command::Scan => {
            let mut config = Config::load_or_default(&config_path, explicit)?;
            if cli.scan.seed.is_some() {
                config.seed = cli.scan.seed;
            }
            let options = RunOptions {
                output: cli.scan.output,
                sample_size: cli.scan.sample.map(|n| n as usize),
                quiet: cli.quiet,
            };

            tokio::select! {
                outcome = pipeline::run_tracker(&config, &options) => {
                    let outcome = outcome?;
                    match outcome.receipt {
                        Some(receipt) => println!("{}", receipt.location),
                        None => log::warn!("Finished without results"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    log::warn!("Interrupted by user; results of this run were not saved");
                    return Ok(ExitCode::from(INTERRUPTED));
                }
            }
        }

        Command::Validate => {
            log::info!("Validating {}...", config_path.display());
            let config = Config::load(&config_path).inspect_err(|e| {
                log::error!("Config load failed: {}", e);
            })?;
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!(
                "✓ Config OK ({} departments, {} identities, {} languages, {} endpoints)",
                config.departments.len(),
                config.identities.len(),
                Language::ALL.len(),
                config.client.endpoints.len()
            );
        }

        Command::Departments => {
            let config = Config::load_or_default(&config_path, explicit)?;
            for (i, dept) in config.departments.iter().enumerate() {
                println!("{:2}. {}  {}", i + 1, dept.id, dept.name);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
