mod commands;
mod input;
mod output;
mod settings;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::{BundleArgs, Context};

/// Bottom-up total return decomposition for a tracked equity index
#[derive(Parser)]
#[command(
    name = "idx-decomp",
    version,
    about = "Bottom-up total return decomposition for a tracked equity index",
    long_about = "Resolves index members to company fundamentals, rolls them up into \
                  company, sector and index levels, splits total return into earnings \
                  growth, PE expansion and dividend yield, verifies the levels against \
                  each other, and compares the result with a reference series."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (TOML); missing file means defaults
    #[arg(long, default_value = "idx-decomp.toml", global = true)]
    config: PathBuf,

    /// Round decimal values to this many places on output
    #[arg(long, global = true)]
    decimals: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all three levels and run every analysis
    Decompose(BundleArgs),
    /// Check additive consistency between the levels
    Verify(BundleArgs),
    /// Annualised rolling-window decomposition and dispersion
    Rolling(BundleArgs),
    /// Compare the index series with a reference series
    CrossValidate(BundleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    // stdout carries results; logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    let ctx = Context {
        config_path: cli.config.clone(),
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Decompose(args) => commands::decompose::run_decompose(args, &ctx),
        Commands::Verify(args) => commands::verify::run_verify(args, &ctx),
        Commands::Rolling(args) => commands::rolling::run_rolling(args, &ctx),
        Commands::CrossValidate(args) => commands::cross_validate::run_cross_validate(args, &ctx),
        Commands::Version => {
            println!("idx-decomp {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(mut value) => {
            if let Some(dp) = cli.decimals {
                output::round_decimals(&mut value, dp);
            }
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
