mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::facility::FacilityArgs;
use commands::feasibility::FeasibilityArgs;

/// Property development feasibility and residual land value
#[derive(Parser)]
#[command(
    name = "devfeas",
    version,
    about = "Property development feasibility and residual land value",
    long_about = "A CLI for development feasibility with decimal precision. Sizes the \
                  construction facility, cascades costs, and reports residual land value, \
                  lender ratios, settlement cash and a revenue sensitivity table."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log level for diagnostics on stderr (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a development: facility, costs, RLV, ratios and sensitivity
    Feasibility(FeasibilityArgs),
    /// Size a construction facility that funds its own fee and interest
    Facility(FacilityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
    /// Printable feasibility summary
    Report,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Feasibility(args) => commands::feasibility::run_feasibility(args),
        Commands::Facility(args) => commands::facility::run_facility(args),
        Commands::Version => {
            println!("devfeas {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
