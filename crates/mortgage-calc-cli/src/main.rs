mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::affordability::AffordabilityArgs;
use commands::loan::LoanArgs;
use commands::purchase::{CompareArgs, SummaryArgs};

/// Mortgage payment, amortisation and affordability calculations
#[derive(Parser)]
#[command(
    name = "mortgage",
    version,
    about = "Mortgage payment, amortisation and affordability calculations",
    long_about = "A CLI for residential mortgage calculations with decimal precision. \
                  Supports level, interest-only and balloon payments, month-by-month \
                  amortisation schedules, DTI-based affordability, purchase cost \
                  summaries and loan comparisons."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the monthly payment for a loan
    Payment(LoanArgs),
    /// Generate the month-by-month amortisation schedule
    Schedule(LoanArgs),
    /// Maximum affordable loan and home price from income and DTI limits
    Affordability(AffordabilityArgs),
    /// Monthly cost breakdown and closing costs for a purchase
    Summary(SummaryArgs),
    /// Compare the current loan against alternative rates and terms
    Compare(CompareArgs),
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
    let cli = Cli::parse();
    logging::init_tracing();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Payment(args) => commands::loan::run_payment(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Affordability(args) => commands::affordability::run_affordability(args),
        Commands::Summary(args) => commands::purchase::run_summary(args),
        Commands::Compare(args) => commands::purchase::run_compare(args),
        Commands::Version => {
            println!("mortgage {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
