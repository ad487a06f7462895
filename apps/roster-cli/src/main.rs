//! roster CLI - offline front end for the provisioning engine
//!
//! - `validate`: read a CSV file and report derived users and rejected rows
//! - `plan`: compute the change set against an observed-state snapshot
//!
//! Nothing here calls a remote service.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use roster_cli::commands;
use roster_cli::error::CliResult;
use roster_cli::logging::{self, LogFormat};

/// roster - identity provisioning planner
#[derive(Parser)]
#[command(name = "roster")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Engine configuration file (YAML)
    #[arg(short, long, global = true, env = "ROSTER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log line format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value = "text")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a CSV file and show the users it derives
    Validate(commands::validate::ValidateArgs),

    /// Show the operations a run would perform
    Plan(commands::plan::PlanArgs),
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    logging::init_logging(cli.log_format, logging::DEFAULT_FILTER)?;
    let config = commands::load_config(cli.config.as_deref())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Validate(args) => commands::validate::execute(&args, config, &mut out),
        Commands::Plan(args) => commands::plan::execute(&args, config, &mut out),
    }
}
