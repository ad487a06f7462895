//! Plan command: show the operations a run would perform.
//!
//! The observed state is a JSON snapshot, in the shape `ObservedState`
//! serializes to. Without one the account is assumed empty.
//!
//! # Usage
//!
//! ```bash
//! roster plan people.csv --observed snapshot.json
//! roster --config roster.yaml plan people.csv --output text
//! ```

use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use roster_connector::ObservedState;
use roster_import::RowError;
use roster_provisioning::{ChangeSet, ProvisioningConfig, ProvisioningEngine, RecordError};

use super::{InputArgs, OutputFormat};
use crate::error::{CliError, CliResult};

/// Compute the change set for a CSV file (dry run)
#[derive(Args, Debug)]
#[command(after_help = "EXAMPLES:
    # Plan against an empty account
    roster plan people.csv

    # Plan against an exported snapshot
    roster plan people.csv --observed snapshot.json --output text
")]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Observed-state snapshot (JSON)
    #[arg(long, value_name = "FILE")]
    pub observed: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "json")]
    pub output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    changes: &'a ChangeSet,
    rejected: &'a [RecordError],
    row_errors: &'a [RowError],
}

/// Read an observed-state snapshot.
pub fn load_observed(path: &Path) -> CliResult<ObservedState> {
    let observed_error = |message: String| CliError::Observed {
        path: path.display().to_string(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| observed_error(e.to_string()))?;
    serde_json::from_str(&content).map_err(|e| observed_error(e.to_string()))
}

pub fn execute(args: &PlanArgs, config: ProvisioningConfig, out: &mut dyn Write) -> CliResult<()> {
    let observed = match &args.observed {
        Some(path) => load_observed(path)?,
        None => ObservedState::new(),
    };
    let imported = args.input.read()?;
    let engine = ProvisioningEngine::new(config)?;
    let plan = engine.plan(imported.records, &observed)?;

    info!(
        operations = plan.changes.len(),
        unchanged = plan.changes.unchanged().len(),
        rejected = plan.rejected.len(),
        "Computed plan"
    );

    match args.output {
        OutputFormat::Json => {
            let report = PlanReport {
                changes: &plan.changes,
                rejected: &plan.rejected,
                row_errors: &imported.errors,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            for op in &plan.changes {
                writeln!(out, "+ {op}")?;
            }
            for error in &plan.rejected {
                writeln!(out, "! {error}")?;
            }
            for error in &imported.errors {
                writeln!(out, "! line {}: {}", error.line, error.message)?;
            }
            writeln!(
                out,
                "Plan: {} operation(s), {} unchanged, {} rejected.",
                plan.changes.len(),
                plan.changes.unchanged().len(),
                plan.rejected.len() + imported.errors.len()
            )?;
        }
    }
    Ok(())
}
