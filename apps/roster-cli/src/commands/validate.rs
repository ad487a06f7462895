//! Validate command: check a CSV file and show the derived users.
//!
//! # Usage
//!
//! ```bash
//! roster validate people.csv
//! roster validate people.csv --output text --map 'Surname=last_name'
//! ```

use clap::Args;
use serde::Serialize;
use std::io::Write;

use roster_import::RowError;
use roster_provisioning::{DesiredUser, ProvisioningConfig, ProvisioningEngine, RecordError};

use super::{InputArgs, OutputFormat};
use crate::error::{CliError, CliResult};

/// Check a CSV file without planning any changes
#[derive(Args, Debug)]
#[command(after_help = "EXIT CODES:
    0  Every row produced a user
    4  Some rows were unreadable or rejected (report is still printed)
")]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "json")]
    pub output: OutputFormat,
}

#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    total_rows: usize,
    accepted: usize,
    row_errors: &'a [RowError],
    rejected: &'a [RecordError],
    users: &'a [DesiredUser],
}

pub fn execute(
    args: &ValidateArgs,
    config: ProvisioningConfig,
    out: &mut dyn Write,
) -> CliResult<()> {
    let imported = args.input.read()?;
    let engine = ProvisioningEngine::new(config)?;
    let derivation = engine.derive(imported.records)?;

    let report = ValidationReport {
        total_rows: imported.total_rows,
        accepted: derivation.desired.users.len(),
        row_errors: &imported.errors,
        rejected: &derivation.rejected,
        users: &derivation.desired.users,
    };

    match args.output {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
        OutputFormat::Text => {
            for user in report.users {
                writeln!(out, "line {:>4}  {:<24} {}", user.line, user.key.as_str(), user.group)?;
            }
            for error in report.row_errors {
                writeln!(out, "line {:>4}  unreadable: {}", error.line, error.message)?;
            }
            for error in report.rejected {
                writeln!(out, "line {:>4}  rejected: {}", error.line(), error)?;
            }
            writeln!(
                out,
                "{} row(s), {} accepted, {} rejected, {} unreadable",
                report.total_rows,
                report.accepted,
                report.rejected.len(),
                report.row_errors.len()
            )?;
        }
    }

    if report.rejected.is_empty() && report.row_errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::RejectedRecords {
            rejected: report.rejected.len(),
            row_errors: report.row_errors.len(),
        })
    }
}
