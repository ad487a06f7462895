//! CLI command implementations.
//!
//! Both commands read the same CSV input; `plan` additionally diffs against an
//! observed-state snapshot. Neither contacts a remote service.

pub mod plan;
pub mod validate;

use clap::{Args, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::info;

use roster_import::{read_file, CsvDelimiter, ImportConfig, ImportResult};
use roster_provisioning::ProvisioningConfig;

use crate::error::{CliError, CliResult};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// One line per item
    Text,
}

/// CSV input options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// CSV file with one identity per row
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    /// Field delimiter: comma, semicolon, tab or pipe
    #[arg(short = 'd', long, default_value = "comma")]
    pub delimiter: String,

    /// Map a source header to a record field, e.g. 'Given Name=first_name'
    #[arg(long = "map", value_name = "HEADER=FIELD")]
    pub mappings: Vec<String>,

    /// Maximum number of data rows to read
    #[arg(long)]
    pub max_rows: Option<usize>,
}

impl InputArgs {
    /// Reader settings from the command line.
    pub fn import_config(&self) -> CliResult<ImportConfig> {
        let delimiter: CsvDelimiter = self.delimiter.parse()?;
        let mut config = ImportConfig::new().with_delimiter(delimiter);
        if let Some(max_rows) = self.max_rows {
            config = config.with_max_rows(max_rows);
        }
        for mapping in &self.mappings {
            let (source, field) = parse_mapping(mapping)?;
            config = config.with_mapping(source, field);
        }
        Ok(config)
    }

    /// Read the CSV input.
    pub fn read(&self) -> CliResult<ImportResult> {
        let imported = read_file(&self.input, &self.import_config()?)?;
        info!(
            path = %self.input.display(),
            rows = imported.total_rows,
            row_errors = imported.errors.len(),
            "Read input file"
        );
        Ok(imported)
    }
}

fn parse_mapping(mapping: &str) -> CliResult<(&str, &str)> {
    match mapping.split_once('=') {
        Some((source, field)) if !source.trim().is_empty() && !field.trim().is_empty() => {
            Ok((source.trim(), field.trim()))
        }
        _ => Err(CliError::InvalidArgument(format!(
            "column mapping '{mapping}' must look like HEADER=FIELD"
        ))),
    }
}

/// Load the engine configuration: YAML file (or defaults), then
/// `ROSTER_*` environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> CliResult<ProvisioningConfig> {
    let config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            ProvisioningConfig::from_file(path)?
        }
        None => ProvisioningConfig::default(),
    };
    let config = config.with_env_overrides()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(delimiter: &str, mappings: &[&str]) -> InputArgs {
        InputArgs {
            input: PathBuf::from("people.csv"),
            delimiter: delimiter.to_string(),
            mappings: mappings.iter().map(|m| m.to_string()).collect(),
            max_rows: Some(10),
        }
    }

    #[test]
    fn test_import_config_from_args() {
        let config = args("semicolon", &["Given Name = first_name"])
            .import_config()
            .unwrap();
        assert_eq!(config.delimiter, CsvDelimiter::Semicolon);
        assert_eq!(config.max_rows, Some(10));
        assert_eq!(
            config.column_mapping.get("Given Name").map(String::as_str),
            Some("first_name")
        );
    }

    #[test]
    fn test_invalid_mapping_rejected() {
        let err = args("comma", &["first_name"]).import_config().unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
        let err = args("comma", &["=first_name"]).import_config().unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }

    #[test]
    fn test_invalid_delimiter_rejected() {
        let err = args("colon", &[]).import_config().unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "console_access: false\nkey_scheme: first_dot_last").unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert!(!config.console_access);
    }

    #[test]
    fn test_load_config_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "concurrency: 0").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
