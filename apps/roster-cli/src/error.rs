//! CLI error types and exit codes

use roster_import::ImportError;
use roster_provisioning::{ConfigError, EngineError, GraphError};
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 3: Configuration error
/// - 4: Input error (unreadable CSV, rejected records)
/// - 5: Graph integrity violation
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("{0}")]
    Graph(#[from] GraphError),

    #[error("Engine error: {0}")]
    Engine(EngineError),

    #[error("Failed to read observed state from {path}: {message}")]
    Observed { path: String, message: String },

    #[error("{rejected} record(s) rejected, {row_errors} row(s) unreadable")]
    RejectedRecords { rejected: usize, row_errors: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Engine(EngineError::Config(_)) => 3,
            CliError::Import(_)
            | CliError::Observed { .. }
            | CliError::InvalidArgument(_)
            | CliError::RejectedRecords { .. } => 4,
            CliError::Graph(_) | CliError::Engine(EngineError::Graph(_)) => 5,
            CliError::Engine(_) | CliError::Logging(_) | CliError::Io(_) => 1,
        }
    }

    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Import(ImportError::MissingColumns(_)) => Some(
                "Rename the columns or map them with --map 'Source Header=field_name'.",
            ),
            CliError::Import(ImportError::InvalidDelimiter(_)) => {
                Some("Use one of: comma, semicolon, tab, pipe.")
            }
            CliError::RejectedRecords { .. } => {
                Some("Run 'roster validate' to list the rejected records.")
            }
            _ => None,
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Graph(graph) => CliError::Graph(graph),
            EngineError::Config(config) => CliError::Config(config),
            other => CliError::Engine(other),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("failed to write JSON: {e}"))
    }
}
