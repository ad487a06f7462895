//! Import error types.

use thiserror::Error;

/// File-level import failure. Row-level problems are reported as
/// [`RowError`](crate::RowError)s instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV input is empty")]
    Empty,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV headers: {0}")]
    Headers(#[source] csv::Error),

    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("more than one column maps to field '{0}'")]
    DuplicateColumn(String),

    #[error("column mapping source '{0}' is not a CSV header")]
    UnknownMappingSource(String),

    #[error("CSV exceeds maximum row limit of {max}")]
    TooManyRows { max: usize },

    #[error("invalid delimiter '{0}'; valid values: ',', ';', '\\t', '|'")]
    InvalidDelimiter(String),
}

impl ImportError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            ImportError::Empty => "EMPTY_FILE",
            ImportError::Io { .. } => "IO_ERROR",
            ImportError::Headers(_) => "INVALID_HEADERS",
            ImportError::MissingColumns(_) => "MISSING_COLUMNS",
            ImportError::DuplicateColumn(_) => "DUPLICATE_COLUMN",
            ImportError::UnknownMappingSource(_) => "INVALID_MAPPING",
            ImportError::TooManyRows { .. } => "TOO_MANY_ROWS",
            ImportError::InvalidDelimiter(_) => "INVALID_DELIMITER",
        }
    }
}
