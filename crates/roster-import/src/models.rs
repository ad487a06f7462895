//! Import configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ImportError;

/// Default cap on data rows per file.
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// CSV field delimiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvDelimiter {
    /// Comma (,) - default delimiter
    #[default]
    Comma,
    /// Semicolon (;) - common in European exports
    Semicolon,
    /// Tab character (\t)
    Tab,
    /// Pipe character (|)
    Pipe,
}

impl CsvDelimiter {
    #[must_use]
    pub fn as_byte(self) -> u8 {
        match self {
            CsvDelimiter::Comma => b',',
            CsvDelimiter::Semicolon => b';',
            CsvDelimiter::Tab => b'\t',
            CsvDelimiter::Pipe => b'|',
        }
    }
}

impl FromStr for CsvDelimiter {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "," | "comma" => Ok(CsvDelimiter::Comma),
            ";" | "semicolon" => Ok(CsvDelimiter::Semicolon),
            "\t" | "tab" | "\\t" => Ok(CsvDelimiter::Tab),
            "|" | "pipe" => Ok(CsvDelimiter::Pipe),
            _ => Err(ImportError::InvalidDelimiter(s.to_string())),
        }
    }
}

/// How a CSV file is read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportConfig {
    pub delimiter: CsvDelimiter,
    /// Row cap; `None` means [`DEFAULT_MAX_ROWS`].
    pub max_rows: Option<usize>,
    /// Source header → record field, for files with their own column names.
    pub column_mapping: HashMap<String, String>,
}

impl ImportConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: CsvDelimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, source: impl Into<String>, field: impl Into<String>) -> Self {
        self.column_mapping.insert(source.into(), field.into());
        self
    }

    pub(crate) fn max_rows(&self) -> usize {
        self.max_rows.unwrap_or(DEFAULT_MAX_ROWS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_parse() {
        assert_eq!("comma".parse::<CsvDelimiter>().unwrap(), CsvDelimiter::Comma);
        assert_eq!(";".parse::<CsvDelimiter>().unwrap(), CsvDelimiter::Semicolon);
        assert_eq!("\\t".parse::<CsvDelimiter>().unwrap(), CsvDelimiter::Tab);
        assert_eq!("pipe".parse::<CsvDelimiter>().unwrap(), CsvDelimiter::Pipe);
        assert!(matches!(
            "colon".parse::<CsvDelimiter>(),
            Err(ImportError::InvalidDelimiter(_))
        ));
    }

    #[test]
    fn test_default_config() {
        let config = ImportConfig::new();
        assert_eq!(config.delimiter, CsvDelimiter::Comma);
        assert_eq!(config.max_rows(), DEFAULT_MAX_ROWS);
        assert!(config.column_mapping.is_empty());
    }
}
