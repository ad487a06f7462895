//! CSV → [`RawRecord`] reader.
//!
//! Handles BOM stripping, configurable delimiters, header normalization and
//! column mapping. Required columns are checked once against the header; a
//! row the CSV parser cannot read becomes a [`RowError`] and the rest of the
//! file is still read.

use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

use roster_provisioning::validation::normalize_field_name;
use roster_provisioning::{RawRecord, REQUIRED_FIELDS};

use crate::error::ImportError;
use crate::models::ImportConfig;

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// A row that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based line number (header = 1, first data row = 2).
    pub line: usize,
    pub message: String,
}

/// Result of reading a file.
#[derive(Debug, Default)]
pub struct ImportResult {
    /// Parsed records, in file order.
    pub records: Vec<RawRecord>,
    /// Rows the parser rejected.
    pub errors: Vec<RowError>,
    /// Data rows seen (excluding the header).
    pub total_rows: usize,
}

fn strip_utf8_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Read a CSV file from disk.
pub fn read_file(path: impl AsRef<Path>, config: &ImportConfig) -> Result<ImportResult, ImportError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_records(&data, config)
}

/// Read CSV bytes into records.
pub fn read_records(data: &[u8], config: &ImportConfig) -> Result<ImportResult, ImportError> {
    let data = strip_utf8_bom(data);
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(ImportError::Empty);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(config.delimiter.as_byte())
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()
        .map_err(ImportError::Headers)?
        .iter()
        .map(normalize_field_name)
        .collect();
    let fields = resolve_fields(&headers, config)?;

    let max_rows = config.max_rows();
    let mut result = ImportResult::default();

    for row in reader.records() {
        result.total_rows += 1;
        if result.total_rows > max_rows {
            return Err(ImportError::TooManyRows { max: max_rows });
        }
        // Header is line 1.
        let fallback_line = result.total_rows + 1;

        match row {
            Ok(row) => {
                let line = row
                    .position()
                    .map_or(fallback_line, |p| p.line() as usize);
                let mut record = RawRecord::new(line);
                for (field, value) in fields.iter().zip(row.iter()) {
                    record.insert(field, value);
                }
                result.records.push(record);
            }
            Err(e) => {
                let line = e.position().map_or(fallback_line, |p| p.line() as usize);
                tracing::debug!(line, error = %e, "Unreadable CSV row");
                result.errors.push(RowError {
                    line,
                    message: format!("failed to parse CSV row: {e}"),
                });
            }
        }
    }

    tracing::debug!(
        rows = result.total_rows,
        records = result.records.len(),
        errors = result.errors.len(),
        "Read CSV input"
    );
    Ok(result)
}

/// Record field name for each column, after mapping. Fails when a required
/// field has no column or more than one.
fn resolve_fields(headers: &[String], config: &ImportConfig) -> Result<Vec<String>, ImportError> {
    let mapping: HashMap<String, String> = config
        .column_mapping
        .iter()
        .map(|(source, field)| (normalize_field_name(source), normalize_field_name(field)))
        .collect();

    if let Some((source, _)) = config
        .column_mapping
        .iter()
        .find(|(source, _)| !headers.contains(&normalize_field_name(source)))
    {
        return Err(ImportError::UnknownMappingSource(source.clone()));
    }

    let fields: Vec<String> = headers
        .iter()
        .map(|h| mapping.get(h).cloned().unwrap_or_else(|| h.clone()))
        .collect();

    for required in REQUIRED_FIELDS {
        if fields.iter().filter(|f| f.as_str() == required).count() > 1 {
            return Err(ImportError::DuplicateColumn(required.to_string()));
        }
    }

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|required| !fields.iter().any(|f| f == *required))
        .map(|required| (*required).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingColumns(missing));
    }

    Ok(fields)
}
