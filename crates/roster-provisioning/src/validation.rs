//! Record validation.
//!
//! Turns raw tabular records into [`Identity`] values. Every record is
//! checked independently and every offending record produces exactly one
//! [`RecordError::InvalidRecord`]; a bad row never stops the batch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::RecordError;

pub const FIELD_FIRST_NAME: &str = "first_name";
pub const FIELD_LAST_NAME: &str = "last_name";
pub const FIELD_DEPARTMENT: &str = "department";
pub const FIELD_JOB_TITLE: &str = "job_title";

/// Fields every record must carry, in reporting order.
pub const REQUIRED_FIELDS: [&str; 4] = [
    FIELD_FIRST_NAME,
    FIELD_LAST_NAME,
    FIELD_DEPARTMENT,
    FIELD_JOB_TITLE,
];

/// Normalize a field name: trimmed, lowercased, spaces and dashes as underscores.
pub fn normalize_field_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Normalize a field value: trimmed with inner whitespace runs collapsed.
pub fn normalize_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One source row as read, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based line in the source, used in error messages.
    pub line: usize,
    fields: HashMap<String, String>,
}

impl RawRecord {
    #[must_use]
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: HashMap::new(),
        }
    }

    /// Builder-style field insert.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a field. The name is normalized; a later duplicate wins.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(normalize_field_name(name), value.into());
    }

    /// Raw value of a field, looked up by normalized name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&normalize_field_name(name))
            .map(String::as_str)
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// A validated person. All fields are non-empty and normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub line: usize,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    pub job_title: String,
}

impl Identity {
    /// "first last", as shown in the console.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Outcome of validating a batch.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Valid identities, in input order.
    pub identities: Vec<Identity>,
    /// One error per rejected record, in input order.
    pub errors: Vec<RecordError>,
}

impl ValidationResult {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a batch of records, collecting every error.
pub fn validate_records<I>(records: I) -> ValidationResult
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut result = ValidationResult::default();

    for record in records {
        match validate_record(&record) {
            Ok(identity) => result.identities.push(identity),
            Err(e) => {
                tracing::debug!(line = record.line, error = %e, "Rejected record");
                result.errors.push(e);
            }
        }
    }

    result
}

fn validate_record(record: &RawRecord) -> Result<Identity, RecordError> {
    let mut missing = Vec::new();
    let mut blank = Vec::new();
    let mut values: [String; 4] = Default::default();

    for (slot, field) in values.iter_mut().zip(REQUIRED_FIELDS) {
        match record.get(field) {
            None => missing.push(field),
            Some(raw) => {
                let value = normalize_value(raw);
                if value.is_empty() {
                    blank.push(field);
                }
                *slot = value;
            }
        }
    }

    if !missing.is_empty() || !blank.is_empty() {
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!("missing: {}", missing.join(", ")));
        }
        if !blank.is_empty() {
            parts.push(format!("blank: {}", blank.join(", ")));
        }
        let fields = missing
            .iter()
            .chain(blank.iter())
            .map(|f| (*f).to_string())
            .collect();
        return Err(RecordError::InvalidRecord {
            line: record.line,
            fields,
            message: parts.join("; "),
        });
    }

    let [first_name, last_name, department, job_title] = values;
    Ok(Identity {
        line: record.line,
        first_name,
        last_name,
        department,
        job_title,
    })
}
