//! CSV import for roster.
//!
//! Reads a delimited file into [`RawRecord`](roster_provisioning::RawRecord)s
//! for the provisioning engine. Rows the CSV parser cannot read are collected
//! as [`RowError`]s; field-level validation is left to the engine.

pub mod error;
pub mod models;
pub mod reader;

pub use error::ImportError;
pub use models::{CsvDelimiter, ImportConfig};
pub use reader::{read_file, read_records, ImportResult, RowError};
