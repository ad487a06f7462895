//! Provisioning error types.
//!
//! Record-level errors ([`RecordError`]) reject a single input row and never
//! abort a run. Graph, configuration and snapshot errors are run-level and
//! abort before any mutating remote call.

use serde::Serialize;
use thiserror::Error;

use roster_connector::RemoteError;
use roster_core::{GroupName, ResourceKey};

/// Error attached to one input record. The record is skipped, the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordError {
    /// One or more required fields are missing or blank.
    #[error("invalid record at line {line}: {message}")]
    InvalidRecord {
        line: usize,
        fields: Vec<String>,
        message: String,
    },

    /// The key transform produced an empty string for this identity.
    #[error("record at line {line} derives an empty key from '{first_name} {last_name}'")]
    EmptyDerivedKey {
        line: usize,
        first_name: String,
        last_name: String,
    },

    /// The key transform produced a string that is not a valid resource key.
    #[error("record at line {line} derives invalid key '{candidate}': {message}")]
    InvalidDerivedKey {
        line: usize,
        candidate: String,
        message: String,
    },
}

impl RecordError {
    /// Source line of the rejected record.
    pub fn line(&self) -> usize {
        match self {
            RecordError::InvalidRecord { line, .. }
            | RecordError::EmptyDerivedKey { line, .. }
            | RecordError::InvalidDerivedKey { line, .. } => *line,
        }
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            RecordError::InvalidRecord { .. } => "INVALID_RECORD",
            RecordError::EmptyDerivedKey { .. } => "EMPTY_DERIVED_KEY",
            RecordError::InvalidDerivedKey { .. } => "INVALID_DERIVED_KEY",
        }
    }
}

/// The desired-state graph or the change set derived from it is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("graph integrity violation: group {group} references unknown user {key}")]
    DanglingMember { group: GroupName, key: ResourceKey },

    #[error("graph integrity violation: user {key} is defined more than once")]
    DuplicateUser { key: ResourceKey },

    #[error("graph integrity violation: user {key} is assigned to group {group} outside the taxonomy")]
    UnknownGroup { key: ResourceKey, group: GroupName },

    #[error("graph integrity violation: group {group} has more than one membership entry")]
    DuplicateMembership { group: GroupName },

    #[error("graph integrity violation: operation {index} ({operation}) is ordered before its dependency {dependency}")]
    OutOfOrder {
        index: usize,
        operation: String,
        dependency: String,
    },
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid configuration value for '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Run-level failure. No mutating call has been issued when one of these is returned.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The account identifier could not be resolved.
    #[error("failed to resolve account: {0}")]
    Account(#[source] RemoteError),

    /// Listing users or group memberships failed after retries.
    #[error("failed to take observed snapshot: {0}")]
    Snapshot(#[source] RemoteError),
}

impl EngineError {
    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            EngineError::Graph(_) => "GRAPH_INTEGRITY_VIOLATION",
            EngineError::Config(_) => "INVALID_CONFIGURATION",
            EngineError::Account(_) => "ACCOUNT_UNRESOLVED",
            EngineError::Snapshot(_) => "SNAPSHOT_FAILED",
        }
    }
}
