//! Error Types
//!
//! Standardized error type shared by the roster crates.
//!
//! # Example
//!
//! ```
//! use roster_core::{ResourceKey, Result, RosterError};
//!
//! fn parse_owner(value: &str) -> Result<ResourceKey> {
//!     ResourceKey::parse(value.trim())
//! }
//!
//! let err = parse_owner("m scott").unwrap_err();
//! assert!(matches!(err, RosterError::InvalidIdentifier { kind: "ResourceKey", .. }));
//! ```

use serde::Serialize;
use thiserror::Error;

/// Standardized error type for roster.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RosterError {
    /// An identifier failed validation.
    #[error("Invalid {kind} '{value}': {message}")]
    InvalidIdentifier {
        /// The identifier type (e.g. `ResourceKey`)
        kind: &'static str,
        /// The rejected value
        value: String,
        /// Why it was rejected
        message: String,
    },
}

/// Type alias for Results using `RosterError`.
pub type Result<T> = std::result::Result<T, RosterError>;
