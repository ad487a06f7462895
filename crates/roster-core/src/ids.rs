//! Strongly Typed Identifiers
//!
//! This module provides type-safe identifier types for roster.
//! Using the newtype pattern, these types prevent accidentally passing a
//! group name where a user key is expected.
//!
//! # Example
//!
//! ```
//! use roster_core::{GroupName, ResourceKey};
//!
//! let key = ResourceKey::parse("jhalpert2").unwrap();
//! let group = GroupName::parse("Education").unwrap();
//!
//! fn requires_key(key: &ResourceKey) -> &str {
//!     key.as_str()
//! }
//!
//! assert_eq!(requires_key(&key), "jhalpert2");
//! // requires_key(&group); // This would not compile!
//! # let _ = group;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Result, RosterError};

/// Maximum length of a user name accepted by cloud IAM services.
pub const MAX_RESOURCE_KEY_LENGTH: usize = 64;

/// Maximum length of a group name accepted by cloud IAM services.
const MAX_GROUP_NAME_LENGTH: usize = 128;

/// Characters allowed in IAM user and group names besides ASCII alphanumerics.
const EXTRA_NAME_CHARS: &[char] = &['+', '=', ',', '.', '@', '_', '-'];

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || EXTRA_NAME_CHARS.contains(&c)
}

/// Macro to define a UUID-backed identifier type
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random ID using UUID v4.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns a reference to the underlying UUID.
            #[must_use]
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = RosterError;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|e| RosterError::InvalidIdentifier {
                        kind: stringify!($name),
                        value: s.to_string(),
                        message: e.to_string(),
                    })
            }
        }
    };
}

/// Macro to define a string-backed name type with a validating constructor.
macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident, $validate:path) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses and validates a name.
            pub fn parse(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                $validate(&value).map_err(|message| RosterError::InvalidIdentifier {
                    kind: stringify!($name),
                    value: value.clone(),
                    message,
                })?;
                Ok(Self(value))
            }

            /// Returns the name as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the name and returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = RosterError;

            fn from_str(s: &str) -> Result<Self> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = RosterError;

            fn try_from(value: String) -> Result<Self> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }
    };
}

fn validate_resource_key(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("key is empty".to_string());
    }
    if value.len() > MAX_RESOURCE_KEY_LENGTH {
        return Err(format!(
            "key exceeds maximum length of {MAX_RESOURCE_KEY_LENGTH} characters"
        ));
    }
    if let Some(c) = value.chars().find(|c| !is_name_char(*c)) {
        return Err(format!("key contains unsupported character '{c}'"));
    }
    Ok(())
}

fn validate_group_name(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("group name is empty".to_string());
    }
    if value.len() > MAX_GROUP_NAME_LENGTH {
        return Err(format!(
            "group name exceeds maximum length of {MAX_GROUP_NAME_LENGTH} characters"
        ));
    }
    if let Some(c) = value.chars().find(|c| !is_name_char(*c)) {
        return Err(format!("group name contains unsupported character '{c}'"));
    }
    Ok(())
}

fn validate_account_id(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err("account identifier is empty".to_string());
    }
    Ok(())
}

define_name!(
    /// Stable, run-unique identifier of a user resource (the IAM user name).
    ///
    /// # Example
    ///
    /// ```
    /// use roster_core::ResourceKey;
    ///
    /// assert!(ResourceKey::parse("mscott").is_ok());
    /// assert!(ResourceKey::parse("").is_err());
    /// assert!(ResourceKey::parse("m scott").is_err());
    /// ```
    ResourceKey,
    validate_resource_key
);

define_name!(
    /// Name of an IAM group in the provisioning taxonomy.
    GroupName,
    validate_group_name
);

define_name!(
    /// Identifier of the remote account (tenant) resources are provisioned into.
    AccountId,
    validate_account_id
);

define_id!(
    /// Identifier of a single engine invocation, attached to every log line of the run.
    RunId
);
