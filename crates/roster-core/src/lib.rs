//! roster Core Library
//!
//! Shared types for the roster provisioning workspace.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`ResourceKey`, `GroupName`, `AccountId`, `RunId`)
//! - [`tags`] - Tag sets attached to user resources
//! - [`error`] - Standardized error type (`RosterError`)
//!
//! # Example
//!
//! ```
//! use roster_core::{ResourceKey, Tags, RunId};
//!
//! let key = ResourceKey::parse("mscott").unwrap();
//! let tags = Tags::new().with("Department", "Education");
//! let run = RunId::new();
//!
//! assert_eq!(key.as_str(), "mscott");
//! assert_eq!(tags.get("Department"), Some("Education"));
//! assert_eq!(run.to_string().len(), 36);
//! ```

pub mod error;
pub mod ids;
pub mod tags;

pub use error::{Result, RosterError};
pub use ids::{AccountId, GroupName, ResourceKey, RunId, MAX_RESOURCE_KEY_LENGTH};
pub use tags::{Tags, TAG_DEPARTMENT, TAG_DISPLAY_NAME, TAG_JOB_TITLE};
