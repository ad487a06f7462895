//! # Remote IAM Connector
//!
//! Abstractions for talking to the cloud IAM service that roster provisions
//! users, login profiles and group memberships into.
//!
//! The engine never talks to a concrete cloud SDK. Instead it depends on the
//! [`IamService`] capability trait; adapters for a specific provider live
//! outside this workspace and tests use hand-written mocks.
//!
//! ## Crate Organization
//!
//! - [`error`] - Remote call errors with transient/permanent classification
//! - [`traits`] - The [`IamService`] capability trait
//! - [`types`] - Observed remote state snapshot ([`ObservedState`])
//! - [`resilience`] - Bounded retry with exponential backoff and per-call timeout

pub mod error;
pub mod resilience;
pub mod traits;
pub mod types;

pub use error::{RemoteError, RemoteResult};
pub use resilience::{Attempted, RetryConfig, RetryExecutor};
pub use traits::IamService;
pub use types::{Memberships, ObservedState, ObservedUser};

/// Prelude module for convenient imports.
///
/// ```
/// use roster_connector::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{RemoteError, RemoteResult};
    pub use crate::resilience::{Attempted, RetryConfig, RetryExecutor};
    pub use crate::traits::IamService;
    pub use crate::types::{Memberships, ObservedState, ObservedUser};
}

// Re-export async_trait for adapter implementors
pub use async_trait::async_trait;
