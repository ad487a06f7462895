//! # Provisioning Engine
//!
//! Derivation and reconciliation of IAM users, login profiles and group
//! memberships from a tabular source of truth.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌───────────────┐   ┌─────────────┐   ┌─────────────┐
//! │ RawRecords  │──►│  Validator  │──►│  Key Deriver  │──►│   Desired   │──►│ Diff Engine │
//! │ (CSV rows)  │   │             │   │ (collisions)  │   │ State Graph │   │             │
//! └─────────────┘   └──────┬──────┘   └───────┬───────┘   └─────────────┘   └──────┬──────┘
//!                          │ InvalidRecord    │ EmptyDerivedKey                    │ ChangeSet
//!                          ▼                  ▼                                    ▼
//!                   ┌────────────────────────────────┐                     ┌──────────────┐
//!                   │       Outcome Report           │◄────────────────────│  Reconciler  │◄── ObservedState
//!                   └────────────────────────────────┘                     └──────────────┘
//! ```
//!
//! ## Features
//!
//! - **Collect-all validation**: one bad row never blocks the rest of the batch
//! - **Deterministic keys**: `first initial + last name`, numeric suffixes on collision
//! - **Full-replacement memberships**: group member sets are recomputed every run
//! - **No implicit deletes**: users missing from the source are never removed
//! - **Ranked reconciliation**: users before login profiles before memberships,
//!   with a bounded worker pool, per-call timeout, bounded retries and cancellation
//!
//! ## Example
//!
//! ```ignore
//! use roster_provisioning::{ProvisioningConfig, ProvisioningEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = ProvisioningEngine::new(ProvisioningConfig::default())?;
//! let report = engine.run(service, records, CancellationToken::new()).await?;
//! println!("created {} users", report.created.len());
//! ```

pub mod changeset;
pub mod config;
pub mod desired;
pub mod diff;
pub mod engine;
pub mod error;
pub mod keys;
pub mod reconciler;
pub mod report;
pub mod taxonomy;
pub mod validation;

pub use changeset::{ChangeSet, Operation, OperationKind, Rank, ResourceRef};
pub use config::{GroupsConfig, KeyScheme, ProvisioningConfig, RetrySettings};
pub use desired::{DesiredMembership, DesiredState, DesiredStateBuilder, DesiredUser};
pub use diff::compute_changes;
pub use engine::{Derivation, Plan, ProvisioningEngine};
pub use error::{ConfigError, EngineError, GraphError, RecordError};
pub use keys::{FirstDotLast, FirstInitialLastName, KeyDerivation, KeyDeriver, KeyTransform, KeyedIdentity};
pub use reconciler::{ReconcileOutput, Reconciler, ReconcilerSettings};
pub use report::{
    OperationOutcome, OutcomeReport, OutcomeStatus, ReportBuilder, ReportSummary, SkipReason,
};
pub use taxonomy::GroupTaxonomy;
pub use validation::{validate_records, Identity, RawRecord, ValidationResult, REQUIRED_FIELDS};
