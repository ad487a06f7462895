//! Outcome report generation.
//!
//! One entry per change-set operation plus one `Skipped(no-op)` entry per
//! unchanged resource, with summary counts, created keys and generated
//! secrets.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use roster_core::{AccountId, ResourceKey, RunId};

use crate::changeset::{ChangeSet, OperationKind, ResourceRef};
use crate::error::RecordError;

/// Why an operation was not attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The resource already matched the desired state.
    NoOp,
    /// A user this operation depends on was not created.
    DependencyFailed { key: ResourceKey },
    /// The run was cancelled before the operation was dispatched.
    Cancelled,
}

/// Result of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Applied {
        attempts: u32,
    },
    Skipped(SkipReason),
    Failed {
        code: String,
        message: String,
        attempts: u32,
    },
}

impl OutcomeStatus {
    #[must_use]
    pub fn is_applied(&self) -> bool {
        matches!(self, OutcomeStatus::Applied { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, OutcomeStatus::Failed { .. })
    }

    /// Short label used in logs and summary tables.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Applied { .. } => "applied",
            OutcomeStatus::Skipped(SkipReason::NoOp) => "skipped_no_op",
            OutcomeStatus::Skipped(SkipReason::DependencyFailed { .. }) => {
                "skipped_dependency_failed"
            }
            OutcomeStatus::Skipped(SkipReason::Cancelled) => "skipped_cancelled",
            OutcomeStatus::Failed { .. } => "failed",
        }
    }
}

/// Report entry for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub resource: ResourceRef,
    /// `None` for unchanged resources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<OperationKind>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

/// Counts by outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub applied: usize,
    pub failed: usize,
    pub skipped_no_op: usize,
    pub skipped_dependency_failed: usize,
    pub skipped_cancelled: usize,
    pub rejected_records: usize,
}

impl ReportSummary {
    fn record(&mut self, status: &OutcomeStatus) {
        match status {
            OutcomeStatus::Applied { .. } => self.applied += 1,
            OutcomeStatus::Failed { .. } => self.failed += 1,
            OutcomeStatus::Skipped(SkipReason::NoOp) => self.skipped_no_op += 1,
            OutcomeStatus::Skipped(SkipReason::DependencyFailed { .. }) => {
                self.skipped_dependency_failed += 1;
            }
            OutcomeStatus::Skipped(SkipReason::Cancelled) => self.skipped_cancelled += 1,
        }
    }
}

/// Complete result of a run.
///
/// `secrets` holds generated console passwords. It is never serialized and
/// its `Debug` output is redacted.
#[derive(Debug, Serialize)]
pub struct OutcomeReport {
    pub run_id: RunId,
    pub account_id: AccountId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub cancelled: bool,
    pub summary: ReportSummary,
    /// Change-set operations in order, followed by unchanged resources.
    pub outcomes: Vec<OperationOutcome>,
    /// Records rejected before reconciliation.
    pub rejected: Vec<RecordError>,
    /// Users created during this run.
    pub created: BTreeSet<ResourceKey>,
    #[serde(skip)]
    pub secrets: BTreeMap<ResourceKey, SecretString>,
}

/// Builds an [`OutcomeReport`] once reconciliation has settled.
#[derive(Debug)]
pub struct ReportBuilder {
    run_id: RunId,
    account_id: AccountId,
    started_at: DateTime<Utc>,
    rejected: Vec<RecordError>,
}

impl ReportBuilder {
    #[must_use]
    pub fn new(run_id: RunId, account_id: AccountId, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            account_id,
            started_at,
            rejected: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_rejected(mut self, rejected: Vec<RecordError>) -> Self {
        self.rejected = rejected;
        self
    }

    /// Assemble the report. `statuses` holds one entry per operation of `changes`.
    #[must_use]
    pub fn build(
        self,
        changes: &ChangeSet,
        statuses: Vec<OutcomeStatus>,
        secrets: BTreeMap<ResourceKey, SecretString>,
        cancelled: bool,
    ) -> OutcomeReport {
        let mut summary = ReportSummary {
            rejected_records: self.rejected.len(),
            ..ReportSummary::default()
        };
        let mut created = BTreeSet::new();
        let mut outcomes = Vec::with_capacity(changes.len() + changes.unchanged().len());

        for (op, status) in changes.iter().zip(statuses) {
            if op.kind() == OperationKind::CreateUser && status.is_applied() {
                if let ResourceRef::User(key) = op.resource() {
                    created.insert(key);
                }
            }
            summary.record(&status);
            outcomes.push(OperationOutcome {
                resource: op.resource(),
                operation: Some(op.kind()),
                status,
            });
        }

        for resource in changes.unchanged() {
            let status = OutcomeStatus::Skipped(SkipReason::NoOp);
            summary.record(&status);
            outcomes.push(OperationOutcome {
                resource: resource.clone(),
                operation: None,
                status,
            });
        }

        OutcomeReport {
            run_id: self.run_id,
            account_id: self.account_id,
            started_at: self.started_at,
            completed_at: Utc::now(),
            cancelled,
            summary,
            outcomes,
            rejected: self.rejected,
            created,
            secrets,
        }
    }
}

impl OutcomeReport {
    /// True when no operation failed. Skips and rejected records do not count.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failed())
    }

    /// Outcomes of real operations, skipping unchanged resources.
    pub fn operations(&self) -> impl Iterator<Item = &OperationOutcome> {
        self.outcomes.iter().filter(|o| o.operation.is_some())
    }

    #[must_use]
    pub fn secret_for(&self, key: &ResourceKey) -> Option<&SecretString> {
        self.secrets.get(key)
    }

    /// Serialize to pretty JSON. Secrets are omitted.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
