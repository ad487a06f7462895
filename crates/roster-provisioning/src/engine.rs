//! Provisioning engine.
//!
//! Ties the pipeline together: validation, key derivation, desired-state
//! build, snapshot, diff and reconciliation.

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use roster_connector::{IamService, ObservedState, RetryExecutor};
use roster_core::RunId;

use crate::changeset::ChangeSet;
use crate::config::ProvisioningConfig;
use crate::desired::{DesiredState, DesiredStateBuilder};
use crate::diff::compute_changes;
use crate::error::{ConfigError, EngineError, GraphError, RecordError};
use crate::keys::{KeyDeriver, KeyTransform};
use crate::reconciler::{Reconciler, ReconcilerSettings};
use crate::report::{OutcomeReport, ReportBuilder};
use crate::validation::{validate_records, RawRecord};

/// Desired state derived from a batch of records.
#[derive(Debug, Clone)]
pub struct Derivation {
    pub desired: DesiredState,
    /// Records rejected by validation or key derivation, by source line.
    pub rejected: Vec<RecordError>,
}

/// Dry-run result: what a run would do against a given snapshot.
#[derive(Debug, Clone)]
pub struct Plan {
    pub desired: DesiredState,
    pub changes: ChangeSet,
    pub rejected: Vec<RecordError>,
}

/// Provisioning engine.
#[derive(Debug, Clone)]
pub struct ProvisioningEngine {
    config: ProvisioningConfig,
    deriver: KeyDeriver,
    builder: DesiredStateBuilder,
}

impl ProvisioningEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: ProvisioningConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let taxonomy = config.groups.to_taxonomy()?;
        Ok(Self {
            deriver: KeyDeriver::new(config.key_scheme.transform()),
            builder: DesiredStateBuilder::new(taxonomy).with_console_access(config.console_access),
            config,
        })
    }

    /// Replace the configured key scheme with a custom transform.
    #[must_use]
    pub fn with_key_transform(mut self, transform: Arc<dyn KeyTransform>) -> Self {
        self.deriver = KeyDeriver::new(transform);
        self
    }

    #[must_use]
    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }

    /// Validate records, derive keys and build the desired graph.
    ///
    /// Rejected records are collected; only a graph integrity violation fails.
    pub fn derive<I>(&self, records: I) -> Result<Derivation, GraphError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let validation = validate_records(records);
        let keys = self.deriver.derive(validation.identities);
        let desired = self.builder.build(&keys.keyed)?;

        let mut rejected = validation.errors;
        rejected.extend(keys.errors);
        rejected.sort_by_key(RecordError::line);

        if !rejected.is_empty() {
            warn!(
                rejected = rejected.len(),
                accepted = desired.users.len(),
                "Some records were rejected"
            );
        }

        Ok(Derivation { desired, rejected })
    }

    /// Compute the change set for `records` against a known snapshot.
    ///
    /// Makes no remote calls.
    pub fn plan<I>(&self, records: I, observed: &ObservedState) -> Result<Plan, EngineError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let Derivation { desired, rejected } = self.derive(records)?;
        let changes = compute_changes(&desired, observed);
        changes.validate_ordering()?;
        Ok(Plan {
            desired,
            changes,
            rejected,
        })
    }

    /// Provision `records` into `service`.
    ///
    /// Fails before any mutating call when the graph is inconsistent or the
    /// account or snapshot cannot be read. Otherwise always returns a full
    /// report, including per-operation failures.
    #[instrument(skip_all, fields(run_id = tracing::field::Empty))]
    pub async fn run<I>(
        &self,
        service: Arc<dyn IamService>,
        records: I,
        cancel: CancellationToken,
    ) -> Result<OutcomeReport, EngineError>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let run_id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(&run_id));
        let started_at = Utc::now();

        let Derivation { desired, rejected } = self.derive(records)?;
        info!(
            service = %service.display_name(),
            users = desired.users.len(),
            rejected = rejected.len(),
            "Derived desired state"
        );

        let executor = RetryExecutor::new(self.config.retry_config());
        let timeout = self.config.call_timeout();

        let account = executor
            .execute_with_timeout(timeout, || service.account_id())
            .await;
        let account_id = account.result.map_err(EngineError::Account)?;

        let snapshot = executor
            .execute_with_timeout(timeout, || service.snapshot())
            .await;
        let observed = snapshot.result.map_err(EngineError::Snapshot)?;
        info!(
            account_id = %account_id,
            observed_users = observed.users.len(),
            observed_groups = observed.memberships.len(),
            "Took observed snapshot"
        );

        let changes = compute_changes(&desired, &observed);
        changes.validate_ordering()?;
        info!(
            operations = changes.len(),
            unchanged = changes.unchanged().len(),
            "Computed change set"
        );

        let reconciler = Reconciler::new(service, ReconcilerSettings::from(&self.config));
        let output = reconciler.apply(run_id, &changes, &cancel).await;

        let report = ReportBuilder::new(run_id, account_id, started_at)
            .with_rejected(rejected)
            .build(&changes, output.statuses, output.secrets, output.cancelled);

        info!(
            applied = report.summary.applied,
            failed = report.summary.failed,
            skipped_no_op = report.summary.skipped_no_op,
            created = report.created.len(),
            "Provisioning run complete"
        );
        Ok(report)
    }
}
