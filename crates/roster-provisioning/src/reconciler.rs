//! Change-set reconciliation.
//!
//! Applies a [`ChangeSet`] rank by rank. Operations inside a rank run
//! concurrently on a bounded pool; the next rank starts only once every
//! operation of the previous one has settled. Each operation writes its own
//! outcome slot exactly once.

use secrecy::SecretString;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use roster_connector::{IamService, RemoteError, RetryConfig, RetryExecutor};
use roster_core::{ResourceKey, RunId};

use crate::changeset::{ChangeSet, Operation};
use crate::config::ProvisioningConfig;
use crate::report::{OutcomeStatus, SkipReason};

/// Worker pool and remote call settings.
#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Maximum operations in flight.
    pub concurrency: usize,
    /// Timeout for one call attempt.
    pub call_timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self::from(&ProvisioningConfig::default())
    }
}

impl From<&ProvisioningConfig> for ReconcilerSettings {
    fn from(config: &ProvisioningConfig) -> Self {
        Self {
            concurrency: config.concurrency,
            call_timeout: config.call_timeout(),
            retry: config.retry_config(),
        }
    }
}

/// What the reconciler produced for a change set.
#[derive(Debug, Default)]
pub struct ReconcileOutput {
    /// One status per operation, in change-set order.
    pub statuses: Vec<OutcomeStatus>,
    /// Initial console passwords by user.
    pub secrets: BTreeMap<ResourceKey, SecretString>,
    /// Whether cancellation was observed.
    pub cancelled: bool,
}

struct Settled {
    index: usize,
    status: OutcomeStatus,
    secret: Option<SecretString>,
}

/// Applies change sets against an [`IamService`].
pub struct Reconciler {
    service: Arc<dyn IamService>,
    executor: RetryExecutor,
    settings: ReconcilerSettings,
}

impl Reconciler {
    #[must_use]
    pub fn new(service: Arc<dyn IamService>, settings: ReconcilerSettings) -> Self {
        Self {
            service,
            executor: RetryExecutor::new(settings.retry.clone()),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &ReconcilerSettings {
        &self.settings
    }

    /// Apply every operation of `changes`.
    ///
    /// Never fails as a whole: failures, dependency skips and cancellations
    /// are recorded per operation.
    #[instrument(skip_all, fields(run_id = %run_id, service = %self.service.display_name(), operations = changes.len()))]
    pub async fn apply(
        &self,
        run_id: RunId,
        changes: &ChangeSet,
        cancel: &CancellationToken,
    ) -> ReconcileOutput {
        let operations = changes.operations();
        let mut slots: Vec<Option<OutcomeStatus>> = vec![None; operations.len()];
        let mut secrets = BTreeMap::new();
        // Users whose CreateUser did not apply in this run.
        let mut missing_users: HashSet<ResourceKey> = HashSet::new();
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));

        info!(
            concurrency = self.settings.concurrency,
            "Starting reconciliation"
        );

        for (rank, indices) in changes.rank_batches() {
            if indices.is_empty() {
                continue;
            }
            debug!(rank = ?rank, operations = indices.len(), "Dispatching rank");

            let mut tasks = JoinSet::new();
            for &index in &indices {
                let op = &operations[index];

                if cancel.is_cancelled() {
                    slots[index] = Some(OutcomeStatus::Skipped(SkipReason::Cancelled));
                    continue;
                }

                if let Some(key) = op.dependencies().find(|k| missing_users.contains(*k)) {
                    debug!(operation = %op, key = %key, "Skipping operation, user was not created");
                    slots[index] = Some(OutcomeStatus::Skipped(SkipReason::DependencyFailed {
                        key: key.clone(),
                    }));
                    continue;
                }

                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                };
                let Some(permit) = permit else {
                    slots[index] = Some(OutcomeStatus::Skipped(SkipReason::Cancelled));
                    continue;
                };

                let service = Arc::clone(&self.service);
                let executor = self.executor.clone();
                let timeout = self.settings.call_timeout;
                let op = op.clone();
                let span = info_span!("operation", index, operation = %op);
                tasks.spawn(
                    async move {
                        let _permit = permit;
                        let (status, secret) =
                            execute_operation(service.as_ref(), &executor, timeout, &op).await;
                        Settled {
                            index,
                            status,
                            secret,
                        }
                    }
                    .instrument(span),
                );
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(settled) => {
                        if let (Some(secret), Operation::EnableConsoleAccess { key }) =
                            (settled.secret, &operations[settled.index])
                        {
                            secrets.insert(key.clone(), secret);
                        }
                        slots[settled.index] = Some(settled.status);
                    }
                    Err(e) => error!(error = %e, "Operation task aborted"),
                }
            }

            for &index in &indices {
                let slot = slots[index].get_or_insert_with(|| OutcomeStatus::Failed {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "operation task aborted before settling".to_string(),
                    attempts: 0,
                });
                if let Operation::CreateUser { key, .. } = &operations[index] {
                    if !slot.is_applied() {
                        missing_users.insert(key.clone());
                    }
                }
            }
        }

        let cancelled = cancel.is_cancelled();
        let statuses: Vec<OutcomeStatus> = slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or(OutcomeStatus::Skipped(SkipReason::Cancelled))
            })
            .collect();

        let failed = statuses.iter().filter(|s| s.is_failed()).count();
        let applied = statuses.iter().filter(|s| s.is_applied()).count();
        if failed > 0 {
            warn!(applied, failed, cancelled, "Reconciliation finished with failures");
        } else {
            info!(applied, cancelled, "Reconciliation finished");
        }

        ReconcileOutput {
            statuses,
            secrets,
            cancelled,
        }
    }
}

async fn execute_operation(
    service: &dyn IamService,
    executor: &RetryExecutor,
    timeout: Duration,
    op: &Operation,
) -> (OutcomeStatus, Option<SecretString>) {
    match op {
        Operation::CreateUser { key, tags } => {
            let attempted = executor
                .execute_with_timeout(timeout, move || service.create_user(key, tags))
                .await;
            (settle(attempted.result, attempted.attempts), None)
        }
        Operation::UpdateUserTags { key, tags } => {
            let attempted = executor
                .execute_with_timeout(timeout, move || service.update_user_tags(key, tags))
                .await;
            (settle(attempted.result, attempted.attempts), None)
        }
        Operation::EnableConsoleAccess { key } => {
            let attempted = executor
                .execute_with_timeout(timeout, move || service.enable_console_access(key))
                .await;
            match attempted.result {
                Ok(secret) => (settle(Ok(()), attempted.attempts), Some(secret)),
                Err(e) => (settle(Err(e), attempted.attempts), None),
            }
        }
        Operation::SetGroupMembership { group, members } => {
            let attempted = executor
                .execute_with_timeout(timeout, move || {
                    service.set_group_membership(group, members)
                })
                .await;
            (settle(attempted.result, attempted.attempts), None)
        }
    }
}

fn settle(result: Result<(), RemoteError>, attempts: u32) -> OutcomeStatus {
    match result {
        Ok(()) => {
            info!(attempts, "Operation applied");
            OutcomeStatus::Applied { attempts }
        }
        Err(e) => {
            warn!(attempts, code = e.error_code(), error = %e, "Operation failed");
            OutcomeStatus::Failed {
                code: e.error_code().to_string(),
                message: e.to_string(),
                attempts,
            }
        }
    }
}
