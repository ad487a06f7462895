//! Shared test fixtures: an in-memory IAM service and record builders.

#![allow(dead_code)]

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use roster_connector::{
    IamService, Memberships, ObservedState, ObservedUser, RemoteError, RemoteResult,
};
use roster_core::{AccountId, GroupName, ResourceKey, Tags};
use roster_provisioning::{ProvisioningConfig, RawRecord};

pub const ACCOUNT_ID: &str = "123456789012";

pub fn key(s: &str) -> ResourceKey {
    ResourceKey::parse(s).unwrap()
}

pub fn group(s: &str) -> GroupName {
    GroupName::parse(s).unwrap()
}

pub fn record(line: usize, first: &str, last: &str, department: &str, title: &str) -> RawRecord {
    RawRecord::new(line)
        .with("first_name", first)
        .with("last_name", last)
        .with("department", department)
        .with("job_title", title)
}

/// Michael Scott (Education) and Dwight Schrute (Sales).
pub fn scenario_records() -> Vec<RawRecord> {
    vec![
        record(2, "Michael", "Scott", "Education", "Regional Manager"),
        record(3, "Dwight", "Schrute", "Sales", "Assistant to the Regional Manager"),
    ]
}

/// Defaults with fast retries so tests never wait on backoff.
pub fn fast_config() -> ProvisioningConfig {
    let mut config = ProvisioningConfig::default();
    config.retry.initial_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config.retry.jitter = false;
    config
}

// =============================================================================
// In-memory IAM service
// =============================================================================

/// IAM service backed by in-memory state, with configurable failures.
///
/// Successful mutations change the state, so a second run observes what the
/// first one applied.
#[derive(Default)]
pub struct MockIam {
    state: Mutex<ObservedState>,
    failing_creates: Mutex<HashSet<String>>,
    throttled_creates: AtomicUsize,
    create_delay: Mutex<Option<Duration>>,
    fail_listing: AtomicBool,
    cancel_on_create: Mutex<Option<CancellationToken>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub console_calls: AtomicUsize,
    pub membership_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl MockIam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: ObservedState) -> Self {
        let mock = Self::default();
        *mock.state.lock().unwrap() = state;
        mock
    }

    /// CreateUser for this key fails with a permanent error.
    pub fn fail_create_for(self, key: &str) -> Self {
        self.failing_creates.lock().unwrap().insert(key.to_string());
        self
    }

    /// The next `count` CreateUser calls are throttled.
    pub fn throttle_creates(self, count: usize) -> Self {
        self.throttled_creates.store(count, Ordering::SeqCst);
        self
    }

    /// Every CreateUser call sleeps this long before answering.
    pub fn slow_creates(self, delay: Duration) -> Self {
        *self.create_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn fail_listing(self) -> Self {
        self.fail_listing.store(true, Ordering::SeqCst);
        self
    }

    /// Cancel `token` from inside the first CreateUser call.
    pub fn cancel_on_create(self, token: CancellationToken) -> Self {
        *self.cancel_on_create.lock().unwrap() = Some(token);
        self
    }

    pub fn snapshot_now(&self) -> ObservedState {
        self.state.lock().unwrap().clone()
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn mutating_calls(&self) -> usize {
        Self::calls(&self.create_calls)
            + Self::calls(&self.update_calls)
            + Self::calls(&self.console_calls)
            + Self::calls(&self.membership_calls)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl IamService for MockIam {
    fn display_name(&self) -> &str {
        "mock-iam"
    }

    async fn account_id(&self) -> RemoteResult<AccountId> {
        AccountId::parse(ACCOUNT_ID).map_err(|e| RemoteError::internal(e.to_string()))
    }

    async fn list_users(&self) -> RemoteResult<Vec<ObservedUser>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(RemoteError::AccessDenied {
                operation: "ListUsers".to_string(),
            });
        }
        Ok(self.state.lock().unwrap().users.values().cloned().collect())
    }

    async fn list_group_memberships(&self) -> RemoteResult<Memberships> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().memberships.clone())
    }

    async fn create_user(&self, key: &ResourceKey, tags: &Tags) -> RemoteResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.enter();

        let token = self.cancel_on_create.lock().unwrap().take();
        if let Some(token) = token {
            token.cancel();
        }

        let delay = *self.create_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.leave();

        if self
            .throttled_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(RemoteError::throttled("Rate exceeded"));
        }
        if self.failing_creates.lock().unwrap().contains(key.as_str()) {
            return Err(RemoteError::AccessDenied {
                operation: format!("CreateUser({key})"),
            });
        }

        let mut state = self.state.lock().unwrap();
        if state.users.contains_key(key) {
            return Err(RemoteError::AlreadyExists {
                identifier: key.to_string(),
            });
        }
        state
            .users
            .insert(key.clone(), ObservedUser::new(key.clone(), tags.clone()));
        Ok(())
    }

    async fn update_user_tags(&self, key: &ResourceKey, tags: &Tags) -> RemoteResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let user = state.users.get_mut(key).ok_or_else(|| RemoteError::NotFound {
            identifier: key.to_string(),
        })?;
        user.tags
            .extend(tags.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Ok(())
    }

    async fn enable_console_access(&self, key: &ResourceKey) -> RemoteResult<SecretString> {
        self.console_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        let user = state.users.get_mut(key).ok_or_else(|| RemoteError::NotFound {
            identifier: key.to_string(),
        })?;
        user.console_access = true;
        Ok(SecretString::from(format!("initial-{key}-Pa55!")))
    }

    async fn set_group_membership(
        &self,
        group: &GroupName,
        members: &BTreeSet<ResourceKey>,
    ) -> RemoteResult<()> {
        self.membership_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if let Some(missing) = members.iter().find(|m| !state.users.contains_key(*m)) {
            return Err(RemoteError::NotFound {
                identifier: missing.to_string(),
            });
        }
        state.memberships.insert(group.clone(), members.clone());
        Ok(())
    }
}
