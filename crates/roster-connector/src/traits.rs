//! Remote IAM service trait.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::BTreeSet;

use roster_core::{AccountId, GroupName, ResourceKey, Tags};

use crate::error::RemoteResult;
use crate::types::{Memberships, ObservedState, ObservedUser};

/// Capability set the engine needs from a cloud IAM service.
///
/// Every call is expected to be atomic and independently retryable. The
/// engine never assumes atomicity across calls.
#[async_trait]
pub trait IamService: Send + Sync {
    /// Short name of the adapter, used in logs.
    fn display_name(&self) -> &str;

    /// Resolve the account (tenant) the service operates on.
    async fn account_id(&self) -> RemoteResult<AccountId>;

    /// List every user with its tags and login-profile state.
    async fn list_users(&self) -> RemoteResult<Vec<ObservedUser>>;

    /// List every group with its current members.
    async fn list_group_memberships(&self) -> RemoteResult<Memberships>;

    /// Create a user carrying the given tags.
    async fn create_user(&self, key: &ResourceKey, tags: &Tags) -> RemoteResult<()>;

    /// Upsert the given tags on an existing user. Tags not named are left alone.
    async fn update_user_tags(&self, key: &ResourceKey, tags: &Tags) -> RemoteResult<()>;

    /// Create a console login profile and return its generated initial password.
    async fn enable_console_access(&self, key: &ResourceKey) -> RemoteResult<SecretString>;

    /// Replace the member list of a group, creating the group if needed.
    async fn set_group_membership(
        &self,
        group: &GroupName,
        members: &BTreeSet<ResourceKey>,
    ) -> RemoteResult<()>;

    /// Take a full snapshot using the two listing calls.
    async fn snapshot(&self) -> RemoteResult<ObservedState> {
        let users = self.list_users().await?;
        let memberships = self.list_group_memberships().await?;
        Ok(ObservedState::from_parts(users, memberships))
    }
}
