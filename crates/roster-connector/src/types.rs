//! Observed remote state.
//!
//! A point-in-time snapshot of what already exists in the IAM service. The
//! engine only reads it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use roster_core::{GroupName, ResourceKey, Tags};

/// Group memberships keyed by group. A group present in the map exists remotely.
pub type Memberships = BTreeMap<GroupName, BTreeSet<ResourceKey>>;

/// A user that exists in the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedUser {
    /// User name.
    pub key: ResourceKey,
    /// Tags currently attached to the user.
    #[serde(default)]
    pub tags: Tags,
    /// Whether a console login profile exists.
    #[serde(default)]
    pub console_access: bool,
}

impl ObservedUser {
    /// Create an observed user without a login profile.
    #[must_use]
    pub fn new(key: ResourceKey, tags: Tags) -> Self {
        Self {
            key,
            tags,
            console_access: false,
        }
    }

    /// Mark the user as having a login profile.
    #[must_use]
    pub fn with_console_access(mut self) -> Self {
        self.console_access = true;
        self
    }
}

/// Snapshot of the remote account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    /// Existing users keyed by user name.
    #[serde(default, with = "user_list")]
    pub users: BTreeMap<ResourceKey, ObservedUser>,
    /// Existing group memberships.
    #[serde(default)]
    pub memberships: Memberships,
}

impl ObservedState {
    /// Empty snapshot (nothing exists remotely).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from the raw listing calls.
    #[must_use]
    pub fn from_parts(users: Vec<ObservedUser>, memberships: Memberships) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.key.clone(), u)).collect(),
            memberships,
        }
    }

    /// Builder-style user insert.
    #[must_use]
    pub fn with_user(mut self, user: ObservedUser) -> Self {
        self.users.insert(user.key.clone(), user);
        self
    }

    /// Builder-style membership insert (replaces any previous set for the group).
    #[must_use]
    pub fn with_membership(
        mut self,
        group: GroupName,
        members: impl IntoIterator<Item = ResourceKey>,
    ) -> Self {
        self.memberships
            .insert(group, members.into_iter().collect());
        self
    }

    #[must_use]
    pub fn user(&self, key: &ResourceKey) -> Option<&ObservedUser> {
        self.users.get(key)
    }

    /// Users indexed by lowercased key. IAM user names are unique regardless
    /// of case, so a desired key matches an observed user of any casing.
    #[must_use]
    pub fn users_by_folded_key(&self) -> HashMap<String, &ObservedUser> {
        self.users
            .values()
            .map(|u| (u.key.as_str().to_lowercase(), u))
            .collect()
    }

    #[must_use]
    pub fn members_of(&self, group: &GroupName) -> Option<&BTreeSet<ResourceKey>> {
        self.memberships.get(group)
    }
}

/// Serializes the user map as a plain list, which is how snapshots are exported.
mod user_list {
    use super::{ObservedUser, ResourceKey};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S: Serializer>(
        users: &BTreeMap<ResourceKey, ObservedUser>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let list: Vec<&ObservedUser> = users.values().collect();
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ResourceKey, ObservedUser>, D::Error> {
        let list = Vec::<ObservedUser>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|u| (u.key.clone(), u)).collect())
    }
}
