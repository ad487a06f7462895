//! Desired vs. observed comparison.

use std::collections::{BTreeSet, HashMap};

use roster_connector::ObservedState;
use roster_core::ResourceKey;

use crate::changeset::{ChangeSet, Operation, ResourceRef};
use crate::desired::DesiredState;

/// Compute the operations that converge `observed` onto `desired`.
///
/// Users observed but not desired produce no operation, and observed groups
/// outside the desired memberships are never touched. A group absent from
/// the snapshot counts as having no members.
///
/// User names match case-insensitively. When an existing user's name differs
/// from the derived key only in case, the observed name is used for that
/// user's operations and in every membership set.
pub fn compute_changes(desired: &DesiredState, observed: &ObservedState) -> ChangeSet {
    let mut operations = Vec::new();
    let mut unchanged = Vec::new();
    let observed_users = observed.users_by_folded_key();
    // Derived key -> observed name, for users whose casing differs remotely.
    let mut renamed: HashMap<&ResourceKey, &ResourceKey> = HashMap::new();

    for user in &desired.users {
        match observed_users.get(&user.key.as_str().to_lowercase()) {
            None => {
                operations.push(Operation::CreateUser {
                    key: user.key.clone(),
                    tags: user.tags.clone(),
                });
                if user.console_access {
                    operations.push(Operation::EnableConsoleAccess {
                        key: user.key.clone(),
                    });
                }
            }
            Some(existing) => {
                if existing.key != user.key {
                    tracing::warn!(
                        key = %user.key,
                        observed = %existing.key,
                        "Existing user name differs in case, keeping the remote name"
                    );
                    renamed.insert(&user.key, &existing.key);
                }
                let key = &existing.key;
                let mut changed = false;

                let delta = user.tags.changed_from(&existing.tags);
                if !delta.is_empty() {
                    operations.push(Operation::UpdateUserTags {
                        key: key.clone(),
                        tags: delta,
                    });
                    changed = true;
                }

                if user.console_access && !existing.console_access {
                    operations.push(Operation::EnableConsoleAccess { key: key.clone() });
                    changed = true;
                }

                if !changed {
                    unchanged.push(ResourceRef::User(key.clone()));
                }
            }
        }
    }

    for membership in &desired.memberships {
        let members: BTreeSet<ResourceKey> = membership
            .members
            .iter()
            .map(|k| renamed.get(k).copied().unwrap_or(k).clone())
            .collect();
        let differs = match observed.members_of(&membership.group) {
            Some(current) => current != &members,
            None => !members.is_empty(),
        };

        if differs {
            operations.push(Operation::SetGroupMembership {
                group: membership.group.clone(),
                members,
            });
        } else {
            unchanged.push(ResourceRef::Group(membership.group.clone()));
        }
    }

    let changes = ChangeSet::new(operations, unchanged);
    tracing::debug!(
        operations = changes.len(),
        unchanged = changes.unchanged().len(),
        renamed = renamed.len(),
        "Computed change set"
    );
    changes
}
