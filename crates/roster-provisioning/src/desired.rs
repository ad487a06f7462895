//! Desired-state graph.
//!
//! Users, their tags and group assignments as they should exist after a
//! successful run. Memberships are recomputed from scratch on every build.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use roster_core::{GroupName, ResourceKey, Tags, TAG_DEPARTMENT, TAG_DISPLAY_NAME, TAG_JOB_TITLE};

use crate::error::GraphError;
use crate::keys::KeyedIdentity;
use crate::taxonomy::GroupTaxonomy;

/// A user as it should exist remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredUser {
    pub key: ResourceKey,
    pub display_name: String,
    pub tags: Tags,
    pub console_access: bool,
    pub group: GroupName,
    /// Source line the user was derived from.
    pub line: usize,
}

/// The complete member set of one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesiredMembership {
    pub group: GroupName,
    pub members: BTreeSet<ResourceKey>,
}

/// Users in input order and memberships in taxonomy order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DesiredState {
    pub users: Vec<DesiredUser>,
    pub memberships: Vec<DesiredMembership>,
}

impl DesiredState {
    #[must_use]
    pub fn user(&self, key: &ResourceKey) -> Option<&DesiredUser> {
        self.users.iter().find(|u| &u.key == key)
    }

    #[must_use]
    pub fn membership(&self, group: &GroupName) -> Option<&DesiredMembership> {
        self.memberships.iter().find(|m| &m.group == group)
    }

    /// Check referential integrity against the taxonomy.
    ///
    /// Fails when a membership names a user that is not desired, a user key
    /// appears twice, a user's group is outside the taxonomy or a group has
    /// two membership entries.
    pub fn verify_integrity(&self, taxonomy: &GroupTaxonomy) -> Result<(), GraphError> {
        let mut keys = HashSet::with_capacity(self.users.len());
        for user in &self.users {
            if !keys.insert(&user.key) {
                return Err(GraphError::DuplicateUser {
                    key: user.key.clone(),
                });
            }
            if !taxonomy.contains(&user.group) {
                return Err(GraphError::UnknownGroup {
                    key: user.key.clone(),
                    group: user.group.clone(),
                });
            }
        }

        let mut groups = HashSet::with_capacity(self.memberships.len());
        for membership in &self.memberships {
            if !groups.insert(&membership.group) {
                return Err(GraphError::DuplicateMembership {
                    group: membership.group.clone(),
                });
            }
            if !taxonomy.contains(&membership.group) {
                if let Some(key) = membership.members.iter().next() {
                    return Err(GraphError::UnknownGroup {
                        key: key.clone(),
                        group: membership.group.clone(),
                    });
                }
            }
            if let Some(key) = membership.members.iter().find(|k| !keys.contains(k)) {
                return Err(GraphError::DanglingMember {
                    group: membership.group.clone(),
                    key: key.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Builds a [`DesiredState`] from keyed identities.
#[derive(Debug, Clone)]
pub struct DesiredStateBuilder {
    taxonomy: GroupTaxonomy,
    console_access: bool,
}

impl DesiredStateBuilder {
    #[must_use]
    pub fn new(taxonomy: GroupTaxonomy) -> Self {
        Self {
            taxonomy,
            console_access: true,
        }
    }

    /// Whether new users get a console login profile.
    #[must_use]
    pub fn with_console_access(mut self, enabled: bool) -> Self {
        self.console_access = enabled;
        self
    }

    #[must_use]
    pub fn taxonomy(&self) -> &GroupTaxonomy {
        &self.taxonomy
    }

    /// Assemble the graph and verify it.
    pub fn build(&self, keyed: &[KeyedIdentity]) -> Result<DesiredState, GraphError> {
        let mut grouped: BTreeMap<&GroupName, BTreeSet<ResourceKey>> = self
            .taxonomy
            .all_groups()
            .map(|g| (g, BTreeSet::new()))
            .collect();

        let mut users = Vec::with_capacity(keyed.len());
        for KeyedIdentity { key, identity } in keyed {
            let group = self.taxonomy.resolve(&identity.department);
            let display_name = identity.display_name();
            let tags = Tags::new()
                .with(TAG_DEPARTMENT, identity.department.as_str())
                .with(TAG_JOB_TITLE, identity.job_title.as_str())
                .with(TAG_DISPLAY_NAME, display_name.as_str());

            grouped.entry(group).or_default().insert(key.clone());
            users.push(DesiredUser {
                key: key.clone(),
                display_name,
                tags,
                console_access: self.console_access,
                group: group.clone(),
                line: identity.line,
            });
        }

        let memberships = self
            .taxonomy
            .all_groups()
            .map(|group| DesiredMembership {
                group: group.clone(),
                members: grouped.remove(group).unwrap_or_default(),
            })
            .collect();

        let state = DesiredState { users, memberships };
        state.verify_integrity(&self.taxonomy)?;

        tracing::debug!(
            users = state.users.len(),
            groups = state.memberships.len(),
            "Built desired state"
        );
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupsConfig;
    use crate::validation::Identity;

    fn key(s: &str) -> ResourceKey {
        ResourceKey::parse(s).unwrap()
    }

    fn group(s: &str) -> GroupName {
        GroupName::parse(s).unwrap()
    }

    fn keyed(k: &str, first: &str, last: &str, dept: &str) -> KeyedIdentity {
        KeyedIdentity {
            key: key(k),
            identity: Identity {
                line: 1,
                first_name: first.to_string(),
                last_name: last.to_string(),
                department: dept.to_string(),
                job_title: "Staff".to_string(),
            },
        }
    }

    fn builder() -> DesiredStateBuilder {
        DesiredStateBuilder::new(GroupsConfig::default().to_taxonomy().unwrap())
    }

    #[test]
    fn test_user_tags_and_display_name() {
        let state = builder()
            .build(&[keyed("mscott", "Michael", "Scott", "Education")])
            .unwrap();
        let user = state.user(&key("mscott")).unwrap();
        assert_eq!(user.display_name, "Michael Scott");
        assert_eq!(user.tags.get(TAG_DEPARTMENT), Some("Education"));
        assert_eq!(user.tags.get(TAG_JOB_TITLE), Some("Staff"));
        assert_eq!(user.tags.get(TAG_DISPLAY_NAME), Some("Michael Scott"));
        assert!(user.console_access);
        assert_eq!(user.group, group("Education"));
    }

    #[test]
    fn test_console_access_disabled() {
        let state = builder()
            .with_console_access(false)
            .build(&[keyed("mscott", "Michael", "Scott", "Education")])
            .unwrap();
        assert!(!state.users[0].console_access);
    }

    #[test]
    fn test_membership_completeness() {
        let state = builder()
            .build(&[
                keyed("mscott", "Michael", "Scott", "Education"),
                keyed("dschrute", "Dwight", "Schrute", "Sales"),
                keyed("pbeesly", "Pam", "Beesly", "education"),
            ])
            .unwrap();
        let education = state.membership(&group("Education")).unwrap();
        assert_eq!(
            education.members,
            BTreeSet::from([key("mscott"), key("pbeesly")])
        );
        let unassigned = state.membership(&group("Unassigned")).unwrap();
        assert_eq!(unassigned.members, BTreeSet::from([key("dschrute")]));
    }

    #[test]
    fn test_every_taxonomy_group_has_membership() {
        let state = builder().build(&[]).unwrap();
        let groups: Vec<&str> = state.memberships.iter().map(|m| m.group.as_str()).collect();
        assert_eq!(groups, vec!["Education", "Engineers", "Managers", "Unassigned"]);
        assert!(state.memberships.iter().all(|m| m.members.is_empty()));
    }

    #[test]
    fn test_build_is_deterministic() {
        let input = [
            keyed("mscott", "Michael", "Scott", "Education"),
            keyed("dschrute", "Dwight", "Schrute", "Sales"),
        ];
        assert_eq!(builder().build(&input).unwrap(), builder().build(&input).unwrap());
    }

    #[test]
    fn test_duplicate_key_is_integrity_violation() {
        let err = builder()
            .build(&[
                keyed("mscott", "Michael", "Scott", "Education"),
                keyed("mscott", "Michael", "Scott", "Education"),
            ])
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateUser { .. }));
    }

    #[test]
    fn test_dangling_member_detected() {
        let taxonomy = GroupsConfig::default().to_taxonomy().unwrap();
        let mut state = builder()
            .build(&[keyed("mscott", "Michael", "Scott", "Education")])
            .unwrap();
        state.memberships[0].members.insert(key("ghost"));

        let err = state.verify_integrity(&taxonomy).unwrap_err();
        assert_eq!(
            err,
            GraphError::DanglingMember {
                group: group("Education"),
                key: key("ghost"),
            }
        );
    }

    #[test]
    fn test_group_outside_taxonomy_detected() {
        let taxonomy = GroupsConfig::default().to_taxonomy().unwrap();
        let mut state = builder()
            .build(&[keyed("mscott", "Michael", "Scott", "Education")])
            .unwrap();
        state.users[0].group = group("Marketing");

        assert!(matches!(
            state.verify_integrity(&taxonomy),
            Err(GraphError::UnknownGroup { .. })
        ));
    }
}
