//! Ordered change sets.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use roster_core::{GroupName, ResourceKey, Tags};

use crate::error::GraphError;

/// Causal rank of an operation. Ranks are applied strictly in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    /// User creation and tag updates.
    Identity,
    /// Login profiles, which need the user to exist.
    Access,
    /// Group memberships, which need every member to exist.
    Membership,
}

impl Rank {
    pub const ALL: [Rank; 3] = [Rank::Identity, Rank::Access, Rank::Membership];
}

/// Kind of a remote mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    CreateUser,
    UpdateUserTags,
    EnableConsoleAccess,
    SetGroupMembership,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationKind::CreateUser => "CreateUser",
            OperationKind::UpdateUserTags => "UpdateUserTags",
            OperationKind::EnableConsoleAccess => "EnableConsoleAccess",
            OperationKind::SetGroupMembership => "SetGroupMembership",
        };
        f.write_str(s)
    }
}

/// A resource touched (or left alone) by a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum ResourceRef {
    User(ResourceKey),
    Group(GroupName),
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::User(key) => write!(f, "user:{key}"),
            ResourceRef::Group(group) => write!(f, "group:{group}"),
        }
    }
}

/// A single remote mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateUser { key: ResourceKey, tags: Tags },
    /// Only the tags that are missing or differ remotely.
    UpdateUserTags { key: ResourceKey, tags: Tags },
    EnableConsoleAccess { key: ResourceKey },
    /// Full replacement of the group's member list.
    SetGroupMembership {
        group: GroupName,
        members: BTreeSet<ResourceKey>,
    },
}

impl Operation {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateUser { .. } => OperationKind::CreateUser,
            Operation::UpdateUserTags { .. } => OperationKind::UpdateUserTags,
            Operation::EnableConsoleAccess { .. } => OperationKind::EnableConsoleAccess,
            Operation::SetGroupMembership { .. } => OperationKind::SetGroupMembership,
        }
    }

    #[must_use]
    pub fn rank(&self) -> Rank {
        match self {
            Operation::CreateUser { .. } | Operation::UpdateUserTags { .. } => Rank::Identity,
            Operation::EnableConsoleAccess { .. } => Rank::Access,
            Operation::SetGroupMembership { .. } => Rank::Membership,
        }
    }

    #[must_use]
    pub fn resource(&self) -> ResourceRef {
        match self {
            Operation::CreateUser { key, .. }
            | Operation::UpdateUserTags { key, .. }
            | Operation::EnableConsoleAccess { key } => ResourceRef::User(key.clone()),
            Operation::SetGroupMembership { group, .. } => ResourceRef::Group(group.clone()),
        }
    }

    /// Users that must exist before this operation can succeed.
    pub fn dependencies(&self) -> Box<dyn Iterator<Item = &ResourceKey> + '_> {
        match self {
            Operation::CreateUser { .. } | Operation::UpdateUserTags { .. } => {
                Box::new(std::iter::empty())
            }
            Operation::EnableConsoleAccess { key } => Box::new(std::iter::once(key)),
            Operation::SetGroupMembership { members, .. } => Box::new(members.iter()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateUser { key, .. }
            | Operation::UpdateUserTags { key, .. }
            | Operation::EnableConsoleAccess { key } => write!(f, "{}({key})", self.kind()),
            Operation::SetGroupMembership { group, members } => {
                write!(f, "{}({group}, {} members)", self.kind(), members.len())
            }
        }
    }
}

/// Operations sorted by rank, plus the resources that need no work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    operations: Vec<Operation>,
    #[serde(default)]
    unchanged: Vec<ResourceRef>,
}

impl ChangeSet {
    /// Build a change set. Operations are stably sorted by rank, so derivation
    /// order is kept within a rank.
    #[must_use]
    pub fn new(mut operations: Vec<Operation>, unchanged: Vec<ResourceRef>) -> Self {
        operations.sort_by_key(Operation::rank);
        Self {
            operations,
            unchanged,
        }
    }

    /// Number of operations. Unchanged resources are not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[must_use]
    pub fn unchanged(&self) -> &[ResourceRef] {
        &self.unchanged
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// Indices of the operations in each rank, in rank order.
    pub fn rank_batches(&self) -> impl Iterator<Item = (Rank, Vec<usize>)> + '_ {
        Rank::ALL.into_iter().map(move |rank| {
            let indices = self
                .operations
                .iter()
                .enumerate()
                .filter(|(_, op)| op.rank() == rank)
                .map(|(i, _)| i)
                .collect();
            (rank, indices)
        })
    }

    /// Operation counts per kind.
    #[must_use]
    pub fn counts(&self) -> HashMap<OperationKind, usize> {
        let mut counts = HashMap::new();
        for op in &self.operations {
            *counts.entry(op.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Check that ranks never decrease and that every user operation comes
    /// before the operations that depend on it.
    pub fn validate_ordering(&self) -> Result<(), GraphError> {
        let mut user_ops: HashMap<&ResourceKey, usize> = HashMap::new();
        for (index, op) in self.operations.iter().enumerate() {
            if let Operation::CreateUser { key, .. } | Operation::UpdateUserTags { key, .. } = op {
                user_ops.entry(key).or_insert(index);
            }
        }

        let mut previous = Rank::Identity;
        for (index, op) in self.operations.iter().enumerate() {
            let rank = op.rank();
            if rank < previous {
                return Err(GraphError::OutOfOrder {
                    index,
                    operation: op.to_string(),
                    dependency: format!("rank {previous:?}"),
                });
            }
            previous = rank;

            for key in op.dependencies() {
                if let Some(&dep_index) = user_ops.get(key) {
                    if dep_index > index {
                        return Err(GraphError::OutOfOrder {
                            index,
                            operation: op.to_string(),
                            dependency: self.operations[dep_index].to_string(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}
