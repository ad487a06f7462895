//! Tag sets attached to user resources.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag holding the source department.
pub const TAG_DEPARTMENT: &str = "Department";

/// Tag holding the source job title.
pub const TAG_JOB_TITLE: &str = "JobTitle";

/// Tag holding the "first last" display name.
pub const TAG_DISPLAY_NAME: &str = "DisplayName";

/// Ordered tag map. Ordering keeps serialized change sets and logs stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    /// Create an empty tag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a tag.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a tag value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Tags of `self` that are missing from `observed` or carry a different value.
    ///
    /// Tags present only in `observed` are not reported; they belong to whoever
    /// manages them outside this engine.
    #[must_use]
    pub fn changed_from(&self, observed: &Tags) -> Tags {
        Tags(
            self.0
                .iter()
                .filter(|(k, v)| observed.0.get(*k) != Some(*v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, String)> for Tags {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<(String, String)> for Tags {
    fn extend<I: IntoIterator<Item = (String, String)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
