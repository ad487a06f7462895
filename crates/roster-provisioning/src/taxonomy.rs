//! Static department → group taxonomy.

use std::collections::HashMap;

use roster_core::GroupName;

use crate::error::ConfigError;
use crate::validation::normalize_value;

/// Maps departments onto a fixed set of groups.
///
/// [`GroupTaxonomy::resolve`] is total: departments without a mapping land in
/// the unassigned bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupTaxonomy {
    groups: Vec<GroupName>,
    unassigned: GroupName,
    departments: HashMap<String, GroupName>,
}

fn department_key(department: &str) -> String {
    normalize_value(department).to_lowercase()
}

impl GroupTaxonomy {
    /// Build a taxonomy. Every mapping must target a listed group.
    pub fn new<D>(
        groups: Vec<GroupName>,
        unassigned: GroupName,
        departments: D,
    ) -> Result<Self, ConfigError>
    where
        D: IntoIterator<Item = (String, GroupName)>,
    {
        let mut ordered: Vec<GroupName> = Vec::with_capacity(groups.len());
        for group in groups {
            if group == unassigned {
                return Err(ConfigError::invalid(
                    "groups.names",
                    format!("'{group}' is already the unassigned bucket"),
                ));
            }
            if !ordered.contains(&group) {
                ordered.push(group);
            }
        }

        let mut mapping = HashMap::new();
        for (department, group) in departments {
            let key = department_key(&department);
            if key.is_empty() {
                return Err(ConfigError::invalid(
                    "groups.departments",
                    "department name is blank",
                ));
            }
            if !ordered.contains(&group) && group != unassigned {
                return Err(ConfigError::invalid(
                    "groups.departments",
                    format!("department '{department}' maps to unknown group '{group}'"),
                ));
            }
            if let Some(previous) = mapping.insert(key, group.clone()) {
                if previous != group {
                    return Err(ConfigError::invalid(
                        "groups.departments",
                        format!("department '{department}' is mapped to both '{previous}' and '{group}'"),
                    ));
                }
            }
        }

        Ok(Self {
            groups: ordered,
            unassigned,
            departments: mapping,
        })
    }

    /// Group for a department, matched case-insensitively.
    #[must_use]
    pub fn resolve(&self, department: &str) -> &GroupName {
        self.departments
            .get(&department_key(department))
            .unwrap_or(&self.unassigned)
    }

    #[must_use]
    pub fn unassigned(&self) -> &GroupName {
        &self.unassigned
    }

    /// Every group the engine manages: listed groups in order, then the bucket.
    pub fn all_groups(&self) -> impl Iterator<Item = &GroupName> {
        self.groups.iter().chain(std::iter::once(&self.unassigned))
    }

    #[must_use]
    pub fn contains(&self, group: &GroupName) -> bool {
        group == &self.unassigned || self.groups.contains(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GroupsConfig;

    fn group(name: &str) -> GroupName {
        GroupName::parse(name).unwrap()
    }

    fn standard() -> GroupTaxonomy {
        GroupsConfig::default().to_taxonomy().unwrap()
    }

    #[test]
    fn test_default_mapping() {
        let taxonomy = standard();
        assert_eq!(taxonomy.resolve("Education"), &group("Education"));
        assert_eq!(taxonomy.resolve("Engineering"), &group("Engineers"));
        assert_eq!(taxonomy.resolve("Management"), &group("Managers"));
    }

    #[test]
    fn test_resolve_is_total() {
        let taxonomy = standard();
        assert_eq!(taxonomy.resolve("Sales"), &group("Unassigned"));
        assert_eq!(taxonomy.resolve(""), &group("Unassigned"));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let taxonomy = standard();
        assert_eq!(taxonomy.resolve("  EDUCATION "), &group("Education"));
        assert_eq!(taxonomy.resolve("engineering"), &group("Engineers"));
    }

    #[test]
    fn test_all_groups_order() {
        let taxonomy = standard();
        let names: Vec<&str> = taxonomy.all_groups().map(GroupName::as_str).collect();
        assert_eq!(names, vec!["Education", "Engineers", "Managers", "Unassigned"]);
    }

    #[test]
    fn test_mapping_to_unknown_group_rejected() {
        let err = GroupTaxonomy::new(
            vec![group("Education")],
            group("Unassigned"),
            vec![("Sales".to_string(), group("Sellers"))],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Sellers"));
    }

    #[test]
    fn test_mapping_to_bucket_allowed() {
        let taxonomy = GroupTaxonomy::new(
            vec![group("Education")],
            group("Unassigned"),
            vec![("Temp".to_string(), group("Unassigned"))],
        )
        .unwrap();
        assert_eq!(taxonomy.resolve("temp"), &group("Unassigned"));
    }

    #[test]
    fn test_conflicting_mapping_rejected() {
        let err = GroupTaxonomy::new(
            vec![group("Education"), group("Managers")],
            group("Unassigned"),
            vec![
                ("Education".to_string(), group("Education")),
                ("education".to_string(), group("Managers")),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_bucket_listed_as_group_rejected() {
        assert!(GroupTaxonomy::new(
            vec![group("Unassigned")],
            group("Unassigned"),
            Vec::new(),
        )
        .is_err());
    }
}
