//! Grouping of redirect rules by source location.
//!
//! Every distinct `location` becomes one storage object, so the rules are
//! partitioned by `location` first. Groups keep the order in which each
//! location was first seen, and rules keep their input order inside a group.

use std::collections::HashMap;

use crate::types::RedirectRule;

/// Insertion-ordered mapping from location to its rules.
///
/// Backed by a `Vec` of buckets plus a `HashMap` index, so iteration order
/// never depends on hashing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RedirectGroups {
    groups: Vec<(String, Vec<RedirectRule>)>,
    index: HashMap<String, usize>,
}

impl RedirectGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule to the bucket of its location, creating the bucket on
    /// first sight.
    pub fn push(&mut self, rule: RedirectRule) {
        match self.index.get(&rule.location) {
            Some(&position) => self.groups[position].1.push(rule),
            None => {
                self.index.insert(rule.location.clone(), self.groups.len());
                self.groups.push((rule.location.clone(), vec![rule]));
            }
        }
    }

    pub fn get(&self, location: &str) -> Option<&[RedirectRule]> {
        self.index
            .get(location)
            .map(|&position| self.groups[position].1.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of rules across all groups.
    pub fn rule_count(&self) -> usize {
        self.groups.iter().map(|(_, rules)| rules.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RedirectRule])> {
        self.groups
            .iter()
            .map(|(location, rules)| (location.as_str(), rules.as_slice()))
    }
}

impl IntoIterator for RedirectGroups {
    type Item = (String, Vec<RedirectRule>);
    type IntoIter = std::vec::IntoIter<(String, Vec<RedirectRule>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

impl FromIterator<RedirectRule> for RedirectGroups {
    fn from_iter<I: IntoIterator<Item = RedirectRule>>(iter: I) -> Self {
        let mut groups = RedirectGroups::new();
        for rule in iter {
            groups.push(rule);
        }
        groups
    }
}

/// Partition rules into groups keyed by `location`.
///
/// Deterministic and total: no rule is rejected. Runs in O(n).
pub fn group(rules: impl IntoIterator<Item = RedirectRule>) -> RedirectGroups {
    rules.into_iter().collect()
}
