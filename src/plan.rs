//! Mapping from one redirect group to the object that materializes it.

use std::collections::HashMap;

use crate::storage::Metadata;
use crate::types::RedirectRule;

const INDEX_DOCUMENT: &str = "index.html";
const LOCATION_METADATA_KEY_PREFIX: &str = "redirect-location-";
const PATTERN_METADATA_KEY_PREFIX: &str = "redirect-pattern-";

/// Everything needed to write one redirect object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectPlan {
    /// The location all rules of the group share.
    pub location: String,
    /// Key relative to the prefix; also the path probed in the build mirror.
    pub sub_path: String,
    /// Full remote key.
    pub key: String,
    pub metadata: Metadata,
}

/// `location` + `index.html`, with a single leading `/` removed.
///
/// ```
/// use s3redirect_rs::plan::storage_key;
///
/// assert_eq!(storage_key("/a/b"), "a/b/index.html");
/// assert_eq!(storage_key("/a/b/"), "a/b/index.html");
/// assert_eq!(storage_key("a"), "a/index.html");
/// ```
pub fn storage_key(location: &str) -> String {
    let path = if location.ends_with('/') {
        format!("{location}{INDEX_DOCUMENT}")
    } else {
        format!("{location}/{INDEX_DOCUMENT}")
    };

    match path.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => path,
    }
}

/// Join the target prefix and a storage key.
pub fn full_key(prefix: &str, sub_path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        sub_path.to_string()
    } else {
        format!("{prefix}/{sub_path}")
    }
}

/// Metadata entries for a group, numbered from 1 within the group.
pub fn build_metadata(rules: &[RedirectRule]) -> Metadata {
    let mut metadata = Metadata::with_capacity(rules.len());
    for (index, rule) in rules.iter().enumerate() {
        let position = index + 1;
        metadata.push((
            format!("{LOCATION_METADATA_KEY_PREFIX}{position}"),
            rule.redirect.clone(),
        ));
        if let Some(ref pattern) = rule.pattern {
            metadata.push((
                format!("{PATTERN_METADATA_KEY_PREFIX}{position}"),
                pattern.clone(),
            ));
        }
    }
    metadata
}

/// Build the plan for one group. Pure and total.
pub fn plan(prefix: &str, location: &str, rules: &[RedirectRule]) -> ObjectPlan {
    let sub_path = storage_key(location);
    ObjectPlan {
        location: location.to_string(),
        key: full_key(prefix, &sub_path),
        sub_path,
        metadata: build_metadata(rules),
    }
}

/// A storage key claimed by more than one distinct location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCollision {
    pub key: String,
    /// The first location seen for the key; its plan is the one kept.
    pub kept_location: String,
    pub dropped_location: String,
}

/// Report every plan whose key was already claimed by an earlier plan.
///
/// Distinct locations such as `/docs` and `/docs/` normalize to the same key.
pub fn find_key_collisions(plans: &[ObjectPlan]) -> Vec<KeyCollision> {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    let mut collisions = Vec::new();

    for plan in plans {
        match owners.get(plan.key.as_str()) {
            Some(&kept_location) => collisions.push(KeyCollision {
                key: plan.key.clone(),
                kept_location: kept_location.to_string(),
                dropped_location: plan.location.clone(),
            }),
            None => {
                owners.insert(plan.key.as_str(), plan.location.as_str());
            }
        }
    }

    collisions
}
