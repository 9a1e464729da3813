//! Tag-group resolution.
//!
//! Recipes may accept "any member of a group" (any plank species, any wool).
//! The resolver replaces such a reference with the one concrete material
//! that stands for the cheapest, most obtainable member of the group.

use crate::recipe::TAG_MARKER;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Errors produced while resolving tag references.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("unknown tag group '{0}'")]
    UnknownTagGroup(String),
}

/// Static table from tag group (including its `#` marker) to representative
/// material.
/// Rule files may spell groups with or without the marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct TagTable {
    groups: BTreeMap<String, String>,
}

impl TagTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. The `#` marker is added when missing.
    pub fn insert(&mut self, group: &str, representative: &str) {
        let group = if group.starts_with(TAG_MARKER) {
            group.to_string()
        } else {
            format!("{TAG_MARKER}{group}")
        };
        self.groups.insert(group, representative.to_string());
    }

    pub fn is_tag(name: &str) -> bool {
        name.starts_with(TAG_MARKER)
    }

    /// Resolve a material name. Concrete names pass through unchanged; tag
    /// references must be present in the table.
    pub fn resolve<'a>(&'a self, name: &'a str) -> Result<&'a str, TagError> {
        if !Self::is_tag(name) {
            return Ok(name);
        }
        self.groups
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| TagError::UnknownTagGroup(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TagTable {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        let mut table = TagTable::new();
        for (group, representative) in iter {
            table.insert(group, representative);
        }
        table
    }
}

impl From<BTreeMap<String, String>> for TagTable {
    fn from(groups: BTreeMap<String, String>) -> Self {
        groups
            .iter()
            .map(|(group, representative)| (group.as_str(), representative.as_str()))
            .collect()
    }
}

impl From<TagTable> for BTreeMap<String, String> {
    fn from(table: TagTable) -> Self {
        table.groups
    }
}
