//! Declared relationships between tables.
//!
//! A [`RelationMap`] names joins from one table to others. Targets are
//! gateway identifiers resolved to physical tables by a [`TableResolver`];
//! resolving a target for the first time merges that target's own map into
//! the caller's, so chains of relations need not be declared everywhere.

mod catalog;
mod targets;

use hashbrown::HashMap;
#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

pub use catalog::{Catalog, TableDefinition, TableResolver};
pub use targets::TargetCache;

/// How one table joins another: `target.target_column = source.local_column`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
pub struct RelationshipDescriptor {
    /// Column on the table the join starts from
    pub local_column: String,
    /// Gateway identifier of the joined table
    pub target: String,
    /// Column on the joined table
    pub target_column: String,
}

impl RelationshipDescriptor {
    pub fn new(
        local_column: impl Into<String>,
        target: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            local_column: local_column.into(),
            target: target.into(),
            target_column: target_column.into(),
        }
    }
}

/// Relationship descriptors keyed by relation name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(transparent))]
pub struct RelationMap {
    relations: HashMap<String, RelationshipDescriptor>,
}

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn relation(mut self, name: impl Into<String>, descriptor: RelationshipDescriptor) -> Self {
        self.insert(name, descriptor);
        self
    }

    /// Declares or replaces a relation.
    pub fn insert(&mut self, name: impl Into<String>, descriptor: RelationshipDescriptor) {
        self.relations.insert(name.into(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&RelationshipDescriptor> {
        self.relations.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RelationshipDescriptor)> {
        self.relations.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Adds every relation of `other`, replacing same-named entries.
    pub fn extend(&mut self, other: RelationMap) {
        self.relations.extend(other.relations);
    }

    /// Adds the relations of `other` this map does not declare yet.
    /// Returns how many were added.
    pub fn merge_missing(&mut self, other: &RelationMap) -> usize {
        let mut added = 0;
        for (name, descriptor) in &other.relations {
            if !self.relations.contains_key(name) {
                self.relations.insert(name.clone(), descriptor.clone());
                added += 1;
            }
        }
        added
    }
}

impl<K: Into<String>> FromIterator<(K, RelationshipDescriptor)> for RelationMap {
    fn from_iter<T: IntoIterator<Item = (K, RelationshipDescriptor)>>(iter: T) -> Self {
        Self {
            relations: iter.into_iter().map(|(k, d)| (k.into(), d)).collect(),
        }
    }
}
