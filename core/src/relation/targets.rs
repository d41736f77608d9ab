use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use super::{RelationMap, TableResolver};
use crate::Result;

/// Memoized gateway resolution.
///
/// The first resolution of a target merges the target's relations into the
/// caller's map; entries already present win. Later lookups of the same
/// target only return the cached table name.
#[derive(Clone, Debug, Default)]
pub struct TargetCache {
    tables: HashMap<String, String>,
}

impl TargetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_resolved(&self, target: &str) -> bool {
        self.tables.contains_key(target)
    }

    /// Physical table name of `target`.
    ///
    /// Without a resolver the identifier is the table name and nothing is merged.
    pub fn table_for(
        &mut self,
        resolver: Option<&dyn TableResolver>,
        target: &str,
        relations: &mut RelationMap,
    ) -> Result<String> {
        let Some(resolver) = resolver else {
            return Ok(target.to_string());
        };
        if let Some(name) = self.tables.get(target) {
            return Ok(name.clone());
        }

        let definition = resolver.resolve(target)?;
        let added = relations.merge_missing(&definition.relations);
        crate::joinery_trace_merge!(target, added);

        self.tables.insert(target.to_string(), definition.name.clone());
        Ok(definition.name)
    }

    /// Resolves every target reachable from `relations`, breadth first.
    /// Returns the number of targets resolved by this call.
    pub fn discover(
        &mut self,
        resolver: Option<&dyn TableResolver>,
        relations: &mut RelationMap,
    ) -> Result<usize> {
        if resolver.is_none() {
            return Ok(0);
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = relations.iter().map(|(_, d)| d.target.clone()).collect();
        let mut resolved = 0;

        while let Some(target) = queue.pop_front() {
            if !visited.insert(target.clone()) || self.is_resolved(&target) {
                continue;
            }
            let before = relations.len();
            self.table_for(resolver, &target, relations)?;
            resolved += 1;
            if relations.len() != before {
                queue.extend(
                    relations
                        .iter()
                        .map(|(_, d)| d.target.clone())
                        .filter(|t| !visited.contains(t)),
                );
            }
        }
        Ok(resolved)
    }
}
