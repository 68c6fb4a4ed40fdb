//! Best-known-solution lookup.

use super::types::{BestKnown, ProblemFamily};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Keyed lookup `family/instance_id → BestKnown`.
///
/// Missing keys yield `None`, which disables gap reporting for that
/// instance without raising an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestKnownTable {
    entries: BTreeMap<String, BestKnown>,
}

impl BestKnownTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(family: ProblemFamily, instance_id: &str) -> String {
        format!("{}/{}", family.tag(), instance_id)
    }

    pub fn insert(&mut self, family: ProblemFamily, instance_id: &str, best: BestKnown) {
        self.entries.insert(Self::key(family, instance_id), best);
    }

    pub fn with_entry(mut self, family: ProblemFamily, instance_id: &str, best: BestKnown) -> Self {
        self.insert(family, instance_id, best);
        self
    }

    pub fn get(&self, family: ProblemFamily, instance_id: &str) -> Option<BestKnown> {
        self.entries.get(&Self::key(family, instance_id)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
