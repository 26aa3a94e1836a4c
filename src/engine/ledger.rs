use std::collections::HashSet;
use std::hash::Hash;

/// Set of identity keys already delivered on one stream.
#[derive(Debug, Clone)]
pub struct DedupLedger<K> {
    seen: HashSet<K>,
}

impl<K: Hash + Eq> DedupLedger<K> {
    pub fn new() -> Self {
        DedupLedger { seen: HashSet::new() }
    }

    pub fn seen(&self, key: &K) -> bool {
        self.seen.contains(key)
    }

    pub fn mark_seen(&mut self, key: K) {
        self.seen.insert(key);
    }

    /// Record `key` and report whether it was new.
    pub fn check_and_mark(&mut self, key: K) -> bool {
        self.seen.insert(key)
    }

    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<K: Hash + Eq> Default for DedupLedger<K> {
    fn default() -> Self {
        Self::new()
    }
}
