//! Per-target record of already emitted permalinks.

use std::collections::HashSet;

/// Permalinks emitted by one pipeline run.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `permalink`, returning `false` if it was already present.
    pub fn insert(&mut self, permalink: &str) -> bool {
        if self.seen.contains(permalink) {
            return false;
        }
        self.seen.insert(permalink.to_string())
    }

    pub fn contains(&self, permalink: &str) -> bool {
        self.seen.contains(permalink)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_insert_rejected() {
        let mut set = DedupSet::new();
        assert!(set.insert("https://x.com/a/status/1"));
        assert!(!set.insert("https://x.com/a/status/1"));
        assert!(set.insert("https://x.com/a/status/2"));
        assert_eq!(set.len(), 2);
        assert!(set.contains("https://x.com/a/status/1"));
    }
}
