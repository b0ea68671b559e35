//! Named event counters

use std::collections::BTreeMap;

/// Monotonic counters keyed by static event names.
#[derive(Debug, Default, Clone)]
pub struct Counter {
    counts: BTreeMap<&'static str, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &'static str, value: u64) {
        *self.counts.entry(name).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counts.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counts.clear();
    }

    /// All counters in name order.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counts.iter().map(|(name, count)| (*name, *count)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_name() {
        let mut counter = Counter::new();
        counter.increment("left", 1);
        counter.increment("entered", 2);
        counter.increment("entered", 3);

        assert_eq!(counter.get("entered"), 5);
        assert_eq!(counter.get("moved"), 0);
        assert_eq!(counter.snapshot(), vec![("entered", 5), ("left", 1)]);

        counter.reset_all();
        assert!(counter.snapshot().is_empty());
    }
}
