//! Accumulated wall time per named phase of a tick

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct PhaseProfiler {
    totals: BTreeMap<&'static str, Duration>,
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_phase<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        *self.totals.entry(name).or_insert(Duration::ZERO) += start.elapsed();
        result
    }

    pub fn total(&self, name: &str) -> Duration {
        self.totals.get(name).copied().unwrap_or(Duration::ZERO)
    }

    pub fn reset(&mut self) {
        self.totals.clear();
    }

    /// Phases sorted by accumulated time, longest first.
    pub fn report(&self) -> Vec<(&'static str, Duration)> {
        let mut phases: Vec<_> = self.totals.iter().map(|(name, total)| (*name, *total)).collect();
        phases.sort_by(|a, b| b.1.cmp(&a.1));
        phases
    }
}
