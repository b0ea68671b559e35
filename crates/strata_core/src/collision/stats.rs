//! Process-wide sweep counters, compiled in with the `metrics` feature.

#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "metrics")]
static SECTIONS: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "metrics")]
static SHAPE_TESTS: AtomicU64 = AtomicU64::new(0);
#[cfg(feature = "metrics")]
static HITS: AtomicU64 = AtomicU64::new(0);

/// Sweep work since the last reset. All zero without the `metrics` feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Non-empty sections entered.
    pub sections: u64,
    /// Shapes fetched and tested against a swept box.
    pub shape_tests: u64,
    /// Shapes yielded.
    pub hits: u64,
}

#[inline]
pub(crate) fn record_section() {
    strata_metrics::metrics! {
        SECTIONS.fetch_add(1, Ordering::Relaxed);
    }
}

#[inline]
pub(crate) fn record_shape_test() {
    strata_metrics::metrics! {
        SHAPE_TESTS.fetch_add(1, Ordering::Relaxed);
    }
}

#[inline]
pub(crate) fn record_hit() {
    strata_metrics::metrics! {
        HITS.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn sweep_stats() -> SweepStats {
    #[cfg(feature = "metrics")]
    {
        SweepStats {
            sections: SECTIONS.load(Ordering::Relaxed),
            shape_tests: SHAPE_TESTS.load(Ordering::Relaxed),
            hits: HITS.load(Ordering::Relaxed),
        }
    }
    #[cfg(not(feature = "metrics"))]
    {
        SweepStats::default()
    }
}

pub fn reset_sweep_stats() {
    strata_metrics::metrics! {
        SECTIONS.store(0, Ordering::Relaxed);
        SHAPE_TESTS.store(0, Ordering::Relaxed);
        HITS.store(0, Ordering::Relaxed);
    }
}
