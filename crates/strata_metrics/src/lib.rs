//! Strata Metrics - counters and timers for tracker and sweep instrumentation
//!
//! Everything here compiles down to no-op stubs unless the `metrics`
//! feature is enabled, so the core crates can instrument hot paths
//! unconditionally.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use strata_metrics::{Counter, TickTimer};
//!
//! let mut timer = TickTimer::new(20);
//! let mut counter = Counter::new();
//! timer.begin();
//! counter.increment("entered", 3);
//! timer.end();
//! println!("{:.2} ms/tick", timer.tick_time_ms());
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod phase_profiler;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod tick_timer;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use phase_profiler::PhaseProfiler;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use tick_timer::TickTimer;

/// Whether this build collects anything.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled.
///
/// The `cfg` is evaluated in the calling crate, which must therefore
/// declare its own `metrics` feature.
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a block under a phase name (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_phase {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        let result = $profiler.time_phase($name, || $body);
        #[cfg(not(feature = "metrics"))]
        let result = $body;
        result
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct TickTimer;

#[cfg(not(feature = "metrics"))]
impl TickTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn ticks(&self) -> u64 { 0 }
    pub fn ticks_per_second(&self) -> f64 { 0.0 }
    pub fn tick_time_ms(&self) -> f64 { 0.0 }
    pub fn tick_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug)]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
    pub fn average(&self) -> T where T: Default { T::default() }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn reset_all(&mut self) {}
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> { Vec::new() }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct PhaseProfiler;

#[cfg(not(feature = "metrics"))]
impl PhaseProfiler {
    pub fn new() -> Self { Self }
    pub fn time_phase<F, R>(&mut self, _name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
    pub fn total(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn reset(&mut self) {}
    pub fn report(&self) -> Vec<(&'static str, std::time::Duration)> { Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_is_usable_either_way() {
        let mut timer = TickTimer::new(20);
        timer.begin();
        timer.end();

        let mut counter = Counter::new();
        counter.increment("entered", 2);

        let mut profiler = PhaseProfiler::new();
        let value = profiler.time_phase("sweep", || 7);
        assert_eq!(value, 7);

        let mut buffer = RingBuffer::<f64>::new(4);
        buffer.push(1.0);

        if ENABLED {
            assert_eq!(counter.get("entered"), 2);
        } else {
            assert_eq!(counter.get("entered"), 0);
            assert!(buffer.is_empty());
        }
    }
}
