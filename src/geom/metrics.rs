//! Opt-in timing hooks for curve queries and follower ticks.
//!
//! Timing is only collected when the `engine_metrics` feature is enabled and the
//! target is not WASM (`std::time::Instant` is unavailable there). Otherwise every
//! call compiles down to running the closure.
//!
//! # Usage
//!
//! ```ignore
//! use spline_engine::geom::{EngineMetrics, TimingBucket};
//!
//! let mut metrics = EngineMetrics::default();
//! metrics.begin();
//! let sample = metrics.time(TimingBucket::Projection, || buffer.project(point, 4));
//! if let Some(report) = metrics.end() {
//!     println!("projection: {} ns", report.projection_ns);
//! }
//! ```

/// Categories for timing curve operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingBucket {
    /// Percent evaluation (`evaluate`, `evaluate_position`, ranges).
    Evaluate,
    /// Nearest-point projection.
    Projection,
    /// Arc-length travel.
    Travel,
    /// Length accumulation.
    Length,
    /// A full follower tick, including boundary resolution and dispatch.
    Tick,
}

/// Cumulative timings in nanoseconds.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TimingReport {
    pub evaluate_ns: u64,
    pub projection_ns: u64,
    pub travel_ns: u64,
    pub length_ns: u64,
    pub tick_ns: u64,
    /// Number of timed calls across all buckets.
    pub calls: u64,
}

impl TimingReport {
    /// Returns the total time across all buckets in nanoseconds.
    #[must_use]
    pub fn total_ns(&self) -> u64 {
        self.evaluate_ns
            .saturating_add(self.projection_ns)
            .saturating_add(self.travel_ns)
            .saturating_add(self.length_ns)
            .saturating_add(self.tick_ns)
    }

    /// Returns the total time in milliseconds (for display purposes).
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.total_ns() as f64 / 1_000_000.0
    }
}

/// Accumulator for timing curve operations.
///
/// When the `engine_metrics` feature is disabled (or on WASM), all methods are
/// no-ops and [`end`](Self::end) returns `None`.
#[derive(Debug, Default, Clone)]
pub struct EngineMetrics {
    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    report: TimingReport,
}

impl EngineMetrics {
    /// Resets all timing counters to zero.
    pub fn begin(&mut self) {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            self.report = TimingReport::default();
        }
    }

    /// Returns the accumulated report, or `None` if metrics are disabled.
    #[must_use]
    pub fn end(&self) -> Option<TimingReport> {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            Some(self.report.clone())
        }
        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            None
        }
    }

    /// Times `f` and accumulates the elapsed time in `bucket`.
    pub fn time<R>(&mut self, bucket: TimingBucket, f: impl FnOnce() -> R) -> R {
        #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
        {
            let start = std::time::Instant::now();
            let result = f();
            let nanos = start.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64;
            self.add_to_bucket(bucket, nanos);
            result
        }

        #[cfg(not(all(feature = "engine_metrics", not(target_arch = "wasm32"))))]
        {
            let _ = bucket;
            f()
        }
    }

    #[cfg(all(feature = "engine_metrics", not(target_arch = "wasm32")))]
    fn add_to_bucket(&mut self, bucket: TimingBucket, nanos: u64) {
        let slot = match bucket {
            TimingBucket::Evaluate => &mut self.report.evaluate_ns,
            TimingBucket::Projection => &mut self.report.projection_ns,
            TimingBucket::Travel => &mut self.report.travel_ns,
            TimingBucket::Length => &mut self.report.length_ns,
            TimingBucket::Tick => &mut self.report.tick_ns,
        };
        *slot = slot.saturating_add(nanos);
        self.report.calls = self.report.calls.saturating_add(1);
    }
}
