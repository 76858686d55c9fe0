//! # Server Metrics
//!
//! Lightweight counters and a latency histogram backing the
//! PERFORMANCE endpoint (spec §6): operations per second, average/p95/p99
//! latency, and error rate since process start.
//!
//! ## Design Principles
//! 1. **Accumulator Pattern**: Use atomic counters to aggregate events cheaply.
//! 2. **Fixed Buckets**: Keep histogram buckets in a contiguous array for cache locality.
//! 3. **Zero-Cost Access**: Expose snapshots as plain structs without heap work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Default latency bucket boundaries in microseconds.
pub const DEFAULT_LATENCY_BUCKETS_US: [u64; 12] =
    [1, 2, 5, 10, 20, 50, 100, 200, 500, 1_000, 2_000, 5_000];

/// Snapshot of all server metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub errors_total: u64,
    pub latency: LatencySnapshot,
}

/// Snapshot of the latency histogram.
#[derive(Debug, Clone)]
pub struct LatencySnapshot {
    /// Bucket boundaries in microseconds.
    pub bounds_us: Vec<u64>,
    /// Bucket counts, including the overflow bucket at the end.
    pub buckets: Vec<u64>,
    pub samples: u64,
    pub sum_us: u64,
}

impl LatencySnapshot {
    pub fn avg_ms(&self) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.sum_us as f64 / self.samples as f64) / 1000.0
    }

    /// Estimates the given percentile (0.0-1.0) from bucket counts. The
    /// estimate is the upper bound of the first bucket whose cumulative
    /// count reaches the target rank; this is only as precise as the
    /// bucket boundaries.
    pub fn percentile_ms(&self, p: f64) -> f64 {
        if self.samples == 0 {
            return 0.0;
        }
        let target = (self.samples as f64 * p).ceil() as u64;
        let mut cumulative = 0u64;
        for (i, &count) in self.buckets.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let bound_us = self.bounds_us.get(i).copied().unwrap_or_else(|| {
                    self.bounds_us.last().copied().unwrap_or(0)
                });
                return bound_us as f64 / 1000.0;
            }
        }
        self.bounds_us.last().copied().unwrap_or(0) as f64 / 1000.0
    }
}

/// Thread-safe metrics aggregator for the server. Uses `AtomicU64` so
/// record calls are zero-allocation; `Ordering::Relaxed` is sufficient
/// since fields require no cross-field ordering.
pub struct Metrics {
    start: Instant,
    requests_total: AtomicU64,
    errors_total: AtomicU64,
    latency: LatencyHistogram,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            start: Instant::now(),
            requests_total: AtomicU64::new(0),
            errors_total: AtomicU64::new(0),
            latency: LatencyHistogram::new(DEFAULT_LATENCY_BUCKETS_US.to_vec()),
        }
    }

    /// Records one completed request and its latency.
    pub fn record_request(&self, latency: Duration, is_error: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if is_error {
            self.errors_total.fetch_add(1, Ordering::Relaxed);
        }
        self.latency.record(latency);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            latency: self.latency.snapshot(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Metrics::new()
    }
}

/// Fixed-bucket latency histogram. Bucket selection is a linear scan;
/// the bucket list is small (12 entries) and stays cache-hot.
pub struct LatencyHistogram {
    bounds_us: Vec<u64>,
    buckets: Vec<AtomicU64>,
    sum_us: AtomicU64,
    samples: AtomicU64,
}

impl LatencyHistogram {
    pub fn new(bounds_us: Vec<u64>) -> Self {
        let buckets = (0..=bounds_us.len()).map(|_| AtomicU64::new(0)).collect();
        LatencyHistogram {
            bounds_us,
            buckets,
            sum_us: AtomicU64::new(0),
            samples: AtomicU64::new(0),
        }
    }

    pub fn record(&self, latency: Duration) {
        let micros = latency.as_micros().min(u64::MAX as u128) as u64;
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.sum_us.fetch_add(micros, Ordering::Relaxed);

        let bucket = self
            .bounds_us
            .iter()
            .position(|&bound| micros <= bound)
            .unwrap_or(self.bounds_us.len());
        self.buckets[bucket].fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        LatencySnapshot {
            bounds_us: self.bounds_us.clone(),
            buckets: self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect(),
            samples: self.samples.load(Ordering::Relaxed),
            sum_us: self.sum_us.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_snapshots() {
        let metrics = Metrics::new();
        metrics.record_request(Duration::from_micros(3), false);
        metrics.record_request(Duration::from_micros(3000), true);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.errors_total, 1);
        assert_eq!(snapshot.latency.samples, 2);
        assert!(snapshot.latency.avg_ms() > 0.0);
    }
}
