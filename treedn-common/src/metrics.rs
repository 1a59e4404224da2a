//! Metrics collection for the TreeDN controller.
//!
//! Lock-free counters and histograms that every dispatcher task updates
//! concurrently through a shared `Arc<ControllerMetrics>`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/* ---------------------------------------------------------------- *
 * Simple Counter
 * ---------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicU64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/* ---------------------------------------------------------------- *
 * Gauge
 * ---------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicU64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, value: u64) {
        self.value.store(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/* ---------------------------------------------------------------- *
 * Histogram
 * ---------------------------------------------------------------- */

/// Fixed-bucket histogram; a sample lands in the first bucket whose upper
/// bound is not below it.
#[derive(Debug)]
pub struct Histogram {
    buckets: Vec<AtomicU64>,
    boundaries: Vec<u64>,
    overflow: AtomicU64,
    sum: AtomicU64,
    count: AtomicU64,
}

impl Histogram {
    pub fn new(boundaries: Vec<u64>) -> Self {
        let buckets = (0..boundaries.len()).map(|_| AtomicU64::new(0)).collect();

        Self {
            buckets,
            boundaries,
            overflow: AtomicU64::new(0),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Buckets suited to latencies in microseconds.
    pub fn latency_micros() -> Self {
        Self::new(vec![10, 100, 1_000, 10_000, 100_000, 1_000_000, 10_000_000])
    }

    pub fn observe(&self, value: u64) {
        self.sum.fetch_add(value, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        match self.boundaries.iter().position(|&b| value <= b) {
            Some(idx) => {
                self.buckets[idx].fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.overflow.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn observe_duration(&self, elapsed: Duration) {
        self.observe(elapsed.as_micros().min(u64::MAX as u128) as u64);
    }

    pub fn average(&self) -> f64 {
        let c = self.count.load(Ordering::Relaxed);
        if c == 0 {
            0.0
        } else {
            self.sum.load(Ordering::Relaxed) as f64 / c as f64
        }
    }

    /// `(upper bound, count)` for every bucket.
    pub fn counts(&self) -> Vec<(u64, u64)> {
        self.boundaries
            .iter()
            .zip(self.buckets.iter())
            .map(|(&b, bucket)| (b, bucket.load(Ordering::Relaxed)))
            .collect()
    }

    pub fn overflow(&self) -> u64 {
        self.overflow.load(Ordering::Relaxed)
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::latency_micros()
    }
}

/* ---------------------------------------------------------------- *
 * Aggregate metrics for the controller
 * ---------------------------------------------------------------- */

#[derive(Debug, Default)]
pub struct ControllerMetrics {
    // Ingest
    pub notifications_received: Counter,
    pub decode_errors: Counter,
    pub packets_ignored: Counter,

    // Interest handling
    pub interests_received: Counter,
    pub interests_handled: Counter,
    pub interests_dropped: Counter,
    pub trees_created: Counter,
    pub trees: Gauge,

    // Rule installation
    pub forwarding_writes: Counter,
    pub forwarding_skipped: Counter,
    pub group_writes: Counter,
    pub binding_writes: Counter,
    pub binding_skipped: Counter,
    pub transport_errors: Counter,

    // Performance
    pub interest_processing_time: Histogram,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for ControllerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "interests: {} received, {} handled, {} dropped",
            self.interests_received.value(),
            self.interests_handled.value(),
            self.interests_dropped.value()
        )?;
        writeln!(
            f,
            "notifications: {} received, {} ignored, {} malformed",
            self.notifications_received.value(),
            self.packets_ignored.value(),
            self.decode_errors.value()
        )?;
        writeln!(
            f,
            "trees: {} ({} created)",
            self.trees.value(),
            self.trees_created.value()
        )?;
        writeln!(
            f,
            "writes: {} forwarding ({} skipped), {} group, {} binding ({} skipped), {} failed",
            self.forwarding_writes.value(),
            self.forwarding_skipped.value(),
            self.group_writes.value(),
            self.binding_writes.value(),
            self.binding_skipped.value(),
            self.transport_errors.value()
        )?;
        write!(
            f,
            "interest processing: {:.1}us average over {}",
            self.interest_processing_time.average(),
            self.interest_processing_time.count()
        )
    }
}
