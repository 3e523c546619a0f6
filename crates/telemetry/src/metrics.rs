//! In-process metrics for tenancy resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let index = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len() - 1);
        self.buckets[index].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Collected metrics for the tenancy host.
#[derive(Debug, Default)]
pub struct Metrics {
    // Middleware outcomes
    pub requests_inspected: Counter,
    pub forwarded_untenanted: Counter,
    pub tenancies_resolved: Counter,
    pub default_tenancies_resolved: Counter,
    pub rejected_missing_tenant: Counter,
    pub rejected_invalid_tenant: Counter,
    pub rejected_not_a_member: Counter,
    pub cancelled_requests: Counter,

    // Collaborator calls
    pub membership_lookups: Counter,
    pub membership_lookup_errors: Counter,
    pub settings_lookups: Counter,
    pub settings_lookup_errors: Counter,

    // Latency histograms
    pub resolution_latency_ms: Histogram,
    pub membership_latency_ms: Histogram,
    pub settings_latency_ms: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub requests_inspected: u64,
    pub forwarded_untenanted: u64,
    pub tenancies_resolved: u64,
    pub default_tenancies_resolved: u64,
    pub rejected_missing_tenant: u64,
    pub rejected_invalid_tenant: u64,
    pub rejected_not_a_member: u64,
    pub cancelled_requests: u64,
    pub membership_lookups: u64,
    pub membership_lookup_errors: u64,
    pub settings_lookups: u64,
    pub settings_lookup_errors: u64,
    pub resolution_latency_mean_ms: f64,
    pub membership_latency_mean_ms: f64,
    pub settings_latency_mean_ms: f64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            requests_inspected: self.requests_inspected.get(),
            forwarded_untenanted: self.forwarded_untenanted.get(),
            tenancies_resolved: self.tenancies_resolved.get(),
            default_tenancies_resolved: self.default_tenancies_resolved.get(),
            rejected_missing_tenant: self.rejected_missing_tenant.get(),
            rejected_invalid_tenant: self.rejected_invalid_tenant.get(),
            rejected_not_a_member: self.rejected_not_a_member.get(),
            cancelled_requests: self.cancelled_requests.get(),
            membership_lookups: self.membership_lookups.get(),
            membership_lookup_errors: self.membership_lookup_errors.get(),
            settings_lookups: self.settings_lookups.get(),
            settings_lookup_errors: self.settings_lookup_errors.get(),
            resolution_latency_mean_ms: self.resolution_latency_ms.mean(),
            membership_latency_mean_ms: self.membership_latency_ms.mean(),
            settings_latency_mean_ms: self.settings_latency_ms.mean(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
