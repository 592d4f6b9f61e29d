//! Sliding-window histogram with exact percentiles over the last N samples.
//!
//! The ring buffer bounds memory (and percentile accuracy) to `capacity`
//! samples. Count, sum, min and max are lifetime values and do not forget
//! evicted samples.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::builder::{BuilderBase, MetricBuilder};
use crate::config::{clamp_capacity, MetricsConfig};
use crate::error::{ensure_finite, Result};
use crate::identity::{MetricIdentity, MetricKind};
use crate::instrument::Instrument;
use crate::value::{DistributionValue, MetricValue};

#[derive(Debug)]
struct Window {
    samples: Vec<f64>,
    /// Slot overwritten by the next insert once the buffer is full.
    next: usize,
    capacity: usize,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Window {
    fn new(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            next: 0,
            capacity,
            count: 0,
            sum: 0.0,
            min: 0.0,
            max: 0.0,
        }
    }

    fn insert(&mut self, v: f64) {
        if self.samples.len() < self.capacity {
            self.samples.push(v);
        } else {
            self.samples[self.next] = v;
            self.next = (self.next + 1) % self.capacity;
        }

        if self.count == 0 {
            self.min = v;
            self.max = v;
        } else {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
        self.count += 1;
        self.sum += v;
    }
}

#[derive(Debug)]
pub struct Histogram {
    identity: MetricIdentity,
    window: Mutex<Window>,
}

impl Histogram {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> HistogramBuilder {
        HistogramBuilder::new(Arc::default(), id, name)
    }

    pub(crate) fn from_parts(identity: MetricIdentity, capacity: usize) -> Self {
        Self {
            identity,
            window: Mutex::new(Window::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, v: f64) -> Result<()> {
        let v = ensure_finite(v)?;
        self.lock().insert(v);
        Ok(())
    }

    pub fn try_record(&self, v: f64) -> bool {
        self.record(v).is_ok()
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Samples currently held for percentile math (at most `capacity`).
    pub fn buffered(&self) -> usize {
        self.lock().samples.len()
    }

    pub fn get_value(&self) -> DistributionValue {
        let (mut samples, count, sum, min, max) = {
            let w = self.lock();
            (w.samples.clone(), w.count, w.sum, w.min, w.max)
        };
        if samples.is_empty() {
            return DistributionValue::default();
        }

        samples.sort_unstable_by(f64::total_cmp);
        DistributionValue {
            count,
            sum,
            min,
            p50: percentile(&samples, 0.5),
            p90: percentile(&samples, 0.9),
            p99: percentile(&samples, 0.99),
            max,
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
}

/// Nearest rank on a sorted, non-empty slice: index = round((n - 1) * p).
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let idx = ((sorted.len() - 1) as f64 * p).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

impl Instrument for Histogram {
    fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
    fn snapshot(&self) -> MetricValue {
        MetricValue::Distribution(self.get_value())
    }
}

pub struct HistogramBuilder {
    base: BuilderBase,
    capacity: Option<usize>,
}

impl HistogramBuilder {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BuilderBase::new(config, id, name),
            capacity: None,
        }
    }

    /// Ring buffer size; values below the floor are clamped up.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

impl MetricBuilder for HistogramBuilder {
    type Output = Histogram;

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> Result<Histogram> {
        let identity = self.base.identity(MetricKind::Histogram)?;
        let capacity =
            clamp_capacity(self.capacity.unwrap_or(self.base.config().histogram_capacity));
        Ok(Histogram::from_parts(identity, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_HISTOGRAM_CAPACITY, MIN_HISTOGRAM_CAPACITY};
    use std::thread;

    fn histogram(capacity: usize) -> Histogram {
        Histogram::builder("latency", "Latency")
            .with_capacity(capacity)
            .build()
            .unwrap()
    }

    #[test]
    fn capacity_defaults_and_floor() {
        let h = Histogram::builder("a", "b").build().unwrap();
        assert_eq!(h.capacity(), DEFAULT_HISTOGRAM_CAPACITY);
        assert_eq!(histogram(3).capacity(), MIN_HISTOGRAM_CAPACITY);
    }

    #[test]
    fn empty_snapshot_is_zeroed() {
        assert_eq!(histogram(256).get_value(), DistributionValue::default());
    }

    #[test]
    fn exact_stats_below_capacity() {
        let h = histogram(1024);
        for v in [5.0, -2.0, 9.5, 3.0] {
            h.record(v).unwrap();
        }
        let v = h.get_value();
        assert_eq!(v.count, 4);
        assert_eq!(v.min, -2.0);
        assert_eq!(v.max, 9.5);
        assert_eq!(v.sum, 15.5);
    }

    #[test]
    fn percentiles_use_rounded_rank() {
        let h = histogram(256);
        for i in 1..=100 {
            h.record(i as f64).unwrap();
        }
        let v = h.get_value();
        // round(99 * p) over 1..=100
        assert_eq!(v.p50, 51.0);
        assert_eq!(v.p90, 90.0);
        assert_eq!(v.p99, 99.0);
    }

    #[test]
    fn overflow_evicts_exactly_one_sample() {
        let h = histogram(256);
        for i in 0..=256 {
            h.record(i as f64).unwrap();
        }
        assert_eq!(h.buffered(), 256);
        let v = h.get_value();
        assert_eq!(v.count, 257);
        // lifetime min survives eviction of sample 0
        assert_eq!(v.min, 0.0);
        assert_eq!(v.max, 256.0);
        // window holds 1..=256: round(255 * 0.5) = 128 -> 129
        assert_eq!(v.p50, 129.0);
    }

    #[test]
    fn non_finite_rejected() {
        let h = histogram(256);
        assert!(h.record(f64::NAN).is_err());
        assert!(!h.try_record(f64::NEG_INFINITY));
        assert_eq!(h.get_value().count, 0);
    }

    #[test]
    fn concurrent_records_keep_lifetime_count() {
        let h = Arc::new(histogram(256));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let h = Arc::clone(&h);
                thread::spawn(move || {
                    for i in 0..1000 {
                        h.record(i as f64).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let v = h.get_value();
        assert_eq!(v.count, 4000);
        assert_eq!(v.max, 999.0);
        assert!(h.buffered() <= 256);
    }
}
