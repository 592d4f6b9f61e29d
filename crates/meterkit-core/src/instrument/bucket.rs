//! Boundary-based bucket histogram.
//!
//! Counts are exclusive per bucket: a sample `v` lands in the first bucket
//! whose upper bound `b` satisfies `v <= b`, or in the trailing overflow
//! bucket. See [`BucketHistogramValue::cumulative_counts`] for `le` totals.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::builder::{BuilderBase, MetricBuilder};
use crate::config::MetricsConfig;
use crate::error::{ensure_finite, MeterError, Result};
use crate::identity::{MetricIdentity, MetricKind};
use crate::instrument::Instrument;
use crate::value::{BucketHistogramValue, MetricValue};

/// `count` bounds `start, start + width, ...`.
pub fn linear_bounds(start: f64, width: f64, count: usize) -> Result<Vec<f64>> {
    if !(start.is_finite() && width.is_finite()) || width <= 0.0 || count == 0 {
        return Err(MeterError::InvalidConfig(format!(
            "linear buckets need finite start, width > 0 and count >= 1 (start={start}, width={width}, count={count})"
        )));
    }
    let bounds = (0..count).map(|i| start + width * i as f64).collect();
    validate_bounds(bounds)
}

/// `count` bounds `start, start * factor, ...`.
pub fn exponential_bounds(start: f64, factor: f64, count: usize) -> Result<Vec<f64>> {
    if !(start.is_finite() && factor.is_finite()) || start <= 0.0 || factor <= 1.0 || count == 0 {
        return Err(MeterError::InvalidConfig(format!(
            "exponential buckets need start > 0, factor > 1 and count >= 1 (start={start}, factor={factor}, count={count})"
        )));
    }
    let bounds = std::iter::successors(Some(start), |b| Some(b * factor))
        .take(count)
        .collect();
    validate_bounds(bounds)
}

fn validate_bounds(bounds: Vec<f64>) -> Result<Vec<f64>> {
    if bounds.is_empty() {
        return Err(MeterError::InvalidConfig("bucket bounds must not be empty".into()));
    }
    if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
        return Err(MeterError::InvalidConfig(format!(
            "bucket bounds must be finite, got {bad}"
        )));
    }
    if let Some(w) = bounds.windows(2).find(|w| w[0] >= w[1]) {
        return Err(MeterError::InvalidConfig(format!(
            "bucket bounds must be strictly increasing ({} >= {})",
            w[0], w[1]
        )));
    }
    Ok(bounds)
}

#[derive(Debug)]
struct Buckets {
    /// One per bound plus the overflow bucket.
    counts: Vec<u64>,
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

#[derive(Debug)]
pub struct BucketHistogram {
    identity: MetricIdentity,
    bounds: Vec<f64>,
    state: Mutex<Buckets>,
}

impl BucketHistogram {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> BucketHistogramBuilder {
        BucketHistogramBuilder::new(Arc::default(), id, name)
    }

    fn lock(&self) -> MutexGuard<'_, Buckets> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Index of the bucket `v` belongs to; `bounds.len()` is the overflow bucket.
    fn bucket_of(&self, v: f64) -> usize {
        self.bounds.partition_point(|b| *b < v)
    }

    pub fn record(&self, v: f64) -> Result<()> {
        let v = ensure_finite(v)?;
        let idx = self.bucket_of(v);

        let mut s = self.lock();
        s.counts[idx] += 1;
        if s.count == 0 {
            s.min = v;
            s.max = v;
        } else {
            s.min = s.min.min(v);
            s.max = s.max.max(v);
        }
        s.count += 1;
        s.sum += v;
        Ok(())
    }

    pub fn try_record(&self, v: f64) -> bool {
        self.record(v).is_ok()
    }

    pub fn get_value(&self) -> BucketHistogramValue {
        let s = self.lock();
        BucketHistogramValue {
            count: s.count,
            min: s.min,
            max: s.max,
            sum: s.sum,
            buckets: self.bounds.clone(),
            counts: s.counts.clone(),
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
}

impl Instrument for BucketHistogram {
    fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
    fn snapshot(&self) -> MetricValue {
        MetricValue::BucketHistogram(self.get_value())
    }
}

#[derive(Debug, Clone)]
enum Layout {
    Linear { start: f64, width: f64, count: usize },
    Exponential { start: f64, factor: f64, count: usize },
    Explicit(Vec<f64>),
}

pub struct BucketHistogramBuilder {
    base: BuilderBase,
    layout: Option<Layout>,
}

impl BucketHistogramBuilder {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BuilderBase::new(config, id, name),
            layout: None,
        }
    }

    pub fn linear(mut self, start: f64, width: f64, count: usize) -> Self {
        self.layout = Some(Layout::Linear { start, width, count });
        self
    }

    pub fn exponential(mut self, start: f64, factor: f64, count: usize) -> Self {
        self.layout = Some(Layout::Exponential { start, factor, count });
        self
    }

    pub fn with_bounds(mut self, bounds: impl Into<Vec<f64>>) -> Self {
        self.layout = Some(Layout::Explicit(bounds.into()));
        self
    }
}

impl MetricBuilder for BucketHistogramBuilder {
    type Output = BucketHistogram;

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> Result<BucketHistogram> {
        let identity = self.base.identity(MetricKind::BucketHistogram)?;
        let bounds = match self.layout {
            Some(Layout::Linear { start, width, count }) => linear_bounds(start, width, count)?,
            Some(Layout::Exponential { start, factor, count }) => {
                exponential_bounds(start, factor, count)?
            }
            Some(Layout::Explicit(bounds)) => validate_bounds(bounds)?,
            None => {
                return Err(MeterError::InvalidConfig(format!(
                    "bucket histogram {} has no bucket layout",
                    identity.id()
                )))
            }
        };
        tracing::debug!(id = identity.id(), buckets = bounds.len(), "bucket histogram built");

        Ok(BucketHistogram {
            identity,
            state: Mutex::new(Buckets {
                counts: vec![0; bounds.len() + 1],
                count: 0,
                sum: 0.0,
                min: 0.0,
                max: 0.0,
            }),
            bounds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_bounds(bounds: &[f64]) -> BucketHistogram {
        BucketHistogram::builder("payload", "Payload size")
            .with_bounds(bounds.to_vec())
            .build()
            .unwrap()
    }

    #[test]
    fn linear_and_exponential_layouts() {
        assert_eq!(linear_bounds(0.0, 10.0, 3).unwrap(), vec![0.0, 10.0, 20.0]);
        assert_eq!(exponential_bounds(1.0, 2.0, 4).unwrap(), vec![1.0, 2.0, 4.0, 8.0]);
        assert!(linear_bounds(0.0, 0.0, 3).is_err());
        assert!(linear_bounds(0.0, 1.0, 0).is_err());
        assert!(exponential_bounds(1.0, 1.0, 3).is_err());
        assert!(exponential_bounds(0.0, 2.0, 3).is_err());
    }

    #[test]
    fn non_increasing_bounds_fail_at_build() {
        for bad in [vec![1.0, 1.0], vec![3.0, 2.0], vec![], vec![1.0, f64::INFINITY]] {
            let err = BucketHistogram::builder("x", "x").with_bounds(bad).build().unwrap_err();
            assert_eq!(err.kind().as_str(), "CONFIGURATION");
        }
        assert!(BucketHistogram::builder("x", "x").build().is_err());
    }

    #[test]
    fn values_land_in_exclusive_buckets() {
        let h = with_bounds(&[1.0, 5.0, 10.0]);
        for v in [0.5, 1.0, 1.1, 5.0, 9.0, 10.0, 10.5, 1000.0] {
            h.record(v).unwrap();
        }
        let v = h.get_value();
        assert_eq!(v.counts, vec![2, 2, 2, 2]);
        assert_eq!(v.counts.iter().sum::<u64>(), v.count);
        assert_eq!(v.cumulative_counts().last().copied(), Some(v.count));
        assert_eq!(v.min, 0.5);
        assert_eq!(v.max, 1000.0);
        assert_eq!(v.buckets, vec![1.0, 5.0, 10.0]);
    }

    #[test]
    fn overflow_bucket_catches_large_values() {
        let h = BucketHistogram::builder("x", "x").linear(0.0, 1.0, 4).build().unwrap();
        h.record(3.5).unwrap();
        let v = h.get_value();
        assert_eq!(v.counts, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn non_finite_rejected() {
        let h = with_bounds(&[1.0]);
        assert!(h.record(f64::NAN).is_err());
        assert!(!h.try_record(f64::INFINITY));
        assert_eq!(h.get_value().count, 0);
    }
}
