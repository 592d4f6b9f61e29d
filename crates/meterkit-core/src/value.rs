//! Immutable snapshot values and the visitor used at the export boundary.
//!
//! Every `get_value()` call produces one of these by value; nothing in them
//! refers back to the live instrument, so they can be handed to exporters on
//! any thread without further synchronization.

use crate::identity::MetricIdentity;
use crate::tags::TagSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterValue {
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaugeValue {
    pub value: f64,
}

/// Sliding-window histogram / timer snapshot.
///
/// `count`, `sum`, `min` and `max` cover every sample ever recorded; the
/// percentiles only cover the samples still held in the window.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistributionValue {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryValue {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    /// `(quantile, estimate)` pairs in ascending quantile order.
    pub quantiles: Vec<(f64, f64)>,
}

impl SummaryValue {
    /// Estimate for an exactly matching configured quantile.
    pub fn quantile(&self, q: f64) -> Option<f64> {
        self.quantiles
            .iter()
            .find(|(k, _)| *k == q)
            .map(|(_, v)| *v)
    }
}

/// Bucket histogram snapshot.
///
/// `counts` are **exclusive**: `counts[i]` holds the samples with
/// `buckets[i-1] < v <= buckets[i]` (the first bucket is unbounded below).
/// `counts` has one extra trailing entry for the implicit `+Inf` overflow
/// bucket. Exporters that speak Prometheus should use [`Self::cumulative_counts`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BucketHistogramValue {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub buckets: Vec<f64>,
    pub counts: Vec<u64>,
}

impl BucketHistogramValue {
    /// Running totals (`le` semantics); the last entry equals `count`.
    pub fn cumulative_counts(&self) -> Vec<u64> {
        self.counts
            .iter()
            .scan(0u64, |acc, c| {
                *acc += c;
                Some(*acc)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultiGaugeValue {
    /// Sibling series sorted by tag set.
    pub siblings: Vec<(TagSet, f64)>,
}

/// Closed union of every snapshot kind.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter(CounterValue),
    Gauge(GaugeValue),
    Distribution(DistributionValue),
    Summary(SummaryValue),
    BucketHistogram(BucketHistogramValue),
    MultiGauge(MultiGaugeValue),
}

impl MetricValue {
    /// Dispatch to the visitor method matching this snapshot kind.
    pub fn accept(&self, identity: &MetricIdentity, visitor: &mut dyn MetricVisitor) {
        match self {
            MetricValue::Counter(v) => visitor.visit_counter(identity, v),
            MetricValue::Gauge(v) => visitor.visit_gauge(identity, v),
            MetricValue::Distribution(v) => visitor.visit_distribution(identity, v),
            MetricValue::Summary(v) => visitor.visit_summary(identity, v),
            MetricValue::BucketHistogram(v) => visitor.visit_bucket_histogram(identity, v),
            MetricValue::MultiGauge(v) => visitor.visit_multi_gauge(identity, v),
        }
    }
}

/// Export-side double dispatch over snapshot kinds.
pub trait MetricVisitor {
    fn visit_counter(&mut self, identity: &MetricIdentity, value: &CounterValue);
    fn visit_gauge(&mut self, identity: &MetricIdentity, value: &GaugeValue);
    /// Histograms and timers.
    fn visit_distribution(&mut self, identity: &MetricIdentity, value: &DistributionValue);
    fn visit_summary(&mut self, identity: &MetricIdentity, value: &SummaryValue);
    fn visit_bucket_histogram(&mut self, identity: &MetricIdentity, value: &BucketHistogramValue);
    fn visit_multi_gauge(&mut self, identity: &MetricIdentity, value: &MultiGaugeValue);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cumulative_counts_run_to_total() {
        let v = BucketHistogramValue {
            count: 6,
            buckets: vec![1.0, 2.0],
            counts: vec![1, 3, 2],
            ..Default::default()
        };
        assert_eq!(v.cumulative_counts(), vec![1, 4, 6]);
    }

    #[test]
    fn summary_lookup_is_exact() {
        let v = SummaryValue {
            count: 1,
            quantiles: vec![(0.5, 10.0), (0.99, 20.0)],
            ..Default::default()
        };
        assert_eq!(v.quantile(0.99), Some(20.0));
        assert_eq!(v.quantile(0.9), None);
    }
}
