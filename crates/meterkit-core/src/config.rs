//! Immutable configuration handed to instrument builders.
//!
//! There is no process-wide registry of tags or defaults: whoever builds
//! instruments owns an `Arc<MetricsConfig>` and passes it in explicitly.

use crate::error::{MeterError, Result};
use crate::tags::TagConfig;
use crate::window::WindowPolicy;

/// Default sliding-window capacity for histograms and timers.
pub const DEFAULT_HISTOGRAM_CAPACITY: usize = 2048;
/// Smallest accepted capacity; smaller requests are clamped up.
pub const MIN_HISTOGRAM_CAPACITY: usize = 256;
/// Quantiles tracked by summaries unless overridden.
pub const DEFAULT_QUANTILES: [f64; 3] = [0.5, 0.9, 0.99];

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsConfig {
    pub tags: TagConfig,
    pub histogram_capacity: usize,
    pub summary_quantiles: Vec<f64>,
    pub summary_window: WindowPolicy,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            tags: TagConfig::default(),
            histogram_capacity: DEFAULT_HISTOGRAM_CAPACITY,
            summary_quantiles: DEFAULT_QUANTILES.to_vec(),
            summary_window: WindowPolicy::Cumulative,
        }
    }
}

impl MetricsConfig {
    pub fn validate(&self) -> Result<()> {
        self.tags.validate()?;
        self.summary_window.validate()?;
        if self.summary_quantiles.is_empty() {
            return Err(MeterError::InvalidConfig(
                "summary quantiles must not be empty".into(),
            ));
        }
        for &q in &self.summary_quantiles {
            validate_quantile(q)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_quantile(q: f64) -> Result<f64> {
    // NaN fails both comparisons
    if q > 0.0 && q < 1.0 {
        Ok(q)
    } else {
        Err(MeterError::QuantileOutOfRange(q))
    }
}

/// Clamp a requested sliding-window capacity up to the floor.
pub(crate) fn clamp_capacity(requested: usize) -> usize {
    if requested < MIN_HISTOGRAM_CAPACITY {
        tracing::debug!(
            requested,
            floor = MIN_HISTOGRAM_CAPACITY,
            "histogram capacity clamped"
        );
        MIN_HISTOGRAM_CAPACITY
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn default_is_valid() {
        assert!(MetricsConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_quantiles_and_windows() {
        let mut cfg = MetricsConfig::default();
        cfg.summary_quantiles = vec![0.5, 1.0];
        assert_eq!(cfg.validate(), Err(MeterError::QuantileOutOfRange(1.0)));

        let mut cfg = MetricsConfig::default();
        cfg.summary_quantiles.clear();
        assert!(cfg.validate().is_err());

        let mut cfg = MetricsConfig::default();
        cfg.summary_window = WindowPolicy::Tumbling(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn capacity_floor() {
        assert_eq!(clamp_capacity(10), MIN_HISTOGRAM_CAPACITY);
        assert_eq!(clamp_capacity(4096), 4096);
    }

    #[test]
    fn quantile_bounds_are_open() {
        assert!(validate_quantile(0.0).is_err());
        assert!(validate_quantile(1.0).is_err());
        assert!(validate_quantile(f64::NAN).is_err());
        assert!(validate_quantile(0.999).is_ok());
    }
}
