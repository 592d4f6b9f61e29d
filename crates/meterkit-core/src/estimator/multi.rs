//! Several P² estimators fed from one stream under a single lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{ensure_finite, MeterError, Result};
use crate::estimator::p2::P2Estimator;

/// Window deadline value meaning no window has been opened yet.
pub(crate) const UNARMED: u64 = 0;

/// Consistent copy of every estimator, taken under one lock acquisition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuantileSnapshot {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub quantiles: Vec<(f64, f64)>,
}

#[derive(Debug)]
pub struct MultiQuantileEstimator {
    /// Sorted, deduplicated; parallel to the estimators.
    quantiles: Vec<f64>,
    estimators: Mutex<Vec<P2Estimator>>,
}

impl MultiQuantileEstimator {
    /// One estimator per distinct quantile. Needs at least one quantile.
    pub fn new(quantiles: &[f64]) -> Result<Self> {
        if quantiles.is_empty() {
            return Err(MeterError::InvalidConfig(
                "at least one quantile is required".into(),
            ));
        }
        let mut estimators = quantiles
            .iter()
            .map(|&q| P2Estimator::new(q))
            .collect::<Result<Vec<_>>>()?;
        estimators.sort_by(|a, b| a.quantile().total_cmp(&b.quantile()));
        estimators.dedup_by(|a, b| a.quantile() == b.quantile());

        Ok(Self {
            quantiles: estimators.iter().map(P2Estimator::quantile).collect(),
            estimators: Mutex::new(estimators),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<P2Estimator>> {
        // every critical section leaves the markers consistent
        self.estimators.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn quantiles(&self) -> &[f64] {
        &self.quantiles
    }

    /// Broadcast one observation to every estimator.
    pub fn add(&self, x: f64) -> Result<()> {
        let x = ensure_finite(x)?;
        for e in self.lock().iter_mut() {
            e.push(x);
        }
        Ok(())
    }

    /// Add `x` to the tumbling window closing at `deadline` (clock nanos).
    ///
    /// The deadline is read, the estimators cleared once `now` reaches it, and
    /// the next deadline stored, all under the estimator lock before `x` is
    /// pushed. A write that sees the new deadline therefore can never be wiped
    /// by the reset that produced it. Returns whether the window rolled.
    pub(crate) fn add_windowed(
        &self,
        x: f64,
        now: u64,
        period: u64,
        deadline: &AtomicU64,
    ) -> Result<bool> {
        let x = ensure_finite(x)?;
        let mut estimators = self.lock();
        let current = deadline.load(Ordering::Acquire);
        let rolled = current != UNARMED && now >= current;
        if rolled {
            for e in estimators.iter_mut() {
                e.reset();
            }
        }
        if rolled || current == UNARMED {
            deadline.store(now.saturating_add(period).max(1), Ordering::Release);
        }
        for e in estimators.iter_mut() {
            e.push(x);
        }
        Ok(rolled)
    }

    /// Estimate for a configured quantile (exact match required).
    pub fn get_quantile(&self, q: f64) -> Result<f64> {
        let idx = self
            .quantiles
            .iter()
            .position(|&k| k == q)
            .ok_or(MeterError::UnknownQuantile(q))?;
        Ok(self.lock()[idx].get_quantile())
    }

    pub fn count(&self) -> u64 {
        self.lock().first().map_or(0, P2Estimator::count)
    }

    pub fn min(&self) -> f64 {
        Self::aggregate(&self.lock()).1
    }

    pub fn max(&self) -> f64 {
        Self::aggregate(&self.lock()).2
    }

    pub fn reset(&self) {
        for e in self.lock().iter_mut() {
            e.reset();
        }
    }

    pub fn snapshot(&self) -> QuantileSnapshot {
        let estimators = self.lock().clone();
        let (count, min, max) = Self::aggregate(&estimators);
        QuantileSnapshot {
            count,
            min,
            max,
            quantiles: estimators
                .iter()
                .map(|e| (e.quantile(), e.get_quantile()))
                .collect(),
        }
    }

    /// (count, min, max) with min/max normalized to 0 when empty.
    fn aggregate(estimators: &[P2Estimator]) -> (u64, f64, f64) {
        let count = estimators.first().map_or(0, P2Estimator::count);
        if count == 0 {
            return (0, 0.0, 0.0);
        }
        let min = estimators.iter().map(P2Estimator::min).fold(f64::INFINITY, f64::min);
        let max = estimators
            .iter()
            .map(P2Estimator::max)
            .fold(f64::NEG_INFINITY, f64::max);
        (count, min, max)
    }
}
