//! Approximate-quantile summary over a cumulative or tumbling window.
//!
//! Tumbling resets are lazy: the first `record` at or after the window
//! boundary clears the estimators and starts the next window. A summary that
//! stops receiving writes keeps reporting the last window.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use crate::builder::{BuilderBase, MetricBuilder};
use crate::clock::{duration_nanos, Clock, SystemClock};
use crate::config::MetricsConfig;
use crate::error::{ensure_finite, Result};
use crate::estimator::multi::UNARMED;
use crate::estimator::MultiQuantileEstimator;
use crate::identity::{MetricIdentity, MetricKind};
use crate::instrument::Instrument;
use crate::value::{MetricValue, SummaryValue};
use crate::window::WindowPolicy;

pub struct Summary {
    identity: MetricIdentity,
    estimator: MultiQuantileEstimator,
    window: WindowPolicy,
    clock: Arc<dyn Clock>,
    /// Clock nanos at which the current tumbling window closes. Only read
    /// and written under the estimator lock.
    next_reset: AtomicU64,
}

impl Summary {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> SummaryBuilder {
        SummaryBuilder::new(Arc::default(), id, name)
    }

    pub fn window(&self) -> WindowPolicy {
        self.window
    }

    pub fn quantiles(&self) -> &[f64] {
        self.estimator.quantiles()
    }

    pub fn record(&self, v: f64) -> Result<()> {
        let v = ensure_finite(v)?;
        let WindowPolicy::Tumbling(period) = self.window else {
            return self.estimator.add(v);
        };
        let now = duration_nanos(self.clock.now());
        if self
            .estimator
            .add_windowed(v, now, duration_nanos(period), &self.next_reset)?
        {
            tracing::debug!(id = self.identity.id(), "summary window rolled");
        }
        Ok(())
    }

    pub fn try_record(&self, v: f64) -> bool {
        self.record(v).is_ok()
    }

    pub fn get_value(&self) -> SummaryValue {
        let snap = self.estimator.snapshot();
        SummaryValue {
            count: snap.count,
            min: snap.min,
            max: snap.max,
            quantiles: snap.quantiles,
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
}

impl std::fmt::Debug for Summary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summary")
            .field("identity", &self.identity)
            .field("window", &self.window)
            .field("estimator", &self.estimator)
            .finish_non_exhaustive()
    }
}

impl Instrument for Summary {
    fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
    fn snapshot(&self) -> MetricValue {
        MetricValue::Summary(self.get_value())
    }
}

pub struct SummaryBuilder {
    base: BuilderBase,
    quantiles: Option<Vec<f64>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SummaryBuilder {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BuilderBase::new(config, id, name),
            quantiles: None,
            clock: None,
        }
    }

    pub fn with_quantiles(mut self, quantiles: impl Into<Vec<f64>>) -> Self {
        self.quantiles = Some(quantiles.into());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl MetricBuilder for SummaryBuilder {
    type Output = Summary;

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> Result<Summary> {
        let identity = self.base.identity(MetricKind::Summary)?;
        let window = self.base.window();
        window.validate()?;
        let quantiles = self
            .quantiles
            .unwrap_or_else(|| self.base.config().summary_quantiles.clone());
        let estimator = MultiQuantileEstimator::new(&quantiles)?;
        tracing::debug!(id = identity.id(), ?window, quantiles = ?estimator.quantiles(), "summary built");

        Ok(Summary {
            identity,
            estimator,
            window,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::new())),
            next_reset: AtomicU64::new(UNARMED),
        })
    }
}
