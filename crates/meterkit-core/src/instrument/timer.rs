//! Duration histogram in milliseconds with a drop-guard scope.

use std::sync::Arc;
use std::time::Duration;

use crate::builder::{BuilderBase, MetricBuilder};
use crate::clock::{Clock, SystemClock};
use crate::config::{clamp_capacity, MetricsConfig};
use crate::error::{ensure_finite, Result};
use crate::identity::{MetricIdentity, MetricKind};
use crate::instrument::{Histogram, Instrument};
use crate::value::{DistributionValue, MetricValue};

pub struct Timer {
    histogram: Histogram,
    clock: Arc<dyn Clock>,
}

impl Timer {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> TimerBuilder {
        TimerBuilder::new(Arc::default(), id, name)
    }

    /// Start timing; the elapsed time is recorded when the scope drops,
    /// including on early return and panic unwind.
    pub fn start(&self) -> TimerScope<'_> {
        TimerScope {
            timer: self,
            started: self.clock.now(),
            armed: true,
        }
    }

    /// Time `f` and return its output.
    pub fn measure<T>(&self, f: impl FnOnce() -> T) -> T {
        let _scope = self.start();
        f()
    }

    pub fn record(&self, elapsed: Duration) {
        // a Duration always converts to a finite millisecond count
        let _ = self.histogram.record(elapsed.as_nanos() as f64 / 1_000_000.0);
    }

    pub fn record_ms(&self, ms: f64) -> Result<()> {
        self.histogram.record(ensure_finite(ms)?)
    }

    pub fn try_record_ms(&self, ms: f64) -> bool {
        self.record_ms(ms).is_ok()
    }

    /// Distribution of recorded durations, in milliseconds.
    pub fn get_value(&self) -> DistributionValue {
        self.histogram.get_value()
    }

    pub fn identity(&self) -> &MetricIdentity {
        self.histogram.identity()
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("histogram", &self.histogram)
            .finish_non_exhaustive()
    }
}

impl Instrument for Timer {
    fn identity(&self) -> &MetricIdentity {
        self.histogram.identity()
    }
    fn snapshot(&self) -> MetricValue {
        MetricValue::Distribution(self.get_value())
    }
}

/// Borrowed stopwatch returned by [`Timer::start`]. No allocation.
#[must_use = "the elapsed time is recorded when the scope is dropped"]
pub struct TimerScope<'a> {
    timer: &'a Timer,
    started: Duration,
    armed: bool,
}

impl TimerScope<'_> {
    pub fn elapsed(&self) -> Duration {
        self.timer.clock.now().saturating_sub(self.started)
    }

    /// Record now and return the elapsed time; the drop then does nothing.
    pub fn stop(mut self) -> Duration {
        let elapsed = self.elapsed();
        self.armed = false;
        self.timer.record(elapsed);
        elapsed
    }
}

impl Drop for TimerScope<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.timer.record(self.elapsed());
        }
    }
}

pub struct TimerBuilder {
    base: BuilderBase,
    capacity: Option<usize>,
    clock: Option<Arc<dyn Clock>>,
}

impl TimerBuilder {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BuilderBase::new(config, id, name),
            capacity: None,
            clock: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl MetricBuilder for TimerBuilder {
    type Output = Timer;

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(mut self) -> Result<Timer> {
        self.base.default_unit("ms");
        let identity = self.base.identity(MetricKind::Timer)?;
        let capacity =
            clamp_capacity(self.capacity.unwrap_or(self.base.config().histogram_capacity));
        Ok(Timer {
            histogram: Histogram::from_parts(identity, capacity),
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock::new())),
        })
    }
}
