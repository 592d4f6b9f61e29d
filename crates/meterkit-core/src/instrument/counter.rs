//! Monotonic counter.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::builder::{BuilderBase, MetricBuilder};
use crate::config::MetricsConfig;
use crate::error::{MeterError, Result};
use crate::identity::{MetricIdentity, MetricKind};
use crate::instrument::Instrument;
use crate::value::{CounterValue, MetricValue};

#[derive(Debug)]
pub struct Counter {
    identity: MetricIdentity,
    value: AtomicI64,
}

impl Counter {
    /// Builder using the default configuration.
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> CounterBuilder {
        CounterBuilder::new(Arc::default(), id, name)
    }

    /// Add `delta` (must be non-negative). Saturates at `i64::MAX`.
    pub fn increment(&self, delta: i64) -> Result<()> {
        if delta < 0 {
            return Err(MeterError::NegativeIncrement(delta));
        }
        // the closure never returns None, so the update cannot fail
        let _ = self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                Some(cur.saturating_add(delta))
            });
        Ok(())
    }

    pub fn increment_one(&self) {
        let _ = self.increment(1);
    }

    /// Like [`Self::increment`] but silently skips invalid deltas.
    pub fn try_increment(&self, delta: i64) -> bool {
        self.increment(delta).is_ok()
    }

    pub fn get_value(&self) -> CounterValue {
        CounterValue {
            value: self.value.load(Ordering::Acquire),
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
}

impl Instrument for Counter {
    fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
    fn snapshot(&self) -> MetricValue {
        MetricValue::Counter(self.get_value())
    }
}

pub struct CounterBuilder {
    base: BuilderBase,
}

impl CounterBuilder {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BuilderBase::new(config, id, name),
        }
    }
}

impl MetricBuilder for CounterBuilder {
    type Output = Counter;

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> Result<Counter> {
        Ok(Counter {
            identity: self.base.identity(MetricKind::Counter)?,
            value: AtomicI64::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::thread;

    fn counter() -> Counter {
        Counter::builder("requests", "Requests").build().unwrap()
    }

    #[test]
    fn negative_increment_fails_and_keeps_state() {
        let c = counter();
        c.increment(5).unwrap();
        assert_eq!(c.increment(-1), Err(MeterError::NegativeIncrement(-1)));
        assert!(!c.try_increment(-3));
        assert_eq!(c.get_value().value, 5);
    }

    #[test]
    fn zero_increment_is_allowed() {
        let c = counter();
        c.increment(0).unwrap();
        c.increment_one();
        assert_eq!(c.get_value().value, 1);
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let c = counter();
        c.increment(i64::MAX).unwrap();
        c.increment(10).unwrap();
        assert_eq!(c.get_value().value, i64::MAX);
    }

    #[test]
    fn concurrent_increments() {
        let c = Arc::new(counter());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&c);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        c.increment_one();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.get_value().value, 80_000);
    }

    #[test]
    fn snapshot_is_counter_kind() {
        let c = counter();
        c.increment(2).unwrap();
        assert_eq!(c.snapshot(), MetricValue::Counter(CounterValue { value: 2 }));
        assert_eq!(Instrument::identity(&c).kind(), MetricKind::Counter);
    }

    proptest! {
        #[test]
        fn value_is_sum_of_increments(deltas in proptest::collection::vec(0i64..1_000_000, 0..200)) {
            let c = counter();
            for d in &deltas {
                c.increment(*d).unwrap();
            }
            prop_assert_eq!(c.get_value().value, deltas.iter().sum::<i64>());
        }

        #[test]
        fn negative_deltas_never_change_state(base in 0i64..1000, neg in i64::MIN..0) {
            let c = counter();
            c.increment(base).unwrap();
            prop_assert!(c.increment(neg).is_err());
            prop_assert_eq!(c.get_value().value, base);
        }
    }
}
