//! Last-value gauge.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::builder::{BuilderBase, MetricBuilder};
use crate::config::MetricsConfig;
use crate::error::{ensure_finite, Result};
use crate::identity::{MetricIdentity, MetricKind};
use crate::instrument::Instrument;
use crate::value::{GaugeValue, MetricValue};

/// Holds the most recent finite value as raw f64 bits.
#[derive(Debug)]
pub struct Gauge {
    identity: MetricIdentity,
    bits: AtomicU64,
}

impl Gauge {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> GaugeBuilder {
        GaugeBuilder::new(Arc::default(), id, name)
    }

    /// Replace the current value.
    pub fn set_value(&self, v: f64) -> Result<()> {
        let v = ensure_finite(v)?;
        self.bits.swap(v.to_bits(), Ordering::AcqRel);
        Ok(())
    }

    pub fn try_set_value(&self, v: f64) -> bool {
        self.set_value(v).is_ok()
    }

    pub fn get_value(&self) -> GaugeValue {
        GaugeValue {
            value: f64::from_bits(self.bits.load(Ordering::Acquire)),
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
}

impl Instrument for Gauge {
    fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
    fn snapshot(&self) -> MetricValue {
        MetricValue::Gauge(self.get_value())
    }
}

pub struct GaugeBuilder {
    base: BuilderBase,
}

impl GaugeBuilder {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BuilderBase::new(config, id, name),
        }
    }
}

impl MetricBuilder for GaugeBuilder {
    type Output = Gauge;

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> Result<Gauge> {
        Ok(Gauge {
            identity: self.base.identity(MetricKind::Gauge)?,
            bits: AtomicU64::new(0.0f64.to_bits()),
        })
    }
}
