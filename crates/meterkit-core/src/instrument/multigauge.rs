//! Tag-keyed family of sibling gauges under one metric identity.
//!
//! Siblings are keyed by their canonical (sanitized, key-sorted) tag set, so
//! `[("a", "1"), ("b", "2")]` and `[("b", "2"), ("a", "1")]` address the same
//! series.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::builder::{BuilderBase, MetricBuilder};
use crate::config::MetricsConfig;
use crate::error::{ensure_finite, Result};
use crate::identity::{MetricIdentity, MetricKind};
use crate::instrument::Instrument;
use crate::tags::{canonical_tag_set, TagLimits, TagSet};
use crate::value::{MetricValue, MultiGaugeValue};

/// One sibling's value plus a count of writes, so a reset-on-read can tell
/// a rewrite of the same value apart from the value it reported.
#[derive(Debug, Default)]
struct Slot {
    bits: AtomicU64,
    writes: AtomicU64,
}

#[derive(Debug)]
pub struct MultiGauge {
    identity: MetricIdentity,
    limits: TagLimits,
    reset_on_read: bool,
    siblings: DashMap<TagSet, Slot>,
}

impl MultiGauge {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> MultiGaugeBuilder {
        MultiGaugeBuilder::new(Arc::default(), id, name)
    }

    /// Set the value of the sibling identified by `tags`, creating it if needed.
    pub fn add_sibling<I, K, V>(&self, tags: I, value: f64) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let value = ensure_finite(value)?;
        let key = canonical_tag_set(tags, &self.limits);
        let slot = self.siblings.entry(key).or_default();
        slot.bits.store(value.to_bits(), Ordering::Release);
        slot.writes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    pub fn try_add_sibling<I, K, V>(&self, tags: I, value: f64) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.add_sibling(tags, value).is_ok()
    }

    /// Drop one sibling series; returns whether it existed.
    pub fn remove_sibling<I, K, V>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let key = canonical_tag_set(tags, &self.limits);
        self.siblings.remove(&key).is_some()
    }

    pub fn sibling_count(&self) -> usize {
        self.siblings.len()
    }

    pub fn reset_on_read(&self) -> bool {
        self.reset_on_read
    }

    /// Copy every sibling, sorted by tag set.
    ///
    /// With reset-on-read enabled this is destructive: each reported sibling
    /// is removed afterwards unless it was written again in the meantime,
    /// even with the same value.
    pub fn get_value(&self) -> MultiGaugeValue {
        let copied = self.copy_siblings();
        if self.reset_on_read {
            self.retire(&copied);
        }
        MultiGaugeValue {
            siblings: copied
                .into_iter()
                .map(|(tags, _, bits)| (tags, f64::from_bits(bits)))
                .collect(),
        }
    }

    /// (tags, write count, value bits), sorted by tags.
    fn copy_siblings(&self) -> Vec<(TagSet, u64, u64)> {
        let mut copied: Vec<_> = self
            .siblings
            .iter()
            .map(|e| {
                // writes before bits: a racing store bumps writes after its value
                let writes = e.value().writes.load(Ordering::Acquire);
                let bits = e.value().bits.load(Ordering::Acquire);
                (e.key().clone(), writes, bits)
            })
            .collect();
        copied.sort_by(|a, b| a.0.cmp(&b.0));
        copied
    }

    fn retire(&self, copied: &[(TagSet, u64, u64)]) {
        for (key, writes, _) in copied {
            self.siblings
                .remove_if(key, |_, slot| slot.writes.load(Ordering::Acquire) == *writes);
        }
    }

    pub fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
}

impl Instrument for MultiGauge {
    fn identity(&self) -> &MetricIdentity {
        &self.identity
    }
    fn snapshot(&self) -> MetricValue {
        MetricValue::MultiGauge(self.get_value())
    }
}

pub struct MultiGaugeBuilder {
    base: BuilderBase,
    reset_on_read: bool,
}

impl MultiGaugeBuilder {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BuilderBase::new(config, id, name),
            reset_on_read: false,
        }
    }

    /// Clear siblings after each `get_value()`. Every read consumes the data
    /// it returns, so only one reader should poll such a gauge.
    pub fn with_reset_on_read(mut self, reset: bool) -> Self {
        self.reset_on_read = reset;
        self
    }
}

impl MetricBuilder for MultiGaugeBuilder {
    type Output = MultiGauge;

    fn base_mut(&mut self) -> &mut BuilderBase {
        &mut self.base
    }

    fn build(self) -> Result<MultiGauge> {
        Ok(MultiGauge {
            identity: self.base.identity(MetricKind::MultiGauge)?,
            limits: self.base.config().tags.limits,
            reset_on_read: self.reset_on_read,
            siblings: DashMap::new(),
        })
    }
}
