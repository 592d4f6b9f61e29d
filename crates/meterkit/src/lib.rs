//! meterkit: in-process metrics instruments with layered tags and a strict
//! YAML config.
//!
//! `core` holds the instruments, snapshots and visitor; `config` turns a
//! YAML file into the `MetricsConfig` the builders take. Most callers only
//! need the `prelude`.

pub mod core {
    pub use meterkit_core::*;
}

pub mod config {
    pub use meterkit_config::*;
}

/// Builders, instruments and the visitor surface in one import.
pub mod prelude {
    pub use meterkit_config::{load_from_file, load_from_str};
    pub use meterkit_core::instrument::{
        BucketHistogramBuilder, CounterBuilder, GaugeBuilder, HistogramBuilder, MultiGaugeBuilder,
        SummaryBuilder, TimerBuilder,
    };
    pub use meterkit_core::{
        Instrument, MeterError, MetricBuilder, MetricIdentity, MetricValue, MetricVisitor,
        MetricsConfig, WindowPolicy,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use std::sync::Arc;

    #[test]
    fn prelude_covers_load_build_and_snapshot() {
        let cfg = Arc::new(load_from_str("version: 1\ntags:\n  global: { env: dev }\n").unwrap());
        let counter = CounterBuilder::new(cfg, "jobs.done", "Jobs done").build().unwrap();
        counter.increment(3).unwrap();

        let instrument: &dyn Instrument = &counter;
        assert_eq!(instrument.identity().tags()["env"], "dev");
        assert!(matches!(instrument.snapshot(), MetricValue::Counter(v) if v.value == 3));
    }
}
