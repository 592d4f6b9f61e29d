//! meterkit core: in-process metric instruments and their snapshots.
//!
//! Instruments (counter, gauge, sliding-window histogram, bucket histogram,
//! P² summary, timer, multi-gauge) are built once through a builder that
//! merges configured tag layers, then written from any number of threads.
//! `get_value()` returns an immutable snapshot; [`Instrument::accept`] feeds
//! it to a [`MetricVisitor`] for export. Exporters, collectors and wire
//! formats live outside this crate.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Invalid input
//! surfaces as [`MeterError`]; every value-accepting call has a `try_*`
//! variant that skips bad samples instead.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod builder;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod identity;
pub mod instrument;
pub mod tags;
pub mod value;
pub mod window;

pub use builder::{BuilderBase, MetricBuilder};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::MetricsConfig;
/// Shared result type.
pub use error::{ErrorKind, MeterError, Result};
pub use estimator::{MultiQuantileEstimator, P2Estimator};
pub use identity::{MetricIdentity, MetricKind};
pub use instrument::{
    BucketHistogram, Counter, Gauge, Histogram, Instrument, MultiGauge, Summary, Timer, TimerScope,
};
pub use tags::{TagConfig, TagLimits, TagMap, TagSet};
pub use value::{
    BucketHistogramValue, CounterValue, DistributionValue, GaugeValue, MetricValue,
    MetricVisitor, MultiGaugeValue, SummaryValue,
};
pub use window::WindowPolicy;
