//! Concrete instruments and the object-safe [`Instrument`] read surface.
//!
//! Every instrument is `Send + Sync`; share it with `Arc` and write to it from
//! any number of threads. Reads (`get_value`) never block writers for longer
//! than a state copy.

pub mod bucket;
pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod multigauge;
pub mod summary;
pub mod timer;

pub use bucket::{exponential_bounds, linear_bounds, BucketHistogram, BucketHistogramBuilder};
pub use counter::{Counter, CounterBuilder};
pub use gauge::{Gauge, GaugeBuilder};
pub use histogram::{Histogram, HistogramBuilder};
pub use multigauge::{MultiGauge, MultiGaugeBuilder};
pub use summary::{Summary, SummaryBuilder};
pub use timer::{Timer, TimerBuilder, TimerScope};

use crate::identity::MetricIdentity;
use crate::value::{MetricValue, MetricVisitor};

/// Read surface shared by all instruments, for heterogeneous collections.
pub trait Instrument: Send + Sync {
    fn identity(&self) -> &MetricIdentity;

    /// Snapshot wrapped in the closed [`MetricValue`] union.
    fn snapshot(&self) -> MetricValue;

    /// Take a snapshot and hand it to the matching visitor method.
    fn accept(&self, visitor: &mut dyn MetricVisitor) {
        self.snapshot().accept(self.identity(), visitor);
    }
}
