//! Immutable metric identity shared by every instrument kind.

use std::fmt;

use crate::tags::TagMap;

/// Instrument kinds known to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
    BucketHistogram,
    MultiGauge,
    Timer,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
            MetricKind::BucketHistogram => "bucket_histogram",
            MetricKind::MultiGauge => "multi_gauge",
            MetricKind::Timer => "timer",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of one instrument. Built by [`crate::builder::BuilderBase`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricIdentity {
    id: String,
    name: String,
    kind: MetricKind,
    unit: Option<String>,
    description: Option<String>,
    tags: TagMap,
}

impl MetricIdentity {
    pub(crate) fn new(
        id: String,
        name: String,
        kind: MetricKind,
        unit: Option<String>,
        description: Option<String>,
        tags: TagMap,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            unit,
            description,
            tags,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn kind(&self) -> MetricKind {
        self.kind
    }
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    /// Materialized tags in insertion order.
    pub fn tags(&self) -> &TagMap {
        &self.tags
    }
}

impl fmt::Display for MetricIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.id, self.kind)
    }
}
