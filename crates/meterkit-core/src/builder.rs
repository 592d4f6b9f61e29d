//! Builder base shared by every instrument builder.

use std::sync::Arc;

use crate::config::MetricsConfig;
use crate::error::{MeterError, Result};
use crate::identity::{MetricIdentity, MetricKind};
use crate::tags::TagMap;
use crate::window::WindowPolicy;

/// Fields common to every builder: identity parts, local tags, window.
#[derive(Debug, Clone)]
pub struct BuilderBase {
    config: Arc<MetricsConfig>,
    id: String,
    name: String,
    unit: Option<String>,
    description: Option<String>,
    tags: TagMap,
    window: Option<WindowPolicy>,
}

impl BuilderBase {
    pub fn new(config: Arc<MetricsConfig>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            config,
            id: id.into(),
            name: name.into(),
            unit: None,
            description: None,
            tags: TagMap::new(),
            window: None,
        }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    /// Window set on the builder, falling back to the configured default.
    pub fn window(&self) -> WindowPolicy {
        self.window.unwrap_or(self.config.summary_window)
    }

    /// Set the unit unless the caller already chose one.
    pub(crate) fn default_unit(&mut self, unit: &str) {
        if self.unit.is_none() {
            self.unit = Some(unit.to_string());
        }
    }

    /// Validate id/name and materialize tags into an identity.
    pub fn identity(&self, kind: MetricKind) -> Result<MetricIdentity> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(MeterError::InvalidConfig("metric id must not be empty".into()));
        }
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MeterError::InvalidConfig(format!(
                "metric name must not be empty (id={id})"
            )));
        }
        Ok(MetricIdentity::new(
            id.to_string(),
            name.to_string(),
            kind,
            self.unit.clone(),
            self.description.clone(),
            self.config.tags.materialize(&self.tags),
        ))
    }
}

/// Fluent surface shared by all builders.
///
/// `with_window` is accepted everywhere; only windowed instruments
/// (summaries) consult it.
pub trait MetricBuilder: Sized {
    type Output;

    fn base_mut(&mut self) -> &mut BuilderBase;

    fn build(self) -> Result<Self::Output>;

    fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.base_mut().unit = Some(unit.into());
        self
    }

    fn with_description(mut self, description: impl Into<String>) -> Self {
        self.base_mut().description = Some(description.into());
        self
    }

    /// Add a local tag; a repeated key replaces the earlier value.
    fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_mut().tags.insert(key.into(), value.into());
        self
    }

    fn with_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let base = self.base_mut();
        for (k, v) in tags {
            base.tags.insert(k.into(), v.into());
        }
        self
    }

    fn with_window(mut self, window: WindowPolicy) -> Self {
        self.base_mut().window = Some(window);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagConfig;

    struct StubBuilder(BuilderBase);

    impl MetricBuilder for StubBuilder {
        type Output = MetricIdentity;
        fn base_mut(&mut self) -> &mut BuilderBase {
            &mut self.0
        }
        fn build(self) -> Result<MetricIdentity> {
            self.0.identity(MetricKind::Gauge)
        }
    }

    fn stub(id: &str, name: &str) -> StubBuilder {
        let mut config = MetricsConfig::default();
        config.tags = TagConfig {
            global: [("env".to_string(), "dev".to_string())].into_iter().collect(),
            ..TagConfig::default()
        };
        StubBuilder(BuilderBase::new(Arc::new(config), id, name))
    }

    #[test]
    fn builds_identity_with_merged_tags() {
        let identity = stub("db.pool", "Pool size")
            .with_unit("connections")
            .with_description("open connections")
            .with_tag("env", "prod")
            .with_tags([("shard", "1")])
            .build()
            .unwrap();
        assert_eq!(identity.id(), "db.pool");
        assert_eq!(identity.kind(), MetricKind::Gauge);
        assert_eq!(identity.unit(), Some("connections"));
        assert_eq!(identity.description(), Some("open connections"));
        assert_eq!(identity.tags()["env"], "prod");
        assert_eq!(identity.tags()["shard"], "1");
    }

    #[test]
    fn empty_id_or_name_fails() {
        let err = stub("  ", "x").build().unwrap_err();
        assert_eq!(err.kind().as_str(), "CONFIGURATION");
        assert!(stub("x", "").build().is_err());
    }

    #[test]
    fn window_falls_back_to_config() {
        let mut p = stub("a", "b");
        assert_eq!(p.base_mut().window(), WindowPolicy::Cumulative);
        let mut p = p.with_window(WindowPolicy::Tumbling(std::time::Duration::from_secs(5)));
        assert_eq!(
            p.base_mut().window(),
            WindowPolicy::Tumbling(std::time::Duration::from_secs(5))
        );
    }
}
