use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;

use meterkit_core::config::{DEFAULT_HISTOGRAM_CAPACITY, DEFAULT_QUANTILES};
use meterkit_core::error::{MeterError, Result};
use meterkit_core::tags::{DEFAULT_MAX_KEY_LEN, DEFAULT_MAX_TAGS, DEFAULT_MAX_VALUE_LEN};
use meterkit_core::{MetricsConfig, TagConfig, TagLimits, WindowPolicy};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub version: u32,

    #[serde(default)]
    pub tags: TagsSection,

    #[serde(default)]
    pub histogram: HistogramSection,

    #[serde(default)]
    pub summary: SummarySection,
}

impl ConfigFile {
    /// Checks that only make sense for the file format. Everything else is
    /// left to [`MetricsConfig::validate`].
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MeterError::UnsupportedVersion(self.version));
        }
        self.tags.limits.validate()
    }

    /// Validate, then convert into the core's immutable config.
    pub fn into_config(self) -> Result<MetricsConfig> {
        self.validate()?;
        let cfg = MetricsConfig {
            tags: TagConfig {
                global: self.tags.global,
                resource: self.tags.resource,
                limits: self.tags.limits.into(),
            },
            // below-floor capacities are clamped by the builders
            histogram_capacity: self.histogram.capacity,
            summary_quantiles: self.summary.quantiles,
            summary_window: match self.summary.window_ms {
                Some(ms) => WindowPolicy::Tumbling(Duration::from_millis(ms)),
                None => WindowPolicy::Cumulative,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TagsSection {
    #[serde(default)]
    pub global: IndexMap<String, String>,

    #[serde(default)]
    pub resource: IndexMap<String, String>,

    #[serde(default)]
    pub limits: LimitsSection,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsSection {
    #[serde(default = "default_max_key_len")]
    pub max_key_len: usize,

    #[serde(default = "default_max_value_len")]
    pub max_value_len: usize,

    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_key_len: default_max_key_len(),
            max_value_len: default_max_value_len(),
            max_tags: default_max_tags(),
        }
    }
}

const MAX_TAG_LEN: usize = 4096;
const MAX_TAG_COUNT: usize = 1024;

impl LimitsSection {
    /// Upper bounds for file-supplied limits; zero is rejected by the core.
    pub fn validate(&self) -> Result<()> {
        if self.max_key_len > MAX_TAG_LEN {
            return Err(MeterError::InvalidConfig(format!(
                "tags.limits.max_key_len must be at most {MAX_TAG_LEN}"
            )));
        }
        if self.max_value_len > MAX_TAG_LEN {
            return Err(MeterError::InvalidConfig(format!(
                "tags.limits.max_value_len must be at most {MAX_TAG_LEN}"
            )));
        }
        if self.max_tags > MAX_TAG_COUNT {
            return Err(MeterError::InvalidConfig(format!(
                "tags.limits.max_tags must be at most {MAX_TAG_COUNT}"
            )));
        }
        Ok(())
    }
}

impl From<LimitsSection> for TagLimits {
    fn from(l: LimitsSection) -> Self {
        TagLimits {
            max_key_len: l.max_key_len,
            max_value_len: l.max_value_len,
            max_tags: l.max_tags,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistogramSection {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for HistogramSection {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SummarySection {
    #[serde(default = "default_quantiles")]
    pub quantiles: Vec<f64>,

    /// Tumbling window length; absent means cumulative.
    #[serde(default)]
    pub window_ms: Option<u64>,
}

impl Default for SummarySection {
    fn default() -> Self {
        Self {
            quantiles: default_quantiles(),
            window_ms: None,
        }
    }
}

fn default_max_key_len() -> usize {
    DEFAULT_MAX_KEY_LEN
}
fn default_max_value_len() -> usize {
    DEFAULT_MAX_VALUE_LEN
}
fn default_max_tags() -> usize {
    DEFAULT_MAX_TAGS
}
fn default_capacity() -> usize {
    DEFAULT_HISTOGRAM_CAPACITY
}
fn default_quantiles() -> Vec<f64> {
    DEFAULT_QUANTILES.to_vec()
}
