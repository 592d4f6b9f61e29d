//! meterkit config loader (strict parsing).
//!
//! Reads a YAML document, rejects unknown fields at every level, validates
//! ranges, and produces the immutable [`MetricsConfig`] that builders take.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod schema;

use std::fs;

use meterkit_core::error::{MeterError, Result};
use meterkit_core::MetricsConfig;

pub use schema::{ConfigFile, HistogramSection, LimitsSection, SummarySection, TagsSection};

pub fn load_from_file(path: &str) -> Result<MetricsConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MeterError::Io(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MetricsConfig> {
    let file: ConfigFile = serde_yaml::from_str(s)
        .map_err(|e| MeterError::InvalidConfig(format!("invalid yaml: {e}")))?;
    let cfg = file.into_config()?;
    tracing::debug!(
        global_tags = cfg.tags.global.len(),
        resource_tags = cfg.tags.resource.len(),
        histogram_capacity = cfg.histogram_capacity,
        window = ?cfg.summary_window,
        "metrics config loaded"
    );
    Ok(cfg)
}
