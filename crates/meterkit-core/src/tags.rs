//! Tag model: layered merge (global < resource < local) plus sanitization.
//!
//! Keys are normalized (trimmed, truncated) before they take part in the merge
//! so that `" env"` and `"env"` address the same entry and layer precedence
//! holds for them. Blank keys are dropped. Values are truncated. The tag count
//! cap keeps the first entries by insertion order.

use indexmap::IndexMap;

use crate::error::{MeterError, Result};

/// Ordered tag map with unique keys.
pub type TagMap = IndexMap<String, String>;

/// Canonical tag set of a multigauge sibling: sanitized and sorted by key.
pub type TagSet = Vec<(String, String)>;

pub const DEFAULT_MAX_KEY_LEN: usize = 200;
pub const DEFAULT_MAX_VALUE_LEN: usize = 200;
pub const DEFAULT_MAX_TAGS: usize = 64;

/// Sanitization caps applied to every materialized tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagLimits {
    /// Max key length in characters.
    pub max_key_len: usize,
    /// Max value length in characters.
    pub max_value_len: usize,
    /// Max number of tags per metric.
    pub max_tags: usize,
}

impl Default for TagLimits {
    fn default() -> Self {
        Self {
            max_key_len: DEFAULT_MAX_KEY_LEN,
            max_value_len: DEFAULT_MAX_VALUE_LEN,
            max_tags: DEFAULT_MAX_TAGS,
        }
    }
}

impl TagLimits {
    pub fn validate(&self) -> Result<()> {
        if self.max_key_len == 0 || self.max_value_len == 0 || self.max_tags == 0 {
            return Err(MeterError::InvalidConfig(
                "tag limits must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Process-level tag layers. Immutable once handed to builders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagConfig {
    pub global: TagMap,
    pub resource: TagMap,
    pub limits: TagLimits,
}

impl TagConfig {
    pub fn validate(&self) -> Result<()> {
        self.limits.validate()?;
        for (layer, map) in [("global", &self.global), ("resource", &self.resource)] {
            if map.keys().any(|k| k.trim().is_empty()) {
                return Err(MeterError::InvalidConfig(format!(
                    "tags.{layer} contains a blank key"
                )));
            }
        }
        Ok(())
    }

    /// Merge the global, resource and local layers and sanitize the result.
    pub fn materialize(&self, local: &TagMap) -> TagMap {
        let mut merged = TagMap::new();
        let mut blank = 0usize;
        for layer in [&self.global, &self.resource, local] {
            for (k, v) in layer {
                match normalize_key(k, self.limits.max_key_len) {
                    // insert() keeps the slot of the first insertion
                    Some(key) => {
                        merged.insert(key, v.clone());
                    }
                    None => blank += 1,
                }
            }
        }
        finish(merged, blank, &self.limits)
    }
}

/// Sanitize a free-standing tag set (no layering) and sort it by key.
///
/// Duplicate keys resolve to the last value given.
pub fn canonical_tag_set<K, V, I>(tags: I, limits: &TagLimits) -> TagSet
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut merged = TagMap::new();
    let mut blank = 0usize;
    for (k, v) in tags {
        match normalize_key(k.as_ref(), limits.max_key_len) {
            Some(key) => {
                merged.insert(key, v.as_ref().to_string());
            }
            None => blank += 1,
        }
    }
    let mut set: TagSet = finish(merged, blank, limits).into_iter().collect();
    set.sort();
    set
}

fn finish(merged: TagMap, blank: usize, limits: &TagLimits) -> TagMap {
    let total = merged.len();
    let out: TagMap = merged
        .into_iter()
        .take(limits.max_tags)
        .map(|(k, v)| (k, truncate_chars(&v, limits.max_value_len)))
        .collect();

    if blank > 0 || out.len() < total {
        tracing::warn!(
            blank_keys = blank,
            truncated = total - out.len(),
            max_tags = limits.max_tags,
            "tag set sanitized"
        );
    }
    out
}

fn normalize_key(k: &str, max_len: usize) -> Option<String> {
    let k = k.trim();
    if k.is_empty() {
        return None;
    }
    Some(truncate_chars(k, max_len))
}

/// Truncate to at most `max` characters, never splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> TagMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn local_overrides_resource_overrides_global() {
        let cfg = TagConfig {
            global: map(&[("env", "dev"), ("region", "eu")]),
            resource: map(&[("region", "us"), ("host", "a")]),
            limits: TagLimits::default(),
        };
        let out = cfg.materialize(&map(&[("env", "prod")]));
        assert_eq!(out["env"], "prod");
        assert_eq!(out["region"], "us");
        assert_eq!(out["host"], "a");
        // first insertion order is preserved across overrides
        let keys: Vec<_> = out.keys().cloned().collect();
        assert_eq!(keys, vec!["env", "region", "host"]);
    }

    #[test]
    fn trims_and_drops_blank_keys() {
        let cfg = TagConfig::default();
        let out = cfg.materialize(&map(&[("  ", "x"), (" env ", "prod")]));
        assert_eq!(out.len(), 1);
        assert_eq!(out["env"], "prod");
    }

    #[test]
    fn truncates_lengths_on_char_boundaries() {
        let cfg = TagConfig {
            limits: TagLimits {
                max_key_len: 3,
                max_value_len: 2,
                max_tags: 8,
            },
            ..TagConfig::default()
        };
        let out = cfg.materialize(&map(&[("service", "héllo")]));
        assert_eq!(out["ser"], "hé");
    }

    #[test]
    fn truncation_collisions_keep_precedence() {
        let cfg = TagConfig {
            global: map(&[("envx", "dev")]),
            limits: TagLimits {
                max_key_len: 3,
                max_value_len: 10,
                max_tags: 8,
            },
            ..TagConfig::default()
        };
        let out = cfg.materialize(&map(&[("envy", "prod")]));
        assert_eq!(out.len(), 1);
        assert_eq!(out["env"], "prod");
    }

    #[test]
    fn tag_count_cap_keeps_first_inserted() {
        let cfg = TagConfig {
            global: map(&[("a", "1"), ("b", "2")]),
            limits: TagLimits {
                max_tags: 3,
                ..TagLimits::default()
            },
            ..TagConfig::default()
        };
        let out = cfg.materialize(&map(&[("c", "3"), ("d", "4"), ("a", "9")]));
        let keys: Vec<_> = out.keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(out["a"], "9");
    }

    #[test]
    fn canonical_set_is_sorted_and_last_wins() {
        let set = canonical_tag_set(
            [("zone", "b"), ("app", "x"), ("zone", "c")],
            &TagLimits::default(),
        );
        assert_eq!(
            set,
            vec![
                ("app".to_string(), "x".to_string()),
                ("zone".to_string(), "c".to_string())
            ]
        );
    }

    #[test]
    fn validate_rejects_zero_limits_and_blank_keys() {
        let mut cfg = TagConfig::default();
        cfg.limits.max_tags = 0;
        assert!(cfg.validate().is_err());

        let cfg = TagConfig {
            global: map(&[(" ", "x")]),
            ..TagConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn layer() -> impl Strategy<Value = TagMap> {
            proptest::collection::vec(("[a-e]", "[a-z]{1,4}"), 0..6)
                .prop_map(|pairs| pairs.into_iter().collect())
        }

        proptest! {
            #[test]
            fn most_local_layer_wins(global in layer(), resource in layer(), local in layer()) {
                let cfg = TagConfig {
                    global: global.clone(),
                    resource: resource.clone(),
                    limits: TagLimits::default(),
                };
                let merged = cfg.materialize(&local);
                for (k, v) in &merged {
                    let expected = local
                        .get(k)
                        .or_else(|| resource.get(k))
                        .or_else(|| global.get(k));
                    prop_assert_eq!(Some(v), expected);
                }
                for k in global.keys().chain(resource.keys()).chain(local.keys()) {
                    prop_assert!(merged.contains_key(k));
                }
            }
        }
    }
}
