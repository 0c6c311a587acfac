//! Generic value trees decoded from engine config containers.
//!
//! The engine's config store is dynamically typed: a node is a scalar, a list
//! or a map, and scalars are stored as text. `decode` walks one node and
//! everything below it depth-first, classifying each node by asking the store
//! in a fixed order: scalar text first, then list, then map. Typed views of a
//! scalar (`as_bool`, `as_int`, `as_double`) are computed on demand from the
//! text, so a scalar that happens to look like a number is never coerced
//! during decoding. A child the store reports as none of the three still
//! takes its place in the parent, as `Null`, so list indices line up with
//! the engine's.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::api::RimeApi;
use crate::store::ConfigGuard;

/// One node of a decoded config tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(String),
    List(Vec<ConfigValue>),
    /// Children in the order the engine iterates them.
    Map(IndexMap<String, ConfigValue>),
    /// A child that is neither scalar, list nor map. Serializes as `null`.
    Null,
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ConfigValue>> {
        match self {
            ConfigValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// `true` / `false` scalars, as the engine spells them.
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_str()?.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }

    /// Decimal or `0x`-prefixed hexadecimal integer scalars.
    pub fn as_int(&self) -> Option<i64> {
        let text = self.as_str()?.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let magnitude = match digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
        {
            Some(hex) => i64::from_str_radix(hex, 16).ok()?,
            None => digits.parse::<i64>().ok()?,
        };
        Some(if negative { -magnitude } else { magnitude })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    pub fn as_double(&self) -> Option<f64> {
        self.as_str()?.trim().parse::<f64>().ok()
    }

    /// Look up a descendant by slash-separated path. List items are addressed
    /// by index, with or without the engine's `@` prefix.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        let mut node = self;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = match node {
                ConfigValue::Map(entries) => entries.get(segment)?,
                ConfigValue::List(items) => {
                    let index = segment.strip_prefix('@').unwrap_or(segment);
                    let index = if index == "last" {
                        items.len().checked_sub(1)?
                    } else {
                        index.parse::<usize>().ok()?
                    };
                    items.get(index)?
                }
                ConfigValue::Scalar(_) | ConfigValue::Null => return None,
            };
        }
        Some(node)
    }

    /// Number of nodes in the tree, this one included.
    pub fn node_count(&self) -> usize {
        match self {
            ConfigValue::Scalar(_) | ConfigValue::Null => 1,
            ConfigValue::List(items) => 1 + items.iter().map(Self::node_count).sum::<usize>(),
            ConfigValue::Map(entries) => {
                1 + entries.values().map(Self::node_count).sum::<usize>()
            }
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(text: &str) -> Self {
        ConfigValue::Scalar(text.to_string())
    }
}

impl From<ConfigValue> for serde_json::Value {
    fn from(value: ConfigValue) -> Self {
        match value {
            ConfigValue::Scalar(text) => serde_json::Value::String(text),
            ConfigValue::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            ConfigValue::Map(entries) => serde_json::Value::Object(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            ConfigValue::Null => serde_json::Value::Null,
        }
    }
}

/// Decode the node at `path`. `None` when nothing exists there.
pub fn decode<A: RimeApi + ?Sized>(config: &ConfigGuard<'_, A>, path: &str) -> Option<ConfigValue> {
    let mut visited = HashSet::new();
    decode_node(config, path, &mut visited)
}

/// Decode the node at `path` only if it is a list.
pub fn decode_list<A: RimeApi + ?Sized>(
    config: &ConfigGuard<'_, A>,
    path: &str,
) -> Option<Vec<ConfigValue>> {
    let mut visited = HashSet::new();
    visited.insert(path.to_string());
    read_list(config, path, &mut visited)
}

/// Decode the node at `path` only if it is a map.
pub fn decode_map<A: RimeApi + ?Sized>(
    config: &ConfigGuard<'_, A>,
    path: &str,
) -> Option<IndexMap<String, ConfigValue>> {
    let mut visited = HashSet::new();
    visited.insert(path.to_string());
    read_map(config, path, &mut visited)
}

fn decode_node<A: RimeApi + ?Sized>(
    config: &ConfigGuard<'_, A>,
    path: &str,
    visited: &mut HashSet<String>,
) -> Option<ConfigValue> {
    if !visited.insert(path.to_string()) {
        tracing::warn!(path, config_id = config.config_id(), "config node reported twice, skipping");
        return None;
    }
    if let Some(text) = config.get_string(path) {
        return Some(ConfigValue::Scalar(text));
    }
    if let Some(items) = read_list(config, path, visited) {
        return Some(ConfigValue::List(items));
    }
    read_map(config, path, visited).map(ConfigValue::Map)
}

fn read_list<A: RimeApi + ?Sized>(
    config: &ConfigGuard<'_, A>,
    path: &str,
    visited: &mut HashSet<String>,
) -> Option<Vec<ConfigValue>> {
    let entries = config.begin_list(path)?;
    let mut items = Vec::new();
    for entry in entries {
        let child = decode_node(config, &entry.path, visited).unwrap_or_else(|| {
            tracing::debug!(path = %entry.path, "list item has no value");
            ConfigValue::Null
        });
        items.push(child);
    }
    Some(items)
}

fn read_map<A: RimeApi + ?Sized>(
    config: &ConfigGuard<'_, A>,
    path: &str,
    visited: &mut HashSet<String>,
) -> Option<IndexMap<String, ConfigValue>> {
    let entries = config.begin_map(path)?;
    let mut map = IndexMap::new();
    for entry in entries {
        let child = decode_node(config, &entry.path, visited).unwrap_or_else(|| {
            tracing::debug!(path = %entry.path, "map entry has no value");
            ConfigValue::Null
        });
        map.insert(entry.key, child);
    }
    Some(map)
}
