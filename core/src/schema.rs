//! Schema listings and metadata.

use serde::{Deserialize, Serialize};

use crate::api::{RawSchemaListItem, RimeApi};
use crate::store::ConfigGuard;
use crate::value::ConfigValue;

/// One entry of a schema list, in engine order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaListItem {
    pub schema_id: String,
    pub name: String,
}

impl SchemaListItem {
    pub fn new<I: Into<String>, N: Into<String>>(schema_id: I, name: N) -> Self {
        Self {
            schema_id: schema_id.into(),
            name: name.into(),
        }
    }

    pub fn from_raw(raw: RawSchemaListItem) -> Self {
        Self {
            schema_id: raw.schema_id,
            name: raw.name.unwrap_or_default(),
        }
    }

    pub fn from_raw_list(raw: Vec<RawSchemaListItem>) -> Vec<Self> {
        raw.into_iter().map(Self::from_raw).collect()
    }
}

/// An entry of a schema's `switches` list.
///
/// A switch with `name` toggles one option; a switch with `options` is a radio
/// group where exactly one option is on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSwitch {
    pub name: Option<String>,
    pub options: Vec<String>,
    pub states: Vec<String>,
    pub reset: Option<i64>,
}

impl SchemaSwitch {
    fn from_value(value: &ConfigValue) -> Option<Self> {
        let map = value.as_map()?;
        let strings = |key: &str| -> Vec<String> {
            map.get(key)
                .and_then(ConfigValue::as_list)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(ConfigValue::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };
        Some(Self {
            name: map.get("name").and_then(ConfigValue::as_str).map(str::to_string),
            options: strings("options"),
            states: strings("states"),
            reset: map.get("reset").and_then(ConfigValue::as_int),
        })
    }

    pub fn is_radio(&self) -> bool {
        !self.options.is_empty()
    }

    /// Option names this switch controls.
    pub fn option_names(&self) -> Vec<&str> {
        match &self.name {
            Some(name) => vec![name.as_str()],
            None => self.options.iter().map(String::as_str).collect(),
        }
    }
}

/// Metadata of one deployed schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaInfo {
    pub schema_id: String,
    pub name: String,
    pub version: String,
    pub authors: Vec<String>,
    pub description: String,
    pub switches: Vec<SchemaSwitch>,
}

impl SchemaInfo {
    /// Read from the schema's deployed config. `None` if it is not deployed.
    pub fn read<A: RimeApi + ?Sized>(api: &A, schema_id: &str) -> Option<Self> {
        let config = ConfigGuard::open_schema(api, schema_id)?;
        let authors = match config.get_value("schema/author") {
            Some(ConfigValue::Scalar(author)) => vec![author],
            Some(ConfigValue::List(items)) => items
                .iter()
                .filter_map(ConfigValue::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        let switches = config
            .get_value("switches")
            .as_ref()
            .and_then(ConfigValue::as_list)
            .map(|items| items.iter().filter_map(SchemaSwitch::from_value).collect())
            .unwrap_or_default();
        Some(Self {
            schema_id: config
                .get_string("schema/schema_id")
                .unwrap_or_else(|| schema_id.to_string()),
            name: config.get_string("schema/name").unwrap_or_default(),
            version: config.get_string("schema/version").unwrap_or_default(),
            authors,
            description: config.get_string("schema/description").unwrap_or_default(),
            switches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRime;

    #[test]
    fn test_read_schema_info() {
        let rime = MemoryRime::new();
        rime.load_schema(
            "luna_pinyin",
            r#"{
                "schema": {
                    "schema_id": "luna_pinyin",
                    "name": "朙月拼音",
                    "version": "0.15",
                    "author": ["佛振 <chen.sst@gmail.com>"],
                    "description": "Rime 預設的拼音輸入方案。"
                },
                "switches": [
                    {"name": "ascii_mode", "reset": "0", "states": ["中文", "西文"]},
                    {"options": ["zh_trad", "zh_simp"], "states": ["漢字", "汉字"]}
                ]
            }"#,
        ).unwrap();
        let info = SchemaInfo::read(&rime, "luna_pinyin").unwrap();
        assert_eq!(info.name, "朙月拼音");
        assert_eq!(info.version, "0.15");
        assert_eq!(info.authors.len(), 1);
        assert_eq!(info.switches.len(), 2);
        assert!(!info.switches[0].is_radio());
        assert_eq!(info.switches[0].reset, Some(0));
        assert!(info.switches[1].is_radio());
        assert_eq!(info.switches[1].option_names(), vec!["zh_trad", "zh_simp"]);
        assert_eq!(rime.open_configs(), 0);
    }

    #[test]
    fn test_single_author_and_missing_schema() {
        let rime = MemoryRime::new();
        rime.load_schema("bopomofo", r#"{"schema": {"author": "someone"}}"#).unwrap();
        let info = SchemaInfo::read(&rime, "bopomofo").unwrap();
        assert_eq!(info.schema_id, "bopomofo");
        assert_eq!(info.authors, vec!["someone"]);
        assert!(info.switches.is_empty());
        assert!(SchemaInfo::read(&rime, "nonexistent").is_none());
    }
}
