//! Scoped access to engine config containers.
//!
//! A `ConfigGuard` owns one open container and closes it when dropped, so a
//! container is released on every exit path, including an early `?` halfway
//! through a tree walk. List and map iteration is scoped the same way with
//! `IterGuard`.

use crate::api::{ConfigHandle, ConfigIterator, RimeApi};
use crate::value::{self, ConfigValue};

/// Which engine entry point opened the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// Deployed config, e.g. `default`.
    Config,
    /// User state config, e.g. `user`.
    User,
    /// Deployed schema config, e.g. `luna_pinyin`.
    Schema,
}

/// An open config container.
pub struct ConfigGuard<'a, A: RimeApi + ?Sized> {
    api: &'a A,
    handle: ConfigHandle,
    config_id: String,
    kind: ConfigKind,
}

impl<'a, A: RimeApi + ?Sized> ConfigGuard<'a, A> {
    /// Open a deployed config such as `default`.
    pub fn open(api: &'a A, config_id: &str) -> Option<Self> {
        let handle = api.config_open(config_id);
        Self::wrap(api, handle, config_id, ConfigKind::Config)
    }

    /// Open a user state config such as `user`.
    pub fn open_user(api: &'a A, config_id: &str) -> Option<Self> {
        let handle = api.user_config_open(config_id);
        Self::wrap(api, handle, config_id, ConfigKind::User)
    }

    /// Open the deployed config of a schema.
    pub fn open_schema(api: &'a A, schema_id: &str) -> Option<Self> {
        let handle = api.schema_open(schema_id);
        Self::wrap(api, handle, schema_id, ConfigKind::Schema)
    }

    fn wrap(
        api: &'a A,
        handle: Option<ConfigHandle>,
        config_id: &str,
        kind: ConfigKind,
    ) -> Option<Self> {
        match handle {
            Some(handle) => Some(Self {
                api,
                handle,
                config_id: config_id.to_string(),
                kind,
            }),
            None => {
                tracing::debug!(config_id, ?kind, "config container not available");
                None
            }
        }
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    pub fn kind(&self) -> ConfigKind {
        self.kind
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.api.config_get_bool(&self.handle, key)
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        self.api.config_get_int(&self.handle, key)
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.api.config_get_double(&self.handle, key)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.api.config_get_string(&self.handle, key)
    }

    pub fn set_bool(&self, key: &str, value: bool) -> bool {
        self.api.config_set_bool(&self.handle, key, value)
    }

    pub fn set_int(&self, key: &str, value: i32) -> bool {
        self.api.config_set_int(&self.handle, key, value)
    }

    pub fn set_double(&self, key: &str, value: f64) -> bool {
        self.api.config_set_double(&self.handle, key, value)
    }

    pub fn set_string(&self, key: &str, value: &str) -> bool {
        self.api.config_set_string(&self.handle, key, value)
    }

    /// Number of items in the list at `key`; `0` when absent or not a list.
    pub fn list_size(&self, key: &str) -> usize {
        self.api.config_list_size(&self.handle, key)
    }

    /// Iterate the list at `key`. `None` when `key` is not a list.
    pub fn begin_list(&self, key: &str) -> Option<IterGuard<'_, A>> {
        self.api
            .config_begin_list(&self.handle, key)
            .map(|iter| IterGuard::new(self.api, iter))
    }

    /// Iterate the map at `key`. `None` when `key` is not a map.
    pub fn begin_map(&self, key: &str) -> Option<IterGuard<'_, A>> {
        self.api
            .config_begin_map(&self.handle, key)
            .map(|iter| IterGuard::new(self.api, iter))
    }

    /// Decode the node at `key` into a generic value tree.
    pub fn get_value(&self, key: &str) -> Option<ConfigValue> {
        value::decode(self, key)
    }

    /// Whether the scalar list at `key` contains `item`.
    pub fn list_contains(&self, key: &str, item: &str) -> bool {
        let Some(entries) = self.begin_list(key) else {
            return false;
        };
        for entry in entries {
            if self.get_string(&entry.path).as_deref() == Some(item) {
                return true;
            }
        }
        false
    }

    /// Scalar items of the list at `key`, skipping non-scalar children.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.begin_list(key) {
            Some(entries) => entries
                .filter_map(|entry| self.get_string(&entry.path))
                .collect(),
            None => Vec::new(),
        }
    }
}

impl<A: RimeApi + ?Sized> Drop for ConfigGuard<'_, A> {
    fn drop(&mut self) {
        if !self.api.config_close(&self.handle) {
            tracing::warn!(config_id = %self.config_id, "failed to close config container");
        }
    }
}

/// One child reported by an iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub index: usize,
    /// Map key; empty for list items.
    pub key: String,
    /// Full path of the child, usable with the typed getters.
    pub path: String,
}

/// An in-progress list or map iteration, ended on drop.
pub struct IterGuard<'g, A: RimeApi + ?Sized> {
    api: &'g A,
    iter: ConfigIterator,
    exhausted: bool,
}

impl<'g, A: RimeApi + ?Sized> IterGuard<'g, A> {
    fn new(api: &'g A, iter: ConfigIterator) -> Self {
        Self {
            api,
            iter,
            exhausted: false,
        }
    }
}

impl<A: RimeApi + ?Sized> Iterator for IterGuard<'_, A> {
    type Item = ConfigEntry;

    fn next(&mut self) -> Option<ConfigEntry> {
        if self.exhausted {
            return None;
        }
        if !self.api.config_next(&mut self.iter) {
            self.exhausted = true;
            return None;
        }
        Some(ConfigEntry {
            index: usize::try_from(self.iter.index).unwrap_or_default(),
            key: self.iter.key.clone(),
            path: self.iter.path.clone(),
        })
    }
}

impl<A: RimeApi + ?Sized> Drop for IterGuard<'_, A> {
    fn drop(&mut self) {
        self.api.config_end(&mut self.iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRime;

    fn engine() -> MemoryRime {
        let rime = MemoryRime::new();
        rime.load_config(
            "default",
            r#"{
                "switcher": {"save_options": ["ascii_punct", "full_shape"]},
                "menu": {"page_size": "5"}
            }"#,
        ).unwrap();
        rime
    }

    #[test]
    fn test_guard_closes_on_drop() {
        let rime = engine();
        {
            let config = ConfigGuard::open(&rime, "default").unwrap();
            assert_eq!(config.kind(), ConfigKind::Config);
            assert_eq!(rime.open_configs(), 1);
            assert_eq!(config.get_int("menu/page_size"), Some(5));
        }
        assert_eq!(rime.open_configs(), 0);
    }

    #[test]
    fn test_missing_container_is_none() {
        let rime = engine();
        assert!(ConfigGuard::open(&rime, "nonexistent").is_none());
        assert_eq!(rime.open_configs(), 0);
    }

    #[test]
    fn test_list_iteration_reports_paths() {
        let rime = engine();
        let config = ConfigGuard::open(&rime, "default").unwrap();
        let entries: Vec<ConfigEntry> = config.begin_list("switcher/save_options").unwrap().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].index, 1);
        assert_eq!(entries[1].path, "switcher/save_options/@1");
        assert_eq!(config.list_size("switcher/save_options"), 2);
        assert_eq!(rime.open_iterators(), 0);
    }

    #[test]
    fn test_list_contains_stops_early_and_ends_iteration() {
        let rime = engine();
        let config = ConfigGuard::open(&rime, "default").unwrap();
        assert!(config.list_contains("switcher/save_options", "ascii_punct"));
        assert!(!config.list_contains("switcher/save_options", "simplification"));
        assert!(!config.list_contains("menu", "page_size"));
        assert_eq!(rime.open_iterators(), 0);
    }

    #[test]
    fn test_map_is_not_a_list() {
        let rime = engine();
        let config = ConfigGuard::open(&rime, "default").unwrap();
        assert!(config.begin_list("menu").is_none());
        let keys: Vec<String> = config.begin_map("menu").unwrap().map(|e| e.key).collect();
        assert_eq!(keys, vec!["page_size"]);
    }

    #[test]
    fn test_writes_are_visible_to_later_reads() {
        let rime = engine();
        {
            let user = ConfigGuard::open_user(&rime, "user").unwrap();
            assert!(user.set_bool("var/option/ascii_punct", true));
            assert!(user.set_string("var/previously_selected_schema", "luna_pinyin"));
        }
        let user = ConfigGuard::open_user(&rime, "user").unwrap();
        assert_eq!(user.get_bool("var/option/ascii_punct"), Some(true));
        assert_eq!(
            user.get_string("var/previously_selected_schema").as_deref(),
            Some("luna_pinyin")
        );
        assert_eq!(user.string_list("var"), Vec::<String>::new());
    }
}
