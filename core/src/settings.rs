//! Persisted settings: scoped editing and what gets remembered.
//!
//! `SettingsEditor` wraps one custom settings container (a `<id>.custom`
//! patch) or the switcher container. It loads on open, and on drop it saves
//! and destroys the container no matter how the scope was left, so callers
//! can batch several mutations and return early freely.
//!
//! The free functions are the persistence policies the session handle calls:
//! which options survive a restart, and the bookkeeping written when a schema
//! is selected.

use crate::api::{RimeApi, SettingsHandle};
use crate::schema::SchemaListItem;
use crate::store::ConfigGuard;

/// Generator id recorded in custom settings files written by this crate.
pub const DEFAULT_GENERATOR_ID: &str = "rime.bridge";

/// List in the `default` config naming the options whose state is saved.
pub const SAVE_OPTIONS_KEY: &str = "switcher/save_options";

pub struct SettingsEditor<'a, A: RimeApi + ?Sized> {
    api: &'a A,
    handle: SettingsHandle,
    config_id: String,
    switcher: bool,
    modified: bool,
}

impl<'a, A: RimeApi + ?Sized> SettingsEditor<'a, A> {
    /// Open a container by id. The switcher container ignores `config_id`
    /// and `generator_id`.
    pub fn with_settings(
        api: &'a A,
        config_id: &str,
        is_switcher: bool,
        generator_id: &str,
    ) -> Option<Self> {
        let handle = if is_switcher {
            api.switcher_settings_init()
        } else {
            api.custom_settings_init(config_id, generator_id)
        };
        let Some(handle) = handle else {
            tracing::warn!(config_id, is_switcher, "failed to create settings container");
            return None;
        };
        if !api.load_settings(&handle) {
            // a container that was never customized has nothing to load
            tracing::debug!(config_id, "settings container starts empty");
        }
        Some(Self {
            api,
            handle,
            config_id: config_id.to_string(),
            switcher: is_switcher,
            modified: false,
        })
    }

    /// Open `<config_id>.custom` for editing.
    pub fn open(api: &'a A, config_id: &str, generator_id: &str) -> Option<Self> {
        Self::with_settings(api, config_id, false, generator_id)
    }

    /// Open the switcher container.
    pub fn open_switcher(api: &'a A) -> Option<Self> {
        Self::with_settings(api, "default", true, DEFAULT_GENERATOR_ID)
    }

    pub fn config_id(&self) -> &str {
        &self.config_id
    }

    pub fn is_switcher(&self) -> bool {
        self.switcher
    }

    /// Whether any mutation succeeded since the container was opened.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    fn track(&mut self, ok: bool, key: &str) -> bool {
        if ok {
            self.modified = true;
        } else {
            tracing::debug!(config_id = %self.config_id, key, "customize rejected");
        }
        ok
    }

    pub fn set_bool(&mut self, key: &str, value: bool) -> bool {
        let ok = self.api.customize_bool(&self.handle, key, value);
        self.track(ok, key)
    }

    pub fn set_int(&mut self, key: &str, value: i32) -> bool {
        let ok = self.api.customize_int(&self.handle, key, value);
        self.track(ok, key)
    }

    pub fn set_double(&mut self, key: &str, value: f64) -> bool {
        let ok = self.api.customize_double(&self.handle, key, value);
        self.track(ok, key)
    }

    pub fn set_string(&mut self, key: &str, value: &str) -> bool {
        let ok = self.api.customize_string(&self.handle, key, value);
        self.track(ok, key)
    }

    /// Every deployed schema, selected or not.
    pub fn available_schemas(&self) -> Vec<SchemaListItem> {
        self.api
            .available_schemas(&self.handle)
            .map(SchemaListItem::from_raw_list)
            .unwrap_or_default()
    }

    /// Schemas currently enabled in the switcher.
    pub fn selected_schemas(&self) -> Vec<SchemaListItem> {
        self.api
            .selected_schemas(&self.handle)
            .map(SchemaListItem::from_raw_list)
            .unwrap_or_default()
    }

    /// Replace the enabled schemas. Takes effect once saved and redeployed.
    pub fn select_schemas(&mut self, schema_ids: &[&str]) -> bool {
        let ok = self.api.select_schemas(&self.handle, schema_ids);
        self.track(ok, "schema_list")
    }

    /// Save now. The container is saved again when dropped.
    pub fn save(&mut self) -> bool {
        self.api.save_settings(&self.handle)
    }
}

impl<A: RimeApi + ?Sized> Drop for SettingsEditor<'_, A> {
    fn drop(&mut self) {
        if !self.api.save_settings(&self.handle) {
            tracing::warn!(config_id = %self.config_id, "failed to save settings");
        }
        self.api.destroy_settings(&self.handle);
    }
}

/// Whether the state of option `name` is saved across sessions. Reads the
/// `default` config only.
pub fn is_persisted_option<A: RimeApi + ?Sized>(api: &A, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    match ConfigGuard::open(api, "default") {
        Some(config) => config.list_contains(SAVE_OPTIONS_KEY, name),
        None => false,
    }
}

/// Write `var/option/<name>` to the user config.
pub fn persist_option<A: RimeApi + ?Sized>(api: &A, name: &str, value: bool) -> bool {
    let Some(user) = ConfigGuard::open_user(api, "user") else {
        return false;
    };
    let ok = user.set_bool(&format!("var/option/{name}"), value);
    tracing::debug!(option = name, value, ok, "option persisted");
    ok
}

/// Record that `schema_id` was just selected: the previous-selection marker
/// and its access time in unix seconds.
pub fn record_schema_selection<A: RimeApi + ?Sized>(api: &A, schema_id: &str) -> bool {
    let Some(user) = ConfigGuard::open_user(api, "user") else {
        return false;
    };
    let now = chrono::Utc::now().timestamp();
    let stamp = i32::try_from(now).unwrap_or(i32::MAX);
    let selected = user.set_string("var/previously_selected_schema", schema_id);
    let accessed = user.set_int(&format!("var/schema_access_time/{schema_id}"), stamp);
    selected && accessed
}
