// core/src/api.rs
//
// Operation surface of the Rime engine as seen from this crate.
//
// Every call the boundary layer makes into the engine goes through the
// `RimeApi` trait. A native binding implements it over the C API; tests use
// `testing::MemoryRime`. The raw structs below mirror the engine's output
// buffers field for field, with nullable C strings as `Option<String>`.

use std::fmt;
use std::num::NonZeroUsize;
use std::ops::Deref;
use std::sync::Arc;

/// Engine session handle. The engine uses `0` for "no session", which has no
/// representation here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(NonZeroUsize);

impl SessionId {
    /// Wrap a raw engine handle; `0` maps to `None`.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(SessionId)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// Process-wide variables handed to the engine before setup and initialize.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traits {
    pub shared_data_dir: String,
    pub user_data_dir: String,
    pub distribution_name: String,
    pub distribution_code_name: String,
    pub distribution_version: String,
    pub app_name: String,
}

/// Callback the engine invokes from its own threads:
/// `(session_id, message_type, message_value)`.
pub type NotificationHandler = Arc<dyn Fn(usize, &str, &str) + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCommit {
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawComposition {
    pub length: i32,
    pub cursor_pos: i32,
    pub sel_start: i32,
    pub sel_end: i32,
    pub preedit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidate {
    pub text: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMenu {
    pub page_size: i32,
    pub page_no: i32,
    pub is_last_page: bool,
    pub highlighted_candidate_index: i32,
    pub num_candidates: i32,
    pub candidates: Vec<RawCandidate>,
    pub select_keys: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawContext {
    pub composition: RawComposition,
    pub menu: RawMenu,
    pub commit_text_preview: Option<String>,
    /// Explicit per-page labels. Older engine builds do not carry the field.
    pub select_labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawStatus {
    pub schema_id: Option<String>,
    pub schema_name: Option<String>,
    pub is_disabled: bool,
    pub is_composing: bool,
    pub is_ascii_mode: bool,
    pub is_full_shape: bool,
    pub is_simplified: bool,
    pub is_traditional: bool,
    pub is_ascii_punct: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSchemaListItem {
    pub schema_id: String,
    pub name: Option<String>,
}

/// Opaque config container token issued by the engine.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ConfigHandle(pub u64);

/// Opaque custom/switcher settings token issued by the engine.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct SettingsHandle(pub u64);

/// List or map iteration cursor. The engine updates `index`, `key` and `path`
/// on every successful `config_next`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigIterator {
    pub token: u64,
    pub index: i32,
    pub key: String,
    pub path: String,
}

impl ConfigIterator {
    pub fn new(token: u64) -> Self {
        Self {
            token,
            index: -1,
            ..Default::default()
        }
    }
}

/// Native operations of the engine.
///
/// Failures are reported the way the engine reports them: `false`, `None`,
/// or an empty value. Implementations must be callable from any thread.
pub trait RimeApi: Send + Sync {
    // ---- lifecycle ----
    fn setup(&self, traits: &Traits);
    fn set_notification_handler(&self, handler: Option<NotificationHandler>);
    fn initialize(&self, traits: &Traits);
    fn finalize(&self);
    fn start_maintenance(&self, full_check: bool) -> bool;
    fn is_maintenance_mode(&self) -> bool;
    fn join_maintenance_thread(&self);

    // ---- deployment ----
    fn deployer_initialize(&self, traits: &Traits);
    fn prebuild(&self) -> bool;
    fn deploy(&self) -> bool;
    fn deploy_schema(&self, schema_file: &str) -> bool;
    fn deploy_config_file(&self, file_name: &str, version_key: &str) -> bool;
    fn sync_user_data(&self) -> bool;
    /// Run a named deployment task such as `installation_update`.
    fn run_task(&self, task_name: &str) -> bool;

    // ---- sessions ----
    fn create_session(&self) -> Option<SessionId>;
    fn find_session(&self, session: SessionId) -> bool;
    fn destroy_session(&self, session: SessionId) -> bool;
    fn cleanup_stale_sessions(&self);
    fn cleanup_all_sessions(&self);

    // ---- input ----
    fn process_key(&self, session: SessionId, keycode: i32, mask: i32) -> bool;
    fn commit_composition(&self, session: SessionId) -> bool;
    fn clear_composition(&self, session: SessionId);
    fn simulate_key_sequence(&self, session: SessionId, key_sequence: &str) -> bool;
    fn get_input(&self, session: SessionId) -> Option<String>;
    fn get_caret_pos(&self, session: SessionId) -> usize;
    fn set_caret_pos(&self, session: SessionId, caret_pos: usize);
    fn select_candidate(&self, session: SessionId, index: usize) -> bool;
    fn select_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool;
    fn delete_candidate(&self, session: SessionId, index: usize) -> bool;
    fn delete_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool;

    // ---- output snapshots, each paired with a free ----
    fn get_commit(&self, session: SessionId) -> Option<RawCommit>;
    fn free_commit(&self, commit: &mut RawCommit) -> bool;
    fn get_context(&self, session: SessionId) -> Option<RawContext>;
    fn free_context(&self, context: &mut RawContext) -> bool;
    fn get_status(&self, session: SessionId) -> Option<RawStatus>;
    fn free_status(&self, status: &mut RawStatus) -> bool;

    // ---- options and properties ----
    fn set_option(&self, session: SessionId, option: &str, value: bool);
    fn get_option(&self, session: SessionId, option: &str) -> bool;
    fn set_property(&self, session: SessionId, prop: &str, value: &str);
    fn get_property(&self, session: SessionId, prop: &str) -> Option<String>;

    // ---- schema ----
    fn get_schema_list(&self) -> Option<Vec<RawSchemaListItem>>;
    fn get_current_schema(&self, session: SessionId) -> Option<String>;
    fn select_schema(&self, session: SessionId, schema_id: &str) -> bool;

    // ---- configuration store ----
    fn config_open(&self, config_id: &str) -> Option<ConfigHandle>;
    fn user_config_open(&self, config_id: &str) -> Option<ConfigHandle>;
    fn schema_open(&self, schema_id: &str) -> Option<ConfigHandle>;
    fn config_close(&self, config: &ConfigHandle) -> bool;
    fn config_get_bool(&self, config: &ConfigHandle, key: &str) -> Option<bool>;
    fn config_get_int(&self, config: &ConfigHandle, key: &str) -> Option<i32>;
    fn config_get_double(&self, config: &ConfigHandle, key: &str) -> Option<f64>;
    fn config_get_string(&self, config: &ConfigHandle, key: &str) -> Option<String>;
    fn config_set_bool(&self, config: &ConfigHandle, key: &str, value: bool) -> bool;
    fn config_set_int(&self, config: &ConfigHandle, key: &str, value: i32) -> bool;
    fn config_set_double(&self, config: &ConfigHandle, key: &str, value: f64) -> bool;
    fn config_set_string(&self, config: &ConfigHandle, key: &str, value: &str) -> bool;
    fn config_list_size(&self, config: &ConfigHandle, key: &str) -> usize;
    fn config_begin_list(&self, config: &ConfigHandle, key: &str) -> Option<ConfigIterator>;
    fn config_begin_map(&self, config: &ConfigHandle, key: &str) -> Option<ConfigIterator>;
    fn config_next(&self, iterator: &mut ConfigIterator) -> bool;
    fn config_end(&self, iterator: &mut ConfigIterator);

    // ---- levers: custom and switcher settings ----
    fn custom_settings_init(&self, config_id: &str, generator_id: &str) -> Option<SettingsHandle>;
    fn switcher_settings_init(&self) -> Option<SettingsHandle>;
    fn load_settings(&self, settings: &SettingsHandle) -> bool;
    fn save_settings(&self, settings: &SettingsHandle) -> bool;
    fn destroy_settings(&self, settings: &SettingsHandle);
    fn customize_bool(&self, settings: &SettingsHandle, key: &str, value: bool) -> bool;
    fn customize_int(&self, settings: &SettingsHandle, key: &str, value: i32) -> bool;
    fn customize_double(&self, settings: &SettingsHandle, key: &str, value: f64) -> bool;
    fn customize_string(&self, settings: &SettingsHandle, key: &str, value: &str) -> bool;
    fn available_schemas(&self, settings: &SettingsHandle) -> Option<Vec<RawSchemaListItem>>;
    fn selected_schemas(&self, settings: &SettingsHandle) -> Option<Vec<RawSchemaListItem>>;
    fn select_schemas(&self, settings: &SettingsHandle, schema_ids: &[&str]) -> bool;

    // ---- environment ----
    fn get_shared_data_dir(&self) -> String;
    fn get_user_data_dir(&self) -> String;
    fn get_sync_dir(&self) -> String;
    fn get_user_id(&self) -> String;

    fn get_version(&self) -> String;
}

/// An engine output buffer that is handed back to the engine when dropped.
pub struct NativeBuffer<'a, A: RimeApi + ?Sized, T> {
    api: &'a A,
    raw: T,
    free: fn(&A, &mut T) -> bool,
}

impl<'a, A: RimeApi + ?Sized, T> NativeBuffer<'a, A, T> {
    pub fn new(api: &'a A, raw: T, free: fn(&A, &mut T) -> bool) -> Self {
        Self { api, raw, free }
    }
}

impl<A: RimeApi + ?Sized, T> Deref for NativeBuffer<'_, A, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.raw
    }
}

impl<A: RimeApi + ?Sized, T> Drop for NativeBuffer<'_, A, T> {
    fn drop(&mut self) {
        if !(self.free)(self.api, &mut self.raw) {
            tracing::debug!("engine refused to free an output buffer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_zero_is_none() {
        assert!(SessionId::from_raw(0).is_none());
        let id = SessionId::from_raw(42).unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "0x2a");
    }

    #[test]
    fn test_iterator_starts_before_first_entry() {
        let it = ConfigIterator::new(7);
        assert_eq!(it.token, 7);
        assert_eq!(it.index, -1);
        assert!(it.key.is_empty());
    }
}
