//! Engine session management.
//!
//! `EngineSession` is the single coordination point between a host and the
//! engine. It owns the engine API, the one session id the engine gave us, and
//! the sending half of the notification channel, and it guards every query
//! on the engine actually running.
//!
//! Lifecycle:
//!
//! ```text
//! NotRunning --startup (session created)--> Running --shutdown--> NotRunning
//! ```
//!
//! `startup` and `shutdown` take `&mut self`, so they can never race each
//! other or a query. Queries take `&self` and may be shared across threads.
//! While not running, every query returns `false`, `None`, an empty value, or
//! does nothing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::api::{NativeBuffer, RimeApi, SessionId, Traits};
use crate::context::{Commit, Context, Status};
use crate::error::{self, Result};
use crate::notification::{self, ActiveSession, NotificationBridge, NotificationReceiver};
use crate::schema::{SchemaInfo, SchemaListItem};
use crate::settings::{self, SettingsEditor};
use crate::store::ConfigGuard;
use crate::value::{self, ConfigValue};
use crate::Config;

/// Keysym the engine uses for "no key".
pub const VOID_SYMBOL: i32 = 0x00ff_ffff;

/// Whether `keycode` can never name a key.
pub fn is_void_keycode(keycode: i32) -> bool {
    keycode <= 0 || keycode == VOID_SYMBOL
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    NotRunning,
    Running,
}

pub struct EngineSession<A: RimeApi> {
    api: A,
    config: Config,
    state: LifecycleState,
    active: ActiveSession,
    bridge: Arc<NotificationBridge>,
    receiver: NotificationReceiver,
    /// One-time engine setup has been performed.
    setup_done: bool,
    /// Directories of the last successful startup.
    data_dirs: Option<(PathBuf, PathBuf)>,
}

impl<A: RimeApi> EngineSession<A> {
    pub fn new(api: A, config: Config) -> Self {
        let active = ActiveSession::new();
        let (bridge, receiver) = notification::channel(config.notification_capacity, active.clone());
        Self {
            api,
            config,
            state: LifecycleState::NotRunning,
            active,
            bridge,
            receiver,
            setup_done: false,
            data_dirs: None,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.active.get()
    }

    /// A receiver for engine notifications. All receivers share one queue.
    pub fn notifications(&self) -> NotificationReceiver {
        self.receiver.clone()
    }

    pub fn bridge(&self) -> &Arc<NotificationBridge> {
        &self.bridge
    }

    fn session(&self) -> Option<SessionId> {
        match self.state {
            LifecycleState::Running => self.active.get(),
            LifecycleState::NotRunning => None,
        }
    }

    // ========== Lifecycle ==========

    /// Start the engine with the directories and maintenance flag from the
    /// configuration.
    pub fn start(&mut self) -> Result<()> {
        let shared = self.config.shared_data_dir.clone();
        let user = self.config.user_data_dir.clone();
        let full_check = self.config.full_check;
        self.startup(&shared, &user, full_check)
    }

    /// Bring the engine up and create the session.
    ///
    /// Engine setup runs on the first startup of this handle only; later
    /// restarts just initialize again. Hosts that construct a second handle
    /// over the same native engine get a second setup, so keep one handle
    /// per process.
    ///
    /// Does nothing when already running. Blocks until maintenance finishes
    /// if the engine decides maintenance is needed. If the engine cannot
    /// create a session it is finalized again and the state stays
    /// `NotRunning`; that is not an error.
    ///
    /// Errors only for directory paths the engine cannot be given.
    pub fn startup(&mut self, shared_data_dir: &Path, user_data_dir: &Path, full_check: bool) -> Result<()> {
        if self.is_running() {
            tracing::debug!("engine already running, startup skipped");
            return Ok(());
        }

        let traits = self.traits(shared_data_dir, user_data_dir)?;
        if !self.setup_done {
            tracing::info!(app = %traits.app_name, "setting up engine");
            self.api.setup(&traits);
            self.setup_done = true;
        }
        tracing::info!(
            shared = %traits.shared_data_dir,
            user = %traits.user_data_dir,
            "initializing engine"
        );
        self.api.initialize(&traits);
        self.api.set_notification_handler(Some(self.bridge.handler()));

        if self.api.start_maintenance(full_check) {
            tracing::info!(full_check, "maintenance started, waiting for it to finish");
            self.api.join_maintenance_thread();
            tracing::info!("maintenance finished");
        }

        match self.api.create_session() {
            Some(session) => {
                self.active.set(Some(session));
                self.state = LifecycleState::Running;
                self.data_dirs = Some((shared_data_dir.to_path_buf(), user_data_dir.to_path_buf()));
                tracing::info!(%session, "engine session created");
            }
            None => {
                tracing::warn!("engine failed to create a session, finalizing");
                self.api.set_notification_handler(None);
                self.api.finalize();
            }
        }
        Ok(())
    }

    /// Destroy the session and finalize the engine. Does nothing when not
    /// running.
    pub fn shutdown(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Some(session) = self.active.get() {
            if !self.api.destroy_session(session) {
                tracing::warn!(%session, "engine did not destroy session");
            }
        }
        self.active.set(None);
        self.api.set_notification_handler(None);
        self.api.finalize();
        self.state = LifecycleState::NotRunning;
        tracing::info!("engine finalized");
    }

    /// Restart with a full maintenance check, redeploying everything that
    /// changed. Uses the directories of the last startup, or the configured
    /// ones. Returns whether the engine is running afterwards.
    pub fn deploy(&mut self) -> Result<bool> {
        let (shared, user) = self.data_dirs.clone().unwrap_or_else(|| {
            (self.config.shared_data_dir.clone(), self.config.user_data_dir.clone())
        });
        self.shutdown();
        self.startup(&shared, &user, true)?;
        Ok(self.is_running())
    }

    fn traits(&self, shared_data_dir: &Path, user_data_dir: &Path) -> Result<Traits> {
        Ok(Traits {
            shared_data_dir: error::path_text("shared data dir", shared_data_dir)?,
            user_data_dir: error::path_text("user data dir", user_data_dir)?,
            distribution_name: self.config.distribution_name.clone(),
            distribution_code_name: self.config.distribution_code_name.clone(),
            distribution_version: self.config.distribution_version.clone(),
            app_name: self.config.app_name.clone(),
        })
    }

    pub fn is_maintenance_mode(&self) -> bool {
        self.is_running() && self.api.is_maintenance_mode()
    }

    pub fn find_session(&self) -> bool {
        self.session().is_some_and(|s| self.api.find_session(s))
    }

    pub fn cleanup_stale_sessions(&self) {
        if self.is_running() {
            self.api.cleanup_stale_sessions();
        }
    }

    /// Destroy every engine session, ours included, then open a fresh one.
    ///
    /// If the engine refuses a new session it is finalized and the state
    /// becomes `NotRunning`, as after a failed startup. Returns whether the
    /// engine is running afterwards.
    pub fn cleanup_all_sessions(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.api.cleanup_all_sessions();
        match self.api.create_session() {
            Some(session) => {
                self.active.set(Some(session));
                tracing::info!(%session, "all sessions cleaned up, new session created");
                true
            }
            None => {
                tracing::warn!("engine failed to recreate a session, finalizing");
                self.active.set(None);
                self.api.set_notification_handler(None);
                self.api.finalize();
                self.state = LifecycleState::NotRunning;
                false
            }
        }
    }

    // ========== Environment ==========

    pub fn shared_data_dir(&self) -> Option<PathBuf> {
        if !self.is_running() {
            return None;
        }
        engine_dir(self.api.get_shared_data_dir())
    }

    pub fn user_data_dir(&self) -> Option<PathBuf> {
        if !self.is_running() {
            return None;
        }
        engine_dir(self.api.get_user_data_dir())
    }

    /// Where `sync_user_data` exchanges user dictionaries.
    pub fn sync_dir(&self) -> Option<PathBuf> {
        if !self.is_running() {
            return None;
        }
        engine_dir(self.api.get_sync_dir())
    }

    pub fn user_id(&self) -> Option<String> {
        if !self.is_running() {
            return None;
        }
        Some(self.api.get_user_id()).filter(|id| !id.is_empty())
    }

    // ========== Deployment ==========

    pub fn deploy_schema(&self, schema_file: &str) -> bool {
        self.is_running() && self.api.deploy_schema(schema_file)
    }

    pub fn deploy_config_file(&self, file_name: &str, version_key: &str) -> bool {
        self.is_running() && self.api.deploy_config_file(file_name, version_key)
    }

    pub fn sync_user_data(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        tracing::info!("syncing user data");
        self.api.sync_user_data()
    }

    /// Run one named deployment task, e.g. `user_dict_upgrade`.
    ///
    /// Errors if the name contains a NUL byte.
    pub fn run_task(&self, task_name: &str) -> Result<bool> {
        error::check_text("task name", task_name)?;
        if !self.is_running() {
            return Ok(false);
        }
        let done = self.api.run_task(task_name);
        tracing::info!(task_name, done, "deployment task finished");
        Ok(done)
    }

    // ========== Input ==========

    /// Feed one key to the engine. `false` means the key was not consumed and
    /// should be passed on to the application.
    pub fn process_key(&self, keycode: i32, mask: i32) -> bool {
        if is_void_keycode(keycode) {
            return false;
        }
        self.session()
            .is_some_and(|s| self.api.process_key(s, keycode, mask))
    }

    pub fn commit_composition(&self) -> bool {
        self.session().is_some_and(|s| self.api.commit_composition(s))
    }

    pub fn clear_composition(&self) {
        if let Some(session) = self.session() {
            self.api.clear_composition(session);
        }
    }

    /// Replay a key sequence such as `ni{space}`.
    ///
    /// Errors if the text contains a NUL byte.
    pub fn simulate_key_sequence(&self, key_sequence: &str) -> Result<bool> {
        error::check_text("key sequence", key_sequence)?;
        Ok(self
            .session()
            .is_some_and(|s| self.api.simulate_key_sequence(s, key_sequence)))
    }

    pub fn raw_input(&self) -> Option<String> {
        self.session().and_then(|s| self.api.get_input(s))
    }

    pub fn caret_pos(&self) -> usize {
        self.session().map_or(0, |s| self.api.get_caret_pos(s))
    }

    pub fn set_caret_pos(&self, caret_pos: usize) {
        if let Some(session) = self.session() {
            self.api.set_caret_pos(session, caret_pos);
        }
    }

    pub fn select_candidate(&self, index: usize) -> bool {
        self.session()
            .is_some_and(|s| self.api.select_candidate(s, index))
    }

    pub fn select_candidate_on_current_page(&self, index: usize) -> bool {
        self.session()
            .is_some_and(|s| self.api.select_candidate_on_current_page(s, index))
    }

    /// Remove the candidate at `index` of the whole menu from the user
    /// dictionary.
    pub fn delete_candidate(&self, index: usize) -> bool {
        self.session()
            .is_some_and(|s| self.api.delete_candidate(s, index))
    }

    pub fn delete_candidate_on_current_page(&self, index: usize) -> bool {
        self.session()
            .is_some_and(|s| self.api.delete_candidate_on_current_page(s, index))
    }

    // ========== Output ==========

    pub fn get_commit(&self) -> Option<Commit> {
        let session = self.session()?;
        let raw = self.api.get_commit(session)?;
        let buffer = NativeBuffer::new(&self.api, raw, A::free_commit);
        Commit::project(&buffer)
    }

    pub fn get_context(&self) -> Option<Context> {
        let session = self.session()?;
        let raw_input = self.api.get_input(session);
        let caret_pos = self.api.get_caret_pos(session);
        let raw = self.api.get_context(session)?;
        let buffer = NativeBuffer::new(&self.api, raw, A::free_context);
        Some(Context::project(&buffer, raw_input, caret_pos))
    }

    pub fn get_status(&self) -> Option<Status> {
        let session = self.session()?;
        let raw = self.api.get_status(session)?;
        let buffer = NativeBuffer::new(&self.api, raw, A::free_status);
        Some(Status::project(&buffer))
    }

    // ========== Options and properties ==========

    /// Set an option, first saving it to the user config when the `default`
    /// config lists it under `switcher/save_options`.
    pub fn set_option(&self, name: &str, value: bool) {
        let Some(session) = self.session() else {
            return;
        };
        if settings::is_persisted_option(&self.api, name) {
            settings::persist_option(&self.api, name, value);
        }
        self.api.set_option(session, name, value);
    }

    pub fn get_option(&self, name: &str) -> bool {
        self.session().is_some_and(|s| self.api.get_option(s, name))
    }

    /// Errors if the value contains a NUL byte.
    pub fn set_property(&self, name: &str, value: &str) -> Result<()> {
        error::check_text("property value", value)?;
        if let Some(session) = self.session() {
            self.api.set_property(session, name, value);
        }
        Ok(())
    }

    pub fn get_property(&self, name: &str) -> Option<String> {
        self.session().and_then(|s| self.api.get_property(s, name))
    }

    // ========== Schema ==========

    pub fn schema_list(&self) -> Vec<SchemaListItem> {
        if !self.is_running() {
            return Vec::new();
        }
        self.api
            .get_schema_list()
            .map(SchemaListItem::from_raw_list)
            .unwrap_or_default()
    }

    pub fn current_schema(&self) -> Option<String> {
        self.session().and_then(|s| self.api.get_current_schema(s))
    }

    /// Switch schema. The selection is recorded in the user config even if
    /// the engine rejects the switch.
    pub fn select_schema(&self, schema_id: &str) -> bool {
        let Some(session) = self.session() else {
            return false;
        };
        if !settings::record_schema_selection(&self.api, schema_id) {
            tracing::warn!(schema_id, "could not record schema selection");
        }
        self.api.select_schema(session, schema_id)
    }

    pub fn schema_info(&self, schema_id: &str) -> Option<SchemaInfo> {
        if !self.is_running() {
            return None;
        }
        SchemaInfo::read(&self.api, schema_id)
    }

    // ========== Configuration store ==========

    fn open_config(&self, config_id: &str) -> Option<ConfigGuard<'_, A>> {
        if !self.is_running() {
            return None;
        }
        ConfigGuard::open(&self.api, config_id)
    }

    pub fn config_get_bool(&self, config_id: &str, key: &str) -> Option<bool> {
        self.open_config(config_id)?.get_bool(key)
    }

    pub fn config_get_int(&self, config_id: &str, key: &str) -> Option<i32> {
        self.open_config(config_id)?.get_int(key)
    }

    pub fn config_get_double(&self, config_id: &str, key: &str) -> Option<f64> {
        self.open_config(config_id)?.get_double(key)
    }

    pub fn config_get_string(&self, config_id: &str, key: &str) -> Option<String> {
        self.open_config(config_id)?.get_string(key)
    }

    pub fn config_set_bool(&self, config_id: &str, key: &str, value: bool) -> bool {
        self.open_config(config_id)
            .is_some_and(|c| c.set_bool(key, value))
    }

    pub fn config_set_int(&self, config_id: &str, key: &str, value: i32) -> bool {
        self.open_config(config_id)
            .is_some_and(|c| c.set_int(key, value))
    }

    pub fn config_set_double(&self, config_id: &str, key: &str, value: f64) -> bool {
        self.open_config(config_id)
            .is_some_and(|c| c.set_double(key, value))
    }

    pub fn config_set_string(&self, config_id: &str, key: &str, value: &str) -> bool {
        self.open_config(config_id)
            .is_some_and(|c| c.set_string(key, value))
    }

    pub fn config_list_size(&self, config_id: &str, key: &str) -> usize {
        self.open_config(config_id).map_or(0, |c| c.list_size(key))
    }

    /// Decode any node of a deployed config.
    pub fn config_get_value(&self, config_id: &str, key: &str) -> Option<ConfigValue> {
        value::decode(&self.open_config(config_id)?, key)
    }

    pub fn config_get_list(&self, config_id: &str, key: &str) -> Option<Vec<ConfigValue>> {
        value::decode_list(&self.open_config(config_id)?, key)
    }

    pub fn config_get_map(&self, config_id: &str, key: &str) -> Option<indexmap::IndexMap<String, ConfigValue>> {
        value::decode_map(&self.open_config(config_id)?, key)
    }

    /// Decode any node of a deployed schema config.
    pub fn schema_get_value(&self, schema_id: &str, key: &str) -> Option<ConfigValue> {
        if !self.is_running() {
            return None;
        }
        ConfigGuard::open_schema(&self.api, schema_id)?.get_value(key)
    }

    // ========== Custom settings ==========

    fn edit_settings(&self, config_id: &str) -> Option<SettingsEditor<'_, A>> {
        if !self.is_running() {
            return None;
        }
        SettingsEditor::open(&self.api, config_id, &self.config.settings_generator_id)
    }

    pub fn customize_bool(&self, config_id: &str, key: &str, value: bool) -> bool {
        self.edit_settings(config_id)
            .is_some_and(|mut e| e.set_bool(key, value))
    }

    pub fn customize_int(&self, config_id: &str, key: &str, value: i32) -> bool {
        self.edit_settings(config_id)
            .is_some_and(|mut e| e.set_int(key, value))
    }

    pub fn customize_double(&self, config_id: &str, key: &str, value: f64) -> bool {
        self.edit_settings(config_id)
            .is_some_and(|mut e| e.set_double(key, value))
    }

    pub fn customize_string(&self, config_id: &str, key: &str, value: &str) -> bool {
        self.edit_settings(config_id)
            .is_some_and(|mut e| e.set_string(key, value))
    }

    fn edit_switcher(&self) -> Option<SettingsEditor<'_, A>> {
        if !self.is_running() {
            return None;
        }
        SettingsEditor::open_switcher(&self.api)
    }

    pub fn available_schemas(&self) -> Vec<SchemaListItem> {
        self.edit_switcher()
            .map(|e| e.available_schemas())
            .unwrap_or_default()
    }

    pub fn selected_schemas(&self) -> Vec<SchemaListItem> {
        self.edit_switcher()
            .map(|e| e.selected_schemas())
            .unwrap_or_default()
    }

    /// Enable exactly `schema_ids` in the switcher. Takes effect after the
    /// next deploy.
    pub fn select_schemas(&self, schema_ids: &[&str]) -> bool {
        self.edit_switcher()
            .is_some_and(|mut e| e.select_schemas(schema_ids))
    }

    pub fn version(&self) -> String {
        self.api.get_version()
    }
}

impl<A: RimeApi> Drop for EngineSession<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn engine_dir(dir: String) -> Option<PathBuf> {
    (!dir.is_empty()).then(|| PathBuf::from(dir))
}

/// Prebuild and deploy a workspace without starting a session.
pub fn deploy_workspace<A: RimeApi + ?Sized>(api: &A, traits: &Traits) -> bool {
    api.deployer_initialize(traits);
    let prebuilt = api.prebuild();
    let deployed = api.deploy();
    tracing::info!(prebuilt, deployed, "workspace deployed");
    prebuilt && deployed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryRime;

    fn session() -> EngineSession<MemoryRime> {
        EngineSession::new(MemoryRime::with_sample_data(), Config::default())
    }

    fn start(s: &mut EngineSession<MemoryRime>) {
        s.startup(Path::new("/usr/share/rime-data"), Path::new("/tmp/rime"), false)
            .unwrap();
    }

    #[test]
    fn test_startup_is_idempotent() {
        let mut s = session();
        start(&mut s);
        let first = s.session_id();
        start(&mut s);
        assert_eq!(s.session_id(), first);
        assert_eq!(s.api().call_count("initialize"), 1);
        assert_eq!(s.api().call_count("create_session"), 1);
    }

    #[test]
    fn test_setup_once_initialize_every_start() {
        let mut s = session();
        start(&mut s);
        s.shutdown();
        start(&mut s);
        assert_eq!(s.api().call_count("setup"), 1);
        assert_eq!(s.api().call_count("initialize"), 2);
        assert_eq!(s.api().call_count("finalize"), 1);
    }

    #[test]
    fn test_failed_session_creation_finalizes() {
        let mut s = session();
        s.api().fail_session_creation(true);
        start(&mut s);
        assert_eq!(s.state(), LifecycleState::NotRunning);
        assert!(s.session_id().is_none());
        assert_eq!(s.api().call_count("finalize"), 1);
        assert!(!s.api().has_notification_handler());
    }

    #[test]
    fn test_void_keycodes_never_reach_engine() {
        let mut s = session();
        start(&mut s);
        assert!(!s.process_key(0, 0));
        assert!(!s.process_key(-1, 0));
        assert!(!s.process_key(VOID_SYMBOL, 0));
        assert_eq!(s.api().call_count("process_key"), 0);
        assert!(s.process_key('n' as i32, 0));
        assert_eq!(s.api().call_count("process_key"), 1);
    }

    #[test]
    fn test_snapshot_buffers_released() {
        let mut s = session();
        start(&mut s);
        s.process_key('n' as i32, 0);
        s.process_key('i' as i32, 0);
        let ctx = s.get_context().unwrap();
        assert_eq!(ctx.raw_input, "ni");
        assert_eq!(ctx.caret_pos, 2);
        assert!(ctx.has_menu());
        assert!(s.get_status().unwrap().is_composing);
        assert!(s.get_commit().is_none());
        assert_eq!(s.api().outstanding_buffers(), 0);
    }

    #[test]
    fn test_nul_in_key_sequence_is_rejected() {
        let mut s = session();
        start(&mut s);
        assert!(s.simulate_key_sequence("ni\0hao").is_err());
        assert!(s.simulate_key_sequence("nihao").unwrap());
        assert!(s.set_property("client_app", "a\0b").is_err());
    }

    #[test]
    fn test_drop_shuts_down() {
        let api = MemoryRime::with_sample_data();
        let observer = api.clone();
        {
            let mut s = EngineSession::new(api, Config::default());
            start(&mut s);
            assert_eq!(observer.live_sessions(), 1);
        }
        assert_eq!(observer.live_sessions(), 0);
        assert_eq!(observer.call_count("finalize"), 1);
    }

    #[test]
    fn test_deploy_restarts_with_full_check() {
        let mut s = session();
        start(&mut s);
        assert!(s.deploy().unwrap());
        assert_eq!(s.api().call_count("join_maintenance_thread"), 1);
        assert!(s.api().maintenance_completed());
    }

    #[test]
    fn test_cleanup_all_sessions_replaces_ours() {
        let mut s = session();
        start(&mut s);
        let first = s.session_id();
        assert!(s.cleanup_all_sessions());
        assert!(s.is_running());
        assert_ne!(s.session_id(), first);
        assert!(s.find_session());
        assert_eq!(s.api().live_sessions(), 1);
    }

    #[test]
    fn test_cleanup_all_sessions_without_new_session_stops() {
        let mut s = session();
        start(&mut s);
        s.api().fail_session_creation(true);
        assert!(!s.cleanup_all_sessions());
        assert_eq!(s.state(), LifecycleState::NotRunning);
        assert!(s.session_id().is_none());
        assert_eq!(s.api().call_count("finalize"), 1);
        assert!(!s.api().has_notification_handler());
    }

    #[test]
    fn test_environment_follows_startup_dirs() {
        let mut s = session();
        start(&mut s);
        assert_eq!(s.shared_data_dir(), Some(PathBuf::from("/usr/share/rime-data")));
        assert_eq!(s.user_data_dir(), Some(PathBuf::from("/tmp/rime")));
        assert_eq!(s.sync_dir(), Some(PathBuf::from("/tmp/rime/sync")));
        assert_eq!(s.user_id().as_deref(), Some("unknown"));
    }

    #[test]
    fn test_run_task() {
        let mut s = session();
        start(&mut s);
        assert!(s.run_task("user_dict_upgrade").unwrap());
        assert!(!s.run_task("no_such_task").unwrap());
        assert!(s.run_task("bad\0name").is_err());
        assert_eq!(s.api().tasks_run(), vec!["user_dict_upgrade".to_string()]);
    }

    #[test]
    fn test_delete_candidate_uses_global_index() {
        let mut s = session();
        start(&mut s);
        s.process_key('n' as i32, 0);
        s.process_key('i' as i32, 0);
        // index 6 sits on the second page of five
        assert!(s.delete_candidate(6));
        assert!(!s.delete_candidate(40));
        assert!(s.select_candidate(6));
        assert_eq!(s.get_commit().unwrap().text, "拟");
    }

    #[test]
    fn test_deploy_workspace() {
        let rime = MemoryRime::with_sample_data();
        assert!(deploy_workspace(&rime, &Traits::default()));
        assert_eq!(rime.call_count("deployer_initialize"), 1);
        assert_eq!(rime.call_count("deploy"), 1);
    }
}
