//! In-memory engine for tests and host-side development.
//!
//! `MemoryRime` implements [`RimeApi`] without any native code. It keeps
//! configs as [`ConfigValue`] trees, runs a toy composition model (typed
//! lowercase letters are looked up in a small dictionary), and records enough
//! bookkeeping to check the boundary layer's contracts:
//!
//! - how often each engine call was made (`call_count`)
//! - config containers, iterations and settings that are still open
//! - output buffers handed out but not yet freed
//! - user state (`user.yaml`) and custom patches, which survive `finalize`
//!   the way files on disk would
//!
//! Clones share state, so a test can keep one clone for inspection while an
//! `EngineSession` owns another.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::api::{
    ConfigHandle, ConfigIterator, NotificationHandler, RawCandidate, RawCommit, RawComposition,
    RawContext, RawMenu, RawSchemaListItem, RawStatus, RimeApi, SessionId, SettingsHandle, Traits,
};
use crate::store::ConfigKind;
use crate::value::ConfigValue;

const DEFAULT_PAGE_SIZE: usize = 5;
const FIRST_SESSION: usize = 0x1000;
const USER_ID: &str = "unknown";

/// Deployment tasks `run_task` accepts.
const TASKS: &[&str] = &[
    "installation_update",
    "workspace_update",
    "user_dict_upgrade",
    "user_dict_sync",
    "backup_config_files",
    "clean_old_log_files",
    "cleanup_trash",
];

const SAMPLE_DEFAULT: &str = r#"{
    "config_version": "0.40",
    "schema_list": [{"schema": "luna_pinyin"}, {"schema": "cangjie5"}],
    "switcher": {"save_options": ["full_shape", "ascii_punct", "simplification"]},
    "menu": {"page_size": "5"}
}"#;

const SAMPLE_LUNA: &str = r#"{
    "schema": {"schema_id": "luna_pinyin", "name": "朙月拼音", "version": "0.15"},
    "switches": [
        {"name": "ascii_mode", "reset": "0", "states": ["中文", "西文"]},
        {"name": "full_shape", "states": ["半角", "全角"]},
        {"name": "simplification", "states": ["漢字", "汉字"]}
    ],
    "menu": {"page_size": "5"}
}"#;

const SAMPLE_CANGJIE: &str = r#"{
    "schema": {"schema_id": "cangjie5", "name": "倉頡五代"},
    "menu": {"alternative_select_labels": ["①", "②", "③", "④", "⑤"]}
}"#;

#[derive(Debug, Default)]
struct FakeSession {
    input: String,
    caret: usize,
    page_no: usize,
    highlighted: usize,
    options: HashMap<String, bool>,
    properties: HashMap<String, String>,
    schema_id: Option<String>,
    commit: Option<String>,
}

#[derive(Debug)]
struct PendingSettings {
    config_id: String,
    staged: Vec<(String, ConfigValue)>,
    selection: Option<Vec<String>>,
}

#[derive(Default)]
struct State {
    calls: HashMap<&'static str, usize>,
    handler: Option<NotificationHandler>,
    traits: Option<Traits>,
    tasks_run: Vec<String>,

    configs: HashMap<String, ConfigValue>,
    schemas: IndexMap<String, ConfigValue>,
    user: HashMap<String, ConfigValue>,
    customs: HashMap<String, IndexMap<String, ConfigValue>>,
    dictionary: HashMap<String, Vec<String>>,

    next_token: u64,
    open_configs: HashMap<u64, (ConfigKind, String)>,
    open_iterators: HashMap<u64, Vec<(String, String)>>,
    open_settings: HashMap<u64, PendingSettings>,

    sessions: HashMap<usize, FakeSession>,
    next_session: usize,
    fail_create: bool,
    needs_maintenance: bool,
    scripted_context: Option<RawContext>,
    outstanding: usize,
}

impl State {
    fn token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    fn count(&mut self, call: &'static str) {
        *self.calls.entry(call).or_default() += 1;
    }

    fn tree(&self, config: &ConfigHandle) -> Option<&ConfigValue> {
        let (kind, id) = self.open_configs.get(&config.0)?;
        match kind {
            ConfigKind::Config => self.configs.get(id),
            ConfigKind::Schema => self.schemas.get(id),
            ConfigKind::User => self.user.get(id),
        }
    }

    fn tree_mut(&mut self, config: &ConfigHandle) -> Option<&mut ConfigValue> {
        let (kind, id) = self.open_configs.get(&config.0)?.clone();
        match kind {
            ConfigKind::Config => self.configs.get_mut(&id),
            ConfigKind::Schema => self.schemas.get_mut(&id),
            ConfigKind::User => Some(self.user.entry(id).or_insert_with(empty_map)),
        }
    }

    fn node(&self, config: &ConfigHandle, key: &str) -> Option<&ConfigValue> {
        self.tree(config)?.get(key)
    }

    fn set(&mut self, config: &ConfigHandle, key: &str, value: String) -> bool {
        match self.tree_mut(config) {
            Some(tree) => assign(tree, key, ConfigValue::Scalar(value)),
            None => false,
        }
    }

    fn begin(&mut self, entries: Vec<(String, String)>) -> ConfigIterator {
        let token = self.token();
        self.open_iterators.insert(token, entries);
        ConfigIterator::new(token)
    }

    fn schema_name(&self, schema_id: &str) -> Option<String> {
        self.schemas
            .get(schema_id)?
            .get("schema/name")?
            .as_str()
            .map(str::to_string)
    }

    fn selected_schema_ids(&self) -> Option<Vec<String>> {
        let list = self.configs.get("default")?.get("schema_list")?.as_list()?;
        Some(
            list.iter()
                .filter_map(|item| item.get("schema").and_then(ConfigValue::as_str))
                .map(str::to_string)
                .collect(),
        )
    }

    fn schema_items(&self, ids: &[String]) -> Vec<RawSchemaListItem> {
        ids.iter()
            .map(|id| RawSchemaListItem {
                schema_id: id.clone(),
                name: self.schema_name(id),
            })
            .collect()
    }

    /// Menu setting from the session's schema, then from `default`.
    fn menu_setting(&self, schema_id: Option<&str>, key: &str) -> Option<&ConfigValue> {
        let path = format!("menu/{key}");
        schema_id
            .and_then(|id| self.schemas.get(id))
            .and_then(|schema| schema.get(&path))
            .or_else(|| self.configs.get("default").and_then(|d| d.get(&path)))
    }

    fn page_size(&self, schema_id: Option<&str>) -> usize {
        self.menu_setting(schema_id, "page_size")
            .and_then(ConfigValue::as_int)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    fn candidates(&self, input: &str) -> Vec<String> {
        match self.dictionary.get(input) {
            Some(words) => words.clone(),
            None if input.is_empty() => Vec::new(),
            None => vec![input.to_string()],
        }
    }

    fn context(&self, session: &FakeSession) -> RawContext {
        let schema_id = session.schema_id.as_deref();
        let page_size = self.page_size(schema_id);
        let all = self.candidates(&session.input);
        let start = (session.page_no * page_size).min(all.len());
        let end = (start + page_size).min(all.len());
        let page: Vec<RawCandidate> = all[start..end]
            .iter()
            .map(|text| RawCandidate {
                text: text.clone(),
                comment: None,
            })
            .collect();
        let select_labels = self
            .menu_setting(schema_id, "alternative_select_labels")
            .and_then(ConfigValue::as_list)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(ConfigValue::as_str)
                    .map(str::to_string)
                    .collect()
            });
        let select_keys = self
            .menu_setting(schema_id, "alternative_select_keys")
            .and_then(ConfigValue::as_str)
            .map(str::to_string);
        let input_len = i32::try_from(session.input.len()).unwrap_or(i32::MAX);
        RawContext {
            composition: RawComposition {
                length: input_len,
                cursor_pos: i32::try_from(session.caret).unwrap_or(i32::MAX),
                sel_start: 0,
                sel_end: input_len,
                preedit: (!session.input.is_empty()).then(|| session.input.clone()),
            },
            menu: RawMenu {
                page_size: i32::try_from(page_size).unwrap_or(i32::MAX),
                page_no: i32::try_from(session.page_no).unwrap_or(0),
                is_last_page: end >= all.len(),
                highlighted_candidate_index: i32::try_from(session.highlighted).unwrap_or(0),
                num_candidates: i32::try_from(page.len()).unwrap_or(0),
                candidates: page,
                select_keys,
            },
            commit_text_preview: all.first().cloned(),
            select_labels,
        }
    }
}

fn empty_map() -> ConfigValue {
    ConfigValue::Map(IndexMap::new())
}

fn list_index(len: usize, segment: &str) -> Option<usize> {
    let index = segment.strip_prefix('@').unwrap_or(segment);
    if index == "last" {
        len.checked_sub(1)
    } else {
        index.parse().ok()
    }
}

fn child_mut<'a>(node: &'a mut ConfigValue, segment: &str) -> Option<&'a mut ConfigValue> {
    if matches!(node, ConfigValue::Scalar(_) | ConfigValue::Null) {
        *node = empty_map();
    }
    match node {
        ConfigValue::Map(entries) => Some(entries.entry(segment.to_string()).or_insert_with(empty_map)),
        ConfigValue::List(items) => {
            let index = list_index(items.len(), segment)?;
            items.get_mut(index)
        }
        ConfigValue::Scalar(_) | ConfigValue::Null => None,
    }
}

/// Write `value` at `path`, creating maps along the way.
fn assign(root: &mut ConfigValue, path: &str, value: ConfigValue) -> bool {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return true;
    };
    let mut node = root;
    for segment in parents {
        node = match child_mut(node, segment) {
            Some(child) => child,
            None => return false,
        };
    }
    if matches!(node, ConfigValue::Scalar(_) | ConfigValue::Null) {
        *node = empty_map();
    }
    match node {
        ConfigValue::Map(entries) => {
            entries.insert(last.to_string(), value);
            true
        }
        ConfigValue::List(items) => match list_index(items.len(), last) {
            Some(index) if index < items.len() => {
                items[index] = value;
                true
            }
            _ => false,
        },
        ConfigValue::Scalar(_) | ConfigValue::Null => false,
    }
}

fn child_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{parent}/{child}")
    }
}

struct Inner {
    state: Mutex<State>,
    maintenance: Mutex<Option<JoinHandle<()>>>,
    maintenance_done: Arc<AtomicBool>,
}

/// In-memory [`RimeApi`] implementation.
#[derive(Clone)]
pub struct MemoryRime {
    inner: Arc<Inner>,
}

impl Default for MemoryRime {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRime {
    /// An engine with no configs, schemas or dictionary.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    next_session: FIRST_SESSION,
                    ..Default::default()
                }),
                maintenance: Mutex::new(None),
                maintenance_done: Arc::new(AtomicBool::new(false)),
            }),
        }
    }

    /// An engine with a `default` config, two schemas and a few words.
    pub fn with_sample_data() -> Self {
        let rime = Self::new();
        let loaded = rime
            .load_config("default", SAMPLE_DEFAULT)
            .and_then(|_| rime.load_schema("luna_pinyin", SAMPLE_LUNA))
            .and_then(|_| rime.load_schema("cangjie5", SAMPLE_CANGJIE));
        if let Err(e) = loaded {
            tracing::error!("sample data is not valid JSON: {e}");
        }
        rime.add_words(
            "ni",
            &["你", "呢", "泥", "尼", "妮", "倪", "腻", "拟", "逆", "溺", "昵", "霓"],
        );
        rime.add_words("hao", &["好", "号", "毫"]);
        rime.add_words("nihao", &["你好", "妳好"]);
        rime
    }

    fn lock(&self) -> parking_lot::MutexGuard<'_, State> {
        self.inner.state.lock()
    }

    /// Install a deployed config from JSON. Scalars must be JSON strings.
    pub fn load_config(&self, config_id: &str, json: &str) -> serde_json::Result<()> {
        let tree: ConfigValue = serde_json::from_str(json)?;
        self.lock().configs.insert(config_id.to_string(), tree);
        Ok(())
    }

    /// Install a deployed schema from JSON. Scalars must be JSON strings.
    pub fn load_schema(&self, schema_id: &str, json: &str) -> serde_json::Result<()> {
        let tree: ConfigValue = serde_json::from_str(json)?;
        self.lock().schemas.insert(schema_id.to_string(), tree);
        Ok(())
    }

    /// Candidates offered for `input`. Unknown input offers itself.
    pub fn add_words(&self, input: &str, words: &[&str]) {
        self.lock()
            .dictionary
            .insert(input.to_string(), words.iter().map(|w| w.to_string()).collect());
    }

    /// Make the next `create_session` calls fail.
    pub fn fail_session_creation(&self, fail: bool) {
        self.lock().fail_create = fail;
    }

    /// Run maintenance on the next startup even without a full check.
    pub fn require_maintenance(&self) {
        self.lock().needs_maintenance = true;
    }

    /// Return this context from `get_context` instead of the computed one.
    pub fn script_context(&self, context: Option<RawContext>) {
        self.lock().scripted_context = context;
    }

    /// Invoke the registered notification handler on the calling thread.
    pub fn emit(&self, session_id: usize, message_type: &str, value: &str) {
        let handler = self.lock().handler.clone();
        if let Some(handler) = handler {
            (*handler)(session_id, message_type, value);
        }
    }

    /// Invoke the registered notification handler from a new thread, the
    /// way the engine's worker threads do.
    pub fn emit_from_thread(&self, session_id: usize, message_type: &str, value: &str) -> JoinHandle<()> {
        let handler = self.lock().handler.clone();
        let message_type = message_type.to_string();
        let value = value.to_string();
        std::thread::spawn(move || {
            if let Some(handler) = handler {
                (*handler)(session_id, &message_type, &value);
            }
        })
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.lock().calls.get(call).copied().unwrap_or(0)
    }

    pub fn has_notification_handler(&self) -> bool {
        self.lock().handler.is_some()
    }

    pub fn open_configs(&self) -> usize {
        self.lock().open_configs.len()
    }

    pub fn open_iterators(&self) -> usize {
        self.lock().open_iterators.len()
    }

    pub fn open_settings(&self) -> usize {
        self.lock().open_settings.len()
    }

    /// Output buffers handed out and not yet freed.
    pub fn outstanding_buffers(&self) -> usize {
        self.lock().outstanding
    }

    pub fn live_sessions(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Deployment tasks the engine accepted, in order.
    pub fn tasks_run(&self) -> Vec<String> {
        self.lock().tasks_run.clone()
    }

    pub fn maintenance_completed(&self) -> bool {
        self.inner.maintenance_done.load(Ordering::Acquire)
    }

    /// A saved custom patch entry, as text.
    pub fn custom_value(&self, config_id: &str, key: &str) -> Option<String> {
        self.lock()
            .customs
            .get(config_id)?
            .get(key)?
            .as_str()
            .map(str::to_string)
    }

    /// A node of a user state config.
    pub fn user_value(&self, config_id: &str, key: &str) -> Option<ConfigValue> {
        self.lock().user.get(config_id)?.get(key).cloned()
    }

    fn notify(&self, session_id: usize, message_type: &str, value: &str) {
        self.emit(session_id, message_type, value);
    }

    fn with_session<R>(&self, session: SessionId, f: impl FnOnce(&mut FakeSession) -> R) -> Option<R> {
        self.lock().sessions.get_mut(&session.get()).map(f)
    }

    /// Commit the candidate at `index` of all candidates for the current input.
    fn commit_candidate(&self, session: SessionId, index: usize) -> bool {
        let mut state = self.lock();
        let input = match state.sessions.get(&session.get()) {
            Some(s) => s.input.clone(),
            None => return false,
        };
        let Some(text) = state.candidates(&input).get(index).cloned() else {
            return false;
        };
        if let Some(s) = state.sessions.get_mut(&session.get()) {
            s.commit = Some(text);
            s.input.clear();
            s.caret = 0;
            s.page_no = 0;
            s.highlighted = 0;
        }
        true
    }

    fn page_size_for(&self, session: SessionId) -> usize {
        let state = self.lock();
        let schema_id = state
            .sessions
            .get(&session.get())
            .and_then(|s| s.schema_id.clone());
        state.page_size(schema_id.as_deref())
    }
}

impl RimeApi for MemoryRime {
    fn setup(&self, traits: &Traits) {
        let mut state = self.lock();
        state.count("setup");
        state.traits = Some(traits.clone());
    }

    fn set_notification_handler(&self, handler: Option<NotificationHandler>) {
        self.lock().handler = handler;
    }

    fn initialize(&self, traits: &Traits) {
        let mut state = self.lock();
        state.count("initialize");
        state.traits = Some(traits.clone());
    }

    fn finalize(&self) {
        let mut state = self.lock();
        state.count("finalize");
        state.sessions.clear();
    }

    fn start_maintenance(&self, full_check: bool) -> bool {
        let handler = {
            let mut state = self.lock();
            state.count("start_maintenance");
            if !full_check && !state.needs_maintenance {
                return false;
            }
            state.needs_maintenance = false;
            state.handler.clone()
        };
        let done = Arc::clone(&self.inner.maintenance_done);
        done.store(false, Ordering::Release);
        let worker = std::thread::spawn(move || {
            if let Some(handler) = &handler {
                (**handler)(0, "deploy", "start");
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
            done.store(true, Ordering::Release);
            if let Some(handler) = &handler {
                (**handler)(0, "deploy", "success");
            }
        });
        *self.inner.maintenance.lock() = Some(worker);
        true
    }

    fn is_maintenance_mode(&self) -> bool {
        self.inner
            .maintenance
            .lock()
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    fn join_maintenance_thread(&self) {
        self.lock().count("join_maintenance_thread");
        let worker = self.inner.maintenance.lock().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                tracing::error!("maintenance thread panicked");
            }
        }
    }

    fn deployer_initialize(&self, _traits: &Traits) {
        self.lock().count("deployer_initialize");
    }

    fn prebuild(&self) -> bool {
        self.lock().count("prebuild");
        true
    }

    fn deploy(&self) -> bool {
        self.lock().count("deploy");
        true
    }

    fn deploy_schema(&self, schema_file: &str) -> bool {
        let mut state = self.lock();
        state.count("deploy_schema");
        let schema_id = schema_file.trim_end_matches(".schema.yaml");
        state.schemas.contains_key(schema_id)
    }

    fn deploy_config_file(&self, file_name: &str, _version_key: &str) -> bool {
        let mut state = self.lock();
        state.count("deploy_config_file");
        let config_id = file_name.trim_end_matches(".yaml");
        state.configs.contains_key(config_id)
    }

    fn sync_user_data(&self) -> bool {
        self.lock().count("sync_user_data");
        true
    }

    fn run_task(&self, task_name: &str) -> bool {
        let mut state = self.lock();
        state.count("run_task");
        if !TASKS.contains(&task_name) {
            return false;
        }
        state.tasks_run.push(task_name.to_string());
        true
    }

    fn create_session(&self) -> Option<SessionId> {
        let mut state = self.lock();
        state.count("create_session");
        if state.fail_create {
            return None;
        }
        let raw = state.next_session;
        state.next_session += 1;

        let mut session = FakeSession::default();
        if let Some(saved) = state
            .user
            .get("user")
            .and_then(|user| user.get("var/option"))
            .and_then(ConfigValue::as_map)
        {
            for (name, value) in saved {
                if let Some(enabled) = value.as_bool() {
                    session.options.insert(name.clone(), enabled);
                }
            }
        }
        session.schema_id = state
            .user
            .get("user")
            .and_then(|user| user.get("var/previously_selected_schema"))
            .and_then(ConfigValue::as_str)
            .map(str::to_string)
            .or_else(|| state.selected_schema_ids().and_then(|ids| ids.into_iter().next()));
        state.sessions.insert(raw, session);
        SessionId::from_raw(raw)
    }

    fn find_session(&self, session: SessionId) -> bool {
        self.lock().sessions.contains_key(&session.get())
    }

    fn destroy_session(&self, session: SessionId) -> bool {
        self.lock().sessions.remove(&session.get()).is_some()
    }

    fn cleanup_stale_sessions(&self) {
        self.lock().count("cleanup_stale_sessions");
    }

    fn cleanup_all_sessions(&self) {
        let mut state = self.lock();
        state.count("cleanup_all_sessions");
        state.sessions.clear();
    }

    fn process_key(&self, session: SessionId, keycode: i32, mask: i32) -> bool {
        self.lock().count("process_key");
        if mask != 0 {
            return false;
        }
        let page_size = self.page_size_for(session);
        let composing = self
            .with_session(session, |s| !s.input.is_empty())
            .unwrap_or(false);
        match keycode {
            0x61..=0x7a => self
                .with_session(session, |s| {
                    if let Some(c) = char::from_u32(keycode as u32) {
                        s.input.push(c);
                        s.caret = s.input.len();
                        s.page_no = 0;
                        s.highlighted = 0;
                    }
                    true
                })
                .unwrap_or(false),
            // BackSpace
            0xff08 if composing => self
                .with_session(session, |s| {
                    s.input.pop();
                    s.caret = s.input.len();
                    true
                })
                .unwrap_or(false),
            // Escape
            0xff1b if composing => self
                .with_session(session, |s| {
                    s.input.clear();
                    s.caret = 0;
                    true
                })
                .unwrap_or(false),
            // Return commits the raw input
            0xff0d if composing => self
                .with_session(session, |s| {
                    s.commit = Some(std::mem::take(&mut s.input));
                    s.caret = 0;
                    true
                })
                .unwrap_or(false),
            0x20 if composing => {
                let index = self
                    .with_session(session, |s| s.page_no * page_size + s.highlighted)
                    .unwrap_or(0);
                self.commit_candidate(session, index)
            }
            0x31..=0x39 if composing => {
                let offset = (keycode - 0x31) as usize;
                self.select_candidate_on_current_page(session, offset);
                true
            }
            // Page_Up / Page_Down
            0xff55 if composing => self
                .with_session(session, |s| {
                    s.page_no = s.page_no.saturating_sub(1);
                    true
                })
                .unwrap_or(false),
            0xff56 if composing => self
                .with_session(session, |s| {
                    s.page_no += 1;
                    true
                })
                .unwrap_or(false),
            _ => false,
        }
    }

    fn commit_composition(&self, session: SessionId) -> bool {
        self.with_session(session, |s| {
            if s.input.is_empty() {
                return false;
            }
            s.commit = Some(std::mem::take(&mut s.input));
            s.caret = 0;
            true
        })
        .unwrap_or(false)
    }

    fn clear_composition(&self, session: SessionId) {
        self.with_session(session, |s| {
            s.input.clear();
            s.caret = 0;
            s.page_no = 0;
        });
    }

    fn simulate_key_sequence(&self, session: SessionId, key_sequence: &str) -> bool {
        if !self.find_session(session) {
            return false;
        }
        let mut chars = key_sequence.chars();
        while let Some(c) = chars.next() {
            let keycode = if c == '{' {
                let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
                match name.as_str() {
                    "space" => 0x20,
                    "Return" => 0xff0d,
                    "BackSpace" => 0xff08,
                    "Escape" => 0xff1b,
                    _ => continue,
                }
            } else {
                c as i32
            };
            self.process_key(session, keycode, 0);
        }
        true
    }

    fn get_input(&self, session: SessionId) -> Option<String> {
        self.with_session(session, |s| s.input.clone())
    }

    fn get_caret_pos(&self, session: SessionId) -> usize {
        self.with_session(session, |s| s.caret).unwrap_or(0)
    }

    fn set_caret_pos(&self, session: SessionId, caret_pos: usize) {
        self.with_session(session, |s| s.caret = caret_pos.min(s.input.len()));
    }

    fn select_candidate(&self, session: SessionId, index: usize) -> bool {
        self.commit_candidate(session, index)
    }

    fn select_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool {
        let page_size = self.page_size_for(session);
        let Some(page_no) = self.with_session(session, |s| s.page_no) else {
            return false;
        };
        index < page_size && self.commit_candidate(session, page_no * page_size + index)
    }

    fn delete_candidate(&self, session: SessionId, index: usize) -> bool {
        let mut state = self.lock();
        let Some(input) = state.sessions.get(&session.get()).map(|s| s.input.clone()) else {
            return false;
        };
        match state.dictionary.get_mut(&input) {
            Some(words) if index < words.len() => {
                words.remove(index);
                true
            }
            _ => false,
        }
    }

    fn delete_candidate_on_current_page(&self, session: SessionId, index: usize) -> bool {
        let page_size = self.page_size_for(session);
        let mut state = self.lock();
        let Some((input, page_no)) = state
            .sessions
            .get(&session.get())
            .map(|s| (s.input.clone(), s.page_no))
        else {
            return false;
        };
        let global = page_no * page_size + index;
        match state.dictionary.get_mut(&input) {
            Some(words) if index < page_size && global < words.len() => {
                words.remove(global);
                true
            }
            _ => false,
        }
    }

    fn get_commit(&self, session: SessionId) -> Option<RawCommit> {
        let mut state = self.lock();
        let text = state.sessions.get_mut(&session.get())?.commit.take()?;
        state.outstanding += 1;
        Some(RawCommit { text: Some(text) })
    }

    fn free_commit(&self, _commit: &mut RawCommit) -> bool {
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        true
    }

    fn get_context(&self, session: SessionId) -> Option<RawContext> {
        let mut state = self.lock();
        let context = match &state.scripted_context {
            Some(scripted) => {
                state.sessions.get(&session.get())?;
                scripted.clone()
            }
            None => state.context(state.sessions.get(&session.get())?),
        };
        state.outstanding += 1;
        Some(context)
    }

    fn free_context(&self, _context: &mut RawContext) -> bool {
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        true
    }

    fn get_status(&self, session: SessionId) -> Option<RawStatus> {
        let mut state = self.lock();
        let s = state.sessions.get(&session.get())?;
        let option = |name: &str| s.options.get(name).copied().unwrap_or(false);
        let status = RawStatus {
            schema_id: s.schema_id.clone(),
            schema_name: s.schema_id.as_deref().and_then(|id| state.schema_name(id)),
            is_disabled: false,
            is_composing: !s.input.is_empty(),
            is_ascii_mode: option("ascii_mode"),
            is_full_shape: option("full_shape"),
            is_simplified: option("simplification"),
            is_traditional: !option("simplification"),
            is_ascii_punct: option("ascii_punct"),
        };
        state.outstanding += 1;
        Some(status)
    }

    fn free_status(&self, _status: &mut RawStatus) -> bool {
        let mut state = self.lock();
        state.outstanding = state.outstanding.saturating_sub(1);
        true
    }

    fn set_option(&self, session: SessionId, option: &str, value: bool) {
        let known = self
            .with_session(session, |s| {
                s.options.insert(option.to_string(), value);
            })
            .is_some();
        if known {
            let message = if value {
                option.to_string()
            } else {
                format!("!{option}")
            };
            self.notify(session.get(), "option", &message);
        }
    }

    fn get_option(&self, session: SessionId, option: &str) -> bool {
        self.with_session(session, |s| s.options.get(option).copied().unwrap_or(false))
            .unwrap_or(false)
    }

    fn set_property(&self, session: SessionId, prop: &str, value: &str) {
        let known = self
            .with_session(session, |s| {
                s.properties.insert(prop.to_string(), value.to_string());
            })
            .is_some();
        if known {
            self.notify(session.get(), "property", &format!("{prop}={value}"));
        }
    }

    fn get_property(&self, session: SessionId, prop: &str) -> Option<String> {
        self.with_session(session, |s| s.properties.get(prop).cloned())
            .flatten()
    }

    fn get_schema_list(&self) -> Option<Vec<RawSchemaListItem>> {
        let state = self.lock();
        let ids = state.selected_schema_ids()?;
        Some(state.schema_items(&ids))
    }

    fn get_current_schema(&self, session: SessionId) -> Option<String> {
        self.with_session(session, |s| s.schema_id.clone()).flatten()
    }

    fn select_schema(&self, session: SessionId, schema_id: &str) -> bool {
        let name = {
            let mut state = self.lock();
            if !state.schemas.contains_key(schema_id) {
                return false;
            }
            let name = state.schema_name(schema_id).unwrap_or_else(|| schema_id.to_string());
            match state.sessions.get_mut(&session.get()) {
                Some(s) => {
                    s.schema_id = Some(schema_id.to_string());
                    s.input.clear();
                }
                None => return false,
            }
            name
        };
        self.notify(session.get(), "schema", &format!("{schema_id}/{name}"));
        true
    }

    fn config_open(&self, config_id: &str) -> Option<ConfigHandle> {
        let mut state = self.lock();
        if !state.configs.contains_key(config_id) {
            return None;
        }
        let token = state.token();
        state
            .open_configs
            .insert(token, (ConfigKind::Config, config_id.to_string()));
        Some(ConfigHandle(token))
    }

    fn user_config_open(&self, config_id: &str) -> Option<ConfigHandle> {
        let mut state = self.lock();
        state
            .user
            .entry(config_id.to_string())
            .or_insert_with(empty_map);
        let token = state.token();
        state
            .open_configs
            .insert(token, (ConfigKind::User, config_id.to_string()));
        Some(ConfigHandle(token))
    }

    fn schema_open(&self, schema_id: &str) -> Option<ConfigHandle> {
        let mut state = self.lock();
        if !state.schemas.contains_key(schema_id) {
            return None;
        }
        let token = state.token();
        state
            .open_configs
            .insert(token, (ConfigKind::Schema, schema_id.to_string()));
        Some(ConfigHandle(token))
    }

    fn config_close(&self, config: &ConfigHandle) -> bool {
        self.lock().open_configs.remove(&config.0).is_some()
    }

    fn config_get_bool(&self, config: &ConfigHandle, key: &str) -> Option<bool> {
        self.lock().node(config, key)?.as_bool()
    }

    fn config_get_int(&self, config: &ConfigHandle, key: &str) -> Option<i32> {
        let value = self.lock().node(config, key)?.as_int()?;
        i32::try_from(value).ok()
    }

    fn config_get_double(&self, config: &ConfigHandle, key: &str) -> Option<f64> {
        self.lock().node(config, key)?.as_double()
    }

    fn config_get_string(&self, config: &ConfigHandle, key: &str) -> Option<String> {
        self.lock().node(config, key)?.as_str().map(str::to_string)
    }

    fn config_set_bool(&self, config: &ConfigHandle, key: &str, value: bool) -> bool {
        self.lock().set(config, key, value.to_string())
    }

    fn config_set_int(&self, config: &ConfigHandle, key: &str, value: i32) -> bool {
        self.lock().set(config, key, value.to_string())
    }

    fn config_set_double(&self, config: &ConfigHandle, key: &str, value: f64) -> bool {
        self.lock().set(config, key, value.to_string())
    }

    fn config_set_string(&self, config: &ConfigHandle, key: &str, value: &str) -> bool {
        self.lock().set(config, key, value.to_string())
    }

    fn config_list_size(&self, config: &ConfigHandle, key: &str) -> usize {
        self.lock()
            .node(config, key)
            .and_then(ConfigValue::as_list)
            .map_or(0, <[ConfigValue]>::len)
    }

    fn config_begin_list(&self, config: &ConfigHandle, key: &str) -> Option<ConfigIterator> {
        let mut state = self.lock();
        let len = state.node(config, key)?.as_list()?.len();
        let entries = (0..len)
            .map(|i| (String::new(), child_path(key, &format!("@{i}"))))
            .collect();
        Some(state.begin(entries))
    }

    fn config_begin_map(&self, config: &ConfigHandle, key: &str) -> Option<ConfigIterator> {
        let mut state = self.lock();
        let keys: Vec<String> = state.node(config, key)?.as_map()?.keys().cloned().collect();
        let entries = keys
            .into_iter()
            .map(|k| {
                let path = child_path(key, &k);
                (k, path)
            })
            .collect();
        Some(state.begin(entries))
    }

    fn config_next(&self, iterator: &mut ConfigIterator) -> bool {
        let state = self.lock();
        let Some(entries) = state.open_iterators.get(&iterator.token) else {
            return false;
        };
        let next = usize::try_from(iterator.index + 1).unwrap_or(0);
        match entries.get(next) {
            Some((key, path)) => {
                iterator.index = i32::try_from(next).unwrap_or(i32::MAX);
                iterator.key = key.clone();
                iterator.path = path.clone();
                true
            }
            None => false,
        }
    }

    fn config_end(&self, iterator: &mut ConfigIterator) {
        self.lock().open_iterators.remove(&iterator.token);
    }

    fn custom_settings_init(&self, config_id: &str, _generator_id: &str) -> Option<SettingsHandle> {
        let mut state = self.lock();
        let token = state.token();
        state.open_settings.insert(
            token,
            PendingSettings {
                config_id: config_id.to_string(),
                staged: Vec::new(),
                selection: None,
            },
        );
        Some(SettingsHandle(token))
    }

    fn switcher_settings_init(&self) -> Option<SettingsHandle> {
        self.custom_settings_init("default", "")
    }

    fn load_settings(&self, settings: &SettingsHandle) -> bool {
        let state = self.lock();
        state
            .open_settings
            .get(&settings.0)
            .is_some_and(|p| state.customs.contains_key(&p.config_id))
    }

    fn save_settings(&self, settings: &SettingsHandle) -> bool {
        let mut state = self.lock();
        let Some(pending) = state.open_settings.get_mut(&settings.0) else {
            return false;
        };
        let config_id = pending.config_id.clone();
        let staged = std::mem::take(&mut pending.staged);
        let selection = pending.selection.take();

        let patch = state.customs.entry(config_id.clone()).or_default();
        for (key, value) in staged {
            patch.insert(key, value);
        }
        if let Some(ids) = selection {
            patch.insert(
                "schema_list".to_string(),
                ConfigValue::List(ids.iter().map(|id| ConfigValue::from(id.as_str())).collect()),
            );
            let list = ConfigValue::List(
                ids.iter()
                    .map(|id| {
                        let mut item = IndexMap::new();
                        item.insert("schema".to_string(), ConfigValue::from(id.as_str()));
                        ConfigValue::Map(item)
                    })
                    .collect(),
            );
            let default = state.configs.entry(config_id).or_insert_with(empty_map);
            assign(default, "schema_list", list);
        }
        true
    }

    fn destroy_settings(&self, settings: &SettingsHandle) {
        self.lock().open_settings.remove(&settings.0);
    }

    fn customize_bool(&self, settings: &SettingsHandle, key: &str, value: bool) -> bool {
        self.customize_string(settings, key, &value.to_string())
    }

    fn customize_int(&self, settings: &SettingsHandle, key: &str, value: i32) -> bool {
        self.customize_string(settings, key, &value.to_string())
    }

    fn customize_double(&self, settings: &SettingsHandle, key: &str, value: f64) -> bool {
        self.customize_string(settings, key, &value.to_string())
    }

    fn customize_string(&self, settings: &SettingsHandle, key: &str, value: &str) -> bool {
        match self.lock().open_settings.get_mut(&settings.0) {
            Some(pending) => {
                pending.staged.push((key.to_string(), ConfigValue::from(value)));
                true
            }
            None => false,
        }
    }

    fn available_schemas(&self, settings: &SettingsHandle) -> Option<Vec<RawSchemaListItem>> {
        let state = self.lock();
        state.open_settings.get(&settings.0)?;
        let ids: Vec<String> = state.schemas.keys().cloned().collect();
        Some(state.schema_items(&ids))
    }

    fn selected_schemas(&self, settings: &SettingsHandle) -> Option<Vec<RawSchemaListItem>> {
        let state = self.lock();
        state.open_settings.get(&settings.0)?;
        let ids = state.selected_schema_ids().unwrap_or_default();
        Some(state.schema_items(&ids))
    }

    fn select_schemas(&self, settings: &SettingsHandle, schema_ids: &[&str]) -> bool {
        match self.lock().open_settings.get_mut(&settings.0) {
            Some(pending) => {
                pending.selection = Some(schema_ids.iter().map(|id| id.to_string()).collect());
                true
            }
            None => false,
        }
    }

    fn get_shared_data_dir(&self) -> String {
        self.lock()
            .traits
            .as_ref()
            .map(|t| t.shared_data_dir.clone())
            .unwrap_or_default()
    }

    fn get_user_data_dir(&self) -> String {
        self.lock()
            .traits
            .as_ref()
            .map(|t| t.user_data_dir.clone())
            .unwrap_or_default()
    }

    fn get_sync_dir(&self) -> String {
        let user = self.get_user_data_dir();
        if user.is_empty() {
            return user;
        }
        format!("{}/sync", user.trim_end_matches('/'))
    }

    fn get_user_id(&self) -> String {
        USER_ID.to_string()
    }

    fn get_version(&self) -> String {
        "1.11.2".to_string()
    }
}
