//! rime-bridge-core
//!
//! Boundary layer between a host application and the Rime input method
//! engine. The engine itself (schemas, dictionaries, ranking) is opaque and
//! reached only through the [`RimeApi`] trait; this crate owns what sits on
//! top of it.
//!
//! Public API:
//! - `EngineSession` - Engine lifecycle and the single active session
//! - `NotificationBridge` / `NotificationReceiver` - Engine callbacks routed
//!   through a bounded channel to a host-owned thread
//! - `ConfigValue` - Generic value tree decoded from engine configs
//! - `Context`, `Menu`, `Candidate` - Display-ready snapshots with labels
//! - `SettingsEditor` - Scoped edits of persisted settings
//! - `Config` - Bridge configuration, loadable from TOML
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod api;
pub use api::{RimeApi, SessionId, Traits};

pub mod error;
pub use error::BridgeError;

pub mod store;
pub use store::{ConfigEntry, ConfigGuard, ConfigKind};

pub mod value;
pub use value::ConfigValue;

pub mod candidate;
pub use candidate::{Candidate, LabelRule};

pub mod context;
pub use context::{Commit, Composition, Context, Menu, Status};

pub mod notification;
pub use notification::{
    ActiveSession, Delivery, DeployState, Notification, NotificationBridge, NotificationEvent,
    NotificationReceiver, NotificationSink,
};

pub mod schema;
pub use schema::{SchemaInfo, SchemaListItem, SchemaSwitch};

pub mod settings;
pub use settings::SettingsEditor;

pub mod session;
pub use session::{EngineSession, LifecycleState};

pub mod testing;

/// Configuration of the bridge itself.
///
/// Engine behaviour (page size, select keys, saved options) lives in the
/// engine's own YAML configs and is read through the session; this struct
/// only covers what the host decides before the engine starts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Read-only data shipped with the application (prebuilt schemas).
    pub shared_data_dir: PathBuf,
    /// Writable data: user dictionaries, custom patches, `user.yaml`.
    pub user_data_dir: PathBuf,

    /// Identity reported to the engine at setup
    pub app_name: String,
    pub distribution_name: String,
    pub distribution_code_name: String,
    pub distribution_version: String,

    /// Force a full maintenance check on `start` even if nothing changed.
    pub full_check: bool,

    /// Maximum queued notifications before new ones are dropped.
    pub notification_capacity: usize,

    /// Trailing character appended to labels for display, e.g. `"."`.
    pub label_separator: Option<char>,

    /// Generator id written into custom settings files.
    pub settings_generator_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shared_data_dir: PathBuf::from("rime-data"),
            user_data_dir: PathBuf::from("rime"),
            app_name: "rime.bridge".to_string(),
            distribution_name: "Rime".to_string(),
            distribution_code_name: "rime-bridge".to_string(),
            distribution_version: env!("CARGO_PKG_VERSION").to_string(),
            full_check: false,
            notification_capacity: 15,
            label_separator: None,
            settings_generator_id: settings::DEFAULT_GENERATOR_ID.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Labels of `context` as they should be shown, with the configured
    /// separator applied.
    pub fn display_labels(&self, context: &Context) -> Vec<String> {
        context
            .menu
            .candidates
            .iter()
            .map(|c| c.display_label(self.label_separator))
            .collect()
    }
}
