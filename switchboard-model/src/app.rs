//! Gateway apps (plugins): configuration, logs and lifecycle.

use crate::error::{ModelError, ModelResult};
use crate::mapping::Mapping;
use crate::object::{lock, Entity, FillOutcome, RemoteObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use switchboard_api::GatewayApi;
use switchboard_config::ConfigTree;
use switchboard_refresh::{LoadingFlag, Refresher};
use switchboard_types::EntityKey;
use tracing::{debug, error, info};

/// How often a running log watcher polls.
pub const LOG_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// One `[kind, version]` interface an app implements (`config`, `webui`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInterface(pub String, pub String);

impl AppInterface {
    pub fn kind(&self) -> &str {
        &self.0
    }

    pub fn version(&self) -> &str {
        &self.1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppFields {
    pub version: Option<String>,
    pub interfaces: Vec<AppInterface>,
}

/// One parsed log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp without its fractional seconds.
    pub timestamp: String,
    pub message: String,
}

impl LogEntry {
    /// Splits `"<timestamp> - <message>"`. A line without the separator is
    /// all message.
    pub fn parse(line: &str) -> Self {
        match line.split_once(" - ") {
            Some((timestamp, message)) => Self {
                timestamp: timestamp.split('.').next().unwrap_or_default().to_string(),
                message: message.to_string(),
            },
            None => Self {
                timestamp: String::new(),
                message: line.to_string(),
            },
        }
    }
}

#[derive(Debug)]
struct AppState {
    installed: bool,
    config: Option<ConfigTree>,
    config_initialized: bool,
    config_loaded: bool,
}

#[derive(Debug, Default)]
struct LogTail {
    entries: Vec<LogEntry>,
    last_line: Option<String>,
}

/// An app installed on (or available to) the gateway.
pub struct App {
    object: RemoteObject<AppFields>,
    api: Arc<dyn GatewayApi>,
    state: Mutex<AppState>,
    logs: Mutex<LogTail>,
    logs_loading: LoadingFlag,
    watcher: Mutex<Option<Refresher>>,
}

impl App {
    /// An installed app.
    pub fn new(api: Arc<dyn GatewayApi>, name: impl Into<String>) -> Self {
        Self::with_installed(api, name.into(), true)
    }

    /// An app listed in the store but not installed.
    pub fn available(api: Arc<dyn GatewayApi>, name: impl Into<String>) -> Self {
        Self::with_installed(api, name.into(), false)
    }

    fn with_installed(api: Arc<dyn GatewayApi>, name: String, installed: bool) -> Self {
        let mapping = Mapping::new()
            .field("name", "name")
            .field("version", "version")
            .field("interfaces", "interfaces");
        Self {
            object: RemoteObject::new(name, "name", mapping),
            api,
            state: Mutex::new(AppState {
                installed,
                config: None,
                config_initialized: false,
                config_loaded: false,
            }),
            logs: Mutex::new(LogTail::default()),
            logs_loading: LoadingFlag::new(),
            watcher: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        self.object.key().as_name().unwrap_or_default()
    }

    pub fn object(&self) -> &RemoteObject<AppFields> {
        &self.object
    }

    pub fn version(&self) -> Option<String> {
        self.object.read(|f| f.version.clone())
    }

    pub fn interfaces(&self) -> Vec<AppInterface> {
        self.object.read(|f| f.interfaces.clone())
    }

    /// Lower-cased name, used in URLs.
    pub fn reference(&self) -> String {
        self.name().to_lowercase()
    }

    fn implements(&self, kind: &str) -> bool {
        self.object
            .read(|f| f.interfaces.iter().any(|interface| interface.kind() == kind))
    }

    /// True when the app declares a config interface and its schema has at
    /// least one field.
    pub fn has_config(&self) -> bool {
        self.implements("config")
            && lock(&self.state)
                .config
                .as_ref()
                .is_some_and(ConfigTree::is_configurable)
    }

    pub fn has_web_ui(&self) -> bool {
        self.implements("webui")
    }

    pub fn is_installed(&self) -> bool {
        lock(&self.state).installed
    }

    pub fn is_config_initialized(&self) -> bool {
        lock(&self.state).config_initialized
    }

    pub fn is_config_loaded(&self) -> bool {
        lock(&self.state).config_loaded
    }

    /// Reads the configuration tree, if initialized.
    pub fn with_config<R>(&self, f: impl FnOnce(&ConfigTree) -> R) -> Option<R> {
        lock(&self.state).config.as_ref().map(f)
    }

    /// Edits the configuration tree, if initialized.
    pub fn with_config_mut<R>(&self, f: impl FnOnce(&mut ConfigTree) -> R) -> Option<R> {
        lock(&self.state).config.as_mut().map(f)
    }

    /// Fetches the configuration schema and builds the tree. Does nothing
    /// once the tree exists.
    pub async fn initialize_config(&self) -> ModelResult<()> {
        if self.is_config_initialized() {
            return Ok(());
        }
        let result = async {
            let description = self.api.get_config_description(self.name()).await?;
            let mut tree = ConfigTree::for_owner(self.name());
            tree.set_structure_json(&description)?;
            Ok::<_, ModelError>(tree)
        }
        .await;
        match result {
            Ok(tree) => {
                debug!(app = self.name(), fields = tree.len(), "config initialized");
                let mut state = lock(&self.state);
                state.config = Some(tree);
                state.config_initialized = true;
                Ok(())
            }
            Err(e) => {
                error!(app = self.name(), error = %e, "could not get config description");
                Err(e)
            }
        }
    }

    /// Fetches the stored configuration into the tree.
    pub async fn load_config(&self) -> ModelResult<()> {
        if !self.is_config_initialized() {
            return Err(ModelError::ConfigNotInitialized(self.name().to_string()));
        }
        let result = match self.api.get_config(self.name()).await {
            Ok(payload) => {
                let mut state = lock(&self.state);
                let applied = match state.config.as_mut() {
                    Some(tree) => tree.set_config(&payload).map_err(ModelError::from),
                    None => Err(ModelError::ConfigNotInitialized(self.name().to_string())),
                };
                if applied.is_ok() {
                    state.config_loaded = true;
                }
                applied
            }
            Err(e) => Err(e.into()),
        };
        if let Err(e) = &result {
            error!(app = self.name(), error = %e, "could not load configuration");
        }
        result
    }

    /// Stores the tree's payload on the gateway.
    pub async fn save_config(&self) -> ModelResult<()> {
        let payload = self
            .with_config(ConfigTree::get_config)
            .ok_or_else(|| ModelError::ConfigNotInitialized(self.name().to_string()))?;
        let text = serde_json::to_string(&payload)?;
        self.api.set_config(self.name(), &text).await.map_err(|e| {
            error!(app = self.name(), error = %e.message(), "could not save configuration");
            e.into()
        })
    }

    /// Log entries collected so far.
    pub fn logs(&self) -> Vec<LogEntry> {
        lock(&self.logs).entries.clone()
    }

    /// Fetches the log and appends the lines not seen yet.
    ///
    /// Returns the number of new entries. Returns 0 without a remote call when
    /// a previous load is still running.
    pub async fn load_logs(&self) -> ModelResult<usize> {
        let Some(_loading) = self.logs_loading.try_begin() else {
            return Ok(0);
        };
        let text = self.api.get_app_logs(self.name()).await.map_err(|e| {
            error!(app = self.name(), error = %e.message(), "could not fetch logs");
            ModelError::from(e)
        })?;

        let lines: Vec<&str> = text.trim().lines().filter(|line| !line.is_empty()).collect();
        let mut tail = lock(&self.logs);
        // Resume after the last line seen; if it scrolled out, take everything.
        let start = tail
            .last_line
            .as_deref()
            .and_then(|last| lines.iter().position(|line| *line == last))
            .map_or(0, |index| index + 1);
        let fresh = &lines[start..];
        for line in fresh {
            tail.entries.push(LogEntry::parse(line));
        }
        if let Some(last) = fresh.last() {
            tail.last_line = Some((*last).to_string());
        }
        Ok(fresh.len())
    }

    pub fn is_loading_logs(&self) -> bool {
        self.logs_loading.is_loading()
    }

    /// Starts polling the log every [`LOG_WATCH_INTERVAL`] and loads it once
    /// right away. Must be called from within a tokio runtime.
    pub fn start_log_watcher(self: &Arc<Self>) {
        self.watch_logs_every(LOG_WATCH_INTERVAL);
    }

    /// Like [`App::start_log_watcher`] with a custom interval. An existing
    /// watcher is restarted at the new interval.
    pub fn watch_logs_every(self: &Arc<Self>, interval: Duration) {
        let mut watcher = lock(&self.watcher);
        if let Some(refresher) = watcher.as_mut() {
            if refresher.interval() != interval {
                refresher.set_interval(interval);
            }
        }
        let refresher = watcher.get_or_insert_with(|| {
            let app: Weak<Self> = Arc::downgrade(self);
            Refresher::new(interval, move || {
                let app = app.clone();
                async move {
                    if let Some(app) = app.upgrade() {
                        let _ = app.load_logs().await;
                    }
                }
            })
        });
        refresher.start();
        refresher.run();
    }

    pub fn stop_log_watcher(&self) {
        if let Some(refresher) = lock(&self.watcher).as_mut() {
            refresher.stop();
        }
    }

    pub fn is_watching_logs(&self) -> bool {
        lock(&self.watcher).as_ref().is_some_and(Refresher::is_running)
    }

    /// Installs the app from the store. Does nothing if already installed.
    pub async fn install_from_store(&self) -> ModelResult<()> {
        if self.is_installed() {
            return Ok(());
        }
        self.api.install_app(self.name()).await?;
        lock(&self.state).installed = true;
        info!(app = self.name(), "app installed");
        Ok(())
    }

    /// Uninstalls the app and forgets its configuration.
    pub async fn remove(&self) -> ModelResult<()> {
        self.api.remove_app(self.name()).await?;
        self.stop_log_watcher();
        {
            let mut state = lock(&self.state);
            state.installed = false;
            state.config = None;
            state.config_initialized = false;
            state.config_loaded = false;
        }
        lock(&self.logs).last_line = None;
        info!(app = self.name(), "app removed");
        Ok(())
    }
}

impl Entity for App {
    fn key(&self) -> &EntityKey {
        self.object.key()
    }

    fn fill_data(
        &self,
        record: &Value,
        validate: bool,
        mapping_key: Option<&str>,
    ) -> ModelResult<FillOutcome> {
        self.object.fill_data(record, validate, mapping_key)
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name())
            .field("object", &self.object)
            .field("state", &*lock(&self.state))
            .finish_non_exhaustive()
    }
}
