use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A snapshot of everything a gateway exposes, loadable from JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayFixture {
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<Value>,
    #[serde(default)]
    pub inputs: Vec<Value>,
    #[serde(default)]
    pub group_actions: Vec<Value>,
    #[serde(default)]
    pub pulse_counters: Vec<Value>,
    #[serde(default)]
    pub apps: Vec<AppFixture>,
}

impl GatewayFixture {
    /// Parses a fixture document.
    pub fn from_json(text: &str) -> ApiResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// An app known to the gateway, installed or available from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppFixture {
    pub name: String,
    pub version: String,
    /// `[kind, version]` pairs, e.g. `["config", "1.0"]`.
    #[serde(default)]
    pub interfaces: Vec<Value>,
    #[serde(default = "default_installed")]
    pub installed: bool,
    /// Configuration schema, an array of field declarations.
    #[serde(default = "empty_array")]
    pub config_description: Value,
    #[serde(default = "empty_object")]
    pub config: Value,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl AppFixture {
    /// The record `get_apps` reports for this app.
    pub fn record(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "version": self.version,
            "interfaces": self.interfaces,
        })
    }
}

fn default_installed() -> bool {
    true
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}
