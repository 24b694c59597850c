//! The remote gateway contract.

use crate::error::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which kind of module `flash_leds` should make blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedTarget {
    Output,
    Input,
}

impl LedTarget {
    /// Numeric code the gateway expects.
    pub const fn code(self) -> u8 {
        match self {
            Self::Output => 0,
            Self::Input => 1,
        }
    }
}

/// One async method per remote gateway operation.
///
/// Fetch operations return JSON-shaped records whose field names are the ones
/// the entity mapping tables refer to (`module_type`, `can_led_1_id`, ...).
/// Write operations take the record to store.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Feature flags of the gateway firmware (e.g. `default_timer_disabled`).
    async fn get_features(&self) -> ApiResult<Vec<String>>;

    // ── Outputs ──────────────────────────────────────────────────

    async fn get_output_configurations(&self) -> ApiResult<Vec<Value>>;

    /// Status-only records: `{id, status, dimmer}`.
    async fn get_output_status(&self) -> ApiResult<Vec<Value>>;

    /// Switches an output. `dimmer` and `timer` are only sent when switching on.
    async fn set_output(
        &self,
        id: u32,
        on: bool,
        dimmer: Option<u8>,
        timer: Option<u32>,
    ) -> ApiResult<()>;

    async fn set_output_configuration(&self, config: Value) -> ApiResult<()>;

    /// Makes the LEDs of a module blink so it can be found physically.
    async fn flash_leds(&self, target: LedTarget, id: u32) -> ApiResult<()>;

    // ── Inputs ───────────────────────────────────────────────────

    async fn get_input_configurations(&self) -> ApiResult<Vec<Value>>;

    async fn set_input_configuration(&self, config: Value) -> ApiResult<()>;

    // ── Group actions ────────────────────────────────────────────

    async fn get_group_action_configurations(&self) -> ApiResult<Vec<Value>>;

    async fn do_group_action(&self, id: u32) -> ApiResult<()>;

    // ── Pulse counters ───────────────────────────────────────────

    async fn get_pulse_counter_configurations(&self) -> ApiResult<Vec<Value>>;

    async fn set_pulse_counter_configuration(&self, config: Value) -> ApiResult<()>;

    // ── Apps ─────────────────────────────────────────────────────

    /// Installed apps: `{name, version, interfaces}`.
    async fn get_apps(&self) -> ApiResult<Vec<Value>>;

    /// The configuration schema of an app (an array of field declarations).
    async fn get_config_description(&self, name: &str) -> ApiResult<Value>;

    /// The stored configuration payload of an app.
    async fn get_config(&self, name: &str) -> ApiResult<Value>;

    /// Stores an app configuration, given as a JSON document.
    async fn set_config(&self, name: &str, config: &str) -> ApiResult<()>;

    /// The app's log, one `"<timestamp> - <message>"` entry per line.
    async fn get_app_logs(&self, name: &str) -> ApiResult<String>;

    async fn install_app(&self, name: &str) -> ApiResult<()>;

    async fn remove_app(&self, name: &str) -> ApiResult<()>;
}
