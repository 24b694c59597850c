//! Events pushed by the gateway between two polls.

use crate::collection::Collection;
use crate::error::SyncResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use switchboard_model::Output;
use tracing::trace;

/// Live state carried by an output change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputState {
    pub on: bool,
    /// Dimmer level, when the output reports one.
    #[serde(default)]
    pub value: Option<u8>,
}

/// A pushed gateway event: `{"type": "OUTPUT_CHANGE", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatewayEvent {
    OutputChange { id: u32, status: OutputState },
}

impl GatewayEvent {
    pub fn from_json(event: &Value) -> SyncResult<Self> {
        Ok(serde_json::from_value(event.clone())?)
    }
}

/// Applies `event` to the outputs it concerns.
///
/// Returns false when the output is unknown or busy with a write of its own.
pub fn apply_event(outputs: &Collection<Output>, event: &GatewayEvent) -> bool {
    match event {
        GatewayEvent::OutputChange { id, status } => match outputs.get_id(i64::from(*id)) {
            Some(output) => output.apply_status(status.on, status.value),
            None => {
                trace!(id, "event for unknown output");
                false
            }
        },
    }
}
