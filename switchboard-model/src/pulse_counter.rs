use crate::error::ModelResult;
use crate::mapping::Mapping;
use crate::object::{Entity, FillOutcome, RemoteObject};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use switchboard_api::GatewayApi;
use switchboard_types::EntityKey;
use tracing::error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseCounterFields {
    /// Input feeding the counter.
    pub input: Option<i64>,
    pub name: Option<String>,
    pub persistent: Option<bool>,
    pub room: Option<i64>,
}

/// A counter of pulses on one input (water, gas, energy meters).
pub struct PulseCounter {
    id: u32,
    object: RemoteObject<PulseCounterFields>,
    api: Arc<dyn GatewayApi>,
}

impl PulseCounter {
    pub fn new(api: Arc<dyn GatewayApi>, id: u32) -> Self {
        let mapping = Mapping::new()
            .field("id", "id")
            .field("input", "input")
            .field("name", "name")
            .field("persistent", "persistent")
            .field("room", "room");
        Self {
            id,
            object: RemoteObject::new(id, "id", mapping),
            api,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn object(&self) -> &RemoteObject<PulseCounterFields> {
        &self.object
    }

    pub fn fields(&self) -> PulseCounterFields {
        self.object.fields()
    }

    /// `"<name> (<id>)"`, or just the id when unnamed.
    pub fn identifier(&self) -> String {
        self.object.read(|f| match f.name.as_deref() {
            Some(name) if !name.is_empty() => format!("{name} ({})", self.id),
            _ => self.id.to_string(),
        })
    }

    /// Stores the configuration fields on the gateway. The next refresh is
    /// skipped whether or not the write went through.
    pub async fn save(&self) -> ModelResult<()> {
        let record = self.object.read(|f| {
            json!({
                "id": self.id,
                "input": f.input,
                "name": f.name,
                "room": f.room,
                "persistent": f.persistent,
            })
        });
        let _write = self.object.begin_write();
        let result = self.api.set_pulse_counter_configuration(record).await;
        self.object.skip_next();
        result.map_err(|e| {
            error!(pulse_counter = %self.identifier(), error = %e.message(), "could not save pulse counter configuration");
            e.into()
        })
    }
}

impl Entity for PulseCounter {
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

impl std::fmt::Debug for PulseCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PulseCounter")
            .field("id", &self.id)
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}
