use crate::error::ModelResult;
use crate::mapping::Mapping;
use crate::object::{Entity, FillOutcome, RemoteObject};
use crate::output::NOT_IN_USE;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use switchboard_api::{GatewayApi, LedTarget};
use switchboard_config::parse_int;
use switchboard_types::EntityKey;
use tracing::error;

/// Reads an id list sent either as an array or as comma-separated text.
fn id_list<'de, D>(deserializer: D) -> Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_id_list(&Value::deserialize(deserializer)?))
}

pub(crate) fn parse_id_list(value: &Value) -> Vec<i64> {
    match value {
        Value::Array(items) => items.iter().map(parse_int).collect(),
        Value::String(text) if !text.is_empty() => text
            .split(',')
            .map(|item| parse_int(&Value::from(item)))
            .collect(),
        _ => Vec::new(),
    }
}

/// What pressing an input does, derived from its action code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Toggles the output whose id is the action code (below 240).
    Linked,
    /// Runs its basic actions (240).
    Advanced,
    /// Switches all outputs off (241).
    OutputsOff,
    /// Switches all lights off (242).
    LightsOff,
    /// Feeds a pulse counter (255, with a counter attached).
    Pulse,
    /// Does nothing (255).
    Inactive,
}

/// Mirrored fields of an [`Input`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFields {
    pub action: Option<i64>,
    #[serde(deserialize_with = "id_list")]
    pub basic_actions: Vec<i64>,
    pub module_type: Option<String>,
    pub name: Option<String>,
    pub can: Option<String>,
    pub room: Option<i64>,
    /// Pulse counter fed by this input; linked locally, not mirrored.
    pub pulse_counter: Option<u32>,
}

/// A push button or sensor input.
pub struct Input {
    id: u32,
    object: RemoteObject<InputFields>,
    api: Arc<dyn GatewayApi>,
}

impl Input {
    pub fn new(api: Arc<dyn GatewayApi>, id: u32) -> Self {
        let mapping = Mapping::new()
            .field("id", "id")
            .field("action", "action")
            .field("basic_actions", "basic_actions")
            .field("module_type", "module_type")
            .field("name", "name")
            .field("can", "can")
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

    pub fn object(&self) -> &RemoteObject<InputFields> {
        &self.object
    }

    pub fn fields(&self) -> InputFields {
        self.object.fields()
    }

    /// Attaches (or detaches) the pulse counter this input feeds.
    pub fn set_pulse_counter(&self, counter: Option<u32>) {
        self.object.update(|f| f.pulse_counter = counter);
    }

    pub fn kind(&self) -> Option<InputKind> {
        self.object.read(|f| match f.action? {
            action if action < 240 => Some(InputKind::Linked),
            240 => Some(InputKind::Advanced),
            241 => Some(InputKind::OutputsOff),
            242 => Some(InputKind::LightsOff),
            255 if f.pulse_counter.is_some() => Some(InputKind::Pulse),
            255 => Some(InputKind::Inactive),
            _ => None,
        })
    }

    pub fn in_use(&self) -> bool {
        let named = self
            .object
            .read(|f| !matches!(f.name.as_deref(), Some("") | Some(NOT_IN_USE)));
        named && self.kind() != Some(InputKind::Inactive)
    }

    /// The name, or the id when the input is unnamed or unused.
    pub fn identifier(&self) -> String {
        self.object.read(|f| match f.name.as_deref() {
            Some(name) if !name.is_empty() && name != NOT_IN_USE => name.to_string(),
            _ => self.id.to_string(),
        })
    }

    pub fn is_virtual(&self) -> bool {
        self.object.read(|f| {
            f.module_type
                .as_deref()
                .is_some_and(|module| module == module.to_lowercase())
        })
    }

    pub fn is_can(&self) -> bool {
        self.object.read(|f| f.can.as_deref() == Some("C"))
    }

    /// Stores the configuration fields on the gateway.
    pub async fn save(&self) -> ModelResult<()> {
        let record = self.object.read(|f| {
            let basic_actions: Vec<String> =
                f.basic_actions.iter().map(ToString::to_string).collect();
            json!({
                "id": self.id,
                "action": f.action,
                "basic_actions": basic_actions.join(","),
                "name": f.name,
                "room": f.room,
            })
        });
        let _write = self.object.begin_write();
        match self.api.set_input_configuration(record).await {
            Ok(()) => {
                self.object.skip_next();
                Ok(())
            }
            Err(e) => {
                error!(input = %self.identifier(), error = %e.message(), "could not save input configuration");
                Err(e.into())
            }
        }
    }

    /// Blinks the input module's LEDs.
    pub async fn indicate(&self) -> ModelResult<()> {
        self.api
            .flash_leds(LedTarget::Input, self.id)
            .await
            .map_err(|e| {
                error!(input = %self.identifier(), error = %e.message(), "could not flash leds");
                e.into()
            })
    }
}

impl Entity for Input {
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

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("id", &self.id)
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}
