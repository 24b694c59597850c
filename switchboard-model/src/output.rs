//! Outputs: relays and dimmers driven by the gateway.

use crate::error::{ModelError, ModelResult};
use crate::features::{GatewayFeatures, DEFAULT_TIMER_DISABLED};
use crate::led::Led;
use crate::mapping::Mapping;
use crate::object::{null_as_default, Entity, FillOutcome, RemoteObject};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use switchboard_api::{GatewayApi, LedTarget};
use switchboard_types::EntityKey;
use tracing::{debug, error};

/// Name the gateway gives to unused outputs and inputs.
pub const NOT_IN_USE: &str = "NOT_IN_USE";

/// Timer value older firmware reports for "no timer".
pub const ZERO_TIMER: u64 = 65535;

/// Timer durations (seconds) the gateway accepts when switching an output on.
pub const TIMER_PRESETS: [u32; 6] = [150, 450, 900, 1500, 2220, 3120];

/// Alternate mapping for status-only records (`{id, status, dimmer}`).
pub const STATUS_MAPPING: &str = "status";

/// What an output drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Outlet,
    Valve,
    Alarm,
    Appliance,
    Pump,
    Hvac,
    #[default]
    Generic,
    Motor,
    Ventilation,
    Heater,
    Light,
}

impl OutputType {
    pub const ALL: [OutputType; 11] = [
        Self::Outlet,
        Self::Valve,
        Self::Alarm,
        Self::Appliance,
        Self::Pump,
        Self::Hvac,
        Self::Generic,
        Self::Motor,
        Self::Ventilation,
        Self::Heater,
        Self::Light,
    ];

    /// The gateway's numeric code.
    pub const fn code(self) -> u8 {
        match self {
            Self::Outlet => 0,
            Self::Valve => 1,
            Self::Alarm => 2,
            Self::Appliance => 3,
            Self::Pump => 4,
            Self::Hvac => 5,
            Self::Generic => 6,
            Self::Motor => 7,
            Self::Ventilation => 8,
            Self::Heater => 9,
            Self::Light => 255,
        }
    }

    /// Decodes a gateway code; unknown codes are generic.
    pub fn from_code(code: i64) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| i64::from(kind.code()) == code)
            .unwrap_or_default()
    }
}

/// Mirrored fields of an [`Output`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputFields {
    pub floor: Option<i64>,
    pub module_type: Option<String>,
    pub locked: Option<bool>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub output_type: Option<OutputType>,
    pub timer: Option<u32>,
    pub dimmer: Option<u8>,
    pub status: Option<u8>,
    pub room: Option<i64>,
    pub led1: Option<Led>,
    pub led2: Option<Led>,
    pub led3: Option<Led>,
    pub led4: Option<Led>,
}

impl OutputFields {
    pub fn is_on(&self) -> bool {
        self.status.is_some_and(|status| status != 0)
    }

    pub fn set_on(&mut self, on: bool) {
        self.status = Some(u8::from(on));
    }

    fn leds(&self) -> [&Option<Led>; 4] {
        [&self.led1, &self.led2, &self.led3, &self.led4]
    }
}

fn led_from(values: &[Option<&Value>]) -> Option<Value> {
    let enumerator = values.first().copied().flatten()?.as_str()?;
    let id = values.get(1).copied().flatten()?.as_i64()?;
    serde_json::to_value(Led::parse(id, enumerator)).ok()
}

fn output_mapping(features: Arc<GatewayFeatures>) -> Mapping {
    let mut mapping = Mapping::new()
        .field("id", "id")
        .field("floor", "floor")
        .field("module_type", "module_type")
        .field("locked", "locked")
        .field("name", "name")
        .derived("output_type", &["type"], |values| {
            let code = values[0]?.as_i64()?;
            serde_json::to_value(OutputType::from_code(code)).ok()
        })
        .derived("timer", &["timer"], move |values| {
            let timer = values[0]?;
            if timer.as_u64() == Some(ZERO_TIMER) && features.contains(DEFAULT_TIMER_DISABLED) {
                Some(Value::from(0))
            } else {
                Some(timer.clone())
            }
        })
        .field("dimmer", "dimmer")
        .field("status", "status")
        .field("room", "room");
    for index in 1..=4 {
        let function = format!("can_led_{index}_function");
        let id = format!("can_led_{index}_id");
        mapping = mapping.derived(format!("led{index}"), &[function.as_str(), id.as_str()], led_from);
    }
    mapping
}

fn status_mapping() -> Mapping {
    Mapping::new()
        .field("id", "id")
        .field("status", "status")
        .field("dimmer", "dimmer")
}

/// A relay or dimmer output.
pub struct Output {
    id: u32,
    object: RemoteObject<OutputFields>,
    api: Arc<dyn GatewayApi>,
}

impl Output {
    pub fn new(api: Arc<dyn GatewayApi>, features: Arc<GatewayFeatures>, id: u32) -> Self {
        Self {
            id,
            object: RemoteObject::new(id, "id", output_mapping(features))
                .with_alternate(STATUS_MAPPING, status_mapping()),
            api,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// The mirrored fields and flags.
    pub fn object(&self) -> &RemoteObject<OutputFields> {
        &self.object
    }

    pub fn fields(&self) -> OutputFields {
        self.object.fields()
    }

    pub fn name(&self) -> String {
        self.object.read(|f| f.name.clone())
    }

    pub fn is_light(&self) -> bool {
        self.object.read(|f| f.output_type == Some(OutputType::Light))
    }

    /// Virtual modules report their type in lower case.
    pub fn is_virtual(&self) -> bool {
        self.object.read(|f| {
            f.module_type
                .as_deref()
                .is_some_and(|module| module == module.to_lowercase())
        })
    }

    pub fn is_dimmer(&self) -> bool {
        self.object.read(|f| {
            f.module_type
                .as_deref()
                .is_some_and(|module| module.eq_ignore_ascii_case("D"))
        })
    }

    pub fn in_use(&self) -> bool {
        self.object.read(|f| f.name != NOT_IN_USE)
    }

    pub fn is_on(&self) -> bool {
        self.object.read(OutputFields::is_on)
    }

    /// The name, or the id when the output is unnamed.
    pub fn identifier(&self) -> String {
        self.object.read(|f| {
            if f.name.is_empty() {
                self.id.to_string()
            } else {
                f.name.clone()
            }
        })
    }

    /// Switches the output, or flips it when `on` is `None`.
    pub async fn toggle(&self, on: Option<bool>) -> ModelResult<()> {
        let _write = self.object.begin_write();
        let previous = self.object.fields();
        self.object.update(|f| f.set_on(on.unwrap_or(!f.is_on())));
        let result = self.set().await;
        if result.is_err() {
            self.object.revert(previous);
        }
        result
    }

    /// Sets the dim level; zero switches the output off.
    ///
    /// Fails with [`ModelError::InvalidMutation`] on a non-dimmer, before any
    /// remote call.
    pub async fn dim(&self, value: u8) -> ModelResult<()> {
        if !self.is_dimmer() {
            return Err(ModelError::InvalidMutation(format!(
                "output {} is not a dimmer",
                self.identifier()
            )));
        }
        let _write = self.object.begin_write();
        let previous = self.object.fields();
        self.object.update(|f| {
            f.set_on(value > 0);
            f.dimmer = Some(value);
        });
        let result = self.set().await;
        if result.is_err() {
            self.object.revert(previous);
        }
        result
    }

    /// Pushes the current on/off state to the gateway.
    ///
    /// When on, the dim level is sent along, and the timer too if it is one
    /// of [`TIMER_PRESETS`]. The next refresh is skipped since it may predate
    /// the change.
    pub async fn set(&self) -> ModelResult<()> {
        let (on, dimmer, timer) = self.object.read(|f| {
            if f.is_on() {
                (true, f.dimmer, f.timer.filter(|t| TIMER_PRESETS.contains(t)))
            } else {
                (false, None, None)
            }
        });
        self.object.skip_next();
        self.api
            .set_output(self.id, on, dimmer, timer)
            .await
            .map_err(|e| {
                error!(output = %self.identifier(), error = %e.message(), "could not set output");
                e.into()
            })
    }

    /// Stores the configuration fields on the gateway.
    pub async fn save(&self) -> ModelResult<()> {
        let record = self.object.read(|f| self.configuration_record(f));
        let _write = self.object.begin_write();
        let result = self.api.set_output_configuration(record).await;
        self.object.skip_next();
        result.map_err(|e| {
            error!(output = %self.identifier(), error = %e.message(), "could not save output configuration");
            e.into()
        })
    }

    fn configuration_record(&self, f: &OutputFields) -> Value {
        let mut record = Map::new();
        record.insert("id".into(), json!(self.id));
        record.insert("floor".into(), json!(f.floor));
        record.insert("name".into(), json!(f.name));
        record.insert("timer".into(), json!(f.timer));
        record.insert(
            "type".into(),
            json!(f.output_type.unwrap_or_default().code()),
        );
        record.insert("module_type".into(), json!(f.module_type));
        record.insert("room".into(), json!(f.room));
        for (index, led) in f.leds().into_iter().enumerate() {
            if let Some(led) = led {
                let n = index + 1;
                record.insert(format!("can_led_{n}_id"), json!(led.id));
                record.insert(format!("can_led_{n}_function"), json!(led.enumerator()));
            }
        }
        Value::Object(record)
    }

    /// Blinks the output module's LEDs.
    pub async fn indicate(&self) -> ModelResult<()> {
        self.api
            .flash_leds(LedTarget::Output, self.id)
            .await
            .map_err(|e| {
                error!(output = %self.identifier(), error = %e.message(), "could not flash leds");
                e.into()
            })
    }

    /// Applies a pushed status change. Ignored while a write is in flight.
    pub fn apply_status(&self, on: bool, value: Option<u8>) -> bool {
        if self.object.is_frozen() {
            return false;
        }
        self.object.update(|f| {
            f.set_on(on);
            if value.is_some() {
                f.dimmer = value;
            }
        });
        debug!(output = self.id, on, "output status pushed");
        true
    }
}

impl Entity for Output {
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

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("id", &self.id)
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}
