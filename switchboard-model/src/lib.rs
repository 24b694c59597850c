//! Domain entities mirroring remote gateway records.
//!
//! Every entity wraps a [`RemoteObject`]: a primary key, typed fields, and a
//! declarative [`Mapping`] describing how those fields are read from a remote
//! record. Refreshes go through [`Entity::fill_data`]; user actions are async
//! methods that call the [`switchboard_api::GatewayApi`] and keep the
//! entity's flags consistent while the call is in flight.
//!
//! - [`Output`], [`Input`], [`GroupAction`], [`PulseCounter`]: id-keyed hardware entities
//! - [`App`]: name-keyed gateway app with a schema-driven configuration tree
//! - [`Led`]: LED link embedded in outputs
//!
//! Remote failures inside mutations are logged where they happen and returned
//! to the caller, who is free to ignore them.

mod app;
mod error;
mod features;
mod group_action;
mod input;
pub mod led;
mod mapping;
mod object;
mod output;
mod pulse_counter;

pub use app::{App, AppFields, AppInterface, LogEntry, LOG_WATCH_INTERVAL};
pub use error::{ModelError, ModelResult};
pub use features::{GatewayFeatures, DEFAULT_TIMER_DISABLED};
pub use group_action::{GroupAction, GroupActionFields};
pub use input::{Input, InputFields, InputKind};
pub use led::{Led, LedMode};
pub use mapping::{FieldMapping, Mapping, Transform};
pub use object::{null_as_default, Entity, FillOutcome, PendingWrite, RemoteObject};
pub use output::{
    Output, OutputFields, OutputType, NOT_IN_USE, STATUS_MAPPING, TIMER_PRESETS, ZERO_TIMER,
};
pub use pulse_counter::{PulseCounter, PulseCounterFields};
