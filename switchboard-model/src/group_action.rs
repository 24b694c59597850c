use crate::error::ModelResult;
use crate::input::parse_id_list;
use crate::mapping::Mapping;
use crate::object::{null_as_default, Entity, FillOutcome, RemoteObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use switchboard_api::GatewayApi;
use switchboard_types::EntityKey;
use tracing::{error, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupActionFields {
    /// Basic action codes, in execution order.
    pub actions: Vec<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// A named sequence of basic actions the gateway runs on demand.
pub struct GroupAction {
    id: u32,
    object: RemoteObject<GroupActionFields>,
    api: Arc<dyn GatewayApi>,
}

impl GroupAction {
    pub fn new(api: Arc<dyn GatewayApi>, id: u32) -> Self {
        let mapping = Mapping::new()
            .field("id", "id")
            .derived("actions", &["actions"], |values| {
                let actions = values[0].map(parse_id_list).unwrap_or_default();
                Some(Value::from(actions))
            })
            .field("name", "name");
        Self {
            id,
            object: RemoteObject::new(id, "id", mapping),
            api,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn object(&self) -> &RemoteObject<GroupActionFields> {
        &self.object
    }

    pub fn name(&self) -> String {
        self.object.read(|f| f.name.clone())
    }

    pub fn actions(&self) -> Vec<i64> {
        self.object.read(|f| f.actions.clone())
    }

    /// Runs the group action on the gateway.
    pub async fn trigger(&self) -> ModelResult<()> {
        let _processing = self.object.begin_processing();
        match self.api.do_group_action(self.id).await {
            Ok(()) => {
                info!(group_action = self.id, "group action triggered");
                Ok(())
            }
            Err(e) => {
                error!(group_action = %self.name(), error = %e.message(), "could not trigger group action");
                Err(e.into())
            }
        }
    }
}

impl Entity for GroupAction {
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

impl std::fmt::Debug for GroupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupAction")
            .field("id", &self.id)
            .field("object", &self.object)
            .finish_non_exhaustive()
    }
}
