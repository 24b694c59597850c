//! In-memory gateway.
//!
//! Serves a [`GatewayFixture`] and applies writes to it, so a sequence of
//! calls behaves like a live gateway. Every call is recorded with its
//! arguments, and a test can make the next call of an operation fail or slow
//! every call down.

use crate::api::{GatewayApi, LedTarget};
use crate::error::{ApiError, ApiResult};
use crate::fixture::{AppFixture, GatewayFixture};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Gateway backed by an in-memory fixture.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    state: Mutex<GatewayFixture>,
    requests: Mutex<Vec<(String, Value)>>,
    failures: Mutex<HashMap<String, ApiError>>,
    latency: Mutex<Duration>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn record_id(record: &Value) -> Option<u64> {
    record.get("id").and_then(Value::as_u64)
}

fn find_record(records: &mut [Value], id: u64) -> Option<&mut Value> {
    records.iter_mut().find(|r| record_id(r) == Some(id))
}

/// Overlays the fields of `config` onto the stored record with the same id.
fn merge_record(records: &mut [Value], config: Value, kind: &str) -> ApiResult<()> {
    let id = record_id(&config)
        .ok_or_else(|| ApiError::remote(format!("{kind} configuration without an id")))?;
    let Value::Object(fields) = config else {
        return Err(ApiError::remote(format!("{kind} configuration must be an object")));
    };
    let stored = find_record(records, id)
        .ok_or_else(|| ApiError::NotFound(format!("{kind} {id}")))?;
    match stored {
        Value::Object(target) => target.extend(fields),
        other => *other = Value::Object(fields),
    }
    Ok(())
}

impl MemoryGateway {
    pub fn new(fixture: GatewayFixture) -> Self {
        Self {
            state: Mutex::new(fixture),
            ..Self::default()
        }
    }

    /// Number of calls made to `operation` (the trait method name).
    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.requests)
            .iter()
            .filter(|(name, _)| name == operation)
            .count()
    }

    /// Arguments of every call made to `operation`, oldest first.
    pub fn requests(&self, operation: &str) -> Vec<Value> {
        lock(&self.requests)
            .iter()
            .filter(|(name, _)| name == operation)
            .map(|(_, args)| args.clone())
            .collect()
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: &str, error: ApiError) {
        lock(&self.failures).insert(operation.to_string(), error);
    }

    /// Delays every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// A copy of the current gateway state.
    pub fn snapshot(&self) -> GatewayFixture {
        lock(&self.state).clone()
    }

    /// Runs `f` against the gateway state, e.g. to simulate a change made
    /// elsewhere.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut GatewayFixture) -> R) -> R {
        f(&mut lock(&self.state))
    }

    /// Appends one line to an app's log.
    pub fn push_app_log(&self, name: &str, line: impl Into<String>) {
        if let Some(app) = lock(&self.state).apps.iter_mut().find(|a| a.name == name) {
            app.logs.push(line.into());
        }
    }

    /// Records the call, waits out the latency and consumes an injected failure.
    async fn enter(&self, operation: &str, args: Value) -> ApiResult<()> {
        lock(&self.requests).push((operation.to_string(), args));
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match lock(&self.failures).remove(operation) {
            Some(error) => {
                debug!(operation, %error, "injected failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn with_app<R>(
        &self,
        name: &str,
        installed_only: bool,
        f: impl FnOnce(&mut AppFixture) -> R,
    ) -> ApiResult<R> {
        let mut state = lock(&self.state);
        let app = state
            .apps
            .iter_mut()
            .find(|a| a.name == name && (a.installed || !installed_only))
            .ok_or_else(|| ApiError::NotFound(format!("app {name}")))?;
        Ok(f(app))
    }
}

#[async_trait]
impl GatewayApi for MemoryGateway {
    async fn get_features(&self) -> ApiResult<Vec<String>> {
        self.enter("get_features", Value::Null).await?;
        Ok(lock(&self.state).features.clone())
    }

    async fn get_output_configurations(&self) -> ApiResult<Vec<Value>> {
        self.enter("get_output_configurations", Value::Null).await?;
        Ok(lock(&self.state).outputs.clone())
    }

    async fn get_output_status(&self) -> ApiResult<Vec<Value>> {
        self.enter("get_output_status", Value::Null).await?;
        let state = lock(&self.state);
        Ok(state
            .outputs
            .iter()
            .map(|output| {
                let mut status = Map::new();
                for field in ["id", "status", "dimmer"] {
                    if let Some(value) = output.get(field) {
                        status.insert(field.to_string(), value.clone());
                    }
                }
                Value::Object(status)
            })
            .collect())
    }

    async fn set_output(
        &self,
        id: u32,
        on: bool,
        dimmer: Option<u8>,
        timer: Option<u32>,
    ) -> ApiResult<()> {
        let args = json!({"id": id, "on": on, "dimmer": dimmer, "timer": timer});
        self.enter("set_output", args).await?;
        debug!(id, on, ?dimmer, ?timer, "set output");
        let mut state = lock(&self.state);
        let output = find_record(&mut state.outputs, u64::from(id))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| ApiError::NotFound(format!("output {id}")))?;
        output.insert("status".into(), Value::from(u8::from(on)));
        if let Some(dimmer) = dimmer.filter(|_| on) {
            output.insert("dimmer".into(), Value::from(dimmer));
        }
        Ok(())
    }

    async fn set_output_configuration(&self, config: Value) -> ApiResult<()> {
        self.enter("set_output_configuration", config.clone()).await?;
        merge_record(&mut lock(&self.state).outputs, config, "output")
    }

    async fn flash_leds(&self, target: LedTarget, id: u32) -> ApiResult<()> {
        self.enter("flash_leds", json!({"target": target, "id": id})).await?;
        let mut state = lock(&self.state);
        let records = match target {
            LedTarget::Output => &mut state.outputs,
            LedTarget::Input => &mut state.inputs,
        };
        find_record(records, u64::from(id))
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("{target:?} {id}")))
    }

    async fn get_input_configurations(&self) -> ApiResult<Vec<Value>> {
        self.enter("get_input_configurations", Value::Null).await?;
        Ok(lock(&self.state).inputs.clone())
    }

    async fn set_input_configuration(&self, config: Value) -> ApiResult<()> {
        self.enter("set_input_configuration", config.clone()).await?;
        merge_record(&mut lock(&self.state).inputs, config, "input")
    }

    async fn get_group_action_configurations(&self) -> ApiResult<Vec<Value>> {
        self.enter("get_group_action_configurations", Value::Null).await?;
        Ok(lock(&self.state).group_actions.clone())
    }

    async fn do_group_action(&self, id: u32) -> ApiResult<()> {
        self.enter("do_group_action", json!({"id": id})).await?;
        let mut state = lock(&self.state);
        find_record(&mut state.group_actions, u64::from(id))
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("group action {id}")))
    }

    async fn get_pulse_counter_configurations(&self) -> ApiResult<Vec<Value>> {
        self.enter("get_pulse_counter_configurations", Value::Null).await?;
        Ok(lock(&self.state).pulse_counters.clone())
    }

    async fn set_pulse_counter_configuration(&self, config: Value) -> ApiResult<()> {
        self.enter("set_pulse_counter_configuration", config.clone()).await?;
        merge_record(&mut lock(&self.state).pulse_counters, config, "pulse counter")
    }

    async fn get_apps(&self) -> ApiResult<Vec<Value>> {
        self.enter("get_apps", Value::Null).await?;
        let state = lock(&self.state);
        Ok(state
            .apps
            .iter()
            .filter(|app| app.installed)
            .map(AppFixture::record)
            .collect())
    }

    async fn get_config_description(&self, name: &str) -> ApiResult<Value> {
        self.enter("get_config_description", json!({"name": name})).await?;
        self.with_app(name, true, |app| app.config_description.clone())
    }

    async fn get_config(&self, name: &str) -> ApiResult<Value> {
        self.enter("get_config", json!({"name": name})).await?;
        self.with_app(name, true, |app| app.config.clone())
    }

    async fn set_config(&self, name: &str, config: &str) -> ApiResult<()> {
        self.enter("set_config", json!({"name": name, "config": config})).await?;
        let config: Value = serde_json::from_str(config)?;
        self.with_app(name, true, |app| app.config = config)
    }

    async fn get_app_logs(&self, name: &str) -> ApiResult<String> {
        self.enter("get_app_logs", json!({"name": name})).await?;
        self.with_app(name, true, |app| app.logs.join("\n"))
    }

    async fn install_app(&self, name: &str) -> ApiResult<()> {
        self.enter("install_app", json!({"name": name})).await?;
        self.with_app(name, false, |app| app.installed = true)
    }

    async fn remove_app(&self, name: &str) -> ApiResult<()> {
        self.enter("remove_app", json!({"name": name})).await?;
        self.with_app(name, true, |app| app.installed = false)
    }
}
