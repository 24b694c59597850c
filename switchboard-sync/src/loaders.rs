//! Ready-made synchronizers for each gateway collection.

use crate::collection::Collection;
use crate::config::RefreshConfig;
use crate::synchronizer::Synchronizer;
use std::cmp::Ordering;
use std::sync::Arc;
use switchboard_api::GatewayApi;
use switchboard_model::{
    App, GatewayFeatures, GroupAction, Input, Output, PulseCounter, STATUS_MAPPING,
};
use switchboard_types::EntityKey;
use tracing::debug;

fn by_name(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn id_of(key: &EntityKey) -> Option<u32> {
    key.as_id().and_then(|id| u32::try_from(id).ok())
}

/// Output configurations, sorted by name.
pub fn outputs(
    api: Arc<dyn GatewayApi>,
    features: Arc<GatewayFeatures>,
    config: RefreshConfig,
) -> Synchronizer<Output> {
    let fetch_api = Arc::clone(&api);
    Synchronizer::new("outputs", "id", move || {
        let api = Arc::clone(&fetch_api);
        async move { api.get_output_configurations().await }
    })
    .with_factory(move |key, _| {
        Some(Output::new(Arc::clone(&api), Arc::clone(&features), id_of(key)?))
    })
    .sorted_by(|a, b| by_name(&a.name(), &b.name()))
    .with_config(config)
}

/// Output status feed. Update-only: it refreshes on/off and dimmer level
/// of the outputs `outputs` already knows.
pub fn output_status(
    api: Arc<dyn GatewayApi>,
    outputs: &Synchronizer<Output>,
    config: RefreshConfig,
) -> Synchronizer<Output> {
    Synchronizer::new("output status", "id", move || {
        let api = Arc::clone(&api);
        async move { api.get_output_status().await }
    })
    .sharing(outputs)
    .with_mapping(STATUS_MAPPING)
    .with_config(config)
}

/// Input configurations, sorted by id.
pub fn inputs(api: Arc<dyn GatewayApi>, config: RefreshConfig) -> Synchronizer<Input> {
    let fetch_api = Arc::clone(&api);
    Synchronizer::new("inputs", "id", move || {
        let api = Arc::clone(&fetch_api);
        async move { api.get_input_configurations().await }
    })
    .with_factory(move |key, _| Some(Input::new(Arc::clone(&api), id_of(key)?)))
    .sorted_by(|a, b| a.id().cmp(&b.id()))
    .with_config(config)
}

/// Group actions, sorted by name.
pub fn group_actions(api: Arc<dyn GatewayApi>, config: RefreshConfig) -> Synchronizer<GroupAction> {
    let fetch_api = Arc::clone(&api);
    Synchronizer::new("group actions", "id", move || {
        let api = Arc::clone(&fetch_api);
        async move { api.get_group_action_configurations().await }
    })
    .with_factory(move |key, _| Some(GroupAction::new(Arc::clone(&api), id_of(key)?)))
    .sorted_by(|a, b| by_name(&a.name(), &b.name()))
    .with_config(config)
}

/// Pulse counters, sorted by id.
pub fn pulse_counters(
    api: Arc<dyn GatewayApi>,
    config: RefreshConfig,
) -> Synchronizer<PulseCounter> {
    let fetch_api = Arc::clone(&api);
    Synchronizer::new("pulse counters", "id", move || {
        let api = Arc::clone(&fetch_api);
        async move { api.get_pulse_counter_configurations().await }
    })
    .with_factory(move |key, _| Some(PulseCounter::new(Arc::clone(&api), id_of(key)?)))
    .sorted_by(|a, b| a.id().cmp(&b.id()))
    .with_config(config)
}

/// Installed apps, sorted by name. A newly seen app gets its configuration
/// schema and values fetched right away.
pub fn apps(api: Arc<dyn GatewayApi>, config: RefreshConfig) -> Synchronizer<App> {
    let fetch_api = Arc::clone(&api);
    Synchronizer::new("apps", "name", move || {
        let api = Arc::clone(&fetch_api);
        async move { api.get_apps().await }
    })
    .with_factory(move |key, _| Some(App::new(Arc::clone(&api), key.as_name()?)))
    .sorted_by(|a, b| by_name(a.name(), b.name()))
    .on_added(|app: Arc<App>| async move {
        // Failures are logged by the app itself.
        if app.initialize_config().await.is_ok() && app.has_config() {
            let _ = app.load_config().await;
        }
    })
    .with_config(config)
}

/// Marks every input that feeds a pulse counter.
///
/// Returns the number of linked inputs.
pub fn link_pulse_counters(
    inputs: &Collection<Input>,
    counters: &Collection<PulseCounter>,
) -> usize {
    let mut linked = 0;
    for input in inputs.iter() {
        let counter = counters
            .iter()
            .find(|counter| counter.fields().input == Some(i64::from(input.id())))
            .map(|counter| counter.id());
        if counter.is_some() {
            linked += 1;
        }
        input.set_pulse_counter(counter);
    }
    debug!(linked, "pulse counters linked to inputs");
    linked
}
