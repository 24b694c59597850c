//! Shared pieces of the switchboard console: arguments, fixture loading and
//! the mirror that keeps every gateway collection in sync.

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use switchboard_api::{GatewayApi, GatewayFixture, MemoryGateway};
use switchboard_model::{App, GatewayFeatures, GroupAction, Input, Output, PulseCounter};
use switchboard_refresh::Refresher;
use switchboard_sync::{loaders, SyncConfig, Synchronizer};
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
#[command(name = "switchboard-console")]
#[command(about = "Mirrors a gateway's outputs, inputs, group actions, pulse counters and apps")]
pub struct Args {
    /// Gateway fixture (JSON)
    #[arg(short, long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/gateway.json"))]
    pub fixture: PathBuf,

    /// Poll every collection at this interval instead of the defaults
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Number of output intervals to keep the refreshers running
    #[arg(short, long, default_value = "3")]
    pub cycles: u32,

    /// Print this app's configuration when done
    #[arg(short, long)]
    pub app: Option<String>,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn sync_config(&self) -> SyncConfig {
        self.interval_ms.map(SyncConfig::uniform).unwrap_or_default()
    }
}

/// Reads a gateway fixture from disk.
pub fn load_fixture(path: &Path) -> Result<GatewayFixture> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    GatewayFixture::from_json(&text)
        .with_context(|| format!("Failed to parse fixture {}", path.display()))
}

/// Counts taken at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub outputs: usize,
    pub outputs_on: usize,
    pub inputs: usize,
    pub inputs_linked: usize,
    pub group_actions: usize,
    pub pulse_counters: usize,
    pub apps: usize,
    pub apps_configured: usize,
}

/// Every mirrored collection of one gateway.
pub struct Mirror {
    pub features: Arc<GatewayFeatures>,
    pub outputs: Arc<Synchronizer<Output>>,
    pub output_status: Arc<Synchronizer<Output>>,
    pub inputs: Arc<Synchronizer<Input>>,
    pub group_actions: Arc<Synchronizer<GroupAction>>,
    pub pulse_counters: Arc<Synchronizer<PulseCounter>>,
    pub apps: Arc<Synchronizer<App>>,
    config: SyncConfig,
}

impl Mirror {
    /// Loads the gateway features and builds the synchronizers. Nothing is
    /// fetched yet.
    pub async fn connect(api: Arc<dyn GatewayApi>, config: SyncConfig) -> Self {
        let features = match GatewayFeatures::load(api.as_ref()).await {
            Ok(features) => features,
            Err(e) => {
                warn!("Could not load gateway features: {}", e);
                GatewayFeatures::new()
            }
        };
        let features = Arc::new(features);
        let outputs = loaders::outputs(Arc::clone(&api), Arc::clone(&features), config.outputs);
        let output_status =
            loaders::output_status(Arc::clone(&api), &outputs, config.output_status);
        Self {
            features,
            outputs: Arc::new(outputs),
            output_status: Arc::new(output_status),
            inputs: Arc::new(loaders::inputs(Arc::clone(&api), config.inputs)),
            group_actions: Arc::new(loaders::group_actions(
                Arc::clone(&api),
                config.group_actions,
            )),
            pulse_counters: Arc::new(loaders::pulse_counters(
                Arc::clone(&api),
                config.pulse_counters,
            )),
            apps: Arc::new(loaders::apps(api, config.apps)),
            config,
        }
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// Refreshes every collection once, concurrently.
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.outputs.refresh(),
            self.inputs.refresh(),
            self.group_actions.refresh(),
            self.pulse_counters.refresh(),
            self.apps.refresh(),
        );
        // Status needs the outputs to exist.
        self.output_status.refresh().await;
        self.link_pulse_counters();
    }

    /// Marks inputs feeding a pulse counter. Returns how many are linked.
    pub fn link_pulse_counters(&self) -> usize {
        self.pulse_counters.with_collection(|counters| {
            self.inputs
                .with_collection(|inputs| loaders::link_pulse_counters(inputs, counters))
        })
    }

    /// One stopped refresher per collection.
    pub fn refreshers(&self) -> Vec<Refresher> {
        vec![
            self.outputs.refresher(),
            self.output_status.refresher(),
            self.inputs.refresher(),
            self.group_actions.refresher(),
            self.pulse_counters.refresher(),
            self.apps.refresher(),
        ]
    }

    pub fn app(&self, name: &str) -> Option<Arc<App>> {
        self.apps
            .snapshot()
            .into_iter()
            .find(|app| app.name().eq_ignore_ascii_case(name))
    }

    pub fn summary(&self) -> Summary {
        let outputs = self.outputs.snapshot();
        let inputs = self.inputs.snapshot();
        let apps = self.apps.snapshot();
        Summary {
            outputs: outputs.len(),
            outputs_on: outputs.iter().filter(|output| output.is_on()).count(),
            inputs: inputs.len(),
            inputs_linked: inputs
                .iter()
                .filter(|input| input.fields().pulse_counter.is_some())
                .count(),
            group_actions: self.group_actions.snapshot().len(),
            pulse_counters: self.pulse_counters.snapshot().len(),
            apps: apps.len(),
            apps_configured: apps.iter().filter(|app| app.is_config_loaded()).count(),
        }
    }
}

/// Result of [`run`].
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: Summary,
    /// Configuration of the requested app, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_config: Option<serde_json::Value>,
    /// Log lines collected for the requested app.
    pub app_logs: usize,
}

/// Mirrors the fixture gateway for `args.cycles` output intervals.
pub async fn run(args: &Args) -> Result<Report> {
    let fixture = load_fixture(&args.fixture)?;
    let gateway = Arc::new(MemoryGateway::new(fixture));
    run_against(gateway, args).await
}

/// Like [`run`] with an already built gateway.
pub async fn run_against(gateway: Arc<dyn GatewayApi>, args: &Args) -> Result<Report> {
    let mirror = Mirror::connect(gateway, args.sync_config()).await;
    mirror.refresh_all().await;

    let watched = match &args.app {
        Some(name) => {
            let app = mirror
                .app(name)
                .with_context(|| format!("No installed app named {name}"))?;
            app.watch_logs_every(mirror.config().app_logs.interval());
            Some(app)
        }
        None => None,
    };

    let mut refreshers = mirror.refreshers();
    for refresher in &mut refreshers {
        refresher.start();
    }
    let window = mirror.config().outputs.interval() * args.cycles;
    info!("Polling for {:?}", window);
    tokio::time::sleep(window).await;
    for refresher in &mut refreshers {
        refresher.stop();
    }
    if let Some(app) = &watched {
        app.stop_log_watcher();
    }

    let linked = mirror.link_pulse_counters();
    let summary = mirror.summary();
    info!(
        outputs = summary.outputs,
        on = summary.outputs_on,
        inputs = summary.inputs,
        linked,
        group_actions = summary.group_actions,
        pulse_counters = summary.pulse_counters,
        apps = summary.apps,
        "Mirror summary"
    );

    Ok(Report {
        summary,
        app_config: watched
            .as_ref()
            .and_then(|app| app.with_config(|tree| tree.get_config())),
        app_logs: watched.as_ref().map_or(0, |app| app.logs().len()),
    })
}
