use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use switchboard_api::MemoryGateway;
use switchboard_console::{load_fixture, run, run_against, Args, Mirror, Summary};
use switchboard_sync::SyncConfig;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/gateway.json")
}

fn args(extra: &[&str]) -> Args {
    let fixture = fixture_path();
    let mut argv = vec!["switchboard-console", "--fixture", fixture.to_str().unwrap()];
    argv.extend_from_slice(extra);
    Args::parse_from(argv)
}

#[test]
fn parses_arguments() {
    let args = Args::parse_from([
        "switchboard-console",
        "--fixture",
        "gw.json",
        "--interval-ms",
        "250",
        "--cycles",
        "5",
        "--app",
        "Hue",
        "--json",
        "--verbose",
    ]);
    assert_eq!(args.fixture, PathBuf::from("gw.json"));
    assert_eq!(args.cycles, 5);
    assert_eq!(args.app.as_deref(), Some("Hue"));
    assert!(args.json);
    assert!(args.verbose);
    assert_eq!(args.sync_config(), SyncConfig::uniform(250));
}

#[test]
fn defaults_use_per_collection_intervals() {
    let args = Args::parse_from(["switchboard-console"]);
    assert_eq!(args.cycles, 3);
    assert!(!args.json);
    assert_eq!(args.sync_config(), SyncConfig::default());
}

#[test]
fn default_fixture_resolves_from_any_directory() {
    let args = Args::parse_from(["switchboard-console"]);
    assert!(args.fixture.is_absolute());
    assert_eq!(args.fixture, fixture_path());
    assert!(load_fixture(&args.fixture).is_ok());
}

#[test]
fn shipped_fixture_loads() {
    let fixture = load_fixture(&fixture_path()).unwrap();
    assert_eq!(fixture.outputs.len(), 4);
    assert_eq!(fixture.apps.len(), 2);
    assert_eq!(fixture.features, vec!["default_timer_disabled"]);
}

#[test]
fn missing_fixture_has_context() {
    let err = load_fixture(Path::new("/nonexistent/gateway.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to read fixture"));
}

#[tokio::test]
async fn mirror_refreshes_everything_once() {
    let fixture = load_fixture(&fixture_path()).unwrap();
    let gateway = Arc::new(MemoryGateway::new(fixture));
    let mirror = Mirror::connect(gateway.clone(), SyncConfig::default()).await;
    assert!(mirror.features.contains("default_timer_disabled"));

    mirror.refresh_all().await;
    assert_eq!(
        mirror.summary(),
        Summary {
            outputs: 4,
            outputs_on: 1,
            inputs: 3,
            inputs_linked: 1,
            group_actions: 2,
            pulse_counters: 1,
            apps: 1,
            apps_configured: 1,
        }
    );

    let living = mirror.outputs.snapshot().into_iter().find(|o| o.id() == 1).unwrap();
    assert_eq!(living.fields().timer, Some(0));
    assert_eq!(gateway.call_count("get_output_status"), 1);
}

#[tokio::test(start_paused = true)]
async fn run_reports_app_configuration_and_logs() {
    let report = run(&args(&["--interval-ms", "100", "--cycles", "2", "--app", "hue"]))
        .await
        .unwrap();

    assert_eq!(report.summary.apps, 1);
    assert_eq!(
        report.app_config,
        Some(json!({
            "bridge_ip": "192.168.1.20",
            "api_key": "",
            "poll_frequency": 5,
            "lights": [{"output_id": 0, "hue_id": 3}]
        }))
    );
    assert_eq!(report.app_logs, 2);
}

#[tokio::test(start_paused = true)]
async fn report_serializes_to_json() {
    let report = run(&args(&["--interval-ms", "100", "--cycles", "1"])).await.unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["summary"]["outputs"], json!(4));
    assert_eq!(value["summary"]["apps_configured"], json!(1));
    assert_eq!(value["app_logs"], json!(0));
    assert!(value.get("app_config").is_none());
}

#[tokio::test(start_paused = true)]
async fn refreshers_keep_polling_during_the_run() {
    let fixture = load_fixture(&fixture_path()).unwrap();
    let gateway = Arc::new(MemoryGateway::new(fixture));

    run_against(gateway.clone(), &args(&["--interval-ms", "100", "--cycles", "3"]))
        .await
        .unwrap();

    // One forced refresh plus a tick per cycle; the last tick races the end of the run.
    assert!(gateway.call_count("get_output_configurations") >= 3);
    assert!(gateway.call_count("get_apps") >= 3);
}

#[tokio::test]
async fn unknown_app_is_an_error() {
    let err = run(&args(&["--cycles", "0", "--app", "Astro"])).await.unwrap_err();
    assert!(err.to_string().contains("No installed app named Astro"));
}
