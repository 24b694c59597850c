//! Switchboard console
//!
//! Mirrors a gateway described by a JSON fixture: refreshes every collection
//! once, keeps the refreshers running for a few cycles and prints what it
//! saw.
//!
//! Usage:
//!   switchboard-console --fixture gateway.json --cycles 3 --app Hue
//!   switchboard-console --json

use anyhow::{Context, Result};
use clap::Parser;
use switchboard_console::{run, Args};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Switchboard console starting with {}", args.fixture.display());
    let report = run(&args).await?;

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("Failed to render report")?;
        println!("{text}");
        return Ok(());
    }

    println!("\n========================================");
    println!("  Gateway mirror");
    println!("========================================");
    println!("  Outputs:        {} ({} on)", report.summary.outputs, report.summary.outputs_on);
    println!(
        "  Inputs:         {} ({} feeding a pulse counter)",
        report.summary.inputs, report.summary.inputs_linked
    );
    println!("  Group actions:  {}", report.summary.group_actions);
    println!("  Pulse counters: {}", report.summary.pulse_counters);
    println!(
        "  Apps:           {} ({} configured)",
        report.summary.apps, report.summary.apps_configured
    );
    println!("========================================\n");

    if let Some(name) = &args.app {
        match &report.app_config {
            Some(config) => {
                let text = serde_json::to_string_pretty(config)
                    .context("Failed to render app configuration")?;
                println!("{name} configuration:\n{text}");
            }
            None => println!("{name} has no configuration"),
        }
        println!("{name} log lines: {}", report.app_logs);
    }
    Ok(())
}
