//! GPS Fix Logger - Main Entry Point

use anyhow::Context;
use clap::Parser;
use gps_logger::{init_logging, run, LoggerConfig, MetricsSink, PriorityHandoff, SampleSource};
use record_ring::TracingSink;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "gps-logger", version, about = "Hand GPS fixes from a producer to a consumer task")]
struct Cli {
    /// Configuration file (defaults to gps-logger.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of fixes to produce
    #[arg(short, long)]
    samples: Option<u64>,

    /// Step the priority hand-off between two tasks instead of logging fixes
    #[arg(long, value_name = "STEPS")]
    handoff: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = LoggerConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(samples) = cli.samples {
        config.samples = samples;
    }
    init_logging(&config.log_level, config.json_logs);

    info!("=== GPS Ring Logger v{} ===", env!("CARGO_PKG_VERSION"));

    if let Some(steps) = cli.handoff {
        for event in PriorityHandoff::default().take(steps) {
            println!("{}", serde_json::to_string(&event)?);
        }
        return Ok(());
    }

    let source = SampleSource::reference().with_live_stamp(config.live_stamp);
    let report = run(&config, source, (TracingSink, MetricsSink))
        .await
        .context("pipeline failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
