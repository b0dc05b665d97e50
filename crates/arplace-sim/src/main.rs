//! Headless AR placement session
//!
//! Replays a synthetic tracking stream and a scripted touch sequence
//! through the placement core, with the executor rendering at a fixed rate.
//!
//! Usage:
//!   arplace-sim                          # Default configuration, 120 frames
//!   arplace-sim --config placement.toml  # Load settings from TOML
//!   arplace-sim --json                   # Print the final scene as JSON

mod scenario;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use arplace_core::{PlacementConfig, PlacementSession, RenderFrame, TouchOutcome};
use clap::Parser;
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "arplace-sim", about = "Replay a synthetic AR placement session")]
struct Cli {
    /// Placement configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of tracking frames to replay
    #[arg(long, default_value = "120")]
    frames: u64,

    /// Rate at which the executor drains mutations and renders
    #[arg(long, default_value = "60")]
    render_hz: u32,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    rendered_frames: u64,
    messages: usize,
    touches: Vec<TouchOutcome>,
    scene: Option<RenderFrame>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arplace_core=info,arplace_sim=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => PlacementConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PlacementConfig::default(),
    };
    if cli.render_hz == 0 {
        anyhow::bail!("--render-hz must be greater than zero");
    }
    let render_period = Duration::from_secs_f64(1.0 / f64::from(cli.render_hz));
    info!(frames = cli.frames, render_hz = cli.render_hz, "arplace-sim starting");

    let PlacementSession {
        executor,
        tracking,
        input,
        mut messages,
    } = PlacementSession::start(config);

    let executor_task = tokio::spawn(async move {
        let mut rendered = 0u64;
        let mut last = None;
        executor
            .run(render_period, |frame| {
                rendered += 1;
                last = Some(frame);
            })
            .await;
        (rendered, last)
    });
    let message_task = tokio::spawn(async move {
        let mut count = 0usize;
        while let Some(message) = messages.recv().await {
            info!(?message, "Message");
            count += 1;
        }
        count
    });
    let tracking_task = tokio::spawn(scenario::drive_tracking(
        tracking,
        cli.frames,
        scenario::FRAME_PERIOD,
    ));
    let input_task = tokio::spawn(scenario::drive_input(input, scenario::FRAME_PERIOD));

    tracking_task.await.context("tracking task failed")?;
    let touches = input_task.await.context("input task failed")?;
    let (rendered_frames, scene) = executor_task.await.context("executor task failed")?;
    let messages = message_task.await.context("message task failed")?;

    let summary = Summary {
        rendered_frames,
        messages,
        touches,
        scene,
    };
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let objects = summary.scene.as_ref().map_or(0, |s| s.objects.len());
        let planes = summary.scene.as_ref().map_or(0, |s| s.planes.len());
        info!(
            rendered = summary.rendered_frames,
            messages = summary.messages,
            objects,
            planes,
            "Session finished"
        );
    }
    Ok(())
}
