use anyhow::Context;
use clap::Parser;
use generator::profile::{build_log_from_config, GeneratorConfig};
use generator::template::LogFormat;
use gui_bridge::bridge::GuiBridge;
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Fleet replay log driver")]
struct Args {
    /// Event log to replay (JSON event list or legacy text)
    #[arg(long)]
    log: Option<PathBuf>,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long, default_value_t = 100)]
    frame_interval_ms: u64,
    #[arg(long, default_value_t = 15)]
    dwell_frames: usize,
    #[arg(long, default_value = "current")]
    map_id: String,
    /// Treat only the first PLANNER_START per robot as a task
    #[arg(long, default_value_t = false)]
    first_task_only: bool,
    /// Write a synthetic log to this path and replay it
    #[arg(long)]
    generate: Option<PathBuf>,
    #[arg(long, default_value_t = 3)]
    robots: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Emit the synthetic log as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Print a summary and write the built replay as JSON
    #[arg(long, default_value_t = false)]
    offline: bool,
    #[arg(long, default_value = "tools/data/simulation.json")]
    output: PathBuf,
    /// Keep the GUI bridge alive for the visualizer
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.frame_interval_ms,
            args.dwell_frames,
            args.map_id.clone(),
            args.first_task_only,
        )
    };

    let runner = Arc::new(Runner::new(workflow_config));
    let gui_bridge = if args.serve {
        GuiBridge::serve(runner.clone()).context("starting GUI bridge")?
    } else {
        GuiBridge::detached(runner.clone())
    };

    let log_path = match (&args.generate, &args.log) {
        (Some(path), _) => {
            let config = GeneratorConfig {
                robots: args.robots,
                seed: args.seed,
                format: if args.json {
                    LogFormat::Json
                } else {
                    LogFormat::Text
                },
                ..Default::default()
            };
            let raw = build_log_from_config(&config)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, raw)
                .with_context(|| format!("writing synthetic log {}", path.display()))?;
            info!("wrote synthetic log to {}", path.display());
            Some(path.clone())
        }
        (None, log) => log.clone(),
    };

    if let Some(path) = log_path {
        let result = runner.execute_file(&path)?;
        println!("Replay {} -> {}", path.display(), result.summary());
        gui_bridge.publish(&result);

        if args.offline {
            if let Some(parent) = args.output.parent() {
                fs::create_dir_all(parent)?;
            }
            let snapshot = gui_bridge.snapshot();
            let json = serde_json::to_string_pretty(&snapshot)
                .context("serializing replay snapshot")?;
            fs::write(&args.output, json)
                .with_context(|| format!("writing replay {}", args.output.display()))?;
            println!("Replay written to {}", args.output.display());
        }
    }

    if args.serve {
        gui_bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
