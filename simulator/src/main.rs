use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use gui_bridge::model::VisualizationModel;
use log::info;
use sonarcore::analysis::DepthProfile;
use sonarcore::{DisplayConfig, ResolutionMode};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::{SourceConfig, WorkflowConfig};
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Sonar echogram playback driver")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Read pings from a transport capture CSV instead of generating them
    #[arg(long)]
    capture: Option<PathBuf>,
    /// Synthetic pings to generate
    #[arg(long, default_value_t = 400)]
    pings: usize,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(long, value_enum, default_value_t = Resolution::Standard)]
    resolution: Resolution,
    #[arg(long, default_value_t = 50.0)]
    sensitivity: f32,
    #[arg(long, default_value_t = 720)]
    width: usize,
    #[arg(long, default_value_t = 360)]
    height: usize,
    /// Jump to this ping after sequential playback
    #[arg(long)]
    seek: Option<usize>,
    /// Print the per-depth profile of the sequence
    #[arg(long, default_value_t = false)]
    analyze: bool,
    /// Play the sequence once and emit a summary
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Keep the GUI bridge alive for the viewer
    #[arg(long, default_value_t = false)]
    serve: bool,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Resolution {
    Coarse,
    Standard,
    Fine,
}

impl From<Resolution> for ResolutionMode {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Coarse => ResolutionMode::Coarse,
            Resolution::Standard => ResolutionMode::Standard,
            Resolution::Fine => ResolutionMode::Fine,
        }
    }
}

fn workflow_from_args(args: &Args) -> WorkflowConfig {
    let display = DisplayConfig {
        resolution: args.resolution.into(),
        sensitivity: args.sensitivity,
        width: args.width,
        height: args.height,
        ..Default::default()
    };
    let source = match &args.capture {
        Some(path) => SourceConfig::Capture { path: path.clone() },
        None => SourceConfig::Synthetic(generator::profile::GeneratorConfig {
            pings: args.pings,
            seed: args.seed,
            ..Default::default()
        }),
    };
    WorkflowConfig::from_args(display, source, args.seek)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = match &args.workflow {
        Some(path) => WorkflowConfig::load(path)?,
        None => workflow_from_args(&args),
    };
    let pings = workflow_config.load_pings()?;
    info!("loaded {} pings", pings.len());

    if args.analyze {
        let profile = DepthProfile::analyze(&pings, &workflow_config.tuning)
            .context("profiling ping sequence")?;
        print!("{}", profile.report());
    }

    let runner = Arc::new(Runner::new(workflow_config.clone()));
    let gui_bridge = if args.serve {
        GuiBridge::serve(runner.clone())
    } else {
        GuiBridge::new()
    };

    if args.offline || args.serve {
        let result = runner.execute(&pings)?;
        println!(
            "Offline run -> pings {}, rebuilds {}, advances {}, bottom holds {}, coverage {:.1}%",
            result.pings,
            result.metrics.rebuilds,
            result.metrics.advances,
            result.metrics.bottom_holds,
            result.bottom_coverage()
        );
        if let Some(overlay) = &result.overlay {
            println!("{}", overlay.summary());
        }

        gui_bridge.publish(&VisualizationModel::from_result(&result, "ready"), &pings);
        gui_bridge.publish_status("Playback results ready.");

        if args.offline {
            let report = format!(
                "pings={} columns={} rebuilds={} advances={} holds={} reacquisitions={}\n",
                result.pings,
                result.metrics.columns_rendered,
                result.metrics.rebuilds,
                result.metrics.advances,
                result.metrics.bottom_holds,
                result.metrics.reacquisitions
            );
            let report_path = PathBuf::from("tools/data/offline_playback.log");
            if let Some(parent) = report_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&report_path)
                .with_context(|| format!("opening {}", report_path.display()))?;
            file.write_all(report.as_bytes())?;
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
