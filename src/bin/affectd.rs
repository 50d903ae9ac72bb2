//! affectd - frame relay daemon
//!
//! Connects to the configured frame peer, starts the analysis engine, and
//! runs the ingestion loop until the peer closes, the engine stops, or
//! Ctrl-C fires. Fatal pipeline errors exit with a per-category code after
//! resources are released.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use affect_relay::config::RelayConfig;
use affect_relay::display::LogDisplay;
use affect_relay::engine::{build_analyzer, WorkerEngine};
use affect_relay::ingest::TcpSource;
use affect_relay::record::{default_output_path, ExperienceRecorder};
use affect_relay::run::RunController;
use affect_relay::PipelineError;

#[derive(Parser, Debug)]
#[command(
    name = "affectd",
    about = "Relay frames from a TCP peer to the face-analysis engine and log per-face metrics"
)]
struct Args {
    /// Path to JSON config file
    #[arg(long, env = "AFFECT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Frame peer host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Frame peer port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Experience log path (overrides config; default is generated)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Log a per-face summary for every recorded batch
    #[arg(long)]
    display: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("config: {:#}", e);
            std::process::exit(1);
        }
    };

    let quit = Arc::new(AtomicBool::new(false));
    let handler_quit = quit.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_quit.store(true, Ordering::Relaxed)) {
        log::error!("install ctrl-c handler: {}", e);
        std::process::exit(1);
    }

    match run(cfg, args.display, quit) {
        Ok(()) => {}
        Err(err) => {
            log::error!("{} failure: {}", err.category(), err);
            std::process::exit(err.exit_code());
        }
    }
}

fn load_config(args: &Args) -> Result<RelayConfig> {
    let mut cfg = RelayConfig::load_from(args.config.as_deref())?;
    if let Some(host) = &args.host {
        cfg.peer.host = host.clone();
    }
    if let Some(port) = args.port {
        cfg.peer.port = port;
    }
    if let Some(output) = &args.output {
        cfg.output_path = Some(output.clone());
    }
    Ok(cfg)
}

fn run(cfg: RelayConfig, display: bool, quit: Arc<AtomicBool>) -> Result<(), PipelineError> {
    log::info!(
        "peer {}:{} frame {}x{} stride {} analyzer {}",
        cfg.peer.host,
        cfg.peer.port,
        cfg.frame.width,
        cfg.frame.height,
        cfg.frame.stride,
        cfg.engine.analyzer
    );

    let analyzer = build_analyzer(&cfg.engine.analyzer)
        .map_err(|e| PipelineError::EngineInit(format!("{:#}", e)))?;
    let engine = WorkerEngine::start(analyzer, cfg.engine.buffer_frames)?;

    let output_path = cfg.output_path.clone().unwrap_or_else(default_output_path);
    let recorder = ExperienceRecorder::open(&output_path)?;

    let source = TcpSource::new(cfg.peer.clone(), &cfg.frame);
    let mut controller = RunController::new(source, engine, recorder, quit);
    if display || cfg.draw_display {
        controller = controller.with_display(Box::new(LogDisplay));
    }

    let summary = controller.run()?;
    log::info!(
        "run complete: {} frames received, {} submitted, {} dropped, {} batches recorded in {:.1}s ({:.2} fps)",
        summary.frames_received,
        summary.frames_submitted,
        summary.frames_dropped,
        summary.batches_recorded,
        summary.elapsed_seconds,
        summary.processing_fps
    );
    Ok(())
}
