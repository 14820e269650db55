//! bubble-attribution command line tool

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bubble_attribution::app::{BatchRunner, BatchSummary};
use bubble_attribution::config::{self, AppConfig};
use bubble_attribution::vision::{BubblePipeline, LayoutProvider, SidecarLayout, TesseractOcr};
use bubble_attribution::{capture, storage};

/// Attribute speech-bubble dialogue in video frames to characters
#[derive(Parser, Debug)]
#[command(name = "bubble-attribution")]
#[command(about = "Attribute speech-bubble dialogue in video frames to characters")]
struct Args {
    /// Frame images, or directories of frame images
    #[arg(required_unless_present = "write_config")]
    frames: Vec<PathBuf>,

    /// Configuration file (defaults to config.toml in the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read pre-computed ALTO layouts (<frame>.xml) from this directory instead of running tesseract
    #[arg(long, conflicts_with = "sidecar_layouts")]
    layout_dir: Option<PathBuf>,

    /// Read pre-computed ALTO layouts stored next to each frame
    #[arg(long)]
    sidecar_layouts: bool,

    /// Override the bubble padding / marker size in pixels
    #[arg(long)]
    padding: Option<u32>,

    /// Number of frames processed in parallel
    #[arg(short, long, default_value = "1")]
    workers: usize,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enable debug logging (per-block skip reasons)
    #[arg(short, long)]
    verbose: bool,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for the report
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => config::load_config(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => load_or_default_config(),
    };
    if let Some(padding) = args.padding {
        config.pipeline.padding = padding;
    }

    if let Some(path) = &args.write_config {
        config::save_config(&config, path)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        info!("Configuration written to {:?}", path);
        return Ok(());
    }

    // Palette problems are fatal before any frame is touched
    let pipeline = BubblePipeline::from_config(&config)?;
    info!(
        "Loaded palette with {} character(s), padding {}px",
        pipeline.palette().len(),
        pipeline.padding()
    );

    let provider: Arc<dyn LayoutProvider> = match (&args.layout_dir, args.sidecar_layouts) {
        (Some(dir), _) => Arc::new(SidecarLayout::in_directory(dir)),
        (None, true) => Arc::new(SidecarLayout::beside_frames()),
        (None, false) => Arc::new(TesseractOcr::from_settings(&config.ocr)),
    };

    let frames = capture::expand_frame_paths(&args.frames)?;
    let runner = BatchRunner::new(pipeline, provider, args.workers);
    let reports = runner.run(&frames);

    match &args.output {
        Some(path) => {
            storage::save_reports(&reports, path)?;
            info!("Report written to {:?}", path);
        }
        None => storage::write_reports(&reports, std::io::stdout().lock())?,
    }

    let summary = BatchSummary::from_reports(&reports);
    info!(
        "{} frame(s): {} speech bubble(s) from {} text block(s); skipped {} degenerate, {} unmatched, {} disagreeing",
        summary.frames,
        summary.blocks.attributed,
        summary.blocks.text_blocks,
        summary.blocks.degenerate_regions,
        summary.blocks.unmatched_markers,
        summary.blocks.disagreeing_markers
    );

    if summary.failed_frames > 0 {
        anyhow::bail!("{} of {} frame(s) failed", summary.failed_frames, summary.frames);
    }

    Ok(())
}

/// Load configuration from the user config directory or fall back to defaults
fn load_or_default_config() -> AppConfig {
    if let Ok(config_dir) = storage::get_config_dir() {
        let config_path = config_dir.join("config.toml");
        if config_path.exists() {
            match config::load_config(&config_path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", config_path);
                    return config;
                }
                Err(e) => tracing::warn!("Ignoring unreadable configuration {:?}: {}", config_path, e),
            }
        }
    }
    info!("Using default configuration");
    AppConfig::default()
}
