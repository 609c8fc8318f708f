use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use circlecam::{DirectorySink, FrameSink, NullSink, Player, SourceSpec, Tuning, Variant};

#[derive(Parser)]
#[command(name = "circlecam")]
#[command(about = "Detect circles in a frame stream and draw them with their colors")]
struct Cli {
    /// Demo to run: plain, color, two-color-mask, two-color-kmeans or pool-ball
    #[arg(value_name = "VARIANT")]
    variant: Variant,

    /// Image file or directory of frames to play
    #[arg(short, long, value_name = "PATH", conflicts_with = "synthetic")]
    input: Option<PathBuf>,

    /// Play a generated table with N balls (default when no input is given)
    #[arg(long, value_name = "N")]
    synthetic: Option<usize>,

    /// Stop after this many frames
    #[arg(long, value_name = "N")]
    frames: Option<usize>,

    /// Write rendered frames to directory
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Save per-step debug images to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// JSON tuning preset merged over the variant's defaults
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Show frames in a window with live sliders
    #[arg(long)]
    gui: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_tracing(args.verbose);

    let mut tuning = args.variant.default_tuning();
    if let Some(path) = &args.params {
        tuning = Tuning::load(path, tuning)?;
        tracing::info!(path = %path.display(), "loaded tuning preset");
    }
    tracing::debug!(?tuning, "effective tuning");

    let source = match (&args.input, args.synthetic) {
        (Some(path), _) => SourceSpec::from_path(path.clone()),
        (None, balls) => SourceSpec::synthetic(balls.unwrap_or(6)),
    };

    if args.gui {
        return run_gui(&args, tuning, source);
    }

    let mut player = Player::new(args.variant, tuning);
    if let Some(dir) = args.debug_out.clone() {
        player = player.with_debug(dir)?;
    }
    if let Some(frames) = args.frames {
        player = player.with_max_frames(frames);
    }

    let mut sink: Box<dyn FrameSink> = match &args.output {
        Some(dir) => Box::new(DirectorySink::new(dir)?),
        None => Box::new(NullSink::default()),
    };
    let mut frames = source.open()?;
    let stats = player.run(frames.as_mut(), sink.as_mut())?;

    tracing::info!(
        frames = stats.frames,
        detections = stats.detections,
        fps = %format!("{:.1}", stats.average_fps()),
        "done"
    );
    Ok(())
}

#[cfg(feature = "gui")]
fn run_gui(args: &Cli, tuning: Tuning, source: SourceSpec) -> anyhow::Result<()> {
    if args.output.is_some() || args.debug_out.is_some() {
        tracing::warn!("--output and --debug-out are ignored by the viewer");
    }
    circlecam::gui::run(circlecam::gui::ViewerConfig {
        variant: args.variant,
        tuning,
        source,
        max_frames: args.frames,
        frame_interval: std::time::Duration::from_millis(33),
    })
}

#[cfg(not(feature = "gui"))]
fn run_gui(_args: &Cli, _tuning: Tuning, _source: SourceSpec) -> anyhow::Result<()> {
    anyhow::bail!("circlecam was built without the gui feature")
}
