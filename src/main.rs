use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;

use anishot::capture::{CaptureSource, FileCapture};
use anishot::catalog::{find_character, load_catalog, sample_characters};
use anishot::compositing::{DirectoryAssets, OverlayLibrary};
use anishot::layout::{text, CollageOptions, LayoutVariant};
use anishot::output::{DirectorySink, OutputSink};
use anishot::pipeline::{CaptureSession, Pipeline, PipelineState};
use anishot::segmentation::SegmentationEngine;
use anishot::CUT_COUNT;

#[derive(Parser, Debug)]
#[command(author, version, about = "Four-cut character photo booth", long_about = None)]
struct Args {
    /// Four photos to use as the cuts, in order
    #[arg(num_args = 4, value_name = "PHOTO", required_unless_present = "webcam")]
    photos: Vec<PathBuf>,

    /// Capture the cuts from a webcam instead (needs the `webcam` feature)
    #[arg(long, conflicts_with = "photos")]
    webcam: bool,

    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Seconds to count down before each webcam shot
    #[arg(long, default_value_t = 3)]
    countdown: u64,

    /// Character id or name
    #[arg(short, long, default_value = "Levi")]
    character: String,

    /// JSON character catalog; the built-in characters are used without one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Directory that overlay URLs such as /characters/levi.png resolve under
    #[arg(long, default_value = "public")]
    assets: PathBuf,

    /// Collage layout
    #[arg(short, long, value_enum, default_value_t = LayoutVariant::Mobile)]
    variant: LayoutVariant,

    /// Path to segmentation model (ONNX file)
    /// If not provided, every cut keeps its original background
    #[arg(long)]
    model: Option<PathBuf>,

    /// TrueType font for collage text; system fonts are tried otherwise
    #[arg(long)]
    font: Option<PathBuf>,

    /// Directory the collage is written to
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip the random sparkles on the frame
    #[arg(long)]
    no_sparkles: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("AniShot starting");
    tracing::info!("Layout: {}", args.variant);

    let catalog = match &args.catalog {
        Some(path) => load_catalog(path).context("Failed to load character catalog")?,
        None => sample_characters(),
    };
    let Some(character) = find_character(&catalog, &args.character).cloned() else {
        let known: Vec<_> = catalog.iter().map(|c| c.name.as_str()).collect();
        bail!(
            "Unknown character '{}' (available: {})",
            args.character,
            known.join(", ")
        );
    };
    tracing::info!("Character: {} ({})", character.name, character.id);

    let overlays = Arc::new(OverlayLibrary::new(DirectoryAssets::new(&args.assets)));
    let options = CollageOptions {
        font: text::find_font(args.font.as_deref()),
        sparkles: !args.no_sparkles,
        ..CollageOptions::default()
    };

    let mut pipeline = Pipeline::new(args.variant, overlays).with_collage_options(options);
    if let Some(model_path) = &args.model {
        tracing::info!("Segmentation model: {}", model_path.display());
        pipeline = pipeline.with_segmentation(Arc::new(SegmentationEngine::from_model_path(
            model_path.clone(),
        )));
    } else {
        tracing::info!("No segmentation model, backgrounds are kept");
    }

    let mut capture = open_capture(&args)?;
    let mut session = CaptureSession::new(Arc::new(pipeline), character);

    for shot in 1..=CUT_COUNT {
        if args.webcam {
            count_down(shot, args.countdown);
        }
        let image = capture
            .capture_frame()
            .with_context(|| format!("Failed to capture photo {shot}"))?;
        session
            .capture(image)
            .context("Failed to generate collage")?;
    }

    let PipelineState::Complete(collage) = session.state() else {
        bail!("Session ended without a collage: {:?}", session.state());
    };

    let mut sink = DirectorySink::new(&args.output_dir);
    let path = sink.write_collage(collage, &session.suggested_filename())?;
    println!("{}", path.display());

    Ok(())
}

fn open_capture(args: &Args) -> Result<Box<dyn CaptureSource>> {
    if !args.webcam {
        return Ok(Box::new(FileCapture::new(args.photos.iter().cloned())));
    }

    #[cfg(feature = "webcam")]
    {
        let camera = anishot::capture::WebcamCapture::new(args.input_device)
            .context("Failed to initialize webcam capture")?;
        Ok(Box::new(camera))
    }
    #[cfg(not(feature = "webcam"))]
    {
        bail!(
            "Webcam device {} requested but this build lacks the `webcam` feature",
            args.input_device
        )
    }
}

fn count_down(shot: usize, seconds: u64) {
    tracing::info!("Photo {}/{} in {}s", shot, CUT_COUNT, seconds);
    for remaining in (1..=seconds).rev() {
        tracing::info!("{}...", remaining);
        std::thread::sleep(Duration::from_secs(1));
    }
}
