mod settings;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use crossbeam_channel::Receiver;
use serde::Serialize;

use facegate_core::detection::domain::detection_adapter::{DetectionAdapter, InitializationError};
use facegate_core::detection::infrastructure::onnx_blazeface_adapter::OnnxBlazefaceAdapter;
use facegate_core::detection::infrastructure::replay_adapter::ReplayAdapter;
use facegate_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facegate_core::publishing::capture_gate::CaptureGate;
use facegate_core::publishing::channel_status_publisher::ChannelStatusPublisher;
use facegate_core::publishing::status_publisher::StatusPublisher;
use facegate_core::rendering::infrastructure::rgba_surface::RgbaSurface;
use facegate_core::scheduling::frame_scheduler::{FrameScheduler, TickOutcome};
use facegate_core::scheduling::frame_source::FrameSource;
use facegate_core::scheduling::image_sequence_source::ImageSequenceSource;
use facegate_core::scheduling::tick_host::ManualTickHost;
use facegate_core::shared::constants::{BLAZEFACE_MODEL_NAME, BLAZEFACE_MODEL_URL};
use facegate_core::shared::model_resolver::{self, ModelOrigin};
use facegate_core::validation::status::ValidationStatus;

use settings::Settings;

/// Replays an image sequence through the face capture validation loop.
#[derive(Parser, Debug)]
#[command(name = "facegate")]
struct Cli {
    /// Image files or directories of images, played in order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Recorded detections (JSON) to replay instead of running the model.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// Directory holding a bundled copy of the detection model.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Rate at which the input images are played.
    #[arg(long, default_value = "30")]
    fps: f64,

    /// Simulated display refresh rate driving the tick callbacks.
    #[arg(long, default_value = "60")]
    refresh_hz: f64,

    /// Settings file (defaults to the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write each rendered overlay as a PNG into this directory.
    #[arg(long)]
    overlay_dir: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0). Overrides settings.
    #[arg(long)]
    confidence: Option<f64>,
}

/// One published status, as printed on stdout.
#[derive(Serialize)]
struct StatusLine<'a> {
    time_ms: f64,
    #[serde(flatten)]
    status: &'a ValidationStatus,
}

#[derive(Default)]
struct CaptureReport {
    published: usize,
    valid: usize,
    first_valid_ms: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load(),
    };
    if let Some(confidence) = cli.confidence {
        settings.confidence = confidence;
    }
    settings.policy.validate()?;

    let paths = ImageSequenceSource::collect_inputs(&cli.inputs)?;
    let source = ImageSequenceSource::open(paths, cli.fps)?;
    let duration_ms = source.duration_ms();
    let (width, height) = source.dimensions();
    log::info!(
        "Loaded {} images ({width}x{height}, {:.1}s at {} fps)",
        source.len(),
        duration_ms / 1000.0,
        cli.fps
    );

    let host = ManualTickHost::new();
    let (publisher, statuses) = ChannelStatusPublisher::unbounded();
    let mut scheduler = FrameScheduler::new(
        build_engine(&cli, settings.confidence),
        settings.policy.clone(),
        settings.scheduler.clone(),
        Box::new(host.clone()),
        Box::new(publisher),
        Box::new(StdoutPipelineLogger::default()),
    );

    let mut gate = CaptureGate::new();
    let mut report = CaptureReport::default();
    drain(&statuses, 0.0, &mut gate, &mut report)?;
    if !scheduler.is_available() {
        return Err("Face detection unavailable".into());
    }

    let mut surface = RgbaSurface::new(width, height);
    if let Some(dir) = &cli.overlay_dir {
        surface = surface.with_snapshot_dir(dir.clone());
    }
    scheduler.start(Box::new(source), Box::new(surface));

    let refresh_ms = 1000.0 / cli.refresh_hz;
    let deadline_ms = duration_ms + settings.scheduler.min_frame_interval_ms + refresh_ms;
    let mut now_ms = 0.0;
    while now_ms <= deadline_ms {
        if host.take_pending().is_some() && scheduler.on_tick(now_ms) == TickOutcome::NotReady {
            break;
        }
        drain(&statuses, now_ms, &mut gate, &mut report)?;
        now_ms += refresh_ms;
    }

    scheduler.stop();
    drain(&statuses, now_ms, &mut gate, &mut report)?;
    scheduler.logger().summary();

    if let Some(dir) = &cli.overlay_dir {
        log::info!("Overlays written to {}", dir.display());
    }
    print_report(&report, &gate);
    Ok(())
}

/// Prints every queued status as a JSON line and feeds it to the gate.
fn drain(
    statuses: &Receiver<ValidationStatus>,
    now_ms: f64,
    gate: &mut CaptureGate,
    report: &mut CaptureReport,
) -> Result<(), Box<dyn std::error::Error>> {
    for status in statuses.try_iter() {
        let line = serde_json::to_string(&StatusLine {
            time_ms: now_ms,
            status: &status,
        })?;
        println!("{line}");

        report.published += 1;
        if status.is_valid {
            report.valid += 1;
            report.first_valid_ms.get_or_insert(now_ms);
        }
        gate.publish(status);
    }
    Ok(())
}

fn print_report(report: &CaptureReport, gate: &CaptureGate) {
    match report.first_valid_ms {
        Some(first) => eprintln!(
            "Capture enabled on {}/{} statuses (first at {first:.0}ms)",
            report.valid, report.published
        ),
        None => eprintln!(
            "Capture never enabled ({} statuses)",
            report.published
        ),
    }
    if let Err(rejected) = gate.request_capture() {
        eprintln!("Final guidance: {}", rejected.message);
    }
}

fn build_engine(
    cli: &Cli,
    confidence: f64,
) -> Result<Box<dyn DetectionAdapter>, InitializationError> {
    if let Some(path) = &cli.detections {
        log::info!("Replaying detections from {}", path.display());
        let adapter = ReplayAdapter::from_file(path, cli.fps)
            .map_err(|e| InitializationError::Model(e.to_string()))?;
        return Ok(Box::new(adapter));
    }

    log::info!("Resolving model: {BLAZEFACE_MODEL_NAME}");
    let model = model_resolver::resolve(
        BLAZEFACE_MODEL_NAME,
        BLAZEFACE_MODEL_URL,
        cli.model_dir.as_deref(),
        Some(Box::new(download_progress)),
    )
    .map_err(|e| InitializationError::Model(e.to_string()))?;
    if model.origin == ModelOrigin::Downloaded {
        eprintln!();
    }
    log::info!("Using {} model at {}", model.origin, model.path.display());

    let adapter = OnnxBlazefaceAdapter::create(&model.path, confidence)?;
    log::info!("Face detection running on {:?} backend", adapter.backend());
    Ok(Box::new(adapter))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    for input in &cli.inputs {
        if !input.exists() {
            return Err(format!("Input not found: {}", input.display()).into());
        }
    }
    if cli.detections.is_some() && cli.model_dir.is_some() {
        return Err("--detections and --model-dir are mutually exclusive".into());
    }
    if let Some(path) = &cli.detections {
        if !path.is_file() {
            return Err(format!("Detections file not found: {}", path.display()).into());
        }
    }
    if !cli.fps.is_finite() || cli.fps <= 0.0 {
        return Err(format!("FPS must be positive, got {}", cli.fps).into());
    }
    if !cli.refresh_hz.is_finite() || cli.refresh_hz <= 0.0 {
        return Err(format!("Refresh rate must be positive, got {}", cli.refresh_hz).into());
    }
    if let Some(confidence) = cli.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {confidence}"
            )
            .into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("facegate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        let cli = parse(&[input]);
        assert_eq!(cli.fps, 30.0);
        assert_eq!(cli.refresh_hz, 60.0);
        assert!(cli.confidence.is_none());
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_inputs_required() {
        assert!(Cli::try_parse_from(["facegate"]).is_err());
    }

    #[test]
    fn test_missing_input_rejected() {
        let cli = parse(&["/nonexistent/frames"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_replay_and_model_dir_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let replay = dir.path().join("replay.json");
        std::fs::write(&replay, "[]").unwrap();
        let input = dir.path().to_str().unwrap();
        let cli = parse(&[
            input,
            "--detections",
            replay.to_str().unwrap(),
            "--model-dir",
            input,
        ]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_bad_rates_and_confidence_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_str().unwrap();
        assert!(validate(&parse(&[input, "--fps", "0"])).is_err());
        assert!(validate(&parse(&[input, "--refresh-hz", "-1"])).is_err());
        assert!(validate(&parse(&[input, "--confidence", "1.5"])).is_err());
    }

    #[test]
    fn test_drain_feeds_gate_and_report() {
        let (mut publisher, rx) = ChannelStatusPublisher::unbounded();
        publisher.publish(ValidationStatus::no_face());
        publisher.publish(ValidationStatus {
            is_valid: true,
            ..ValidationStatus::no_face()
        });

        let mut gate = CaptureGate::new();
        let mut report = CaptureReport::default();
        drain(&rx, 66.0, &mut gate, &mut report).unwrap();

        assert_eq!(report.published, 2);
        assert_eq!(report.valid, 1);
        assert_eq!(report.first_valid_ms, Some(66.0));
        assert!(gate.can_capture());
    }
}
