use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use flashscan::{
    ClipOutcome, ClipWriter, DetectorOptions, FfmpegLogLevel, FlashDetector, FlashEvent,
    FrameOutputOptions, ImageSequenceWriter, ProgressCallback, ProgressInfo, ScanOptions,
    VideoFrameSource,
};
use image::ImageFormat;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

#[cfg(feature = "gif")]
use flashscan::GifClipWriter;
#[cfg(feature = "tiff")]
use flashscan::TiffClipWriter;

const CLI_AFTER_HELP: &str = "Examples:\n  flashscan detect input.mp4 --json\n  flashscan clip input.mp4 --events 0,3 --out clips --format tiff\n  flashscan scan input.mp4 --out clips --threshold 60 --blur 8 --progress\n  flashscan completions zsh > _flashscan";

#[derive(Debug, Parser)]
#[command(
    name = "flashscan",
    version,
    about = "Detect bright flashes in video and extract clips around them",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional status output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while scanning.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing clips.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct DetectArgs {
    /// Input video path.
    input: PathBuf,

    /// Width frames are downscaled to for detection; 0 keeps the source width.
    #[arg(long, default_value_t = 320)]
    analysis_width: u32,

    /// Relative brightness (0-255) a frame must exceed to count as a flash.
    #[arg(long, default_value_t = 100.0)]
    threshold: f32,

    /// Side length of the box blur applied to the difference image.
    #[arg(long, default_value_t = 5)]
    blur: u32,

    /// Frames after an event's start at which the baseline is refreshed.
    #[arg(long, default_value_t = 20)]
    refresh_delay: u64,
}

#[derive(Debug, Args, Clone)]
struct ClipArgs {
    /// Video to cut clips from. Defaults to the input video.
    #[arg(long)]
    clip_source: Option<PathBuf>,

    /// Output directory for clips.
    #[arg(long, default_value = "clips")]
    out: PathBuf,

    /// Number of frames per clip.
    #[arg(long, default_value_t = 32)]
    clip_length: usize,

    /// Clip format: png | jpg | bmp (image sequences), tiff or gif.
    #[arg(long, default_value = "png")]
    format: String,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the flash events in a video.
    #[command(
        about = "Detect flash events",
        after_help = "Examples:\n  flashscan detect input.mp4\n  flashscan detect input.mp4 --threshold 60 --blur 8 --json"
    )]
    Detect {
        #[command(flatten)]
        detect: DetectArgs,

        /// Output events as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Detect flashes and extract clips for selected events.
    #[command(
        about = "Extract clips for selected events",
        after_help = "Examples:\n  flashscan clip input.mp4 --events 0,19\n  flashscan clip low_res.mp4 --clip-source full_res.mp4 --events 2 --format gif"
    )]
    Clip {
        #[command(flatten)]
        detect: DetectArgs,

        #[command(flatten)]
        clip: ClipArgs,

        /// Comma-separated event indices, as listed by `detect`.
        #[arg(long)]
        events: String,
    },

    /// Detect flashes and extract a clip for every event.
    #[command(about = "Extract clips for all events")]
    Scan {
        #[command(flatten)]
        detect: DetectArgs,

        #[command(flatten)]
        clip: ClipArgs,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

enum ClipFormat {
    Sequence(ImageFormat),
    #[cfg(feature = "tiff")]
    Tiff,
    #[cfg(feature = "gif")]
    Gif,
}

fn parse_clip_format(value: &str) -> Option<ClipFormat> {
    match value.trim_start_matches('.').to_ascii_lowercase().as_str() {
        "png" => Some(ClipFormat::Sequence(ImageFormat::Png)),
        "jpg" | "jpeg" => Some(ClipFormat::Sequence(ImageFormat::Jpeg)),
        "bmp" => Some(ClipFormat::Sequence(ImageFormat::Bmp)),
        #[cfg(feature = "tiff")]
        "tiff" | "tif" => Some(ClipFormat::Tiff),
        #[cfg(feature = "gif")]
        "gif" => Some(ClipFormat::Gif),
        _ => None,
    }
}

fn parse_selection(value: &str) -> Result<Vec<usize>, String> {
    let selection = value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .map_err(|_| format!("invalid event index: {part}"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if selection.is_empty() {
        return Err("--events must list at least one event index".to_string());
    }
    Ok(selection)
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        flashscan::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} frames {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total.max(info.current));
        }
        self.bar.set_position(info.current);
        self.bar.set_message(format!("{} flash(es)", info.events_found));
    }
}

fn detect_events(
    args: &DetectArgs,
    global: &GlobalOptions,
) -> Result<(Vec<FlashEvent>, f64), Box<dyn std::error::Error>> {
    let mut output = FrameOutputOptions::new();
    if args.analysis_width > 0 {
        output = output.with_width(args.analysis_width);
    }

    let mut source = VideoFrameSource::open_with_output(&args.input, output)?;
    let metadata = source.metadata().clone();
    if global.verbose {
        let (width, height) = source.output_dimensions();
        eprintln!(
            "{} {}x{} @ {:.2} fps [{}], analysing at {width}x{height}",
            "input:".cyan().bold(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.codec,
        );
    }

    let detector = FlashDetector::new(
        DetectorOptions::new()
            .threshold(args.threshold)
            .blur_size(args.blur)
            .baseline_refresh_delay(args.refresh_delay),
    );

    let mut scan = ScanOptions::new()
        .with_expected_frames(metadata.frame_count)
        .with_batch_size(100);
    let progress = if global.progress {
        let progress = Arc::new(BarProgress::new(metadata.frame_count)?);
        scan = scan.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let events = detector.detect_from_source_with_options(&mut source, &scan)?;

    if let Some(progress) = progress {
        progress.bar.finish_with_message("done");
    }

    Ok((events, metadata.frames_per_second))
}

fn print_events(events: &[FlashEvent], frames_per_second: f64) {
    if events.is_empty() {
        println!("{}", "No flashes detected".yellow());
        return;
    }
    for (index, event) in events.iter().enumerate() {
        let seconds = if frames_per_second > 0.0 {
            event.start_index as f64 / frames_per_second
        } else {
            0.0
        };
        println!(
            "#{index:<4} frame {:>8}  {:>9.3}s  {} frame(s)",
            event.start_index, seconds, event.length,
        );
    }
}

fn extract_outcomes(
    clip_source: &Path,
    events: &[FlashEvent],
    selection: &[usize],
    clip_length: usize,
) -> Result<Vec<ClipOutcome>, Box<dyn std::error::Error>> {
    #[cfg(feature = "rayon")]
    let outcomes = flashscan::extract_clips_parallel(
        || VideoFrameSource::open(clip_source),
        events,
        selection,
        clip_length,
        &ScanOptions::new(),
    )?;

    #[cfg(not(feature = "rayon"))]
    let outcomes = {
        let mut source = VideoFrameSource::open(clip_source)?;
        flashscan::extract_clips_with_options(
            &mut source,
            events,
            selection,
            clip_length,
            &ScanOptions::new(),
        )?
    };

    Ok(outcomes)
}

fn build_writer(
    args: &ClipArgs,
    overwrite: bool,
) -> Result<Box<dyn ClipWriter>, Box<dyn std::error::Error>> {
    let format = parse_clip_format(&args.format)
        .ok_or(format!("unsupported --format: {}", args.format))?;

    let writer: Box<dyn ClipWriter> = match format {
        ClipFormat::Sequence(image_format) => Box::new(
            ImageSequenceWriter::new(&args.out)
                .with_format(image_format)
                .with_overwrite(overwrite),
        ),
        #[cfg(feature = "tiff")]
        ClipFormat::Tiff => Box::new(TiffClipWriter::new(&args.out).with_overwrite(overwrite)),
        #[cfg(feature = "gif")]
        ClipFormat::Gif => Box::new(GifClipWriter::new(&args.out).with_overwrite(overwrite)),
    };
    Ok(writer)
}

fn write_clips(
    detect: &DetectArgs,
    clip: &ClipArgs,
    global: &GlobalOptions,
    events: &[FlashEvent],
    selection: &[usize],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = build_writer(clip, global.overwrite)?;
    let clip_source = clip.clip_source.as_deref().unwrap_or(&detect.input);

    let outcomes = extract_outcomes(clip_source, events, selection, clip.clip_length)?;

    let mut written = 0_usize;
    for outcome in outcomes {
        let result = outcome
            .clip
            .and_then(|clip| writer.write_clip(outcome.event_index, &clip.frames));
        match result {
            Ok(path) => {
                written += 1;
                if global.verbose {
                    eprintln!("saved event {} -> {}", outcome.event_index, path.display());
                }
            }
            Err(error) => eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("event {}: {error}", outcome.event_index).yellow()
            ),
        }
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!(
            "Wrote {written} of {} clip(s) to {}",
            selection.len(),
            clip.out.display()
        )
        .green()
    );
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Detect { detect, json } => {
            let (events, frames_per_second) = detect_events(&detect, &cli.global)?;
            if json {
                let payload = json!({
                    "input": detect.input.display().to_string(),
                    "frames_per_second": frames_per_second,
                    "events": events.iter().enumerate().map(|(index, event)| json!({
                        "index": index,
                        "start_index": event.start_index,
                        "length": event.length,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_events(&events, frames_per_second);
            }
        }
        Commands::Clip {
            detect,
            clip,
            events,
        } => {
            let selection = parse_selection(&events)?;
            let (detected, _) = detect_events(&detect, &cli.global)?;
            if cli.global.verbose {
                eprintln!("{} {} event(s) detected", "detect:".cyan().bold(), detected.len());
            }
            write_clips(&detect, &clip, &cli.global, &detected, &selection)?;
        }
        Commands::Scan { detect, clip } => {
            let (detected, frames_per_second) = detect_events(&detect, &cli.global)?;
            print_events(&detected, frames_per_second);
            if detected.is_empty() {
                return Ok(());
            }
            let selection: Vec<usize> = (0..detected.len()).collect();
            write_clips(&detect, &clip, &cli.global, &detected, &selection)?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "flashscan", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
