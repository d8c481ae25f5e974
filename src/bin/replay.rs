use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use replay::{
    FrameSink, FrameSource, LogLevel, PlaybackConfig, PlaybackController, PlaybackError,
    Resolution, TransformChain, VideoFileSink, VideoFileSource, VideoWindow, logging,
};

const CLI_AFTER_HELP: &str = "Examples:\n  replay --video-file-path clip.mp4\n  replay --video-file-path clip.mp4 --monochrome --display-resolution 1280x720\n  replay --video-file-path clip.mp4 --segment --frame-rate 20\n\nControls: p = pause/resume, b = step back one frame (while paused), q = quit";

#[derive(Debug, Parser)]
#[command(
    name = "replay",
    version,
    about = "Play back a video file with optional per-frame processing",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// The filepath of the video to display.
    #[arg(long, default_value = replay::DEFAULT_VIDEO_PATH)]
    video_file_path: PathBuf,

    /// Where to store the processed stream. Defaults to
    /// <stem>_processed.mp4 beside the input; giving a path enables
    /// output writing.
    #[arg(long)]
    target_file_path: Option<PathBuf>,

    /// The target frame rate of the output file.
    #[arg(long, default_value_t = replay::DEFAULT_FRAME_RATE)]
    frame_rate: u32,

    /// Scale decoded frames to WIDTHxHEIGHT for display.
    #[arg(long)]
    display_resolution: Option<Resolution>,

    /// The resolution of the output file (default: the displayed
    /// resolution).
    #[arg(long)]
    output_resolution: Option<Resolution>,

    /// If set, play the video in monochrome.
    #[arg(long)]
    monochrome: bool,

    /// If set, run foreground segmentation and store the result at the
    /// target path.
    #[arg(long)]
    segment: bool,

    /// Set the logger level.
    #[arg(long, value_enum, default_value = "INFO")]
    log_level: LogLevel,
}

impl Cli {
    fn into_config(self) -> PlaybackConfig {
        PlaybackConfig {
            video_file_path: self.video_file_path,
            target_file_path: self.target_file_path,
            frame_rate: self.frame_rate,
            display_resolution: self.display_resolution,
            output_resolution: self.output_resolution,
            monochrome: self.monochrome,
            segment: self.segment,
        }
    }
}

fn run() -> Result<(), PlaybackError> {
    let cli = Cli::parse();
    logging::init(cli.log_level);
    let config = cli.into_config();

    let source = VideoFileSource::open(&config.video_file_path, config.display_resolution)?;

    let mut target_path = None;
    let sink: Option<Box<dyn FrameSink>> = if config.writes_output() {
        let resolution = config.output_resolution.unwrap_or(Resolution {
            width: source.width(),
            height: source.height(),
        });
        let path = config.resolved_target_path();
        let sink = VideoFileSink::open(&path, resolution, config.frame_rate)?;
        target_path = Some(path);
        Some(Box::new(sink))
    } else {
        None
    };

    let transforms = TransformChain::from_config(&config)?;
    let mut window = VideoWindow::open("video")?;
    let mut controller = PlaybackController::new(Box::new(source), transforms, sink);
    controller.run(&mut window)?;

    if let Some(path) = target_path {
        println!("{} {}", "saved".green().bold(), path.display());
    }
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
