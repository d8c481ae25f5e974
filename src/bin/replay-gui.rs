use std::path::PathBuf;

use clap::Parser;
use colored::Colorize;
use replay::{
    FrameSource, LogLevel, PlaybackConfig, PlaybackController, PlaybackError, Resolution,
    TransformChain, VideoFileSink, VideoFileSource, gui, logging,
};

const CLI_AFTER_HELP: &str = "Examples:\n  replay-gui --video-file-path clip.mp4\n  replay-gui --video-file-path clip.mp4 --segment --target-file-path segmented.mp4\n\nThe processed stream is always written to the target path while playing.";

#[derive(Debug, Parser)]
#[command(
    name = "replay-gui",
    version,
    about = "Play back a video file on a canvas with Pause and Step Back controls",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// The filepath of the video to display.
    #[arg(long, default_value = replay::DEFAULT_VIDEO_PATH)]
    video_file_path: PathBuf,

    /// The filepath of the video to extract. Defaults to
    /// <stem>_processed.mp4 beside the input.
    #[arg(long)]
    target_file_path: Option<PathBuf>,

    /// The target frame rate of the output file.
    #[arg(long, default_value_t = replay::DEFAULT_FRAME_RATE)]
    frame_rate: u32,

    /// The resolution of the output file (default: the source
    /// resolution).
    #[arg(long)]
    output_resolution: Option<Resolution>,

    /// If set, play the video in monochrome.
    #[arg(long)]
    monochrome: bool,

    /// If set, run the segmentation algorithm and save the result to the
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
            display_resolution: None,
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

    let source = VideoFileSource::open(&config.video_file_path, None)?;
    let width = source.width();
    let height = source.height();

    // The GUI player always stores the processed stream.
    let resolution = config
        .output_resolution
        .unwrap_or(Resolution { width, height });
    let target_path = config.resolved_target_path();
    let sink = VideoFileSink::open(&target_path, resolution, config.frame_rate)?;

    let transforms = TransformChain::from_config(&config)?;
    let controller =
        PlaybackController::new(Box::new(source), transforms, Some(Box::new(sink)));

    gui::run(controller, "Video Playback GUI", width, height)?;

    println!("{} {}", "saved".green().bold(), target_path.display());
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
