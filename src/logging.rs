//! Logger setup shared by the playback binaries.
//!
//! Two logging systems are in play: the Rust-side [`log`] facade used by
//! this crate, and FFmpeg's internal stderr logging, which is configured
//! separately through `ffmpeg_next::util::log`. The `--log-level` flag
//! drives both so a single switch quiets (or opens up) the whole pipeline.

use clap::ValueEnum;
use ffmpeg_next::util::log::Level as FfmpegLevel;
use log::LevelFilter;

/// Verbosity selected by `--log-level`.
///
/// The level names mirror the original utilities' choices; `Critical` maps
/// to the `log` facade's `Error` (its most severe level) and to FFmpeg's
/// `Fatal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    /// Log everything, including per-frame diagnostics.
    Debug,
    /// Log operational messages (default).
    Info,
    /// Log warnings and errors only.
    Warning,
    /// Log errors only.
    Error,
    /// Log only unrecoverable failures.
    Critical,
}

impl LogLevel {
    fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error | LogLevel::Critical => LevelFilter::Error,
        }
    }

    fn to_ffmpeg_level(self) -> FfmpegLevel {
        match self {
            LogLevel::Debug => FfmpegLevel::Verbose,
            LogLevel::Info => FfmpegLevel::Warning,
            LogLevel::Warning => FfmpegLevel::Warning,
            LogLevel::Error => FfmpegLevel::Error,
            LogLevel::Critical => FfmpegLevel::Fatal,
        }
    }
}

/// Install the process-wide logger and tune FFmpeg's stderr verbosity.
///
/// Call once at binary startup, before opening any source or sink. FFmpeg
/// defaults to `Warning` even at `INFO` so decoder chatter does not drown
/// the player's own output.
pub fn init(level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(level.to_level_filter())
        .format_timestamp(None)
        .init();
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}
