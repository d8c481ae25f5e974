//! Playback configuration.
//!
//! [`PlaybackConfig`] gathers everything the binaries parse from the command
//! line into one value that is passed into constructors. The config is
//! immutable once built: transforms, resolutions, and output paths are fixed
//! for the run.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
    str::FromStr,
};

/// A `WIDTHxHEIGHT` pixel resolution, as parsed from the command line.
///
/// # Example
///
/// ```
/// use replay::Resolution;
///
/// let resolution: Resolution = "1920x1080".parse().unwrap();
/// assert_eq!(resolution.width, 1920);
/// assert_eq!(resolution.height, 1080);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (width, height) = value
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
        let width: u32 = width
            .trim()
            .parse()
            .map_err(|_| format!("invalid width in {value:?}"))?;
        let height: u32 = height
            .trim()
            .parse()
            .map_err(|_| format!("invalid height in {value:?}"))?;
        if width == 0 || height == 0 {
            return Err(format!("resolution dimensions must be non-zero, got {value:?}"));
        }
        Ok(Resolution { width, height })
    }
}

/// Default input path, used when no `--video-file-path` is given.
pub const DEFAULT_VIDEO_PATH: &str = "data/video_1.mp4";

/// Default output frame rate in frames per second.
pub const DEFAULT_FRAME_RATE: u32 = 20;

/// Suffix appended to the input file stem to derive the default output path.
const PROCESSED_SUFFIX: &str = "_processed";

/// Everything the playback binaries need to construct a pipeline.
///
/// Populated by clap argument parsing in the binaries and passed by value
/// into [`VideoFileSource`](crate::VideoFileSource),
/// [`VideoFileSink`](crate::VideoFileSink), and the surfaces.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Path of the video to play.
    pub video_file_path: PathBuf,
    /// Explicit output path. `None` derives `<stem>_processed.mp4` beside
    /// the input via [`resolved_target_path`](PlaybackConfig::resolved_target_path).
    pub target_file_path: Option<PathBuf>,
    /// Output frame rate for the sink.
    pub frame_rate: u32,
    /// Resolution decoded frames are scaled to for display. `None` keeps
    /// the source resolution.
    pub display_resolution: Option<Resolution>,
    /// Resolution the sink is opened at. `None` uses the (possibly scaled)
    /// source resolution.
    pub output_resolution: Option<Resolution>,
    /// Convert frames to three-channel grayscale before display/encoding.
    pub monochrome: bool,
    /// Apply motion-based foreground segmentation before display/encoding.
    pub segment: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            video_file_path: PathBuf::from(DEFAULT_VIDEO_PATH),
            target_file_path: None,
            frame_rate: DEFAULT_FRAME_RATE,
            display_resolution: None,
            output_resolution: None,
            monochrome: false,
            segment: false,
        }
    }
}

impl PlaybackConfig {
    /// The output path: the explicit `--target-file-path` if given, else
    /// `<stem>_processed.mp4` beside the input file.
    pub fn resolved_target_path(&self) -> PathBuf {
        if let Some(path) = &self.target_file_path {
            return path.clone();
        }
        let stem = self
            .video_file_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.video_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("{stem}{PROCESSED_SUFFIX}.mp4"))
    }

    /// Whether the immediate-mode player should open a sink.
    ///
    /// Writing is enabled by `--segment` (segmentation is only useful if
    /// its result is stored) or by an explicit output path.
    pub fn writes_output(&self) -> bool {
        self.segment || self.target_file_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_both_separators() {
        assert_eq!(
            "640x480".parse::<Resolution>().unwrap(),
            Resolution {
                width: 640,
                height: 480
            }
        );
        assert_eq!(
            "1920X1080".parse::<Resolution>().unwrap(),
            Resolution {
                width: 1920,
                height: 1080
            }
        );
    }

    #[test]
    fn resolution_rejects_garbage() {
        assert!("640".parse::<Resolution>().is_err());
        assert!("x480".parse::<Resolution>().is_err());
        assert!("0x480".parse::<Resolution>().is_err());
        assert!("640xhigh".parse::<Resolution>().is_err());
    }

    #[test]
    fn target_path_derives_from_input_stem() {
        let config = PlaybackConfig {
            video_file_path: PathBuf::from("data/video_1.mp4"),
            ..PlaybackConfig::default()
        };
        assert_eq!(
            config.resolved_target_path(),
            PathBuf::from("data/video_1_processed.mp4")
        );
    }

    #[test]
    fn explicit_target_path_wins() {
        let config = PlaybackConfig {
            target_file_path: Some(PathBuf::from("out.mp4")),
            ..PlaybackConfig::default()
        };
        assert_eq!(config.resolved_target_path(), PathBuf::from("out.mp4"));
        assert!(config.writes_output());
    }
}
