//! # replay
//!
//! Play back video files with optional per-frame processing — grayscale
//! conversion and motion-based foreground segmentation — interactive
//! pause/step-back navigation, and optional re-encoding of the processed
//! stream to an MPEG-4 file.
//!
//! Decoding and encoding are powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; the
//! immediate-mode window and the background-subtraction model come from
//! [`opencv`](https://crates.io/crates/opencv). Frames are plain
//! [`image::RgbImage`] values between the two.
//!
//! ## Quick Start
//!
//! ### Play a file in a window
//!
//! ```no_run
//! use replay::{PlaybackController, TransformChain, VideoFileSource, VideoWindow};
//!
//! let source = VideoFileSource::open("input.mp4", None)?;
//! let mut window = VideoWindow::open("video")?;
//! let mut controller =
//!     PlaybackController::new(Box::new(source), TransformChain::identity(), None);
//! controller.run(&mut window)?;
//! # Ok::<(), replay::PlaybackError>(())
//! ```
//!
//! ### Process and store the result
//!
//! ```no_run
//! use replay::{
//!     FrameSource, PlaybackConfig, PlaybackController, Resolution, TransformChain,
//!     VideoFileSink, VideoFileSource, VideoWindow,
//! };
//!
//! let config = PlaybackConfig {
//!     monochrome: true,
//!     ..PlaybackConfig::default()
//! };
//! let source = VideoFileSource::open(&config.video_file_path, None)?;
//! let resolution = Resolution {
//!     width: source.width(),
//!     height: source.height(),
//! };
//! let sink = VideoFileSink::open(config.resolved_target_path(), resolution, config.frame_rate)?;
//! let transforms = TransformChain::from_config(&config)?;
//! let mut window = VideoWindow::open("video")?;
//! let mut controller =
//!     PlaybackController::new(Box::new(source), transforms, Some(Box::new(sink)));
//! controller.run(&mut window)?;
//! # Ok::<(), replay::PlaybackError>(())
//! ```
//!
//! ## Playback controls
//!
//! | Input | Effect |
//! |-------|--------|
//! | `p` | toggle pause |
//! | `b` | step back one frame (while paused) |
//! | `q` | quit |
//!
//! The managed-canvas player (feature `gui`, binary `replay-gui`) offers
//! the same controls as buttons, with step-back enabled only while paused.
//!
//! ## Requirements
//!
//! FFmpeg and OpenCV development libraries must be installed on your
//! system. The `gui` feature additionally pulls in
//! [`eframe`](https://crates.io/crates/eframe).

pub mod config;
pub mod controller;
pub mod error;
#[cfg(feature = "gui")]
pub mod gui;
pub mod logging;
pub mod sink;
pub mod source;
pub mod surface;
pub mod transform;
mod utilities;

pub use config::{DEFAULT_FRAME_RATE, DEFAULT_VIDEO_PATH, PlaybackConfig, Resolution};
pub use controller::{PlaybackController, PlaybackState};
pub use error::PlaybackError;
pub use logging::LogLevel;
pub use sink::{FrameSink, VideoFileSink};
pub use source::{Frame, FrameSource, VideoFileSource};
pub use surface::{ControlEvent, Surface, VideoWindow};
pub use transform::{ForegroundSegmenter, FrameTransform, TransformChain};
