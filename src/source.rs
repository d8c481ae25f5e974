//! Video frame sources.
//!
//! [`FrameSource`] is the capability the playback controller pulls frames
//! from: sequential retrieval plus explicit backward seeking in frame-count
//! units. [`VideoFileSource`] implements it over an FFmpeg demux → decode →
//! scale pipeline that produces packed RGB8 frames.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Error as FfmpegError, Packet,
    Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::{Pixel, context::Input},
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::{config::Resolution, error::PlaybackError, utilities};

/// A single decoded frame: packed 8-bit RGB, height × width × 3.
///
/// Frames have no identity beyond their position index; the controller
/// retains only the current one, for paused redraws.
pub type Frame = RgbImage;

/// Sequential frame retrieval with backward seeking.
///
/// The contract the playback controller is written against. `Ok(None)` from
/// [`next_frame`](FrameSource::next_frame) signals end of stream — it is not
/// an error. Implementations own their decoder handle and their position
/// counter, which advances monotonically except on
/// [`seek_back`](FrameSource::seek_back).
pub trait FrameSource {
    /// Decode and return the next frame, or `Ok(None)` at end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>, PlaybackError>;

    /// Move the read position `delta` frames behind the last successfully
    /// read frame, clamped to the start of the stream.
    ///
    /// After `seek_back(1)` the next [`next_frame`](FrameSource::next_frame)
    /// call returns the frame *before* the one most recently read, which is
    /// how step-back re-shows the previous frame.
    fn seek_back(&mut self, delta: u64) -> Result<(), PlaybackError>;

    /// Index of the next frame to be read.
    fn position(&self) -> u64;

    /// Width of produced frames in pixels.
    fn width(&self) -> u32;

    /// Height of produced frames in pixels.
    fn height(&self) -> u32;

    /// Source frame rate in frames per second.
    fn frame_rate(&self) -> f64;
}

/// A [`FrameSource`] backed by a video file.
///
/// Opens the file once, keeps a persistent decoder and pixel-format
/// converter, and decodes on demand — one frame per
/// [`next_frame`](FrameSource::next_frame) call, without buffering the
/// stream. Backward seeks go to the nearest keyframe before the target and
/// decode forward, discarding frames until the target index is reached.
///
/// # Example
///
/// ```no_run
/// use replay::{FrameSource, VideoFileSource};
///
/// let mut source = VideoFileSource::open("input.mp4", None)?;
/// while let Some(frame) = source.next_frame()? {
///     println!("frame {} ({}x{})", source.position() - 1, frame.width(), frame.height());
/// }
/// # Ok::<(), replay::PlaybackError>(())
/// ```
pub struct VideoFileSource {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    frames_per_second: f64,
    output_width: u32,
    output_height: u32,
    /// Index of the next frame to be read.
    position: u64,
    /// Seek requested but not yet executed against the demuxer.
    pending_seek: Option<u64>,
    /// After a seek, discard decoded frames below this index.
    skip_until: Option<u64>,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    done: bool,
    /// Kept for error messages.
    #[allow(dead_code)]
    file_path: PathBuf,
}

impl VideoFileSource {
    /// Open a video file for sequential decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and sets up a converter from the stream's native pixel
    /// format to RGB24. When `display_resolution` is given, decoded frames
    /// are scaled to it; otherwise they keep the source resolution.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::SourceOpen`] if the file cannot be opened or its
    ///   codec parameters cannot be read.
    /// - [`PlaybackError::NoVideoStream`] if the file has no video stream.
    pub fn open<P: AsRef<Path>>(
        path: P,
        display_resolution: Option<Resolution>,
    ) -> Result<Self, PlaybackError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        ffmpeg_next::init().map_err(|error| PlaybackError::SourceOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| {
            PlaybackError::SourceOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            }
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(PlaybackError::NoVideoStream)?;
        let stream_index = stream.index();
        let time_base = stream.time_base();

        // Frames per second from the stream's average frame rate, falling
        // back to the raw rate field.
        let average = stream.avg_frame_rate();
        let frames_per_second = if average.denominator() != 0 {
            average.numerator() as f64 / average.denominator() as f64
        } else {
            let rate = stream.rate();
            if rate.denominator() != 0 {
                rate.numerator() as f64 / rate.denominator() as f64
            } else {
                0.0
            }
        };
        // Position arithmetic needs a usable rate even for streams that
        // do not declare one.
        let frames_per_second = if frames_per_second > 0.0 {
            frames_per_second
        } else {
            25.0
        };

        let codec_parameters = stream.parameters();
        let decoder_context =
            CodecContext::from_parameters(codec_parameters).map_err(|error| {
                PlaybackError::SourceOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to read video codec parameters: {error}"),
                }
            })?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| PlaybackError::SourceOpen {
                path: file_path.clone(),
                reason: format!("Failed to create video decoder: {error}"),
            })?;

        let (output_width, output_height) = match display_resolution {
            Some(resolution) => (resolution.width, resolution.height),
            None => (decoder.width(), decoder.height()),
        };

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            output_width,
            output_height,
            ScalingFlags::BILINEAR,
        )?;

        log::debug!(
            "opened {} ({}x{} @ {:.2} fps, decoding to {}x{})",
            file_path.display(),
            decoder.width(),
            decoder.height(),
            frames_per_second,
            output_width,
            output_height,
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            time_base,
            frames_per_second,
            output_width,
            output_height,
            position: 0,
            pending_seek: None,
            skip_until: None,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            done: false,
            file_path,
        })
    }

    /// Execute a deferred seek: container-level seek to the nearest
    /// keyframe before `target`, then arrange for decode-forward skipping.
    fn run_seek(&mut self, target: u64) -> Result<(), PlaybackError> {
        let timestamp =
            utilities::frame_number_to_seek_timestamp(target, self.frames_per_second);
        self.input.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.skip_until = Some(target);
        self.eof_sent = false;
        self.done = false;
        Ok(())
    }

    /// Convert the scaled RGB24 frame into an owned [`Frame`].
    fn take_scaled_frame(&mut self) -> Result<Frame, PlaybackError> {
        let buffer = utilities::frame_to_buffer(
            &self.scaled_frame,
            self.output_width,
            self.output_height,
            3,
        );
        RgbImage::from_raw(self.output_width, self.output_height, buffer).ok_or_else(|| {
            PlaybackError::Decode(
                "Failed to construct RGB image from decoded frame data".to_string(),
            )
        })
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, PlaybackError> {
        if let Some(target) = self.pending_seek.take() {
            self.run_seek(target)?;
        }
        if self.done {
            return Ok(None);
        }

        loop {
            // Drain frames the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let pts = self.decoded_frame.pts().unwrap_or(0);
                let frame_number = utilities::pts_to_frame_number(
                    pts,
                    self.time_base,
                    self.frames_per_second,
                );

                // After a seek the demuxer lands on a keyframe before the
                // target; decode forward until the target is reached.
                if let Some(target) = self.skip_until {
                    if frame_number < target {
                        continue;
                    }
                    self.skip_until = None;
                }

                self.position = frame_number + 1;
                self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;
                return Ok(Some(self.take_scaled_frame()?));
            }

            // Decoder has no buffered frames; feed it more packets.
            if self.eof_sent {
                self.done = true;
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index {
                        self.decoder.send_packet(&packet)?;
                    }
                    // Non-video packets are silently skipped.
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(_) => {
                    // Non-fatal read error; try the next packet.
                }
            }
        }
    }

    fn seek_back(&mut self, delta: u64) -> Result<(), PlaybackError> {
        let last_read = self.position.saturating_sub(1);
        let target = last_read.saturating_sub(delta);
        log::debug!("seek back {delta}: position {} -> {target}", self.position);
        self.pending_seek = Some(target);
        self.position = target;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn width(&self) -> u32 {
        self.output_width
    }

    fn height(&self) -> u32 {
        self.output_height
    }

    fn frame_rate(&self) -> f64 {
        self.frames_per_second
    }
}
