//! Video frame sinks.
//!
//! [`FrameSink`] is the capability the playback controller pushes processed
//! frames into. [`VideoFileSink`] implements it as a streaming FFmpeg
//! encoder: frames are appended one at a time to an MPEG-4 container using
//! the `mp4v`-tagged MPEG-4 Part 2 codec, at a resolution and frame rate
//! fixed when the sink is opened.
//!
//! The sink never resizes. A frame whose dimensions differ from the
//! configured resolution is rejected with
//! [`PlaybackError::DimensionMismatch`].

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational,
    codec::Id,
    codec::context::Context as CodecContext,
    encoder::Video as OpenedVideoEncoder,
    format::{Flags as FormatFlags, Pixel, context::Output},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{config::Resolution, error::PlaybackError, source::Frame};

/// Append processed frames to an output video.
///
/// `write` appends exactly one frame; `close` finalizes the container and
/// must be safe to call more than once (only the first call does work).
pub trait FrameSink {
    /// Append one frame. The frame's dimensions must equal the resolution
    /// the sink was configured with.
    fn write(&mut self, frame: &Frame) -> Result<(), PlaybackError>;

    /// Flush pending data and finalize the output. Idempotent.
    fn close(&mut self) -> Result<(), PlaybackError>;
}

/// A [`FrameSink`] that encodes frames into an MPEG-4 video file.
///
/// Created via [`VideoFileSink::open`]. Frames are converted RGB24 →
/// YUV420P and fed to the encoder as they arrive; packets are interleaved
/// into the container immediately, so memory use is independent of stream
/// length.
///
/// Dropping an unclosed sink finalizes it best-effort; call
/// [`close`](FrameSink::close) explicitly to observe errors.
///
/// # Example
///
/// ```no_run
/// use image::RgbImage;
/// use replay::{FrameSink, Resolution, VideoFileSink};
///
/// let resolution = Resolution { width: 640, height: 480 };
/// let mut sink = VideoFileSink::open("output.mp4", resolution, 20)?;
/// sink.write(&RgbImage::new(640, 480))?;
/// sink.close()?;
/// # Ok::<(), replay::PlaybackError>(())
/// ```
pub struct VideoFileSink {
    output: Output,
    encoder: OpenedVideoEncoder,
    scaler: ScalingContext,
    stream_index: usize,
    encoder_time_base: Rational,
    width: u32,
    height: u32,
    frame_index: i64,
    closed: bool,
    file_path: PathBuf,
}

impl VideoFileSink {
    /// Open an output video file for appending frames.
    ///
    /// The container format is inferred from the file extension; the codec
    /// is fixed to MPEG-4 Part 2 (`mp4v`), which every MPEG-4-compatible
    /// player handles.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::SinkOpen`] if the output cannot be created
    /// or the encoder cannot be configured.
    pub fn open<P: AsRef<Path>>(
        path: P,
        resolution: Resolution,
        frame_rate: u32,
    ) -> Result<Self, PlaybackError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();
        let sink_open = |reason: String| PlaybackError::SinkOpen {
            path: file_path.clone(),
            reason,
        };

        ffmpeg_next::init()
            .map_err(|error| sink_open(format!("FFmpeg initialisation failed: {error}")))?;

        let mut output = ffmpeg_next::format::output(&path)
            .map_err(|error| sink_open(format!("cannot open output: {error}")))?;

        // Check the global-header requirement before adding the stream
        // (avoids a borrow conflict with `add_stream`).
        let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let encoder_codec = ffmpeg_next::encoder::find(Id::MPEG4)
            .ok_or_else(|| sink_open("MPEG-4 encoder not available".to_string()))?;

        let mut stream = output
            .add_stream(encoder_codec)
            .map_err(|error| sink_open(format!("cannot add stream: {error}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| sink_open(format!("cannot create codec context: {error}")))?
            .encoder()
            .video()
            .map_err(|error| sink_open(format!("cannot create video encoder: {error}")))?;

        let encoder_time_base = Rational::new(1, frame_rate as i32);
        encoder.set_width(resolution.width);
        encoder.set_height(resolution.height);
        encoder.set_format(Pixel::YUV420P);
        encoder.set_time_base(encoder_time_base);
        encoder.set_frame_rate(Some(Rational::new(frame_rate as i32, 1)));

        if needs_global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |=
                    ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let opened_encoder = encoder
            .open_as(encoder_codec)
            .map_err(|error| sink_open(format!("cannot open encoder: {error}")))?;

        stream.set_parameters(&opened_encoder);

        output
            .write_header()
            .map_err(|error| sink_open(format!("cannot write header: {error}")))?;

        let scaler = ScalingContext::get(
            Pixel::RGB24,
            resolution.width,
            resolution.height,
            Pixel::YUV420P,
            resolution.width,
            resolution.height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| sink_open(format!("cannot create scaler: {error}")))?;

        log::info!(
            "writing processed stream to {} ({} @ {} fps)",
            file_path.display(),
            resolution,
            frame_rate,
        );

        Ok(Self {
            output,
            encoder: opened_encoder,
            scaler,
            stream_index,
            encoder_time_base,
            width: resolution.width,
            height: resolution.height,
            frame_index: 0,
            closed: false,
            file_path,
        })
    }

    /// Drain encoded packets and interleave them into the container.
    fn drain_packets(&mut self) -> Result<(), PlaybackError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            // The muxer may have adjusted the stream time base when the
            // header was written; rescale at write time.
            let stream_time_base = self
                .output
                .stream(self.stream_index)
                .map(|stream| stream.time_base())
                .unwrap_or(self.encoder_time_base);
            packet.rescale_ts(self.encoder_time_base, stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|error| PlaybackError::Encode(format!("write packet failed: {error}")))?;
        }
        Ok(())
    }
}

impl FrameSink for VideoFileSink {
    fn write(&mut self, frame: &Frame) -> Result<(), PlaybackError> {
        if self.closed {
            return Err(PlaybackError::Encode(
                "sink is already closed".to_string(),
            ));
        }
        if frame.width() != self.width || frame.height() != self.height {
            return Err(PlaybackError::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                actual_width: frame.width(),
                actual_height: frame.height(),
            });
        }

        // Copy the packed RGB data into an FFmpeg frame, honoring its
        // row stride.
        let mut source_frame = VideoFrame::new(Pixel::RGB24, self.width, self.height);
        let stride = source_frame.stride(0);
        let data = source_frame.data_mut(0);
        let rgb_bytes = frame.as_raw();
        let row_length = (self.width as usize) * 3;
        for row in 0..self.height as usize {
            let source_start = row * row_length;
            let destination_start = row * stride;
            data[destination_start..destination_start + row_length]
                .copy_from_slice(&rgb_bytes[source_start..source_start + row_length]);
        }

        let mut encoder_frame = VideoFrame::empty();
        self.scaler
            .run(&source_frame, &mut encoder_frame)
            .map_err(|error| PlaybackError::Encode(format!("scaling failed: {error}")))?;
        encoder_frame.set_pts(Some(self.frame_index));
        self.frame_index += 1;

        self.encoder
            .send_frame(&encoder_frame)
            .map_err(|error| PlaybackError::Encode(format!("send_frame failed: {error}")))?;
        self.drain_packets()
    }

    fn close(&mut self) -> Result<(), PlaybackError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.encoder
            .send_eof()
            .map_err(|error| PlaybackError::Encode(format!("send_eof failed: {error}")))?;
        self.drain_packets()?;
        self.output
            .write_trailer()
            .map_err(|error| PlaybackError::Encode(format!("cannot write trailer: {error}")))?;

        log::info!(
            "finalized {} ({} frames)",
            self.file_path.display(),
            self.frame_index,
        );
        Ok(())
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(error) = self.close() {
                log::warn!("failed to finalize {}: {error}", self.file_path.display());
            }
        }
    }
}
