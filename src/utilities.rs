//! Internal utility functions.
//!
//! Helpers for pixel-data copying, timestamp conversion, and the
//! `image` ↔ OpenCV `Mat` interop shared by the display window and the
//! foreground segmenter.

use ffmpeg_next::{Rational, frame::Video as VideoFrame};
use image::RgbImage;
use opencv::{
    core::{self, Mat},
    prelude::*,
};

/// Copy pixel data from an FFmpeg video frame into a tightly-packed buffer.
///
/// `bytes_per_pixel` is the number of bytes per pixel for the output format
/// (3 for RGB24). FFmpeg frames may carry per-row padding, so rows are
/// copied individually when the stride differs from the packed width.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let expected_stride = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == expected_stride {
        data[..expected_stride * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(expected_stride * (height as usize));
        for row in 0..(height as usize) {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + expected_stride]);
        }
        buffer
    }
}

/// Rescale a PTS value from stream time base to a frame number.
pub(crate) fn pts_to_frame_number(pts: i64, time_base: Rational, frames_per_second: f64) -> u64 {
    let seconds = pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64;
    (seconds * frames_per_second).round() as u64
}

/// Convert a frame number to a seek timestamp in AV_TIME_BASE (microseconds).
///
/// `input_context.seek()` (via `avformat_seek_file` with `stream_index = -1`)
/// expects timestamps in AV_TIME_BASE (1/1_000_000), so the frame's time in
/// seconds converts directly to microseconds, bypassing the stream time base.
pub(crate) fn frame_number_to_seek_timestamp(frame_number: u64, frames_per_second: f64) -> i64 {
    let seconds = frame_number as f64 / frames_per_second;
    (seconds * 1_000_000.0) as i64
}

/// Copy an RGB image into a freshly-allocated BGR `Mat`.
///
/// OpenCV's display and segmentation APIs expect BGR channel order, so the
/// channels are swapped during the copy.
pub(crate) fn rgb_image_to_bgr_mat(image: &RgbImage) -> opencv::Result<Mat> {
    let (width, height) = image.dimensions();
    let mut mat = unsafe { Mat::new_rows_cols(height as i32, width as i32, core::CV_8UC3)? };
    let destination = mat.data_bytes_mut()?;
    for (pixel, source) in destination
        .chunks_exact_mut(3)
        .zip(image.as_raw().chunks_exact(3))
    {
        pixel[0] = source[2];
        pixel[1] = source[1];
        pixel[2] = source[0];
    }
    Ok(mat)
}

/// Copy a continuous 8-bit 3-channel BGR `Mat` back into an RGB image.
pub(crate) fn bgr_mat_to_rgb_image(mat: &Mat) -> opencv::Result<RgbImage> {
    let width = mat.cols() as u32;
    let height = mat.rows() as u32;
    let source = mat.data_bytes()?;
    let mut buffer = vec![0u8; source.len()];
    for (pixel, bgr) in buffer.chunks_exact_mut(3).zip(source.chunks_exact(3)) {
        pixel[0] = bgr[2];
        pixel[1] = bgr[1];
        pixel[2] = bgr[0];
    }
    RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
        opencv::Error::new(
            core::StsError,
            "BGR matrix size does not match its reported dimensions".to_string(),
        )
    })
}
