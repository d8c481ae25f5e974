//! Per-frame transforms.
//!
//! A [`TransformChain`] is an ordered list of [`FrameTransform`]s applied
//! left-to-right to every frame between decoding and display/encoding. The
//! chain is configured once at startup and immutable for the run; ordering
//! is monochrome first, then segmentation.
//!
//! Transforms are total per frame: if an underlying library step cannot
//! produce output the error propagates as fatal — frames are never
//! silently skipped.

use opencv::{
    core::{self, Mat, Ptr},
    prelude::*,
    video::BackgroundSubtractorMOG2,
};

use crate::{
    config::PlaybackConfig,
    error::PlaybackError,
    source::Frame,
    utilities::{bgr_mat_to_rgb_image, rgb_image_to_bgr_mat},
};

// MOG2 model defaults: 500-frame history, variance threshold 16,
// shadow detection on.
const MOG2_HISTORY: i32 = 500;
const MOG2_VARIANCE_THRESHOLD: f64 = 16.0;
const MOG2_DETECT_SHADOWS: bool = true;

/// Motion-based foreground segmentation backed by an OpenCV MOG2
/// background subtractor.
///
/// The subtractor keeps a per-pixel background model that is updated on
/// every [`apply`](ForegroundSegmenter::apply), so the segmenter is
/// stateful across frames: early frames segment poorly until the model has
/// seen enough of the scene.
pub struct ForegroundSegmenter {
    subtractor: Ptr<BackgroundSubtractorMOG2>,
}

impl ForegroundSegmenter {
    /// Create a segmenter with the default MOG2 model parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Segmentation`] if the subtractor cannot be
    /// constructed.
    pub fn new() -> Result<Self, PlaybackError> {
        let subtractor = opencv::video::create_background_subtractor_mog2(
            MOG2_HISTORY,
            MOG2_VARIANCE_THRESHOLD,
            MOG2_DETECT_SHADOWS,
        )
        .map_err(|error| PlaybackError::Segmentation(error.to_string()))?;
        Ok(Self { subtractor })
    }

    /// Update the background model with `frame` and return the frame
    /// masked to its foreground regions.
    fn apply(&mut self, frame: &Frame) -> Result<Frame, PlaybackError> {
        let segmentation = |error: opencv::Error| PlaybackError::Segmentation(error.to_string());

        let image = rgb_image_to_bgr_mat(frame).map_err(segmentation)?;
        let mut foreground_mask = Mat::default();
        self.subtractor
            .apply(&image, &mut foreground_mask, -1.0)
            .map_err(segmentation)?;

        let mut foreground = Mat::default();
        core::bitwise_and(&image, &image, &mut foreground, &foreground_mask)
            .map_err(segmentation)?;
        bgr_mat_to_rgb_image(&foreground).map_err(segmentation)
    }
}

/// A single frame-to-frame transform.
pub enum FrameTransform {
    /// Luminance-weighted grayscale, re-expanded to three channels so
    /// downstream stages and encoders see a consistent shape.
    Monochrome,
    /// Foreground segmentation via background subtraction.
    ForegroundSegmentation(ForegroundSegmenter),
}

impl FrameTransform {
    /// Apply this transform to one frame.
    pub fn apply(&mut self, frame: Frame) -> Result<Frame, PlaybackError> {
        match self {
            FrameTransform::Monochrome => Ok(monochrome(&frame)),
            FrameTransform::ForegroundSegmentation(segmenter) => segmenter.apply(&frame),
        }
    }
}

/// Convert to grayscale, keeping the three-channel layout.
fn monochrome(frame: &Frame) -> Frame {
    let gray = image::imageops::grayscale(frame);
    let mut output = Frame::new(frame.width(), frame.height());
    for (pixel, luma) in output.pixels_mut().zip(gray.pixels()) {
        let value = luma.0[0];
        pixel.0 = [value, value, value];
    }
    output
}

/// An ordered list of transforms applied to each frame in sequence.
///
/// # Example
///
/// ```no_run
/// use replay::{PlaybackConfig, TransformChain};
///
/// let config = PlaybackConfig {
///     monochrome: true,
///     ..PlaybackConfig::default()
/// };
/// let mut chain = TransformChain::from_config(&config)?;
/// let frame = image::RgbImage::new(64, 48);
/// let processed = chain.apply(frame)?;
/// # Ok::<(), replay::PlaybackError>(())
/// ```
pub struct TransformChain {
    transforms: Vec<FrameTransform>,
}

impl TransformChain {
    /// An empty chain; [`apply`](TransformChain::apply) is the identity.
    pub fn identity() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Build the chain selected by `--monochrome` / `--segment`.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Segmentation`] if the segmenter cannot be
    /// constructed.
    pub fn from_config(config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        let mut transforms = Vec::new();
        if config.monochrome {
            transforms.push(FrameTransform::Monochrome);
        }
        if config.segment {
            transforms.push(FrameTransform::ForegroundSegmentation(
                ForegroundSegmenter::new()?,
            ));
        }
        Ok(Self { transforms })
    }

    /// Pipe one frame through every transform, left to right.
    pub fn apply(&mut self, frame: Frame) -> Result<Frame, PlaybackError> {
        let mut frame = frame;
        for transform in &mut self.transforms {
            frame = transform.apply(frame)?;
        }
        Ok(frame)
    }

    /// Number of configured transforms.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// `true` if the chain is the identity.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        Frame::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn monochrome_output_has_equal_channels() {
        let frame = gradient_frame(32, 24);
        let gray = monochrome(&frame);
        assert_eq!(gray.dimensions(), frame.dimensions());
        for pixel in gray.pixels() {
            assert_eq!(pixel.0[0], pixel.0[1]);
            assert_eq!(pixel.0[1], pixel.0[2]);
        }
    }

    #[test]
    fn monochrome_matches_luminance_weights() {
        let frame = gradient_frame(16, 16);
        let gray = monochrome(&frame);
        let reference = image::imageops::grayscale(&frame);
        for (pixel, luma) in gray.pixels().zip(reference.pixels()) {
            assert_eq!(pixel.0[0], luma.0[0]);
        }
    }

    #[test]
    fn monochrome_is_idempotent() {
        let frame = gradient_frame(32, 24);
        let once = monochrome(&frame);
        let twice = monochrome(&once);
        assert_eq!(once.as_raw(), twice.as_raw());
    }

    #[test]
    fn empty_chain_is_identity() {
        let frame = gradient_frame(8, 8);
        let mut chain = TransformChain::identity();
        assert!(chain.is_empty());
        let output = chain.apply(frame.clone()).unwrap();
        assert_eq!(output.as_raw(), frame.as_raw());
    }
}
