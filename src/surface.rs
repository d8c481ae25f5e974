//! Presentation surfaces.
//!
//! A [`Surface`] renders frames and reports control events. Two scheduling
//! strategies implement the capability set:
//!
//! - [`VideoWindow`] (this module): an immediate-mode OpenCV window whose
//!   [`poll_input`](Surface::poll_input) blocks for a fixed timeout — the
//!   poll doubles as the playback pacer.
//! - The managed canvas in [`crate::gui`] (feature `gui`): cooperative,
//!   driven by the host event loop's repaint timer, with buttons instead
//!   of key codes. It drives the controller directly rather than through
//!   the blocking loop, so the two scheduling contracts stay separate.

use opencv::highgui;

use crate::{error::PlaybackError, source::Frame, utilities::rgb_image_to_bgr_mat};

/// How long one input poll blocks, in milliseconds. This is also the
/// per-frame delay of immediate-mode playback.
const POLL_TIMEOUT_MS: i32 = 100;

/// A control event reported by a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Toggle between playing and paused (`p`, or the Pause/Play button).
    TogglePause,
    /// Re-show the previous frame (`b` while paused, or the Step Back
    /// button).
    StepBack,
    /// End playback (`q`, or closing the window).
    Quit,
}

/// Rendering plus control-input capability, shared by both surface kinds.
pub trait Surface {
    /// Display one frame.
    fn render(&mut self, frame: &Frame) -> Result<(), PlaybackError>;

    /// Wait for input according to this surface's scheduling strategy and
    /// return the decoded event, if any.
    fn poll_input(&mut self) -> Result<Option<ControlEvent>, PlaybackError>;
}

/// An immediate-mode native display window.
///
/// Renders by blitting the frame into an OpenCV `highgui` window and polls
/// the keyboard with a blocking 100 ms timeout. Key map: `p` toggles
/// pause, `b` steps back one frame (while paused), `q` quits.
///
/// The window is destroyed when the value is dropped.
pub struct VideoWindow {
    name: String,
}

impl VideoWindow {
    /// Create (and show) a named window.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Window`] if the window cannot be created —
    /// typically on headless systems without a display server.
    pub fn open(title: &str) -> Result<Self, PlaybackError> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)
            .map_err(|error| PlaybackError::Window(error.to_string()))?;
        Ok(Self {
            name: title.to_string(),
        })
    }
}

impl Surface for VideoWindow {
    fn render(&mut self, frame: &Frame) -> Result<(), PlaybackError> {
        let image = rgb_image_to_bgr_mat(frame)
            .map_err(|error| PlaybackError::Window(error.to_string()))?;
        highgui::imshow(&self.name, &image)
            .map_err(|error| PlaybackError::Window(error.to_string()))
    }

    fn poll_input(&mut self) -> Result<Option<ControlEvent>, PlaybackError> {
        let key = highgui::wait_key(POLL_TIMEOUT_MS)
            .map_err(|error| PlaybackError::Window(error.to_string()))?;
        Ok(decode_key(key))
    }
}

/// Map a `wait_key` return value to a control event.
fn decode_key(key: i32) -> Option<ControlEvent> {
    if key < 0 {
        return None;
    }
    match (key & 0xFF) as u8 {
        b'p' => Some(ControlEvent::TogglePause),
        b'b' => Some(ControlEvent::StepBack),
        b'q' => Some(ControlEvent::Quit),
        _ => None,
    }
}

impl Drop for VideoWindow {
    fn drop(&mut self) {
        // Window teardown failures are not actionable at this point.
        let _ = highgui::destroy_window(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_codes_map_to_events() {
        assert_eq!(decode_key(i32::from(b'p')), Some(ControlEvent::TogglePause));
        assert_eq!(decode_key(i32::from(b'b')), Some(ControlEvent::StepBack));
        assert_eq!(decode_key(i32::from(b'q')), Some(ControlEvent::Quit));
        assert_eq!(decode_key(i32::from(b'x')), None);
        assert_eq!(decode_key(-1), None);
    }

    #[test]
    fn modifier_bits_are_masked_off() {
        // wait_key reports modifiers in the high bits on some platforms.
        assert_eq!(
            decode_key(0x10000 | i32::from(b'q')),
            Some(ControlEvent::Quit)
        );
    }
}
