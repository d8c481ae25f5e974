//! The playback state machine.
//!
//! [`PlaybackController`] drives the pipeline: fetch a frame from the
//! source, pipe it through the transform chain, hand it to a presentation
//! surface, optionally append it to a sink, and react to control events.
//!
//! States and transitions:
//!
//! ```text
//! Playing --(end of stream)--> Stopped
//! Playing --(pause)----------> Paused
//! Paused  --(resume)---------> Playing
//! Paused  --(step back)------> Paused   (seek one frame back, re-render)
//! Playing | Paused --(quit)--> Stopped
//! ```
//!
//! `Stopped` is terminal: the sink is finalized and no further frames are
//! fetched. Step-back redraws are never written to the sink.

use crate::{
    error::PlaybackError,
    sink::FrameSink,
    source::{Frame, FrameSource},
    surface::{ControlEvent, Surface},
    transform::TransformChain,
};

/// Where playback currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Frames are being fetched and rendered continuously.
    Playing,
    /// No fetching; only control input is serviced.
    Paused,
    /// Terminal. Resources have been released.
    Stopped,
}

/// Drives fetch → transform → render → encode → poll.
///
/// The controller owns the source, the transform chain, and the optional
/// sink; surfaces stay outside so the same controller can be driven either
/// by the blocking immediate-mode loop ([`run`](PlaybackController::run))
/// or cooperatively, one [`advance`](PlaybackController::advance) per
/// host-timer tick.
pub struct PlaybackController {
    source: Box<dyn FrameSource>,
    transforms: TransformChain,
    sink: Option<Box<dyn FrameSink>>,
    state: PlaybackState,
    current_frame: Option<Frame>,
}

impl PlaybackController {
    /// Assemble a controller. Playback starts in [`PlaybackState::Playing`].
    pub fn new(
        source: Box<dyn FrameSource>,
        transforms: TransformChain,
        sink: Option<Box<dyn FrameSink>>,
    ) -> Self {
        Self {
            source,
            transforms,
            sink,
            state: PlaybackState::Playing,
            current_frame: None,
        }
    }

    /// Current playback state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The most recently rendered frame, kept for paused redraws.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.current_frame.as_ref()
    }

    /// Fetch, transform, and (when a sink is configured) append the next
    /// frame.
    ///
    /// Returns the processed frame, or `None` when the stream is exhausted
    /// — in which case the controller transitions to
    /// [`PlaybackState::Stopped`] and finalizes the sink. Calling `advance`
    /// outside [`PlaybackState::Playing`] is a no-op returning `None`.
    pub fn advance(&mut self) -> Result<Option<&Frame>, PlaybackError> {
        if self.state != PlaybackState::Playing {
            return Ok(None);
        }
        match self.source.next_frame()? {
            None => {
                log::info!("end of stream at frame {}", self.source.position());
                self.stop()?;
                Ok(None)
            }
            Some(frame) => {
                let frame = self.transforms.apply(frame)?;
                if let Some(sink) = &mut self.sink {
                    sink.write(&frame)?;
                }
                self.current_frame = Some(frame);
                Ok(self.current_frame.as_ref())
            }
        }
    }

    /// Re-show the frame before the one currently displayed.
    ///
    /// Only meaningful while paused; in any other state this is a no-op.
    /// The re-fetched frame goes through the transform chain again but is
    /// **not** written to the sink.
    pub fn step_back(&mut self) -> Result<Option<&Frame>, PlaybackError> {
        if self.state != PlaybackState::Paused {
            return Ok(None);
        }
        log::debug!("step back from position {}", self.source.position());
        self.source.seek_back(1)?;
        match self.source.next_frame()? {
            None => Ok(None),
            Some(frame) => {
                let frame = self.transforms.apply(frame)?;
                self.current_frame = Some(frame);
                Ok(self.current_frame.as_ref())
            }
        }
    }

    /// Toggle between [`PlaybackState::Playing`] and
    /// [`PlaybackState::Paused`]. Ignored once stopped.
    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            PlaybackState::Playing => {
                log::info!("paused");
                PlaybackState::Paused
            }
            PlaybackState::Paused => {
                log::info!("resumed");
                PlaybackState::Playing
            }
            PlaybackState::Stopped => PlaybackState::Stopped,
        };
    }

    /// Enter the terminal state and finalize the sink.
    ///
    /// Idempotent: repeated calls are no-ops.
    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        if self.state == PlaybackState::Stopped {
            return Ok(());
        }
        self.state = PlaybackState::Stopped;
        if let Some(sink) = &mut self.sink {
            sink.close()?;
        }
        Ok(())
    }

    /// The blocking immediate-mode playback loop.
    ///
    /// Runs until end of stream or a quit event. The surface's input poll
    /// blocks for its fixed timeout, which also paces playback.
    ///
    /// # Errors
    ///
    /// Any decoding, transform, rendering, or encoding failure aborts the
    /// loop and propagates; the sink is still finalized on drop.
    pub fn run(&mut self, surface: &mut dyn Surface) -> Result<(), PlaybackError> {
        while self.state != PlaybackState::Stopped {
            match self.state {
                PlaybackState::Playing => {
                    if let Some(frame) = self.advance()? {
                        surface.render(frame)?;
                    }
                    if self.state == PlaybackState::Stopped {
                        break;
                    }
                    match surface.poll_input()? {
                        Some(ControlEvent::TogglePause) => self.toggle_pause(),
                        Some(ControlEvent::Quit) => {
                            log::info!("quitting");
                            self.stop()?;
                        }
                        // Step-back is only honored while paused.
                        Some(ControlEvent::StepBack) | None => {}
                    }
                }
                PlaybackState::Paused => match surface.poll_input()? {
                    Some(ControlEvent::TogglePause) => self.toggle_pause(),
                    Some(ControlEvent::StepBack) => {
                        if let Some(frame) = self.step_back()? {
                            surface.render(frame)?;
                        }
                    }
                    Some(ControlEvent::Quit) => {
                        log::info!("quitting");
                        self.stop()?;
                    }
                    None => {}
                },
                PlaybackState::Stopped => {}
            }
        }
        Ok(())
    }
}
