//! Playback state machine integration tests.
//!
//! These run against a synthetic in-memory frame source and a recording
//! sink, so they exercise the controller contract without touching FFmpeg
//! or a display.

use std::{cell::RefCell, rc::Rc};

use replay::{
    Frame, FrameSink, FrameSource, PlaybackConfig, PlaybackController, PlaybackError,
    PlaybackState, TransformChain,
};

/// Deterministic frame content: the first pixel's red channel carries the
/// frame index, the rest is a gradient so grayscale has something to chew
/// on.
fn synthetic_frame(index: u64, width: u32, height: u32) -> Frame {
    Frame::from_fn(width, height, |x, y| {
        image::Rgb([
            (index % 256) as u8,
            (x * 11 % 256) as u8,
            (y * 17 % 256) as u8,
        ])
    })
}

/// The frame index a synthetic frame carries.
fn frame_index(frame: &Frame) -> u64 {
    u64::from(frame.get_pixel(0, 0).0[0])
}

struct SyntheticSource {
    frame_count: u64,
    position: u64,
    width: u32,
    height: u32,
}

impl SyntheticSource {
    fn new(frame_count: u64) -> Self {
        Self {
            frame_count,
            position: 0,
            width: 16,
            height: 12,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, PlaybackError> {
        if self.position >= self.frame_count {
            return Ok(None);
        }
        let frame = synthetic_frame(self.position, self.width, self.height);
        self.position += 1;
        Ok(Some(frame))
    }

    fn seek_back(&mut self, delta: u64) -> Result<(), PlaybackError> {
        let last_read = self.position.saturating_sub(1);
        self.position = last_read.saturating_sub(delta);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn frame_rate(&self) -> f64 {
        20.0
    }
}

#[derive(Default)]
struct SinkLog {
    written: Vec<u64>,
    closed: bool,
}

/// A sink that records which frame indices were appended.
struct RecordingSink {
    log: Rc<RefCell<SinkLog>>,
}

impl FrameSink for RecordingSink {
    fn write(&mut self, frame: &Frame) -> Result<(), PlaybackError> {
        self.log.borrow_mut().written.push(frame_index(frame));
        Ok(())
    }

    fn close(&mut self) -> Result<(), PlaybackError> {
        self.log.borrow_mut().closed = true;
        Ok(())
    }
}

fn controller_with_sink(
    frame_count: u64,
) -> (PlaybackController, Rc<RefCell<SinkLog>>) {
    let log = Rc::new(RefCell::new(SinkLog::default()));
    let sink = RecordingSink {
        log: Rc::clone(&log),
    };
    let controller = PlaybackController::new(
        Box::new(SyntheticSource::new(frame_count)),
        TransformChain::identity(),
        Some(Box::new(sink)),
    );
    (controller, log)
}

#[test]
fn plays_to_end_of_stream_and_stops() {
    let (mut controller, log) = controller_with_sink(5);
    assert_eq!(controller.state(), PlaybackState::Playing);

    let mut seen = Vec::new();
    while let Some(frame) = controller.advance().expect("advance") {
        seen.push(frame_index(frame));
    }

    assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    assert_eq!(controller.state(), PlaybackState::Stopped);
    let log = log.borrow();
    assert_eq!(log.written, vec![0, 1, 2, 3, 4]);
    assert!(log.closed, "sink must be finalized at end of stream");
}

#[test]
fn paused_controller_does_not_fetch() {
    let (mut controller, log) = controller_with_sink(5);
    controller.advance().expect("advance").expect("frame");
    controller.toggle_pause();
    assert_eq!(controller.state(), PlaybackState::Paused);

    assert!(controller.advance().expect("advance").is_none());
    assert_eq!(log.borrow().written, vec![0]);
}

#[test]
fn step_back_is_ignored_while_playing() {
    let (mut controller, _log) = controller_with_sink(5);
    controller.advance().expect("advance").expect("frame");
    controller.advance().expect("advance").expect("frame");

    assert!(controller.step_back().expect("step back").is_none());
    let frame = controller.advance().expect("advance").expect("frame");
    assert_eq!(frame_index(frame), 2, "playback order must be undisturbed");
}

#[test]
fn step_back_rewinds_one_frame_per_press() {
    let (mut controller, _log) = controller_with_sink(10);
    for _ in 0..5 {
        controller.advance().expect("advance").expect("frame");
    }
    // Last shown frame is 4; position is 5.
    controller.toggle_pause();

    let frame = controller.step_back().expect("step back").expect("frame");
    assert_eq!(frame_index(frame), 3);
    let frame = controller.step_back().expect("step back").expect("frame");
    assert_eq!(frame_index(frame), 2);
}

#[test]
fn resume_after_step_back_replays_the_sequence() {
    let (mut controller, _log) = controller_with_sink(7);
    for _ in 0..5 {
        controller.advance().expect("advance").expect("frame");
    }
    controller.toggle_pause();
    // Step back twice from position 5: playing forward must reproduce
    // frames 3, 4, 5, ...
    controller.step_back().expect("step back");
    controller.step_back().expect("step back");
    controller.toggle_pause();

    let mut replayed = Vec::new();
    while let Some(frame) = controller.advance().expect("advance") {
        replayed.push(frame_index(frame));
    }
    assert_eq!(replayed, vec![3, 4, 5, 6]);
}

#[test]
fn step_back_clamps_at_the_first_frame() {
    let (mut controller, _log) = controller_with_sink(5);
    controller.advance().expect("advance").expect("frame");
    controller.toggle_pause();

    for _ in 0..3 {
        let frame = controller.step_back().expect("step back").expect("frame");
        assert_eq!(frame_index(frame), 0, "seeking must clamp at frame 0");
    }
}

#[test]
fn step_back_writes_nothing_to_the_sink() {
    let (mut controller, log) = controller_with_sink(10);
    for _ in 0..4 {
        controller.advance().expect("advance").expect("frame");
    }
    let written_before_pause = log.borrow().written.clone();

    controller.toggle_pause();
    controller.step_back().expect("step back");
    controller.step_back().expect("step back");
    controller.stop().expect("stop");

    let log = log.borrow();
    assert_eq!(
        log.written, written_before_pause,
        "paused step-backs must not append frames"
    );
    assert!(log.closed, "quit must finalize the sink");
}

#[test]
fn stop_is_idempotent() {
    let (mut controller, log) = controller_with_sink(3);
    controller.stop().expect("stop");
    controller.stop().expect("second stop");
    assert_eq!(controller.state(), PlaybackState::Stopped);
    assert!(log.borrow().closed);

    // A stopped controller fetches nothing.
    assert!(controller.advance().expect("advance").is_none());
}

#[test]
fn toggle_pause_after_stop_stays_stopped() {
    let (mut controller, _log) = controller_with_sink(3);
    controller.stop().expect("stop");
    controller.toggle_pause();
    assert_eq!(controller.state(), PlaybackState::Stopped);
}

#[test]
fn monochrome_playback_produces_luminance_gray_frames() {
    let config = PlaybackConfig {
        monochrome: true,
        ..PlaybackConfig::default()
    };
    let transforms = TransformChain::from_config(&config).expect("chain");
    let mut controller = PlaybackController::new(
        Box::new(SyntheticSource::new(10)),
        transforms,
        None,
    );

    let mut index = 0u64;
    while let Some(frame) = controller.advance().expect("advance") {
        let expected = image::imageops::grayscale(&synthetic_frame(index, 16, 12));
        for (pixel, luma) in frame.pixels().zip(expected.pixels()) {
            assert_eq!(pixel.0[0], pixel.0[1]);
            assert_eq!(pixel.0[1], pixel.0[2]);
            assert_eq!(pixel.0[0], luma.0[0]);
        }
        index += 1;
    }
    assert_eq!(index, 10);
}
