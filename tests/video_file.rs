//! FFmpeg-backed source and sink integration tests.
//!
//! No checked-in fixtures: each test encodes its own clip with
//! [`VideoFileSink`] into a temporary directory and reads it back with
//! [`VideoFileSource`]. Tests are skipped gracefully if the MPEG-4 encoder
//! is unavailable on the platform.

use replay::{
    Frame, FrameSink, FrameSource, PlaybackError, Resolution, VideoFileSink, VideoFileSource,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const FRAME_RATE: u32 = 10;
const FRAME_COUNT: u64 = 10;

/// Brightness carried by frame `index`, spaced widely enough to survive
/// lossy encoding.
fn frame_brightness(index: u64) -> u8 {
    (index * 20 + 10) as u8
}

fn solid_frame(index: u64) -> Frame {
    let value = frame_brightness(index);
    Frame::from_pixel(WIDTH, HEIGHT, image::Rgb([value, value, value]))
}

/// Encode the standard test clip, returning `None` if no encoder is
/// available on this platform.
fn write_test_clip(path: &std::path::Path) -> Option<()> {
    let resolution = Resolution {
        width: WIDTH,
        height: HEIGHT,
    };
    let mut sink = match VideoFileSink::open(path, resolution, FRAME_RATE) {
        Ok(sink) => sink,
        Err(error) => {
            let message = format!("{error}");
            if message.contains("encoder") {
                eprintln!("Skipping: MPEG-4 encoder not available ({message})");
                return None;
            }
            panic!("open sink: {message}");
        }
    };
    for index in 0..FRAME_COUNT {
        sink.write(&solid_frame(index)).expect("write frame");
    }
    sink.close().expect("close sink");
    // A second close must be a no-op.
    sink.close().expect("close sink again");
    Some(())
}

#[test]
fn encoded_clip_reads_back_frame_by_frame() {
    let directory = tempfile::tempdir().expect("create temp dir");
    let path = directory.path().join("roundtrip.mp4");
    if write_test_clip(&path).is_none() {
        return;
    }

    let file_size = std::fs::metadata(&path).expect("stat output").len();
    assert!(file_size > 0, "output file should be non-empty");

    let mut source = VideoFileSource::open(&path, None).expect("open source");
    assert_eq!(source.width(), WIDTH);
    assert_eq!(source.height(), HEIGHT);

    let mut decoded = 0u64;
    while let Some(frame) = source.next_frame().expect("decode frame") {
        assert_eq!(frame.dimensions(), (WIDTH, HEIGHT));
        let expected = i32::from(frame_brightness(decoded));
        let actual = i32::from(frame.get_pixel(WIDTH / 2, HEIGHT / 2).0[0]);
        assert!(
            (expected - actual).abs() <= 24,
            "frame {decoded}: brightness {actual} too far from {expected}"
        );
        decoded += 1;
    }
    assert_eq!(decoded, FRAME_COUNT);
    assert_eq!(source.position(), FRAME_COUNT);
}

#[test]
fn display_resolution_scales_decoded_frames() {
    let directory = tempfile::tempdir().expect("create temp dir");
    let path = directory.path().join("scaled.mp4");
    if write_test_clip(&path).is_none() {
        return;
    }

    let display = Resolution {
        width: 32,
        height: 24,
    };
    let mut source = VideoFileSource::open(&path, Some(display)).expect("open source");
    assert_eq!(source.width(), 32);
    assert_eq!(source.height(), 24);

    let frame = source
        .next_frame()
        .expect("decode frame")
        .expect("first frame");
    assert_eq!(frame.dimensions(), (32, 24));
}

#[test]
fn seek_back_replays_the_previous_frame() {
    let directory = tempfile::tempdir().expect("create temp dir");
    let path = directory.path().join("seek.mp4");
    if write_test_clip(&path).is_none() {
        return;
    }

    let mut source = VideoFileSource::open(&path, None).expect("open source");
    for _ in 0..5 {
        source.next_frame().expect("decode frame").expect("frame");
    }
    assert_eq!(source.position(), 5);

    // One step behind the last read frame (4) is frame 3.
    source.seek_back(1).expect("seek back");
    assert_eq!(source.position(), 3);
    let frame = source
        .next_frame()
        .expect("decode frame")
        .expect("replayed frame");
    let expected = i32::from(frame_brightness(3));
    let actual = i32::from(frame.get_pixel(WIDTH / 2, HEIGHT / 2).0[0]);
    assert!(
        (expected - actual).abs() <= 24,
        "replayed brightness {actual} too far from {expected}"
    );
    assert_eq!(source.position(), 4);
}

#[test]
fn seek_back_clamps_to_the_stream_start() {
    let directory = tempfile::tempdir().expect("create temp dir");
    let path = directory.path().join("clamp.mp4");
    if write_test_clip(&path).is_none() {
        return;
    }

    let mut source = VideoFileSource::open(&path, None).expect("open source");
    source.next_frame().expect("decode frame").expect("frame");

    // Far past the start: position must clamp to 0, not go negative.
    source.seek_back(100).expect("seek back");
    assert_eq!(source.position(), 0);

    let frame = source
        .next_frame()
        .expect("decode frame")
        .expect("first frame");
    let expected = i32::from(frame_brightness(0));
    let actual = i32::from(frame.get_pixel(WIDTH / 2, HEIGHT / 2).0[0]);
    assert!((expected - actual).abs() <= 24);
    assert_eq!(source.position(), 1);
}

#[test]
fn seek_back_at_end_of_stream_resumes_decoding() {
    let directory = tempfile::tempdir().expect("create temp dir");
    let path = directory.path().join("eos.mp4");
    if write_test_clip(&path).is_none() {
        return;
    }

    let mut source = VideoFileSource::open(&path, None).expect("open source");
    while source.next_frame().expect("decode frame").is_some() {}
    assert!(source.next_frame().expect("decode frame").is_none());

    source.seek_back(1).expect("seek back");
    let frame = source.next_frame().expect("decode frame");
    assert!(
        frame.is_some(),
        "stepping back from end of stream must yield a frame"
    );
}

#[test]
fn mismatched_frame_dimensions_are_rejected() {
    let directory = tempfile::tempdir().expect("create temp dir");
    let path = directory.path().join("mismatch.mp4");

    let resolution = Resolution {
        width: WIDTH,
        height: HEIGHT,
    };
    let mut sink = match VideoFileSink::open(&path, resolution, FRAME_RATE) {
        Ok(sink) => sink,
        Err(error) => {
            eprintln!("Skipping: sink unavailable ({error})");
            return;
        }
    };

    let undersized = Frame::new(32, 32);
    let result = sink.write(&undersized);
    match result {
        Err(PlaybackError::DimensionMismatch {
            expected_width,
            expected_height,
            actual_width,
            actual_height,
        }) => {
            assert_eq!((expected_width, expected_height), (WIDTH, HEIGHT));
            assert_eq!((actual_width, actual_height), (32, 32));
        }
        other => panic!("expected DimensionMismatch, got {other:?}"),
    }

    // The sink must still accept correctly-sized frames afterwards.
    sink.write(&solid_frame(0)).expect("write valid frame");
    sink.close().expect("close sink");
}

#[test]
fn opening_a_missing_file_fails() {
    let result = VideoFileSource::open("definitely/not/a/real/file.mp4", None);
    match result {
        Err(PlaybackError::SourceOpen { path, .. }) => {
            assert!(path.ends_with("file.mp4"));
        }
        Ok(_) => panic!("opening a missing file must fail"),
        Err(other) => panic!("expected SourceOpen, got {other:?}"),
    }
}

#[test]
fn opening_an_unwritable_sink_path_fails() {
    let result = VideoFileSink::open(
        "definitely/not/a/real/directory/out.mp4",
        Resolution {
            width: WIDTH,
            height: HEIGHT,
        },
        FRAME_RATE,
    );
    assert!(matches!(result, Err(PlaybackError::SinkOpen { .. })));
}
