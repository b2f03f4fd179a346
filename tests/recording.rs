//! Recording a full loop through the software renderer.

mod common;

use chat_animator::recording::{FrameEncoder, GifSink, PngSequence, Recorder};
use chat_animator::render::{FontBook, SoftwareRenderer};
use chat_animator::{AnimationConfig, CanvasSize};
use common::session_with_texts;

/// Two messages at 10fps with 0.1s phases: 6 frames plus the finishing one.
fn tiny_config() -> AnimationConfig {
    AnimationConfig {
        canvas: CanvasSize::new(80, 120),
        frame_rate: 10.0,
        slide_duration: 0.1,
        hold_duration: 0.1,
        start_delay: 0.1,
        avatar_size_px: 16.0,
        ..AnimationConfig::default()
    }
}

fn record(step: u64, encoder: Box<dyn FrameEncoder>) -> u64 {
    let mut session = session_with_texts(tiny_config(), &["hi", "yo"]);
    assert_eq!(session.total_frames(), 6);

    let mut recorder = Recorder::new(SoftwareRenderer::new(FontBook::empty())).with_frame_step(step);
    recorder.start(encoder);
    while !session.tick(&mut recorder).is_finished() {}
    assert!(!recorder.is_recording());
    recorder.frames_written()
}

fn png_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "png"))
        .count()
}

#[test]
fn png_sequence_gets_every_frame() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("frames");
    let written = record(1, Box::new(PngSequence::create(&dir).unwrap()));
    assert_eq!(written, 7);
    assert_eq!(png_count(&dir), 7);

    let first = image::open(dir.join("frame_00000.png")).unwrap();
    assert_eq!((first.width(), first.height()), (80, 120));
}

#[test]
fn frame_step_thins_output() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("frames");
    let written = record(2, Box::new(PngSequence::create(&dir).unwrap()));
    assert_eq!(written, 4);
    assert_eq!(png_count(&dir), 4);
}

#[test]
fn gif_is_closed_when_loop_ends() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("chat.gif");
    let written = record(1, Box::new(GifSink::create(&path, 10.0).unwrap()));
    assert_eq!(written, 7);

    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.starts_with(b"GIF89a"));
    assert_eq!(bytes.last(), Some(&0x3b));
}

#[test]
fn first_frame_is_background_only() {
    let mut session = session_with_texts(tiny_config(), &["hi"]);
    session.set_background("#102030", 1.0).unwrap();
    let mut recorder = Recorder::new(SoftwareRenderer::new(FontBook::empty()));
    session.tick(&mut recorder);
    let canvas = recorder.renderer().canvas();
    assert!(canvas.pixels().all(|p| p.0 == [0x10, 0x20, 0x30, 0xff]));
}
