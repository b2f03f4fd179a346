//! Shared test helpers.

use chat_animator::recording::{CaptureSink, Preview};
use chat_animator::render::{FixedAdvance, FrameView, NullRenderer, Renderer};
use chat_animator::{AnimationConfig, Message, ProfileId, Session, SpeakerProfile};

/// 0.5s slide, 0.5s hold, 1s start delay at 60fps.
#[allow(dead_code)]
pub fn fast_config() -> AnimationConfig {
    AnimationConfig {
        slide_duration: 0.5,
        hold_duration: 0.5,
        start_delay: 1.0,
        ..AnimationConfig::default()
    }
}

/// Session measured with a fixed advance so results do not depend on
/// installed fonts. One non-main speaker sends every message.
#[allow(dead_code)]
pub fn session_with_texts(config: AnimationConfig, texts: &[&str]) -> Session<FixedAdvance> {
    let mut session = Session::new(config, FixedAdvance::default()).expect("valid config");
    let speaker = session.add_profile(SpeakerProfile::new("Olivia", false));
    for text in texts {
        session
            .add_message(Message::text(*text, speaker))
            .expect("profile exists");
    }
    session
}

#[allow(dead_code)]
pub fn first_profile<M>(session: &Session<M>) -> ProfileId
where
    M: chat_animator::render::TextMetrics,
{
    session.profiles()[0].id
}

#[allow(dead_code)]
pub fn headless() -> Preview<NullRenderer> {
    Preview(NullRenderer)
}

/// Counts frames and end-of-loop signals, and remembers the last frame's
/// bubble positions.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct FrameLog {
    pub frames: u64,
    pub finished: u32,
    pub positions: Vec<(usize, f64)>,
}

impl Renderer for FrameLog {
    fn render(&mut self, view: &FrameView<'_>) {
        self.frames += 1;
        self.positions = view
            .bubbles
            .iter()
            .map(|b| (b.layout.index, b.message.actual_position))
            .collect();
    }
}

impl CaptureSink for FrameLog {
    fn capture_finished(&mut self) -> chat_animator::Result<()> {
        self.finished += 1;
        Ok(())
    }
}
