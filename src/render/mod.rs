//! Text measurement and frame rendering.
//!
//! The layout engine hands a read-only [`FrameView`] to a [`Renderer`] once
//! per tick. [`SoftwareRenderer`] paints it with tiny-skia into RGBA frames; [`NullRenderer`]
//! discards it for headless runs.

pub mod canvas;
mod font;
mod glyph;
mod measure;
mod software;

pub use font::FontBook;
pub use glyph::{draw_text_line, TextAlign};
pub use measure::{wrap_greedy, FixedAdvance, TextMeasurer, TextMetrics, WrappedText};
pub use software::SoftwareRenderer;

use crate::config::AnimationConfig;
use crate::images::ImageStore;
use crate::layout::BubbleLayout;
use crate::model::{Message, ProfileId, SpeakerProfile};
use crate::style::Color;

/// Stand-in for messages whose profile was deleted under them.
static UNKNOWN_SPEAKER: SpeakerProfile = SpeakerProfile {
    id: ProfileId(0),
    name: String::new(),
    avatar: None,
    bubble_color: Color::rgb(0xd8, 0xd8, 0xd8),
    text_color: Color::BLACK,
    alpha: 1.0,
    is_main: false,
};

/// One visible bubble with everything needed to draw it.
#[derive(Debug, Clone, Copy)]
pub struct BubbleView<'a> {
    pub message: &'a Message,
    pub profile: &'a SpeakerProfile,
    pub layout: &'a BubbleLayout,
}

impl BubbleView<'_> {
    /// Top edge in canvas pixels.
    pub fn top_px(&self, config: &AnimationConfig) -> f64 {
        self.message.actual_position * config.canvas_height()
    }
}

/// Everything a renderer may read for one frame.
#[derive(Debug)]
pub struct FrameView<'a> {
    pub frame: u64,
    pub config: &'a AnimationConfig,
    pub images: &'a ImageStore,
    /// Visible bubbles, top of the conversation first.
    pub bubbles: Vec<BubbleView<'a>>,
}

impl<'a> FrameView<'a> {
    pub fn new(
        frame: u64,
        config: &'a AnimationConfig,
        images: &'a ImageStore,
        messages: &'a [Message],
        profiles: &'a [SpeakerProfile],
        layouts: &'a [BubbleLayout],
    ) -> Self {
        let bubbles = layouts
            .iter()
            .filter_map(|layout| {
                let message = messages.get(layout.index)?;
                Some(BubbleView {
                    message,
                    profile: profile_for(profiles, message.profile),
                    layout,
                })
            })
            .collect();
        Self {
            frame,
            config,
            images,
            bubbles,
        }
    }
}

/// Look up a profile by ID, falling back to a neutral grey speaker.
pub fn profile_for(profiles: &[SpeakerProfile], id: ProfileId) -> &SpeakerProfile {
    profiles.iter().find(|p| p.id == id).unwrap_or_else(|| {
        tracing::warn!("Message refers to unknown profile {:?}", id);
        &UNKNOWN_SPEAKER
    })
}

/// Consumer of laid-out frames. Renderers never write message positions.
pub trait Renderer {
    fn render(&mut self, view: &FrameView<'_>);
}

/// Renderer that draws nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _view: &FrameView<'_>) {}
}

impl<R: Renderer + ?Sized> Renderer for &mut R {
    fn render(&mut self, view: &FrameView<'_>) {
        (**self).render(view);
    }
}
