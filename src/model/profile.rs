//! Speaker profiles: who sent a message and how their bubbles look.

use super::{next_profile_id, ImageHandle};
use crate::style::Color;

/// Stable identifier for a profile; messages refer to profiles by ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerProfile {
    pub id: ProfileId,
    pub name: String,
    pub avatar: Option<ImageHandle>,
    pub bubble_color: Color,
    pub text_color: Color,
    /// Bubble opacity in `[0, 1]`.
    pub alpha: f32,
    /// Own messages: bubbles sit on the trailing (right) side.
    pub is_main: bool,
}

impl SpeakerProfile {
    /// Grey bubble with black text; main speakers get white text.
    pub fn new(name: impl Into<String>, is_main: bool) -> Self {
        Self {
            id: next_profile_id(),
            name: name.into(),
            avatar: None,
            bubble_color: Color::rgb(0xd8, 0xd8, 0xd8),
            text_color: if is_main { Color::WHITE } else { Color::BLACK },
            alpha: 1.0,
            is_main,
        }
    }

    pub fn with_avatar(mut self, avatar: ImageHandle) -> Self {
        self.avatar = Some(avatar);
        self
    }

    pub fn with_colors(mut self, bubble: Color, text: Color) -> Self {
        self.bubble_color = bubble;
        self.text_color = text;
        self
    }

    /// A new profile with the same style as `self` but a fresh ID.
    pub fn duplicate(&self) -> Self {
        Self {
            id: next_profile_id(),
            ..self.clone()
        }
    }

    /// Bubble fill with the profile opacity applied.
    pub fn fill_color(&self) -> Color {
        self.bubble_color.with_alpha(self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let a = SpeakerProfile::new("A", false);
        let b = SpeakerProfile::new("B", false);
        assert_ne!(a.id, b.id);
        assert_ne!(a.id, a.duplicate().id);
    }

    #[test]
    fn main_speaker_defaults_to_white_text() {
        assert_eq!(SpeakerProfile::new("me", true).text_color, Color::WHITE);
        assert_eq!(SpeakerProfile::new("them", false).text_color, Color::BLACK);
    }

    #[test]
    fn fill_applies_alpha() {
        let mut p = SpeakerProfile::new("A", false);
        p.alpha = 0.5;
        assert_eq!(p.fill_color().a, 128);
    }
}
