//! Chat message with its three animated position fields.

use super::{ImageHandle, ProfileId};

/// Position of a bubble that has not entered yet: just below the canvas.
pub const OFFSCREEN: f64 = 1.1;

/// What a bubble shows.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Image(ImageHandle),
}

/// A message in the conversation.
///
/// Positions are the *top* edge of the bubble as a fraction of canvas height.
/// They are owned by the frame driver; edits should only touch `content`,
/// `profile` and `entrance_frame`.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub content: MessageContent,
    pub profile: ProfileId,
    /// Interpolation origin, written when the visible set grows.
    pub start_position: f64,
    /// Resting position for the current frame.
    pub desired_position: f64,
    /// Rendered position for the current frame.
    pub actual_position: f64,
    /// Frame at which the message enters when manual timing is on.
    pub entrance_frame: Option<u64>,
}

impl Message {
    pub fn new(content: MessageContent, profile: ProfileId) -> Self {
        Self {
            content,
            profile,
            start_position: OFFSCREEN,
            desired_position: OFFSCREEN,
            actual_position: OFFSCREEN,
            entrance_frame: None,
        }
    }

    pub fn text(text: impl Into<String>, profile: ProfileId) -> Self {
        Self::new(MessageContent::Text(text.into()), profile)
    }

    pub fn image(handle: ImageHandle, profile: ProfileId) -> Self {
        Self::new(MessageContent::Image(handle), profile)
    }

    pub fn with_entrance_frame(mut self, frame: u64) -> Self {
        self.entrance_frame = Some(frame);
        self
    }

    /// Text content, if this is a text bubble.
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(t) => Some(t),
            MessageContent::Image(_) => None,
        }
    }

    /// Snap all three positions to the off-screen sentinel.
    pub fn park(&mut self) {
        self.start_position = OFFSCREEN;
        self.desired_position = OFFSCREEN;
        self.actual_position = OFFSCREEN;
    }

    pub fn is_parked(&self) -> bool {
        self.start_position == OFFSCREEN
            && self.desired_position == OFFSCREEN
            && self.actual_position == OFFSCREEN
    }
}
