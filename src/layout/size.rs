//! Bubble size calculation.
//!
//! Sizes are derived, never stored: font and canvas settings can change at
//! any time, so every frame re-measures from content and config.

use std::sync::Arc;

use crate::config::AnimationConfig;
use crate::images::{ImageStore, DEFAULT_NATURAL_SIZE};
use crate::model::{Message, MessageContent};
use crate::render::{TextMeasurer, TextMetrics, WrappedText};

/// Bubble size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BubbleSize {
    pub width: f64,
    pub height: f64,
}

impl BubbleSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Size of the bubble for `message` plus its wrapped lines for text bubbles.
///
/// Text: `min(content, bubble) + 2 * inset_w` wide and
/// `lines * line_height + 2 * inset_h` tall.
/// Images: full bubble width, height from the aspect ratio, capped at
/// `max_image_height_fraction` of the canvas.
pub fn measure_message<M: TextMetrics>(
    message: &Message,
    measurer: &mut TextMeasurer<M>,
    images: &ImageStore,
    config: &AnimationConfig,
) -> (BubbleSize, Option<Arc<WrappedText>>) {
    let bubble_w = config.bubble_width_px();
    match &message.content {
        MessageContent::Text(text) => {
            let wrapped = measurer.wrap(text, bubble_w as f32, &config.font);
            let content_w = f64::from(wrapped.max_line_width).min(bubble_w);
            let size = BubbleSize::new(
                content_w + 2.0 * config.inset_width,
                wrapped.line_count() as f64 * config.line_height + 2.0 * config.inset_height,
            );
            (size, Some(wrapped))
        }
        MessageContent::Image(handle) => {
            let (nw, nh) = match images.natural_size(handle) {
                (0, _) | (_, 0) => DEFAULT_NATURAL_SIZE,
                dims => dims,
            };
            let scaled = bubble_w * f64::from(nh) / f64::from(nw);
            let cap = config.max_image_height_fraction * config.canvas_height();
            (BubbleSize::new(bubble_w, scaled.min(cap)), None)
        }
    }
}
