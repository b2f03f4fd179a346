//! Vertical layout: desired resting positions and eased actual positions.

use std::sync::Arc;

use super::size::{measure_message, BubbleSize};
use super::timeline::Membership;
use crate::config::AnimationConfig;
use crate::images::ImageStore;
use crate::model::Message;
use crate::render::{TextMeasurer, TextMetrics, WrappedText};

/// Steepness of the exponential approach.
const EASE_RATE: f64 = 6.0;

/// Map linear slide progress to eased progress: `1 - e^(-6t)`.
///
/// Fast start, slow finish. `ease(0) == 0` and it approaches 1 as `t` grows.
pub fn ease(t: f64) -> f64 {
    1.0 - (-EASE_RATE * t).exp()
}

/// Geometry of one visible bubble for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BubbleLayout {
    /// Index into the message list.
    pub index: usize,
    pub size: BubbleSize,
    /// Wrapped lines for text bubbles.
    pub lines: Option<Arc<WrappedText>>,
}

/// Total pixel height of a stack of bubbles with their spacing and name labels.
pub fn stack_height(sizes: &[BubbleSize], config: &AnimationConfig) -> f64 {
    if sizes.is_empty() {
        return 0.0;
    }
    let bubbles: f64 = sizes.iter().map(|s| s.height).sum();
    let gaps = config.spacing_px * (sizes.len() - 1) as f64;
    bubbles + gaps + config.name_allowance_px() * sizes.len() as f64
}

/// Anchor line (fraction of canvas height) for the bottom of the stack.
///
/// Stacks that fit are centred; taller ones are pinned one spacing above the
/// bottom edge and scroll up as they grow.
pub fn anchor_baseline(total_px: f64, config: &AnimationConfig) -> f64 {
    let h = config.canvas_height();
    if total_px > h {
        1.0 - config.spacing_fraction()
    } else {
        0.5 + total_px / (2.0 * h)
    }
}

/// Lay out the visible messages for one frame.
///
/// Writes `desired_position` and `actual_position` of every visible message
/// and returns their geometry in visible order. A stale index (the list
/// shrank since membership was resolved) skips the frame and returns nothing.
pub fn layout<M: TextMetrics>(
    messages: &mut [Message],
    membership: &Membership,
    measurer: &mut TextMeasurer<M>,
    images: &ImageStore,
    config: &AnimationConfig,
) -> Vec<BubbleLayout> {
    if let Some(&bad) = membership.visible.iter().find(|&&i| i >= messages.len()) {
        tracing::warn!(
            "Visible index {} out of range ({} messages), skipping layout",
            bad,
            messages.len()
        );
        return Vec::new();
    }

    let bubbles: Vec<BubbleLayout> = membership
        .visible
        .iter()
        .map(|&index| {
            let (size, lines) = measure_message(&messages[index], measurer, images, config);
            BubbleLayout { index, size, lines }
        })
        .collect();
    let sizes: Vec<BubbleSize> = bubbles.iter().map(|b| b.size).collect();

    let h = config.canvas_height();
    let name_frac = config.name_allowance_px() / h;
    let spacing_frac = config.spacing_fraction();
    let mut baseline = anchor_baseline(stack_height(&sizes, config), config);

    for bubble in bubbles.iter().rev() {
        let msg = &mut messages[bubble.index];
        msg.desired_position = baseline - bubble.size.height / h;
        baseline = msg.desired_position - name_frac - spacing_frac;
    }

    let sliding = membership.progress_secs < config.slide_duration;
    let eased = ease(membership.slide_fraction(config.slide_duration));
    for bubble in &bubbles {
        let msg = &mut messages[bubble.index];
        msg.actual_position = if sliding {
            msg.start_position + (msg.desired_position - msg.start_position) * eased
        } else {
            msg.desired_position
        };
    }

    bubbles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OFFSCREEN, ProfileId};
    use crate::render::FixedAdvance;

    fn config() -> AnimationConfig {
        AnimationConfig::default()
    }

    fn membership(count: usize, progress_secs: f64) -> Membership {
        Membership {
            visible: (0..count).collect(),
            progress_secs,
        }
    }

    #[test]
    fn ease_shape() {
        assert_eq!(ease(0.0), 0.0);
        assert!(ease(1.0) > 0.99);
        assert!((ease(50.0) - 1.0).abs() < 1e-12);
        let mut prev = ease(0.0);
        for i in 1..=100 {
            let next = ease(f64::from(i) / 100.0);
            assert!(next > prev);
            prev = next;
        }
    }

    #[test]
    fn desired_positions_increase_down_the_stack() {
        let cfg = config();
        let mut msgs: Vec<Message> = (0..4)
            .map(|i| Message::text(format!("message {i}"), ProfileId(1)))
            .collect();
        let mut m = TextMeasurer::new(FixedAdvance::default());
        let out = layout(&mut msgs, &membership(4, 10.0), &mut m, &ImageStore::new(), &cfg);
        assert_eq!(out.len(), 4);
        for pair in msgs.windows(2) {
            assert!(pair[1].desired_position > pair[0].desired_position);
        }
        // Settled: actual equals desired exactly.
        for msg in &msgs {
            assert_eq!(msg.actual_position, msg.desired_position);
        }
    }

    #[test]
    fn sliding_bubble_is_between_start_and_desired() {
        let cfg = config();
        let mut msgs = vec![Message::text("Hi", ProfileId(1))];
        let mut m = TextMeasurer::new(FixedAdvance::default());
        layout(&mut msgs, &membership(1, 0.3), &mut m, &ImageStore::new(), &cfg);
        let msg = &msgs[0];
        assert_eq!(msg.start_position, OFFSCREEN);
        assert!(msg.actual_position < OFFSCREEN);
        assert!(msg.actual_position > msg.desired_position);
        let expected = OFFSCREEN + (msg.desired_position - OFFSCREEN) * ease(0.3 / 1.3);
        assert!((msg.actual_position - expected).abs() < 1e-12);
    }

    #[test]
    fn stale_index_skips_layout() {
        let cfg = config();
        let mut msgs = vec![Message::text("only", ProfileId(1))];
        let mut m = TextMeasurer::new(FixedAdvance::default());
        let out = layout(&mut msgs, &membership(3, 0.0), &mut m, &ImageStore::new(), &cfg);
        assert!(out.is_empty());
        assert!(msgs[0].is_parked());
    }

    #[test]
    fn empty_membership_is_a_no_op() {
        let cfg = config();
        let mut msgs = vec![Message::text("waiting", ProfileId(1))];
        let mut m = TextMeasurer::new(FixedAdvance::default());
        let out = layout(&mut msgs, &Membership::empty(), &mut m, &ImageStore::new(), &cfg);
        assert!(out.is_empty());
        assert!(msgs[0].is_parked());
    }

    #[test]
    fn stack_height_counts_gaps_and_names() {
        let mut cfg = config();
        let sizes = [BubbleSize::new(10.0, 100.0), BubbleSize::new(10.0, 50.0)];
        assert_eq!(stack_height(&sizes, &cfg), 170.0);
        cfg.show_names = true;
        let name = cfg.name_allowance_px();
        assert!((stack_height(&sizes, &cfg) - (170.0 + 2.0 * name)).abs() < 1e-9);
        assert_eq!(stack_height(&[], &cfg), 0.0);
    }
}
