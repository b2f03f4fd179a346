//! Frame counter and screen membership.
//!
//! [`resolve`] decides which messages are on screen for a frame and how far
//! the newest one is into its entrance. Two cadences are supported: a fixed
//! automatic one (`start_delay`, then one message every `slide + hold`) and a
//! manual one where every message carries its own entrance frame.

use crate::config::AnimationConfig;
use crate::model::Message;

/// Per-driver timing state.
///
/// Replaces process-wide counters so several timelines can run side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    /// Frames rendered since the last reset.
    pub frame: u64,
    /// Visible count seen on the previous tick; `None` right after a reset.
    pub visible_count: Option<usize>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.frame = 0;
        self.visible_count = None;
    }

    pub fn advance(&mut self) {
        self.frame += 1;
    }

    /// Seconds since the last reset.
    pub fn elapsed(&self, config: &AnimationConfig) -> f64 {
        self.frame as f64 / config.frame_rate
    }
}

/// Messages on screen for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Membership {
    /// Indices into the message list, in ascending order.
    pub visible: Vec<usize>,
    /// Seconds since the newest visible message started entering.
    pub progress_secs: f64,
}

impl Membership {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Index of the bottom-most visible message.
    pub fn newest(&self) -> Option<usize> {
        self.visible.last().copied()
    }

    /// Progress as a fraction of the slide duration (unclamped).
    pub fn slide_fraction(&self, slide_duration: f64) -> f64 {
        self.progress_secs / slide_duration
    }
}

/// Tolerance so exact multiples of the cadence land on the right side of `floor`.
const CADENCE_EPSILON: f64 = 1e-9;

/// Which messages are on screen at `frame`.
pub fn resolve(messages: &[Message], frame: u64, config: &AnimationConfig) -> Membership {
    if messages.is_empty() {
        return Membership::empty();
    }
    if config.manual_timing {
        resolve_manual(messages, frame, config)
    } else {
        resolve_automatic(messages.len(), frame as f64 / config.frame_rate, config)
    }
}

fn resolve_automatic(n: usize, elapsed: f64, config: &AnimationConfig) -> Membership {
    if elapsed + CADENCE_EPSILON < config.start_delay {
        return Membership::empty();
    }
    let effective = (elapsed - config.start_delay).max(0.0);
    let per_message = config.time_per_message();
    let entered = (effective / per_message + CADENCE_EPSILON).floor() as usize + 1;
    let count = entered.min(n);
    let progress = (effective - (count - 1) as f64 * per_message).max(0.0);
    Membership {
        visible: (0..count).collect(),
        progress_secs: progress,
    }
}

fn resolve_manual(messages: &[Message], frame: u64, config: &AnimationConfig) -> Membership {
    let mut visible = Vec::new();
    let mut latest = 0;
    for i in 0..messages.len() {
        let entrance = entrance_frame(messages, i, config);
        if frame >= entrance {
            visible.push(i);
            latest = latest.max(entrance);
        }
    }
    if visible.is_empty() {
        return Membership::empty();
    }
    Membership {
        visible,
        progress_secs: (frame - latest) as f64 / config.frame_rate,
    }
}

/// Frame at which message `index` enters.
///
/// Messages without an explicit entrance frame fall back to where the
/// automatic cadence would place them.
pub fn entrance_frame(messages: &[Message], index: usize, config: &AnimationConfig) -> u64 {
    messages
        .get(index)
        .and_then(|m| m.entrance_frame)
        .unwrap_or_else(|| {
            let secs = config.start_delay + index as f64 * config.time_per_message();
            (secs * config.frame_rate).round() as u64
        })
}

/// Length of one full loop in frames. The driver finishes once the frame
/// counter goes past this.
pub fn total_frames(messages: &[Message], config: &AnimationConfig) -> u64 {
    if config.manual_timing {
        let latest = (0..messages.len())
            .map(|i| entrance_frame(messages, i, config))
            .max()
            .unwrap_or(0);
        let tail = (config.slide_duration + config.start_delay) * config.frame_rate;
        latest + tail.round() as u64
    } else {
        let secs = messages.len() as f64 * config.time_per_message() + 2.0 * config.start_delay;
        (secs * config.frame_rate).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProfileId;

    fn messages(n: usize) -> Vec<Message> {
        (0..n).map(|i| Message::text(format!("m{i}"), ProfileId(1))).collect()
    }

    fn fast_config() -> AnimationConfig {
        AnimationConfig {
            slide_duration: 0.5,
            hold_duration: 0.5,
            start_delay: 1.0,
            ..AnimationConfig::default()
        }
    }

    #[test]
    fn nothing_visible_during_start_delay() {
        let cfg = fast_config();
        assert!(resolve(&messages(3), 0, &cfg).is_empty());
        assert!(resolve(&messages(3), 59, &cfg).is_empty());
        let m = resolve(&messages(3), 60, &cfg);
        assert_eq!(m.visible, vec![0]);
        assert_eq!(m.progress_secs, 0.0);
    }

    #[test]
    fn cadence_adds_one_message_per_period() {
        let cfg = fast_config();
        let m = resolve(&messages(3), 60 + 90, &cfg);
        assert_eq!(m.visible, vec![0, 1]);
        assert!((m.progress_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn count_never_exceeds_messages() {
        let cfg = fast_config();
        let m = resolve(&messages(2), 10_000, &cfg);
        assert_eq!(m.visible, vec![0, 1]);
        assert!(m.progress_secs > cfg.slide_duration);
    }

    #[test]
    fn empty_list_resolves_empty() {
        let m = resolve(&[], 500, &AnimationConfig::default());
        assert!(m.is_empty());
        assert_eq!(m.progress_secs, 0.0);
        assert_eq!(m.newest(), None);
    }

    #[test]
    fn manual_entrance_frames() {
        let cfg = AnimationConfig {
            manual_timing: true,
            ..AnimationConfig::default()
        };
        let msgs: Vec<Message> = [0, 60, 120]
            .into_iter()
            .map(|f| Message::text("x", ProfileId(1)).with_entrance_frame(f))
            .collect();
        let m = resolve(&msgs, 90, &cfg);
        assert_eq!(m.visible, vec![0, 1]);
        let slide_frames = cfg.slide_duration * cfg.frame_rate;
        assert!((m.slide_fraction(cfg.slide_duration) - 30.0 / slide_frames).abs() < 1e-9);
    }

    #[test]
    fn missing_entrance_frame_uses_cadence() {
        let cfg = fast_config();
        let msgs = messages(3);
        assert_eq!(entrance_frame(&msgs, 0, &cfg), 60);
        assert_eq!(entrance_frame(&msgs, 2, &cfg), 180);
    }

    #[test]
    fn total_frames_for_both_modes() {
        let cfg = fast_config();
        assert_eq!(total_frames(&messages(5), &cfg), 420);

        let manual = AnimationConfig {
            manual_timing: true,
            ..fast_config()
        };
        let msgs = vec![
            Message::text("a", ProfileId(1)).with_entrance_frame(0),
            Message::text("b", ProfileId(1)).with_entrance_frame(200),
        ];
        assert_eq!(total_frames(&msgs, &manual), 200 + 90);
    }

    #[test]
    fn timeline_reset_clears_counters() {
        let mut t = Timeline::new();
        t.advance();
        t.visible_count = Some(2);
        t.reset();
        assert_eq!(t, Timeline::default());
    }
}
