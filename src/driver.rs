//! Frame driver: the per-tick state machine.
//!
//! Each call to [`FrameDriver::tick`] runs one frame to completion:
//! resolve membership, snapshot start positions when the visible set changed,
//! lay out, render, advance the counter and detect the end of the loop.
//!
//! ```text
//! Reset -> Animating -> Reset -> ...
//! ```
//!
//! The tick that ends a loop reports it through [`TickOutcome::Finished`]
//! and leaves the driver in `Reset`.

use crate::config::AnimationConfig;
use crate::images::ImageStore;
use crate::layout::{layout, resolve, total_frames, Timeline};
use crate::model::{Message, SpeakerProfile};
use crate::recording::CaptureSink;
use crate::render::{FrameView, Renderer, TextMeasurer, TextMetrics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    /// Positions parked, counter at zero; the next tick starts a new loop.
    #[default]
    Reset,
    Animating,
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was rendered; `frame` is the counter value it was rendered at.
    Animating { frame: u64, visible: usize },
    /// The last frame of the loop was rendered and the driver reset.
    Finished { frame: u64 },
}

impl TickOutcome {
    pub fn is_finished(&self) -> bool {
        matches!(self, TickOutcome::Finished { .. })
    }
}

/// Borrowed conversation state for one tick.
pub struct FrameContext<'a, M> {
    pub messages: &'a mut [Message],
    pub profiles: &'a [SpeakerProfile],
    pub config: &'a AnimationConfig,
    pub measurer: &'a mut TextMeasurer<M>,
    pub images: &'a ImageStore,
}

/// Owns the timeline and drives messages through one loop after another.
#[derive(Debug, Clone, Default)]
pub struct FrameDriver {
    timeline: Timeline,
    state: DriverState,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Frame the next tick will render.
    pub fn frame(&self) -> u64 {
        self.timeline.frame
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Park every message and start over on the next tick. Idempotent.
    pub fn restart(&mut self, messages: &mut [Message]) {
        for msg in messages.iter_mut() {
            msg.park();
        }
        self.timeline.reset();
        self.state = DriverState::Reset;
        tracing::debug!("Animation restarted");
    }

    /// Run one frame.
    ///
    /// `output` renders the frame and hears about the end of each loop.
    pub fn tick<M, O>(&mut self, ctx: FrameContext<'_, M>, output: &mut O) -> TickOutcome
    where
        M: TextMetrics,
        O: Renderer + CaptureSink + ?Sized,
    {
        let FrameContext {
            messages,
            profiles,
            config,
            measurer,
            images,
        } = ctx;

        if self.state != DriverState::Animating {
            self.restart(messages);
            self.state = DriverState::Animating;
        }

        let frame = self.timeline.frame;
        let membership = resolve(messages, frame, config);
        let count = membership.count();
        if self.timeline.visible_count != Some(count) {
            // Only writer of start positions: once per change of the visible set.
            for &i in &membership.visible {
                if let Some(msg) = messages.get_mut(i) {
                    msg.start_position = msg.actual_position;
                }
            }
            if count > 0 {
                tracing::debug!("Frame {}: {} message(s) on screen", frame, count);
            }
            self.timeline.visible_count = Some(count);
        }

        let layouts = layout(messages, &membership, measurer, images, config);
        output.render(&FrameView::new(frame, config, images, messages, profiles, &layouts));

        self.timeline.advance();
        let total = total_frames(messages, config);
        if self.timeline.frame > total {
            tracing::debug!("Loop finished after {} frames", self.timeline.frame);
            if let Err(e) = output.capture_finished() {
                tracing::warn!("Capture sink failed to finish: {}", e);
            }
            self.restart(messages);
            return TickOutcome::Finished { frame };
        }

        TickOutcome::Animating {
            frame,
            visible: count,
        }
    }
}
