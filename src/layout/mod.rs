//! Per-frame layout: bubble sizing, screen membership and vertical placement.

mod engine;
mod size;
mod timeline;

pub use engine::{anchor_baseline, ease, layout, stack_height, BubbleLayout};
pub use size::{measure_message, BubbleSize};
pub use timeline::{entrance_frame, resolve, total_frames, Membership, Timeline};
