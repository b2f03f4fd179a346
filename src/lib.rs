//! Chat Animator
//!
//! Renders a conversation as a vertically scrolling reveal of chat bubbles,
//! one frame at a time, for export as video or animated image. Bubbles slide
//! into a centred stack that pins to the bottom and scrolls once the canvas
//! is full.

pub mod config;
pub mod driver;
pub mod error;
pub mod images;
pub mod layout;
pub mod model;
pub mod recording;
pub mod render;
pub mod scene;
pub mod session;
pub mod style;

pub use config::{AnimationConfig, CanvasSize};
pub use driver::{DriverState, FrameDriver, TickOutcome};
pub use error::{Error, Result};
pub use model::{ImageHandle, Message, MessageContent, ProfileId, SpeakerProfile, OFFSCREEN};
pub use scene::SceneFile;
pub use session::Session;
pub use style::{Color, FontSpec};
