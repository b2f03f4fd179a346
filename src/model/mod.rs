//! Conversation data: speaker profiles and the messages they send.

mod message;
mod profile;

pub use message::{Message, MessageContent, OFFSCREEN};
pub use profile::{ProfileId, SpeakerProfile};

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PROFILE_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a unique profile ID.
pub fn next_profile_id() -> ProfileId {
    ProfileId(NEXT_PROFILE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Handle to an image known to the [`ImageStore`](crate::images::ImageStore).
///
/// Usually a file path; tests and embedders may register images under any key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageHandle(pub String);

impl ImageHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
