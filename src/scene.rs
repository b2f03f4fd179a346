//! JSON scene files: config, speakers and messages for the CLI.
//!
//! ```json
//! {
//!   "config": { "slide_duration": 1.0, "font": "28px sans-serif" },
//!   "profiles": [ { "name": "Grump", "bubble_color": "#218aff", "is_main": true } ],
//!   "messages": [ { "profile": 0, "text": "Hello!" } ]
//! }
//! ```
//!
//! Profiles are referenced by position. Scene files are read, never written
//! back from a session.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AnimationConfig;
use crate::error::{Error, Result};
use crate::images::ImageStore;
use crate::model::{ImageHandle, Message, MessageContent, SpeakerProfile};
use crate::render::TextMetrics;
use crate::session::Session;
use crate::style::Color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default = "default_bubble_color")]
    pub bubble_color: Color,
    /// Defaults to white for the main speaker, black otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<Color>,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub is_main: bool,
}

fn default_bubble_color() -> Color {
    Color::rgb(0xd8, 0xd8, 0xd8)
}

fn default_alpha() -> f32 {
    1.0
}

impl ProfileSpec {
    fn new(name: &str, bubble_color: Color, is_main: bool) -> Self {
        Self {
            name: name.to_string(),
            avatar: None,
            bubble_color,
            text_color: None,
            alpha: 1.0,
            is_main,
        }
    }

    fn build(&self) -> SpeakerProfile {
        let mut profile = SpeakerProfile::new(self.name.clone(), self.is_main);
        profile.bubble_color = self.bubble_color;
        if let Some(text) = self.text_color {
            profile.text_color = text;
        }
        profile.alpha = self.alpha;
        profile.avatar = self.avatar.as_deref().map(ImageHandle::new);
        profile
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSpec {
    /// Index into `profiles`.
    pub profile: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrance_frame: Option<u64>,
}

impl MessageSpec {
    fn text(profile: usize, text: &str) -> Self {
        Self {
            profile,
            text: Some(text.to_string()),
            image: None,
            entrance_frame: None,
        }
    }

    fn content(&self, index: usize) -> Result<MessageContent> {
        match (&self.text, &self.image) {
            (Some(text), None) => Ok(MessageContent::Text(text.clone())),
            (None, Some(image)) => Ok(MessageContent::Image(ImageHandle::new(image.clone()))),
            _ => Err(Error::InvalidScene(format!(
                "message {index} must have exactly one of \"text\" or \"image\""
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default)]
    pub config: AnimationConfig,
    #[serde(default)]
    pub profiles: Vec<ProfileSpec>,
    #[serde(default)]
    pub messages: Vec<MessageSpec>,
}

impl SceneFile {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let scene = Self::from_json(&json)?;
        tracing::debug!(
            "Loaded scene {} ({} profiles, {} messages)",
            path.display(),
            scene.profiles.len(),
            scene.messages.len()
        );
        Ok(scene)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The sample conversation shown on first start.
    pub fn demo() -> Self {
        Self {
            config: AnimationConfig::default(),
            profiles: vec![
                ProfileSpec {
                    text_color: Some(Color::WHITE),
                    ..ProfileSpec::new("Grump", Color::rgb(0x21, 0x8a, 0xff), true)
                },
                ProfileSpec::new("Olivia", default_bubble_color(), false),
                ProfileSpec::new("Chad", default_bubble_color(), false),
                ProfileSpec::new("Tischman", default_bubble_color(), false),
            ],
            messages: vec![
                MessageSpec::text(0, "Have you heard about chat-animator?"),
                MessageSpec::text(0, "It makes phone chat animations like this."),
                MessageSpec::text(2, "How cool 😃"),
                MessageSpec::text(
                    3,
                    "You can use them anywhere for free! Even the profile pictures are free for commercial use.",
                ),
                MessageSpec::text(3, "Import the file into your video editor"),
            ],
        }
    }

    /// Check references and config without building anything.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.profiles.is_empty() && !self.messages.is_empty() {
            return Err(Error::InvalidScene("messages need at least one profile".to_string()));
        }
        for (i, msg) in self.messages.iter().enumerate() {
            if msg.profile >= self.profiles.len() {
                return Err(Error::InvalidScene(format!(
                    "message {i} refers to profile {} but only {} exist",
                    msg.profile,
                    self.profiles.len()
                )));
            }
            msg.content(i)?;
        }
        Ok(())
    }

    /// Build a session. Images are loaded through `images`; missing ones are
    /// logged and drawn as placeholders.
    pub fn into_session<M: TextMetrics>(self, metrics: M, images: ImageStore) -> Result<Session<M>> {
        self.validate()?;
        let mut session = Session::new(self.config, metrics)?.with_images(images);
        let ids: Vec<_> = self
            .profiles
            .iter()
            .map(|spec| session.add_profile(spec.build()))
            .collect();
        for (i, spec) in self.messages.iter().enumerate() {
            let mut msg = Message::new(spec.content(i)?, ids[spec.profile]);
            msg.entrance_frame = spec.entrance_frame;
            session.add_message(msg)?;
        }
        Ok(session)
    }
}
