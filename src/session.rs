//! A conversation plus everything needed to animate it.
//!
//! `Session` is the editing surface: it owns profiles, messages and config,
//! checks every edit, and restarts the animation after edits that change
//! layout. Ticking delegates to the [`FrameDriver`].

use crate::config::{AnimationConfig, CanvasSize};
use crate::driver::{DriverState, FrameContext, FrameDriver, TickOutcome};
use crate::error::{Error, Result};
use crate::images::ImageStore;
use crate::layout::{resolve, total_frames, Membership};
use crate::model::{ImageHandle, Message, MessageContent, ProfileId, SpeakerProfile};
use crate::recording::{CaptureSink, Preview};
use crate::render::{FontBook, NullRenderer, Renderer, TextMeasurer, TextMetrics};
use crate::style::{Color, FontSpec};

pub struct Session<M = FontBook> {
    profiles: Vec<SpeakerProfile>,
    messages: Vec<Message>,
    config: AnimationConfig,
    measurer: TextMeasurer<M>,
    images: ImageStore,
    driver: FrameDriver,
}

impl<M> std::fmt::Debug for Session<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("profiles", &self.profiles.len())
            .field("messages", &self.messages.len())
            .field("frame", &self.driver.frame())
            .field("state", &self.driver.state())
            .finish()
    }
}

impl<M: TextMetrics> Session<M> {
    /// Empty conversation. Fails if `config` does not validate.
    pub fn new(config: AnimationConfig, metrics: M) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            profiles: Vec::new(),
            messages: Vec::new(),
            config,
            measurer: TextMeasurer::new(metrics),
            images: ImageStore::new(),
            driver: FrameDriver::new(),
        })
    }

    pub fn with_images(mut self, images: ImageStore) -> Self {
        self.images = images;
        self
    }

    pub fn profiles(&self) -> &[SpeakerProfile] {
        &self.profiles
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageStore {
        &mut self.images
    }

    pub fn measurer_mut(&mut self) -> &mut TextMeasurer<M> {
        &mut self.measurer
    }

    /// Frame the next tick renders.
    pub fn frame(&self) -> u64 {
        self.driver.frame()
    }

    pub fn state(&self) -> DriverState {
        self.driver.state()
    }

    /// Frames in one loop for the current conversation and config.
    pub fn total_frames(&self) -> u64 {
        total_frames(&self.messages, &self.config)
    }

    /// Membership for the frame the next tick renders.
    pub fn membership(&self) -> Membership {
        self.membership_at(self.driver.frame())
    }

    pub fn membership_at(&self, frame: u64) -> Membership {
        resolve(&self.messages, frame, &self.config)
    }

    pub fn profile(&self, id: ProfileId) -> Option<&SpeakerProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    // --- Animation ---

    /// Render one frame into `output`.
    pub fn tick<O>(&mut self, output: &mut O) -> TickOutcome
    where
        O: Renderer + CaptureSink + ?Sized,
    {
        let ctx = FrameContext {
            messages: &mut self.messages,
            profiles: &self.profiles,
            config: &self.config,
            measurer: &mut self.measurer,
            images: &self.images,
        };
        self.driver.tick(ctx, output)
    }

    /// Park every message and start the loop over.
    pub fn restart(&mut self) {
        self.driver.restart(&mut self.messages);
    }

    /// Restart and run headless up to `frame`, then render that frame into
    /// `output`. Frames past the end of the loop are clamped to the last one.
    pub fn seek<O>(&mut self, frame: u64, output: &mut O) -> TickOutcome
    where
        O: Renderer + CaptureSink + ?Sized,
    {
        let frame = frame.min(self.total_frames());
        self.restart();
        let mut headless = Preview(NullRenderer);
        while self.driver.frame() < frame {
            self.tick(&mut headless);
        }
        self.tick(output)
    }

    // --- Profiles ---

    /// Add a profile, loading its avatar if it has one.
    pub fn add_profile(&mut self, profile: SpeakerProfile) -> ProfileId {
        if let Some(avatar) = &profile.avatar {
            self.images.preload([avatar]);
        }
        let id = profile.id;
        self.profiles.push(profile);
        id
    }

    /// Add a profile styled like the last one, or a blank one if there are none.
    pub fn duplicate_last_profile(&mut self) -> ProfileId {
        let profile = match self.profiles.last() {
            Some(last) => last.duplicate(),
            None => SpeakerProfile::new("", false),
        };
        self.add_profile(profile)
    }

    /// Delete a profile. The last remaining profile cannot be deleted; messages
    /// that used it move to the first profile.
    pub fn remove_profile(&mut self, id: ProfileId) -> Result<SpeakerProfile> {
        let pos = self
            .profiles
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("profile {}", id.0)))?;
        if self.profiles.len() <= 1 {
            return Err(Error::InvalidScene("cannot delete the only profile".to_string()));
        }
        let removed = self.profiles.remove(pos);
        let fallback = self.profiles[0].id;
        let mut moved = 0;
        for msg in self.messages.iter_mut().filter(|m| m.profile == id) {
            msg.profile = fallback;
            moved += 1;
        }
        if moved > 0 {
            tracing::debug!("Moved {} message(s) from deleted profile to {:?}", moved, fallback);
        }
        self.restart();
        Ok(removed)
    }

    /// Style edits (name, colours, alpha) show up on the next frame.
    pub fn profile_mut(&mut self, id: ProfileId) -> Option<&mut SpeakerProfile> {
        self.profiles.iter_mut().find(|p| p.id == id)
    }

    pub fn set_profile_avatar(&mut self, id: ProfileId, avatar: Option<ImageHandle>) -> Result<()> {
        if let Some(handle) = &avatar {
            self.images.preload([handle]);
        }
        let profile = self
            .profile_mut(id)
            .ok_or_else(|| Error::NotFound(format!("profile {}", id.0)))?;
        profile.avatar = avatar;
        Ok(())
    }

    // --- Messages ---

    /// Append a message and restart. Its profile must exist.
    pub fn add_message(&mut self, message: Message) -> Result<usize> {
        self.check_profile(message.profile)?;
        if let MessageContent::Image(handle) = &message.content {
            self.images.preload([handle]);
        }
        self.messages.push(message);
        self.restart();
        Ok(self.messages.len() - 1)
    }

    /// Append an empty message from the first profile.
    pub fn new_message(&mut self) -> Result<usize> {
        let first = self
            .profiles
            .first()
            .map(|p| p.id)
            .ok_or_else(|| Error::InvalidScene("add a profile before adding messages".to_string()))?;
        self.add_message(Message::text("", first))
    }

    pub fn remove_message(&mut self, index: usize) -> Result<Message> {
        self.check_index(index)?;
        let removed = self.messages.remove(index);
        self.restart();
        Ok(removed)
    }

    pub fn set_message_text(&mut self, index: usize, text: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.messages[index].content = MessageContent::Text(text.into());
        self.restart();
        Ok(())
    }

    pub fn set_message_image(&mut self, index: usize, handle: ImageHandle) -> Result<()> {
        self.check_index(index)?;
        self.images.preload([&handle]);
        self.messages[index].content = MessageContent::Image(handle);
        self.restart();
        Ok(())
    }

    pub fn set_message_profile(&mut self, index: usize, profile: ProfileId) -> Result<()> {
        self.check_index(index)?;
        self.check_profile(profile)?;
        self.messages[index].profile = profile;
        self.restart();
        Ok(())
    }

    /// Set or clear the explicit entrance frame used in manual timing mode.
    pub fn set_entrance_frame(&mut self, index: usize, frame: Option<u64>) -> Result<()> {
        self.check_index(index)?;
        self.messages[index].entrance_frame = frame;
        self.restart();
        Ok(())
    }

    // --- Config ---

    /// Replace the whole config. Invalid configs are rejected and nothing changes.
    pub fn set_config(&mut self, config: AnimationConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.restart();
        Ok(())
    }

    /// Apply a change to a copy of the config and keep it only if it validates.
    fn edit_config(&mut self, edit: impl FnOnce(&mut AnimationConfig)) -> Result<()> {
        let mut config = self.config.clone();
        edit(&mut config);
        self.set_config(config)
    }

    /// Set the body font from a CSS-like string such as `"28px Arial"`.
    /// Line height follows the font size.
    pub fn set_font(&mut self, font: &str) -> Result<()> {
        let font = FontSpec::parse(font)?;
        self.edit_config(|c| c.set_font(font))
    }

    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.edit_config(|c| c.canvas = CanvasSize::new(width, height))
    }

    pub fn set_timing(&mut self, slide: f64, hold: f64, start_delay: f64) -> Result<()> {
        self.edit_config(|c| {
            c.slide_duration = slide;
            c.hold_duration = hold;
            c.start_delay = start_delay;
        })
    }

    pub fn set_manual_timing(&mut self, manual: bool) -> Result<()> {
        self.edit_config(|c| c.manual_timing = manual)
    }

    /// Background from a hex colour and an opacity in `[0, 1]`. Takes effect
    /// on the next frame without restarting.
    pub fn set_background(&mut self, hex: &str, opacity: f32) -> Result<()> {
        self.config.background = Color::from_hex(hex)?.with_alpha(opacity);
        Ok(())
    }

    /// Toggle name labels. Layout picks the change up on the next frame.
    pub fn set_show_names(&mut self, show: bool) {
        self.config.show_names = show;
    }

    pub fn set_show_avatars(&mut self, show: bool) {
        self.config.show_avatars = show;
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.messages.len() {
            Ok(())
        } else {
            Err(Error::NotFound(format!(
                "message {index} (have {})",
                self.messages.len()
            )))
        }
    }

    fn check_profile(&self, id: ProfileId) -> Result<()> {
        self.profile(id)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("profile {}", id.0)))
    }
}
