//! Animation configuration.
//!
//! One `AnimationConfig` value drives every frame. External controls may
//! replace fields at any time; the layout pass reads it fresh each tick, so a
//! write takes effect on the next frame. Values are checked by [`validate`]
//! at the editing boundary and assumed valid everywhere else.
//!
//! [`validate`]: AnimationConfig::validate

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::style::{Color, FontSpec};

/// Canvas size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(800, 1200)
    }
}

/// Settings shared by the resolver, layout engine and renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub canvas: CanvasSize,
    /// Frames per second the caller ticks at.
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Seconds a bubble spends sliding into place.
    #[serde(default = "default_slide")]
    pub slide_duration: f64,
    /// Seconds a bubble stays still before the next one enters.
    #[serde(default = "default_hold")]
    pub hold_duration: f64,
    /// Empty time at the start (and again at the end) of the loop.
    #[serde(default = "default_start_delay")]
    pub start_delay: f64,
    /// Bubble width as a fraction of canvas width.
    #[serde(default = "default_bubble_width")]
    pub bubble_width_fraction: f64,
    /// Vertical gap between bubbles.
    #[serde(default = "default_spacing")]
    pub spacing_px: f64,
    #[serde(default = "default_inset_width")]
    pub inset_width: f64,
    #[serde(default = "default_inset_height")]
    pub inset_height: f64,
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// Draw speaker names above bubbles.
    #[serde(default)]
    pub show_names: bool,
    #[serde(default = "default_name_font")]
    pub name_font: FontSpec,
    #[serde(default = "default_name_color")]
    pub name_color: Color,
    #[serde(default = "default_true")]
    pub show_avatars: bool,
    #[serde(default = "default_avatar_size")]
    pub avatar_size_px: f64,
    #[serde(default)]
    pub background: Color,
    /// Use each message's `entrance_frame` instead of the fixed cadence.
    #[serde(default)]
    pub manual_timing: bool,
    #[serde(default = "default_corner_radius")]
    pub corner_radius: f64,
    /// Draw a small tail on the speaker's side of each bubble.
    #[serde(default = "default_true")]
    pub tails: bool,
    /// Horizontal gap between a bubble (or avatar) and the canvas edge.
    #[serde(default = "default_side_margin")]
    pub side_margin_px: f64,
    /// Cap on image bubble height, as a fraction of canvas height.
    #[serde(default = "default_max_image_height")]
    pub max_image_height_fraction: f64,
}

fn default_frame_rate() -> f64 { 60.0 }
fn default_slide() -> f64 { 1.3 }
fn default_hold() -> f64 { 2.0 }
fn default_start_delay() -> f64 { 2.0 }
fn default_bubble_width() -> f64 { 0.70 }
fn default_spacing() -> f64 { 20.0 }
fn default_inset_width() -> f64 { 24.0 }
fn default_inset_height() -> f64 { 16.0 }
fn default_line_height() -> f64 { f64::from(FontSpec::default().line_height()) }
fn default_true() -> bool { true }
fn default_name_font() -> FontSpec { FontSpec::new(24.0, "sans-serif") }
fn default_name_color() -> Color { Color::rgb(0x55, 0x55, 0x55) }
fn default_avatar_size() -> f64 { 64.0 }
fn default_corner_radius() -> f64 { 20.0 }
fn default_side_margin() -> f64 { 10.0 }
fn default_max_image_height() -> f64 { 0.4 }

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            frame_rate: default_frame_rate(),
            slide_duration: default_slide(),
            hold_duration: default_hold(),
            start_delay: default_start_delay(),
            bubble_width_fraction: default_bubble_width(),
            spacing_px: default_spacing(),
            inset_width: default_inset_width(),
            inset_height: default_inset_height(),
            font: FontSpec::default(),
            line_height: default_line_height(),
            show_names: false,
            name_font: default_name_font(),
            name_color: default_name_color(),
            show_avatars: true,
            avatar_size_px: default_avatar_size(),
            background: Color::WHITE,
            manual_timing: false,
            corner_radius: default_corner_radius(),
            tails: true,
            side_margin_px: default_side_margin(),
            max_image_height_fraction: default_max_image_height(),
        }
    }
}

impl AnimationConfig {
    /// Reject values the per-frame code cannot handle.
    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{name} must be a positive number, got {v}")))
            }
        }
        fn non_negative(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{name} must be zero or more, got {v}")))
            }
        }
        fn fraction(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v > 0.0 && v <= 1.0 {
                Ok(())
            } else {
                Err(Error::InvalidConfig(format!("{name} must be in (0, 1], got {v}")))
            }
        }

        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "canvas size must be positive, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        positive("frame_rate", self.frame_rate)?;
        positive("slide_duration", self.slide_duration)?;
        non_negative("hold_duration", self.hold_duration)?;
        non_negative("start_delay", self.start_delay)?;
        fraction("bubble_width_fraction", self.bubble_width_fraction)?;
        non_negative("spacing_px", self.spacing_px)?;
        non_negative("inset_width", self.inset_width)?;
        non_negative("inset_height", self.inset_height)?;
        positive("line_height", self.line_height)?;
        positive("avatar_size_px", self.avatar_size_px)?;
        non_negative("corner_radius", self.corner_radius)?;
        non_negative("side_margin_px", self.side_margin_px)?;
        fraction("max_image_height_fraction", self.max_image_height_fraction)?;
        Ok(())
    }

    pub fn canvas_width(&self) -> f64 {
        f64::from(self.canvas.width)
    }

    pub fn canvas_height(&self) -> f64 {
        f64::from(self.canvas.height)
    }

    /// Maximum bubble width in pixels.
    pub fn bubble_width_px(&self) -> f64 {
        self.bubble_width_fraction * self.canvas_width()
    }

    /// Bubble spacing as a fraction of canvas height.
    pub fn spacing_fraction(&self) -> f64 {
        self.spacing_px / self.canvas_height()
    }

    /// Vertical room reserved above each bubble for the speaker name.
    pub fn name_allowance_px(&self) -> f64 {
        if self.show_names {
            f64::from(self.name_font.line_height())
        } else {
            0.0
        }
    }

    /// Seconds between consecutive message entrances in automatic cadence.
    pub fn time_per_message(&self) -> f64 {
        self.slide_duration + self.hold_duration
    }

    /// Set the body font and derive the matching line height.
    pub fn set_font(&mut self, font: FontSpec) {
        self.line_height = f64::from(font.line_height());
        self.font = font;
    }
}
