//! CPU renderer producing RGBA frames for screenshots and recordings.
//!
//! Frames are painted on a tiny-skia [`Pixmap`] and converted to a
//! straight-alpha [`RgbaImage`] once per frame for the encoders.

use std::collections::HashMap;

use image::RgbaImage;
use tiny_skia::Pixmap;

use super::canvas::{self, Rect};
use super::font::FontBook;
use super::glyph::{draw_text_line, TextAlign};
use super::{BubbleView, FrameView, Renderer};
use crate::config::AnimationConfig;
use crate::images::{cover_fit, ImageStore};
use crate::model::{ImageHandle, MessageContent};
use crate::style::Color;

/// Border drawn around image bubbles, in the speaker's bubble colour.
const IMAGE_BORDER_PX: f32 = 4.0;
/// Tail length past the bubble edge.
const TAIL_PX: f32 = 10.0;

type FittedCache = HashMap<(ImageHandle, u32, u32), Pixmap>;

/// Draws frames into an owned canvas.
pub struct SoftwareRenderer {
    pixmap: Option<Pixmap>,
    frame: RgbaImage,
    fonts: FontBook,
    /// Cover-fitted copies keyed by handle and target size.
    fitted: FittedCache,
}

impl std::fmt::Debug for SoftwareRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoftwareRenderer")
            .field("canvas", &self.frame.dimensions())
            .field("fonts", &self.fonts)
            .field("fitted", &self.fitted.len())
            .finish()
    }
}

impl SoftwareRenderer {
    pub fn new(fonts: FontBook) -> Self {
        Self {
            pixmap: None,
            frame: RgbaImage::new(1, 1),
            fonts,
            fitted: HashMap::new(),
        }
    }

    /// Last rendered frame.
    pub fn canvas(&self) -> &RgbaImage {
        &self.frame
    }

    pub fn into_canvas(self) -> RgbaImage {
        self.frame
    }

    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    /// Drop cached resized images, e.g. after replacing an image in the store.
    pub fn clear_image_cache(&mut self) {
        self.fitted.clear();
    }

    /// Cleared pixmap of the configured size, reused while the size holds.
    fn prepare_canvas(&mut self, config: &AnimationConfig) -> Option<Pixmap> {
        let (w, h) = (config.canvas.width, config.canvas.height);
        let mut pixmap = match self.pixmap.take() {
            Some(p) if (p.width(), p.height()) == (w, h) => p,
            _ => {
                tracing::debug!("Resizing render canvas to {}x{}", w, h);
                Pixmap::new(w, h)?
            }
        };
        canvas::clear(&mut pixmap, config.background);
        Some(pixmap)
    }

    fn draw_bubble(
        &mut self,
        pixmap: &mut Pixmap,
        bubble: &BubbleView<'_>,
        config: &AnimationConfig,
        images: &ImageStore,
    ) {
        let w = config.canvas_width() as f32;
        let h = config.canvas_height() as f32;
        let top = bubble.top_px(config) as f32;
        if top >= h {
            return;
        }
        let size = bubble.layout.size;
        let (bw, bh) = (size.width as f32, size.height as f32);
        let margin = config.side_margin_px as f32;
        let avatar = config.avatar_size_px as f32;
        let avatar_space = if config.show_avatars { avatar + margin } else { 0.0 };
        let trailing = bubble.profile.is_main;
        let x = if trailing {
            w - margin - avatar_space - bw
        } else {
            margin + avatar_space
        };
        let rect = Rect::new(x, top, bw, bh);
        let radius = config.corner_radius as f32;
        let fill = bubble.profile.fill_color();

        if config.show_names && !bubble.profile.name.is_empty() {
            let name_h = config.name_allowance_px() as f32;
            let align = if trailing { TextAlign::Right } else { TextAlign::Left };
            draw_text_line(
                &mut self.fonts,
                pixmap,
                &bubble.profile.name,
                &config.name_font,
                name_h,
                x,
                top - name_h,
                bw,
                align,
                config.name_color,
            );
        }

        if config.show_avatars {
            let ax = if trailing { w - margin - avatar } else { margin };
            let ay = rect.bottom() - avatar;
            self.draw_avatar(pixmap, bubble, images, ax, ay, avatar);
        }

        match &bubble.message.content {
            MessageContent::Text(_) => {
                if config.tails {
                    draw_tail(pixmap, rect, radius, trailing, fill);
                }
                canvas::fill_rounded_rect(pixmap, rect, radius, fill);
                self.draw_lines(pixmap, bubble, config, rect);
            }
            MessageContent::Image(handle) => {
                let (iw, ih) = (bw.round().max(1.0) as u32, bh.round().max(1.0) as u32);
                let opacity = bubble.profile.alpha.clamp(0.0, 1.0);
                match fitted_image(&mut self.fitted, images, handle, iw, ih) {
                    Some(img) => canvas::draw_rounded(pixmap, img, x.round(), top.round(), radius, opacity),
                    None => canvas::fill_rounded_rect(pixmap, rect, radius, fill),
                }
                canvas::stroke_rounded_rect(pixmap, rect, radius, IMAGE_BORDER_PX, fill);
            }
        }
    }

    fn draw_lines(&mut self, pixmap: &mut Pixmap, bubble: &BubbleView<'_>, config: &AnimationConfig, rect: Rect) {
        let Some(wrapped) = &bubble.layout.lines else {
            return;
        };
        let lh = config.line_height as f32;
        let x = rect.x + config.inset_width as f32;
        let inner_w = rect.w - 2.0 * config.inset_width as f32;
        for (i, line) in wrapped.lines.iter().enumerate() {
            let y = rect.y + config.inset_height as f32 + i as f32 * lh;
            draw_text_line(
                &mut self.fonts,
                pixmap,
                line,
                &config.font,
                lh,
                x,
                y,
                inner_w,
                TextAlign::Left,
                bubble.profile.text_color,
            );
        }
    }

    fn draw_avatar(
        &mut self,
        pixmap: &mut Pixmap,
        bubble: &BubbleView<'_>,
        images: &ImageStore,
        x: f32,
        y: f32,
        size: f32,
    ) {
        let side = size.round().max(1.0) as u32;
        let fitted = match &bubble.profile.avatar {
            Some(handle) => fitted_image(&mut self.fitted, images, handle, side, side),
            None => None,
        };
        match fitted {
            Some(img) => canvas::draw_rounded(pixmap, img, x.round(), y.round(), size / 2.0, 1.0),
            None => canvas::fill_circle(pixmap, Rect::new(x, y, size, size), bubble.profile.bubble_color),
        }
    }
}

/// `handle` cover-fitted to `w` x `h`, if the image is loaded.
fn fitted_image<'c>(
    cache: &'c mut FittedCache,
    images: &ImageStore,
    handle: &ImageHandle,
    w: u32,
    h: u32,
) -> Option<&'c Pixmap> {
    let key = (handle.clone(), w, h);
    if !cache.contains_key(&key) {
        let src = images.get(handle)?;
        let fitted = canvas::from_image(&cover_fit(src, w, h, (0.5, 0.5)))?;
        cache.insert(key.clone(), fitted);
    }
    cache.get(&key)
}

/// Small triangle at the bottom corner on the speaker's side.
fn draw_tail(pixmap: &mut Pixmap, rect: Rect, radius: f32, trailing: bool, color: Color) {
    let bottom = rect.bottom();
    let reach = radius.max(TAIL_PX);
    let pts = if trailing {
        let edge = rect.right();
        [(edge - reach, bottom), (edge + TAIL_PX, bottom), (edge - 2.0, bottom - reach)]
    } else {
        let edge = rect.x;
        [(edge + reach, bottom), (edge - TAIL_PX, bottom), (edge + 2.0, bottom - reach)]
    };
    canvas::fill_triangle(pixmap, pts, color);
}

impl Renderer for SoftwareRenderer {
    fn render(&mut self, view: &FrameView<'_>) {
        let Some(mut pixmap) = self.prepare_canvas(view.config) else {
            tracing::warn!("Cannot allocate a {:?} canvas", view.config.canvas);
            return;
        };
        for bubble in &view.bubbles {
            self.draw_bubble(&mut pixmap, bubble, view.config, view.images);
        }
        self.frame = canvas::to_image(&pixmap);
        self.pixmap = Some(pixmap);
    }
}
