//! Anti-aliased drawing on a tiny-skia pixmap.
//!
//! Bubbles, tails and avatar placeholders are filled as paths; images are
//! drawn through a rounded clip mask. [`to_image`] converts the finished
//! frame to straight-alpha RGBA for the encoders.

use image::RgbaImage;
use tiny_skia::{
    ColorU8, FillRule, Mask, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform,
};

use crate::style::Color;

/// Cubic control point offset for a quarter circle (4/3 * tan(pi/8)).
const KAPPA: f32 = 0.552_284_8;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    /// Shrink by `d` on every side.
    pub fn inset(&self, d: f32) -> Self {
        Self::new(self.x + d, self.y + d, (self.w - 2.0 * d).max(0.0), (self.h - 2.0 * d).max(0.0))
    }
}

/// Solid anti-aliased paint.
pub fn paint(color: Color) -> Paint<'static> {
    let mut p = Paint::default();
    p.set_color_rgba8(color.r, color.g, color.b, color.a);
    p.anti_alias = true;
    p
}

/// Overwrite every pixel with `color`.
pub fn clear(pixmap: &mut Pixmap, color: Color) {
    pixmap.fill(tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a));
}

/// Rounded rectangle path. The radius is clamped to half the shorter side.
pub fn rounded_rect_path(rect: Rect, radius: f32) -> Option<Path> {
    if rect.w <= 0.0 || rect.h <= 0.0 {
        return None;
    }
    let r = radius.clamp(0.0, rect.w.min(rect.h) / 2.0);
    if r == 0.0 {
        let sk = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.w, rect.h)?;
        return Some(PathBuilder::from_rect(sk));
    }
    let (x0, y0, x1, y1) = (rect.x, rect.y, rect.right(), rect.bottom());
    let k = r * KAPPA;

    let mut pb = PathBuilder::new();
    pb.move_to(x0 + r, y0);
    pb.line_to(x1 - r, y0);
    pb.cubic_to(x1 - r + k, y0, x1, y0 + r - k, x1, y0 + r);
    pb.line_to(x1, y1 - r);
    pb.cubic_to(x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1);
    pb.line_to(x0 + r, y1);
    pb.cubic_to(x0 + r - k, y1, x0, y1 - r + k, x0, y1 - r);
    pb.line_to(x0, y0 + r);
    pb.cubic_to(x0, y0 + r - k, x0 + r - k, y0, x0 + r, y0);
    pb.close();
    pb.finish()
}

/// Fill a rounded rectangle.
pub fn fill_rounded_rect(pixmap: &mut Pixmap, rect: Rect, radius: f32, color: Color) {
    if let Some(path) = rounded_rect_path(rect, radius) {
        pixmap.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
    }
}

/// Stroke a rounded rectangle with the line fully inside `rect`.
pub fn stroke_rounded_rect(pixmap: &mut Pixmap, rect: Rect, radius: f32, width: f32, color: Color) {
    let half = width / 2.0;
    let Some(path) = rounded_rect_path(rect.inset(half), (radius - half).max(0.0)) else {
        return;
    };
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint(color), &stroke, Transform::identity(), None);
}

/// Fill a circle inscribed in `rect`.
pub fn fill_circle(pixmap: &mut Pixmap, rect: Rect, color: Color) {
    let r = rect.w.min(rect.h) / 2.0;
    if let Some(path) = PathBuilder::from_circle(rect.x + r, rect.y + r, r) {
        pixmap.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
    }
}

pub fn fill_triangle(pixmap: &mut Pixmap, pts: [(f32, f32); 3], color: Color) {
    let mut pb = PathBuilder::new();
    pb.move_to(pts[0].0, pts[0].1);
    pb.line_to(pts[1].0, pts[1].1);
    pb.line_to(pts[2].0, pts[2].1);
    pb.close();
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, &paint(color), FillRule::Winding, Transform::identity(), None);
    }
}

/// Draw `src` with its top-left at `(x, y)`, clipped to a rounded rectangle of
/// its own size. A radius of half the side gives a circle.
pub fn draw_rounded(pixmap: &mut Pixmap, src: &Pixmap, x: f32, y: f32, radius: f32, opacity: f32) {
    let frame = Rect::new(x, y, src.width() as f32, src.height() as f32);
    let Some(path) = rounded_rect_path(frame, radius) else {
        return;
    };
    let Some(mut mask) = Mask::new(pixmap.width(), pixmap.height()) else {
        return;
    };
    mask.fill_path(&path, FillRule::Winding, true, Transform::identity());
    let paint = PixmapPaint {
        opacity: opacity.clamp(0.0, 1.0),
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(
        x.round() as i32,
        y.round() as i32,
        src.as_ref(),
        &paint,
        Transform::identity(),
        Some(&mask),
    );
}

/// Premultiplied copy of a straight-alpha image.
pub fn from_image(img: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(img.width(), img.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(img.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

/// Straight-alpha copy of a pixmap.
pub fn to_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    img
}
