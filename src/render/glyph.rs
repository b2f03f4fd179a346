//! Glyph rasterization onto a tiny-skia pixmap.
//!
//! Text is shaped with cosmic-text, each glyph is rasterized through the
//! swash cache into a small premultiplied pixmap and composited with
//! `draw_pixmap`.

use cosmic_text::SwashContent;
use tiny_skia::{ColorU8, Pixmap, PixmapPaint, Transform};

use super::font::FontBook;
use crate::style::{Color, FontSpec};

/// Horizontal placement of a line inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Draw a single line of text with its line box's top-left at `(x, y)`.
///
/// `box_width` is only used for non-left alignment. Returns the laid out
/// line width, or 0 when no fonts are available.
#[allow(clippy::too_many_arguments)]
pub fn draw_text_line(
    book: &mut FontBook,
    canvas: &mut Pixmap,
    text: &str,
    font: &FontSpec,
    line_height: f32,
    x: f32,
    y: f32,
    box_width: f32,
    align: TextAlign,
    color: Color,
) -> f32 {
    if !book.has_fonts() || text.trim().is_empty() {
        return 0.0;
    }
    let buffer = book.shape(text, font, line_height, None);
    let mut drawn_width = 0.0_f32;

    for run in buffer.layout_runs() {
        drawn_width = drawn_width.max(run.line_w);
        let x_offset = match align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (box_width - run.line_w) / 2.0,
            TextAlign::Right => box_width - run.line_w,
        };

        for glyph in run.glyphs.iter() {
            let pg = glyph.physical((0.0, 0.0), 1.0);
            let Some(image) = book
                .swash_cache
                .get_image(&mut book.font_system, pg.cache_key)
                .as_ref()
            else {
                continue;
            };
            let gx = (x + x_offset).round() as i32 + pg.x + image.placement.left;
            let gy = (y + run.line_y).round() as i32 + pg.y - image.placement.top;
            blit_glyph(
                canvas,
                gx,
                gy,
                image.placement.width,
                image.placement.height,
                &image.data,
                image.content,
                color,
            );
        }
    }
    drawn_width
}

/// Composite one rasterized glyph bitmap at `(gx, gy)`.
#[allow(clippy::too_many_arguments)]
fn blit_glyph(
    canvas: &mut Pixmap,
    gx: i32,
    gy: i32,
    width: u32,
    height: u32,
    data: &[u8],
    content: SwashContent,
    color: Color,
) {
    let Some(mut glyph) = Pixmap::new(width, height) else {
        return;
    };
    let byte = |i: usize| data.get(i).copied().unwrap_or(0);
    for (i, px) in glyph.pixels_mut().iter_mut().enumerate() {
        let straight = match content {
            SwashContent::Mask => ColorU8::from_rgba(color.r, color.g, color.b, scale(color.a, byte(i))),
            SwashContent::SubpixelMask => {
                // Average the three subpixel coverages.
                let base = i * 3;
                let sum = (0..3).map(|k| u32::from(byte(base + k))).sum::<u32>();
                ColorU8::from_rgba(color.r, color.g, color.b, scale(color.a, (sum / 3) as u8))
            }
            SwashContent::Color => {
                // Emoji and other colour glyphs keep their own colour.
                let base = i * 4;
                ColorU8::from_rgba(byte(base), byte(base + 1), byte(base + 2), scale(byte(base + 3), color.a))
            }
        };
        *px = straight.premultiply();
    }
    canvas.draw_pixmap(
        gx,
        gy,
        glyph.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

fn scale(a: u8, b: u8) -> u8 {
    ((u16::from(a) * u16::from(b) + 127) / 255) as u8
}
