//! Greedy word wrap and wrapped-text measurement.
//!
//! Widths come from a [`TextMetrics`] implementation so the same wrap runs
//! against real shaped fonts ([`FontBook`](super::FontBook)) or a fixed
//! advance for headless use.

use std::collections::HashMap;
use std::sync::Arc;

use crate::style::FontSpec;

/// Cache entries kept before the wrap cache is flushed.
const MAX_CACHE_ENTRIES: usize = 4096;

/// Single-line text width provider.
pub trait TextMetrics {
    /// Rendered width in pixels of `text` laid out on one line.
    fn line_width(&mut self, text: &str, font: &FontSpec) -> f32;
}

/// Every character advances by `advance_em * font size`.
///
/// Deterministic and font-free; used by tests and the `inspect` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    pub advance_em: f32,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { advance_em: 0.5 }
    }
}

impl TextMetrics for FixedAdvance {
    fn line_width(&mut self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * font.size_px * self.advance_em
    }
}

/// Result of wrapping a string to a maximum width.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedText {
    pub lines: Vec<String>,
    /// Width of the widest line.
    pub max_line_width: f32,
}

impl WrappedText {
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// Wrap `text` greedily so no line exceeds `max_width` unless it is a single word.
///
/// `\n` forces a break. Empty text is treated as a single space so a bubble
/// always has at least one line.
pub fn wrap_greedy<M: TextMetrics + ?Sized>(
    metrics: &mut M,
    text: &str,
    max_width: f32,
    font: &FontSpec,
) -> WrappedText {
    let text = if text.is_empty() { " " } else { text };
    let mut out = WrappedText {
        lines: Vec::new(),
        max_line_width: 0.0,
    };

    for paragraph in text.split('\n') {
        let mut words = paragraph.split_whitespace().peekable();
        if words.peek().is_none() {
            // Blank paragraph still takes a line.
            commit_line(metrics, font, paragraph.to_string(), &mut out);
            continue;
        }

        let mut line = String::new();
        for word in words {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if metrics.line_width(&candidate, font) <= max_width {
                line = candidate;
            } else {
                commit_line(metrics, font, std::mem::take(&mut line), &mut out);
                line.push_str(word);
            }
        }
        commit_line(metrics, font, line, &mut out);
    }

    out
}

fn commit_line<M: TextMetrics + ?Sized>(
    metrics: &mut M,
    font: &FontSpec,
    line: String,
    out: &mut WrappedText,
) {
    let width = metrics.line_width(&line, font);
    out.max_line_width = out.max_line_width.max(width);
    out.lines.push(line);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct WrapKey {
    text: String,
    font: (u32, String),
    max_width: u32,
}

/// Memoising front end for [`wrap_greedy`].
///
/// Sizes are re-derived every frame; the cache keeps that cheap. Keys include
/// every input, so edits to text, font or width simply miss.
#[derive(Debug)]
pub struct TextMeasurer<M> {
    metrics: M,
    cache: HashMap<WrapKey, Arc<WrappedText>>,
}

impl<M: TextMetrics> TextMeasurer<M> {
    pub fn new(metrics: M) -> Self {
        Self {
            metrics,
            cache: HashMap::new(),
        }
    }

    /// Wrap `text` at `max_width` pixels.
    pub fn wrap(&mut self, text: &str, max_width: f32, font: &FontSpec) -> Arc<WrappedText> {
        let key = WrapKey {
            text: text.to_string(),
            font: font.cache_key(),
            max_width: max_width.to_bits(),
        };
        if let Some(hit) = self.cache.get(&key) {
            return Arc::clone(hit);
        }
        if self.cache.len() >= MAX_CACHE_ENTRIES {
            tracing::debug!("Wrap cache full ({} entries), flushing", self.cache.len());
            self.cache.clear();
        }
        let wrapped = Arc::new(wrap_greedy(&mut self.metrics, text, max_width, font));
        self.cache.insert(key, Arc::clone(&wrapped));
        wrapped
    }

    /// `(line_count, max_line_width)` for `text` wrapped at `max_width`.
    pub fn measure(&mut self, text: &str, max_width: f32, font: &FontSpec) -> (usize, f32) {
        let wrapped = self.wrap(text, max_width, font);
        (wrapped.line_count(), wrapped.max_line_width)
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn metrics_mut(&mut self) -> &mut M {
        &mut self.metrics
    }
}
