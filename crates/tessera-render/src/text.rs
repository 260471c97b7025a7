//! Text measurement for labels, titles and legend entries.

use unicode_width::UnicodeWidthStr;

pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// The font properties that affect a measured extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl TextStyle {
    pub fn sized(font_size: f64) -> Self {
        Self { font_size }
    }
}

/// Extent of a (possibly multi-line) string.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
    pub lines: usize,
}

pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextExtent;
}

/// Every display column advances `font_size * advance`; every line is
/// `font_size * line_height` tall.
///
/// Headless layout has no font backend. East Asian wide characters count as two columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasurer {
    pub advance: f64,
    pub line_height: f64,
}

impl Default for FixedAdvanceMeasurer {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMeasurer for FixedAdvanceMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextExtent {
        if text.is_empty() {
            return TextExtent::default();
        }
        let font_size = style.font_size.max(1.0);
        let (columns, lines) = text
            .lines()
            .fold((0, 0), |(columns, lines), line| (columns.max(line.width()), lines + 1));
        let lines = lines.max(1);
        TextExtent {
            width: columns as f64 * font_size * self.advance,
            height: lines as f64 * font_size * self.line_height,
            lines,
        }
    }
}
