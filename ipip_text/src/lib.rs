// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph box measurement for heatmap cell labels.
//!
//! The heatmap label overlay centers a formatted value on each cell, which
//! needs the size of the rendered string. Glyph shaping and rendering live
//! downstream in whatever backend draws the frame, so the core only depends on
//! this small measurement interface.
//!
//! This crate is:
//! - dependency-free and `no_std` (it uses `alloc` for named font families), and
//! - backend-agnostic: a shaping engine, a GPU glyph atlas, or the bundled
//!   [`HeuristicTextMeasurer`] can all implement [`TextMeasurer`].

#![no_std]

extern crate alloc;

use alloc::sync::Arc;

/// Measures the box a single line of text occupies once rendered.
pub trait TextMeasurer {
    /// Measure `text` as one line.
    ///
    /// Cell labels never contain newlines, so implementations may ignore them.
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

impl<T: TextMeasurer + ?Sized> TextMeasurer for &T {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        (**self).measure(text, style)
    }
}

/// Font inputs that influence label measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font size in render-space units (typically pixels).
    pub font_size: f64,
    /// The preferred font family.
    pub font_family: FontFamily,
}

impl TextStyle {
    /// Creates a sans-serif style with the given `font_size`.
    #[must_use]
    pub fn new(font_size: f64) -> Self {
        Self {
            font_size,
            font_family: FontFamily::SansSerif,
        }
    }

    /// Sets the font family.
    #[must_use]
    pub fn with_family(mut self, font_family: FontFamily) -> Self {
        self.font_family = font_family;
        self
    }
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::new(13.0)
    }
}

/// Font family selection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FontFamily {
    /// A generic sans-serif family.
    SansSerif,
    /// A generic monospace family; numeric labels line up better with it.
    Monospace,
    /// A named family (e.g. `"Inter"`).
    Named(Arc<str>),
}

impl FontFamily {
    /// Returns the CSS-style family name.
    #[must_use]
    pub fn as_css_family(&self) -> &str {
        match self {
            Self::SansSerif => "sans-serif",
            Self::Monospace => "monospace",
            Self::Named(name) => name,
        }
    }
}

/// Measured extents of one line of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextMetrics {
    /// Horizontal advance of the whole string.
    pub advance_width: f64,
    /// Distance from baseline to the top of typical glyphs.
    pub ascent: f64,
    /// Distance from baseline to the bottom of typical glyphs.
    pub descent: f64,
}

impl TextMetrics {
    /// Returns `ascent + descent`.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }

    /// Returns the glyph box as `(width, height)`.
    #[must_use]
    pub fn size(&self) -> (f64, f64) {
        (self.advance_width, self.height())
    }
}

/// A measurer that estimates glyph boxes without any font data.
///
/// It assumes an average advance of 0.6em and splits the line height 0.8/0.2
/// between ascent and descent. Good enough for digits in a proportional face.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicTextMeasurer;

impl TextMeasurer for HeuristicTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        TextMetrics {
            advance_width: 0.6 * style.font_size * text.chars().count() as f64,
            ascent: 0.8 * style.font_size,
            descent: 0.2 * style.font_size,
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn heuristic_box_scales_with_length_and_size() {
        let m = HeuristicTextMeasurer;
        let short = m.measure("1.0", &TextStyle::new(10.0));
        let long = m.measure("100.0", &TextStyle::new(10.0));
        assert!((short.advance_width - 18.0).abs() < 1e-9, "{short:?}");
        assert!((long.advance_width - 30.0).abs() < 1e-9, "{long:?}");
        assert!((short.height() - 10.0).abs() < 1e-9, "{short:?}");
    }

    #[test]
    fn families_map_to_css_names() {
        let style = TextStyle::default();
        assert_eq!(style.font_family.as_css_family(), "sans-serif");
        let style = style.with_family(FontFamily::Monospace);
        assert_eq!(style.font_family.as_css_family(), "monospace");
        assert_eq!(style.font_size, 13.0);
        let named = TextStyle::new(9.0).with_family(FontFamily::Named("Inter".into()));
        assert_eq!(named.font_family.as_css_family(), "Inter");
    }

    #[test]
    fn measurer_is_usable_through_a_reference() {
        fn width_of(m: impl TextMeasurer) -> f64 {
            m.measure("ab", &TextStyle::new(5.0)).advance_width
        }
        let m = HeuristicTextMeasurer;
        assert!((width_of(&m) - 6.0).abs() < 1e-9, "borrowed measurer");
    }
}
