// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid heatmap rasterization.
//!
//! A [`GridView`] is laid out over a data-space rectangle, one cell per value,
//! and each cell becomes a solid rectangle colored by its normalized value.
//! Rectangles stream straight into a [`DrawList`] through the batch
//! allocator, and off-screen or transparent cells are culled on the way.
//!
//! Optionally each cell also gets a centered text label of its value
//! ([`heatmap_labels`]).

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use ipip_text::{TextMeasurer, TextStyle};
use kurbo::{Point, Rect, Vec2};
use peniko::Color;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::batch::{
    DrawIndex, DrawList, RectPrimitive, RectRenderer, RectSource, RenderStats, render_primitives,
};
use crate::grid::GridView;
use crate::palette::{Palette, contrast_text_color};
use crate::transform::{PlotTransform, Transform2d, TransformVisitor, Viewport};

/// How a heatmap is placed, colored and labeled.
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapSpec {
    /// Data-space rectangle covered by the grid.
    pub bounds: Rect,
    /// Value mapped to the first and last palette color.
    ///
    /// `(0.0, 0.0)` means "use the grid's own min and max".
    pub scale: (f64, f64),
    /// Lay row 0 along the top edge (`bounds.y1`) instead of the bottom.
    pub flip_y: bool,
    /// Per-cell value labels; `None` disables them.
    pub label_format: Option<LabelFormat>,
    /// Style used to measure labels.
    pub label_style: TextStyle,
}

impl HeatmapSpec {
    /// Creates an auto-ranged, unlabeled heatmap over `bounds`.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            scale: (0.0, 0.0),
            flip_y: false,
            label_format: None,
            label_style: TextStyle::default(),
        }
    }

    /// Sets the color scale limits.
    pub fn with_scale(mut self, min: f64, max: f64) -> Self {
        self.scale = (min, max);
        self
    }

    /// Sets whether row 0 sits at the top.
    pub fn with_flip_y(mut self, flip_y: bool) -> Self {
        self.flip_y = flip_y;
        self
    }

    /// Enables value labels.
    pub fn with_labels(mut self, format: LabelFormat) -> Self {
        self.label_format = Some(format);
        self
    }

    /// Sets the label font size.
    pub fn with_label_size(mut self, font_size: f64) -> Self {
        self.label_style.font_size = font_size;
        self
    }

    /// The effective `(min, max)` color scale for `grid`.
    ///
    /// Returns `(0.0, 0.0)` when auto-ranging finds no finite values.
    pub fn resolve_scale(&self, grid: &GridView<'_>) -> (f64, f64) {
        if self.scale == (0.0, 0.0) {
            grid.min_max().unwrap_or((0.0, 0.0))
        } else {
            self.scale
        }
    }
}

/// What [`render_heatmap`] produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeatmapOutcome {
    /// The grid had no cells; nothing was drawn.
    Empty,
    /// The color scale was degenerate; the whole bounds were filled with one
    /// color.
    Filled {
        /// The fill color (the palette's first color).
        color: Color,
    },
    /// One rectangle per visible cell.
    Cells(RenderStats),
}

/// The cells of a heatmap as rectangle primitives.
#[derive(Debug)]
pub struct HeatmapCells<'a, P> {
    grid: GridView<'a>,
    palette: &'a P,
    scale_min: f64,
    scale_range: f64,
    x_ref: f64,
    y_ref: f64,
    y_dir: f64,
    size: Vec2,
}

impl<'a, P: Palette> HeatmapCells<'a, P> {
    /// Lays `grid` out over `bounds`, normalizing values against
    /// `[scale_min, scale_max]`.
    pub fn new(
        grid: GridView<'a>,
        palette: &'a P,
        bounds: Rect,
        flip_y: bool,
        (scale_min, scale_max): (f64, f64),
    ) -> Self {
        let (y_ref, y_dir) = if flip_y {
            (bounds.y1, -1.0)
        } else {
            (bounds.y0, 1.0)
        };
        Self {
            grid,
            palette,
            scale_min,
            scale_range: scale_max - scale_min,
            x_ref: bounds.x0,
            y_ref,
            y_dir,
            size: Vec2::new(
                (bounds.x1 - bounds.x0) / grid.cols() as f64,
                (bounds.y1 - bounds.y0) / grid.rows() as f64,
            ),
        }
    }

    /// Data-space center of cell `(row, col)`.
    pub fn center(&self, row: usize, col: usize) -> Point {
        let (w, h) = (self.size.x, self.size.y);
        Point::new(
            self.x_ref + 0.5 * w + col as f64 * w,
            self.y_ref + self.y_dir * (0.5 * h + row as f64 * h),
        )
    }

    /// Normalized position of `value` on the color scale, clamped to `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        ((value - self.scale_min) / self.scale_range).clamp(0.0, 1.0)
    }
}

impl<P: Palette> RectSource for HeatmapCells<'_, P> {
    fn count(&self) -> usize {
        self.grid.len()
    }

    #[inline]
    fn rect(&self, i: usize) -> RectPrimitive {
        let (r, c) = self.grid.cell(i);
        let value = self.grid.values()[i];
        let center = self.center(r, c);
        let half = 0.5 * self.size;
        RectPrimitive {
            min: center - half,
            max: center + half,
            color: self.palette.sample(self.normalize(value)),
        }
    }
}

struct Rasterize<'a, S, I: DrawIndex> {
    source: &'a S,
    list: &'a mut DrawList<I>,
    clip: Rect,
}

impl<S: RectSource, I: DrawIndex> TransformVisitor for Rasterize<'_, S, I> {
    type Output = RenderStats;

    fn visit<T: Transform2d>(self, transform: &T) -> RenderStats {
        render_primitives(&RectRenderer::new(self.source, transform), self.list, self.clip)
    }
}

/// Draws `grid` into `list`.
///
/// The viewport supplies both the data-to-render transform and the cull
/// rectangle.
pub fn render_heatmap<P: Palette, I: DrawIndex>(
    grid: &GridView<'_>,
    spec: &HeatmapSpec,
    palette: &P,
    viewport: &Viewport,
    list: &mut DrawList<I>,
) -> HeatmapOutcome {
    if grid.is_empty() {
        return HeatmapOutcome::Empty;
    }
    let transform = viewport.transform();
    let scale = spec.resolve_scale(grid);
    if scale.0 == scale.1 {
        let color = palette.sample(0.0);
        let a = transform.map(Point::new(spec.bounds.x0, spec.bounds.y0));
        let b = transform.map(Point::new(spec.bounds.x1, spec.bounds.y1));
        list.add_rect_filled(a, b, color);
        return HeatmapOutcome::Filled { color };
    }

    let cells = HeatmapCells::new(*grid, palette, spec.bounds, spec.flip_y, scale);
    let stats = transform.dispatch(Rasterize {
        source: &cells,
        list,
        clip: viewport.rect,
    });
    log::trace!(
        "heatmap {}x{}: {} drawn, {} culled",
        grid.rows(),
        grid.cols(),
        stats.drawn,
        stats.culled
    );
    HeatmapOutcome::Cells(stats)
}

/// A value label centered on a heatmap cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellLabel {
    /// Formatted value.
    pub text: String,
    /// Top-left corner of the text box in render space.
    pub origin: Point,
    /// Measured `(width, height)` of the text box.
    pub size: (f64, f64),
    /// Text color, chosen for contrast with the cell.
    pub color: Color,
}

/// Builds the value labels of a heatmap, in grid storage order.
///
/// Nothing is produced when labels are disabled, the grid is empty, or the
/// color scale is degenerate (the grid is drawn as a single fill).
pub fn heatmap_labels<P: Palette, M: TextMeasurer>(
    grid: &GridView<'_>,
    spec: &HeatmapSpec,
    palette: &P,
    transform: &PlotTransform,
    measurer: &M,
) -> Vec<CellLabel> {
    let Some(format) = &spec.label_format else {
        return Vec::new();
    };
    let scale = spec.resolve_scale(grid);
    if grid.is_empty() || scale.0 == scale.1 {
        return Vec::new();
    }
    let cells = HeatmapCells::new(*grid, palette, spec.bounds, spec.flip_y, scale);
    let mut labels = Vec::with_capacity(grid.len());
    for (i, &value) in grid.values().iter().enumerate() {
        let (r, c) = grid.cell(i);
        let center = transform.map(cells.center(r, c));
        let text = format.format(value);
        let metrics = measurer.measure(&text, &spec.label_style);
        let (w, h) = metrics.size();
        labels.push(CellLabel {
            origin: Point::new(center.x - 0.5 * w, center.y - 0.5 * h),
            size: (w, h),
            color: contrast_text_color(palette.sample(cells.normalize(value))),
            text,
        });
    }
    labels
}

/// A printf-style value format with a single conversion.
///
/// Supported conversions are `%d` (truncated integer), `%f`/`%.Nf` (fixed),
/// `%e`/`%.Ne` (scientific, Rust exponent notation) and `%g` (shortest
/// round-trip form). `%%` is a literal percent sign. Text around the
/// conversion is copied verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelFormat {
    prefix: String,
    conversion: Conversion,
    suffix: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Conversion {
    Integer,
    Fixed(usize),
    Exponent(usize),
    Shortest,
}

/// Why a label format string was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelFormatError {
    /// The string has no conversion.
    MissingConversion,
    /// The string has more than one conversion.
    ExtraConversion,
    /// A conversion character outside the supported subset.
    Unsupported(char),
    /// The string ends in the middle of a conversion.
    Truncated,
    /// A precision above [`LabelFormat::MAX_PRECISION`].
    Precision,
}

impl fmt::Display for LabelFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingConversion => f.write_str("format has no conversion"),
            Self::ExtraConversion => f.write_str("format has more than one conversion"),
            Self::Unsupported(c) => write!(f, "unsupported conversion '%{c}'"),
            Self::Truncated => f.write_str("format ends inside a conversion"),
            Self::Precision => write!(
                f,
                "precision above {}",
                LabelFormat::MAX_PRECISION
            ),
        }
    }
}

impl core::error::Error for LabelFormatError {}

impl LabelFormat {
    /// Largest precision accepted after `%.`.
    pub const MAX_PRECISION: usize = 17;

    /// Parses a format such as `"%.1f"` or `"%d ms"`.
    pub fn parse(format: &str) -> Result<Self, LabelFormatError> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut conversion = None;
        let mut chars = format.chars();
        while let Some(ch) = chars.next() {
            let out = if conversion.is_some() {
                &mut suffix
            } else {
                &mut prefix
            };
            if ch != '%' {
                out.push(ch);
                continue;
            }
            let mut precision = None;
            let spec = match chars.next() {
                Some('%') => {
                    out.push('%');
                    continue;
                }
                Some('.') => {
                    let mut digits = 0_usize;
                    let mut next = chars.next();
                    while let Some(d) = next.and_then(|c| c.to_digit(10)) {
                        digits = digits
                            .checked_mul(10)
                            .and_then(|v| v.checked_add(usize::try_from(d).ok()?))
                            .filter(|&v| v <= Self::MAX_PRECISION)
                            .ok_or(LabelFormatError::Precision)?;
                        next = chars.next();
                    }
                    precision = Some(digits);
                    next
                }
                other => other,
            };
            let parsed = match spec {
                None => return Err(LabelFormatError::Truncated),
                Some('d' | 'i') if precision.is_none() => Conversion::Integer,
                Some('f' | 'F') => Conversion::Fixed(precision.unwrap_or(6)),
                Some('e' | 'E') => Conversion::Exponent(precision.unwrap_or(6)),
                Some('g' | 'G') => Conversion::Shortest,
                Some(c) => return Err(LabelFormatError::Unsupported(c)),
            };
            if conversion.replace(parsed).is_some() {
                return Err(LabelFormatError::ExtraConversion);
            }
        }
        match conversion {
            Some(conversion) => Ok(Self {
                prefix,
                conversion,
                suffix,
            }),
            None => Err(LabelFormatError::MissingConversion),
        }
    }

    /// Writes `value` through the format.
    pub fn write_to(&self, out: &mut impl fmt::Write, value: f64) -> fmt::Result {
        out.write_str(&self.prefix)?;
        match self.conversion {
            // `+ 0.0` turns -0 into 0.
            Conversion::Integer => write!(out, "{:.0}", value.trunc() + 0.0)?,
            Conversion::Fixed(p) => write!(out, "{value:.p$}")?,
            Conversion::Exponent(p) => write!(out, "{value:.p$e}")?,
            Conversion::Shortest => write!(out, "{value}")?,
        }
        out.write_str(&self.suffix)
    }

    /// Formats `value` into a new string.
    pub fn format(&self, value: f64) -> String {
        let mut s = String::new();
        // Writing into a `String` cannot fail.
        let _ = self.write_to(&mut s, value);
        s
    }
}

impl Default for LabelFormat {
    /// `%.1f`.
    fn default() -> Self {
        Self {
            prefix: String::new(),
            conversion: Conversion::Fixed(1),
            suffix: String::new(),
        }
    }
}
