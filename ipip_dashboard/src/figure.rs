// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A named subplot and everything drawn into it for one frame.

use std::collections::HashMap;

use ipip_core::{
    AxisScale, CellLabel, ColorRamp, DrawList, FeedOutcome, HeatmapOutcome, HeatmapSpec,
    LabelFormat, Palette, RenderStats, StreamSet, TimeWindowBuffer, Transform2d, Viewport,
    heatmap_labels, render_heatmap,
};
use ipip_text::{FontFamily, TextMeasurer, TextStyle};
use kurbo::{BezPath, Point, Rect};
use peniko::Color;

use crate::sample::Sample;

/// A scalar stream drawn as a polyline in render space.
#[derive(Clone, Debug)]
pub struct StreamLine {
    /// Stream name.
    pub stream: String,
    /// The polyline, already mapped through the frame transform.
    pub path: BezPath,
    /// Stroke color.
    pub color: Color,
}

/// Everything one figure produced for one frame.
#[derive(Debug)]
pub struct FrameOutput {
    /// Figure name.
    pub figure: String,
    /// The viewport the frame was drawn with.
    pub viewport: Viewport,
    /// Heatmap triangles, batched for 16-bit indices.
    pub geometry: DrawList<u16>,
    /// Scalar stream polylines, in stream order.
    pub lines: Vec<StreamLine>,
    /// Heatmap cell labels.
    pub labels: Vec<CellLabel>,
    /// Style the labels were measured with.
    pub label_style: TextStyle,
    /// Cell counts summed over every heatmap.
    pub stats: RenderStats,
}

/// A named subplot holding its own streams.
///
/// Scalar streams are drawn as lines, vector streams as heatmaps with time
/// along x and one row per channel.
#[derive(Clone, Debug)]
pub struct Figure {
    name: String,
    streams: StreamSet,
    extents: HashMap<String, (f64, f64)>,
    /// Heatmap color-scale limits; `(0.0, 0.0)` auto-ranges every frame.
    pub color_scale: (f64, f64),
    /// X axis scale.
    pub x_scale: AxisScale,
    /// Y axis scale.
    pub y_scale: AxisScale,
    /// Heatmap cell labels; `None` draws none.
    pub label_format: Option<LabelFormat>,
    /// Heatmap label font; monospace by default.
    pub label_style: TextStyle,
    line_colors: ColorRamp,
}

impl Figure {
    /// Creates an empty figure whose streams keep `span` seconds.
    pub fn new(name: impl Into<String>, span: f64) -> Self {
        Self {
            name: name.into(),
            streams: StreamSet::new(span),
            extents: HashMap::new(),
            color_scale: (0.0, 0.0),
            x_scale: AxisScale::Linear,
            y_scale: AxisScale::Linear,
            label_format: None,
            label_style: TextStyle::default().with_family(FontFamily::Monospace),
            line_colors: ColorRamp::preset(0),
        }
    }

    /// Figure name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The figure's streams.
    pub fn streams(&self) -> &StreamSet {
        &self.streams
    }

    /// Changes the window span of every stream.
    pub fn set_span(&mut self, span: f64) {
        self.streams.set_span(span);
    }

    /// Stores one sample.
    ///
    /// `ymin`/`ymax` stick to the stream until a later sample overrides them.
    pub fn feed(&mut self, sample: &Sample) -> FeedOutcome {
        if sample.y_min.is_some() || sample.y_max.is_some() {
            let extent = self
                .extents
                .entry(sample.stream.clone())
                .or_insert((0.0, 0.0));
            if let Some(y_min) = sample.y_min {
                extent.0 = y_min;
            }
            if let Some(y_max) = sample.y_max {
                extent.1 = y_max;
            }
        }
        self.streams.feed(&sample.stream, sample.time, &sample.values)
    }

    /// The `(ymin, ymax)` last set on `stream`, `(0, 0)` if never set.
    pub fn y_extent(&self, stream: &str) -> (f64, f64) {
        self.extents.get(stream).copied().unwrap_or((0.0, 0.0))
    }

    /// Data-space rectangle covered by a vector stream's heatmap.
    ///
    /// `None` for scalar or empty streams.
    pub fn heatmap_bounds(&self, stream: &str) -> Option<Rect> {
        heatmap_bounds(self.streams.get(stream)?, self.y_extent(stream))
    }

    /// Whether any stream carries more than one channel.
    pub fn has_vector_streams(&self) -> bool {
        self.streams.iter().any(|(_, buf)| buf.width() > 1)
    }

    /// Builds the viewport for this figure inside `rect`.
    ///
    /// With `x_lock` set, x spans `[0, x_lock]`; otherwise x and y follow the
    /// data. Empty or flat ranges are widened so the transform stays finite.
    pub fn viewport(&self, rect: Rect, x_lock: Option<f64>) -> Viewport {
        let mut x: Option<(f64, f64)> = None;
        let mut y: Option<(f64, f64)> = None;
        for (name, buf) in self.streams.iter() {
            let Some(ticks) = buf.tick_range() else {
                continue;
            };
            x = Some(union(x, ticks));
            if buf.width() > 1 {
                if let Some(b) = heatmap_bounds(buf, self.y_extent(name)) {
                    y = Some(union(y, (b.y0.min(b.y1), b.y0.max(b.y1))));
                }
            } else if let Some(extrema) = buf.extrema() {
                y = Some(union(y, extrema));
            }
        }
        let x = match x_lock {
            Some(hi) => (0.0, hi),
            None => widen(x.unwrap_or((0.0, 1.0))),
        };
        let y = widen(y.unwrap_or((0.0, 1.0)));
        Viewport::new(rect, x, y)
            .with_x_scale(self.x_scale)
            .with_y_scale(self.y_scale)
    }

    /// Draws every stream of the figure.
    ///
    /// Vector streams are rasterized with `palette`; scalar streams cycle
    /// through a fixed set of line colors.
    pub fn render<P: Palette, M: TextMeasurer>(
        &mut self,
        viewport: Viewport,
        palette: &P,
        measurer: &M,
    ) -> FrameOutput {
        let transform = viewport.transform();
        let mut out = FrameOutput {
            figure: self.name.clone(),
            viewport,
            geometry: DrawList::new(),
            lines: Vec::new(),
            labels: Vec::new(),
            label_style: self.label_style.clone(),
            stats: RenderStats::default(),
        };
        let line_colors = self.line_colors.stops();
        let mut line_index = 0;

        for (name, buf) in self.streams.iter_mut() {
            if buf.is_empty() {
                continue;
            }
            if buf.width() == 1 {
                let mut path = BezPath::new();
                for (i, (t, v)) in buf.polyline().enumerate() {
                    let p = transform.map(Point::new(t, v));
                    if i == 0 {
                        path.move_to(p);
                    } else {
                        path.line_to(p);
                    }
                }
                out.lines.push(StreamLine {
                    stream: name.to_owned(),
                    path,
                    color: line_colors[line_index % line_colors.len()],
                });
                line_index += 1;
                continue;
            }

            let extent = self.extents.get(name).copied().unwrap_or((0.0, 0.0));
            let Some(bounds) = heatmap_bounds(buf, extent) else {
                continue;
            };
            let (lo, hi) = self.color_scale;
            let mut spec = HeatmapSpec::new(bounds)
                .with_scale(lo, hi)
                .with_flip_y(true);
            spec.label_style = self.label_style.clone();
            if let Some(format) = &self.label_format {
                spec = spec.with_labels(format.clone());
            }
            let grid = buf.as_grid();
            match render_heatmap(&grid, &spec, palette, &viewport, &mut out.geometry) {
                HeatmapOutcome::Cells(stats) => out.stats += stats,
                HeatmapOutcome::Filled { .. } => {
                    log::trace!("{}/{name}: flat heatmap", self.name);
                }
                HeatmapOutcome::Empty => {}
            }
            out.labels
                .extend(heatmap_labels(&grid, &spec, palette, &transform, measurer));
        }
        out
    }
}

fn heatmap_bounds(buf: &TimeWindowBuffer, (y_min, y_max): (f64, f64)) -> Option<Rect> {
    if buf.width() < 2 {
        return None;
    }
    let (t0, t1) = buf.tick_range()?;
    let y_max = if y_min == y_max {
        buf.width() as f64
    } else {
        y_max
    };
    Some(Rect::new(t0, y_min, t1, y_max))
}

fn union(acc: Option<(f64, f64)>, (lo, hi): (f64, f64)) -> (f64, f64) {
    match acc {
        Some((a, b)) => (a.min(lo), b.max(hi)),
        None => (lo, hi),
    }
}

fn widen((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, lo + 0.5)
    }
}

#[cfg(test)]
mod tests {
    use ipip_text::HeuristicTextMeasurer;
    use kurbo::PathEl;

    use super::*;

    fn sample(stream: &str, time: f64, values: &[f64]) -> Sample {
        Sample {
            figure: "fig".into(),
            stream: stream.into(),
            time,
            values: values.to_vec(),
            y_min: None,
            y_max: None,
        }
    }

    #[test]
    fn extent_persists_until_overridden() {
        let mut fig = Figure::new("fig", 10.0);
        let mut s = sample("heat", 0.0, &[1.0, 2.0]);
        s.y_min = Some(-1.0);
        s.y_max = Some(3.0);
        fig.feed(&s);
        fig.feed(&sample("heat", 1.0, &[1.0, 2.0]));
        assert_eq!(fig.y_extent("heat"), (-1.0, 3.0));
        assert_eq!(fig.heatmap_bounds("heat"), Some(Rect::new(0.0, -1.0, 1.0, 3.0)));

        let mut s = sample("heat", 2.0, &[1.0, 2.0]);
        s.y_max = Some(5.0);
        fig.feed(&s);
        assert_eq!(fig.y_extent("heat"), (-1.0, 5.0));
    }

    #[test]
    fn flat_extent_falls_back_to_channel_count() {
        let mut fig = Figure::new("fig", 10.0);
        fig.feed(&sample("heat", 0.5, &[1.0, 2.0, 3.0]));
        fig.feed(&sample("heat", 2.5, &[1.0, 2.0, 3.0]));
        assert_eq!(fig.heatmap_bounds("heat"), Some(Rect::new(0.5, 0.0, 2.5, 3.0)));
        assert!(fig.has_vector_streams());
    }

    #[test]
    fn scalar_streams_have_no_heatmap_bounds() {
        let mut fig = Figure::new("fig", 10.0);
        fig.feed(&sample("sin", 0.0, &[0.5]));
        assert_eq!(fig.heatmap_bounds("sin"), None);
        assert_eq!(fig.heatmap_bounds("missing"), None);
        assert!(!fig.has_vector_streams());
    }

    #[test]
    fn viewport_follows_data_unless_locked() {
        let mut fig = Figure::new("fig", 10.0);
        fig.feed(&sample("sin", 1.0, &[-2.0]));
        fig.feed(&sample("sin", 3.0, &[4.0]));
        let rect = Rect::new(0.0, 0.0, 200.0, 100.0);

        let free = fig.viewport(rect, None);
        assert_eq!(free.x_range, (1.0, 3.0));
        assert_eq!(free.y_range, (-2.0, 4.0));

        let locked = fig.viewport(rect, Some(5.0));
        assert_eq!(locked.x_range, (0.0, 5.0));
        assert_eq!(locked.y_range, (-2.0, 4.0));
    }

    #[test]
    fn empty_figure_gets_a_unit_viewport() {
        let fig = Figure::new("fig", 10.0);
        let vp = fig.viewport(Rect::new(0.0, 0.0, 10.0, 10.0), None);
        assert_eq!((vp.x_range, vp.y_range), ((0.0, 1.0), (0.0, 1.0)));
    }

    #[test]
    fn render_draws_lines_and_heatmaps() {
        let mut fig = Figure::new("fig", 10.0);
        for t in 0..4 {
            let t = f64::from(t);
            fig.feed(&sample("sin", t, &[t.sin()]));
            fig.feed(&sample("cos", t, &[t.cos()]));
            fig.feed(&sample("heat", t, &[t, -t]));
        }
        let vp = fig.viewport(Rect::new(0.0, 0.0, 400.0, 300.0), Some(5.0));
        let out = fig.render(vp, &ColorRamp::preset(5), &HeuristicTextMeasurer);

        assert_eq!(out.figure, "fig");
        assert_eq!(out.lines.len(), 2);
        assert_ne!(out.lines[0].color, out.lines[1].color);
        let first = &out.lines[0];
        assert_eq!(first.stream, "sin");
        assert!(matches!(first.path.elements()[0], PathEl::MoveTo(_)));
        assert_eq!(first.path.elements().len(), 4);

        assert_eq!(out.stats.drawn + out.stats.culled, 8);
        assert_eq!(out.geometry.vertices().len(), out.stats.drawn * 4);
        assert!(out.labels.is_empty());
    }

    #[test]
    fn labels_follow_the_figure_format() {
        let mut fig = Figure::new("fig", 10.0);
        fig.label_format = Some(LabelFormat::default());
        fig.feed(&sample("heat", 0.0, &[0.0, 1.0]));
        fig.feed(&sample("heat", 1.0, &[2.0, 3.0]));
        let vp = fig.viewport(Rect::new(0.0, 0.0, 100.0, 100.0), None);
        let out = fig.render(vp, &ColorRamp::preset(5), &HeuristicTextMeasurer);
        let texts: Vec<_> = out.labels.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["0.0", "2.0", "1.0", "3.0"]);
    }

    #[test]
    fn label_style_sizes_labels_and_reaches_the_frame() {
        let mut fig = Figure::new("fig", 10.0);
        fig.label_format = Some(LabelFormat::default());
        assert_eq!(fig.label_style.font_family, FontFamily::Monospace);
        fig.label_style = TextStyle::new(20.0).with_family(FontFamily::Named("Inter".into()));
        fig.feed(&sample("heat", 0.0, &[0.0, 1.0]));
        fig.feed(&sample("heat", 1.0, &[2.0, 3.0]));
        let vp = fig.viewport(Rect::new(0.0, 0.0, 100.0, 100.0), None);
        let out = fig.render(vp, &ColorRamp::preset(5), &HeuristicTextMeasurer);
        assert_eq!(out.label_style.font_family.as_css_family(), "Inter");
        // "0.0" at 0.6em per char and 20px.
        let (w, h) = out.labels[0].size;
        assert!((w - 36.0).abs() < 1e-9 && (h - 20.0).abs() < 1e-9, "{w} x {h}");
    }
}
