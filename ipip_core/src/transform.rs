// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data-space to render-space coordinate transforms.
//!
//! A plot frame maps each axis independently, either linearly or
//! logarithmically, which gives four 2-D combinations. [`PlotTransform`] is the
//! tagged form, computed once per frame from the [`Viewport`]. Hot loops
//! call [`PlotTransform::dispatch`] so they run against the concrete
//! [`TransformXY`] and never re-match per point.

use kurbo::{Point, Rect};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Floor applied to non-positive inputs of a log axis.
pub const LOG_EPSILON: f64 = f64::MIN_POSITIVE;

/// Smallest domain bound a log axis accepts.
const LOG_DOMAIN_FLOOR: f64 = 0.001;

/// Scale of a single plot axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AxisScale {
    /// Linear mapping.
    #[default]
    Linear,
    /// Base-10 logarithmic mapping.
    Log,
}

/// The four axis-scale combinations, x first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleMode {
    /// Linear x, linear y.
    LinLin,
    /// Log x, linear y.
    LogLin,
    /// Linear x, log y.
    LinLog,
    /// Log x, log y.
    LogLog,
}

impl ScaleMode {
    /// Combines per-axis scales.
    pub fn from_axes(x: AxisScale, y: AxisScale) -> Self {
        match (x, y) {
            (AxisScale::Linear, AxisScale::Linear) => Self::LinLin,
            (AxisScale::Log, AxisScale::Linear) => Self::LogLin,
            (AxisScale::Linear, AxisScale::Log) => Self::LinLog,
            (AxisScale::Log, AxisScale::Log) => Self::LogLog,
        }
    }

    /// Returns the x-axis scale.
    pub fn x(self) -> AxisScale {
        match self {
            Self::LinLin | Self::LinLog => AxisScale::Linear,
            Self::LogLin | Self::LogLog => AxisScale::Log,
        }
    }

    /// Returns the y-axis scale.
    pub fn y(self) -> AxisScale {
        match self {
            Self::LinLin | Self::LogLin => AxisScale::Linear,
            Self::LinLog | Self::LogLog => AxisScale::Log,
        }
    }
}

/// Inputs shared by both 1-D transform kinds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisParams {
    /// Render coordinate of `domain_min`.
    pub render_min: f64,
    /// Lower domain bound.
    pub domain_min: f64,
    /// Upper domain bound.
    pub domain_max: f64,
    /// Render units per domain unit (negative for a y axis growing upward).
    pub slope: f64,
    /// `log10(domain_max / domain_min)`; unused by linear axes.
    pub log_den: f64,
}

/// A 1-D mapping from domain values to render coordinates.
pub trait Axis1d: Copy + core::fmt::Debug {
    /// Builds the axis from its frame parameters.
    fn from_params(params: AxisParams) -> Self;

    /// Maps a domain value to a render coordinate.
    fn map(&self, value: f64) -> f64;
}

/// `out = render_min + slope * (value - domain_min)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearAxis {
    render_min: f64,
    domain_min: f64,
    slope: f64,
}

impl Axis1d for LinearAxis {
    fn from_params(params: AxisParams) -> Self {
        Self {
            render_min: params.render_min,
            domain_min: params.domain_min,
            slope: params.slope,
        }
    }

    #[inline]
    fn map(&self, value: f64) -> f64 {
        self.render_min + self.slope * (value - self.domain_min)
    }
}

/// Logarithmic axis.
///
/// The value is placed at `t = log10(value / domain_min) / log_den` along the
/// domain, then mapped linearly. Inputs `<= 0` are clamped to [`LOG_EPSILON`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LogAxis {
    render_min: f64,
    domain_min: f64,
    domain_max: f64,
    slope: f64,
    log_den: f64,
}

impl LogAxis {
    /// Returns the input actually fed to `log10`.
    #[inline]
    pub fn clamp_input(value: f64) -> f64 {
        if value <= 0.0 { LOG_EPSILON } else { value }
    }
}

impl Axis1d for LogAxis {
    fn from_params(params: AxisParams) -> Self {
        Self {
            render_min: params.render_min,
            domain_min: params.domain_min,
            domain_max: params.domain_max,
            slope: params.slope,
            log_den: params.log_den,
        }
    }

    #[inline]
    fn map(&self, value: f64) -> f64 {
        if self.log_den == 0.0 {
            return self.render_min;
        }
        let value = Self::clamp_input(value);
        let t = (value / self.domain_min).log10() / self.log_den;
        let lerped = self.domain_min + (self.domain_max - self.domain_min) * t;
        self.render_min + self.slope * (lerped - self.domain_min)
    }
}

/// Maps data-space points into render space.
pub trait Transform2d {
    /// Maps one point.
    fn map(&self, p: Point) -> Point;
}

/// Independent x and y axes composed into a 2-D transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformXY<X, Y> {
    /// Horizontal axis.
    pub x: X,
    /// Vertical axis.
    pub y: Y,
}

impl<X: Axis1d, Y: Axis1d> TransformXY<X, Y> {
    /// Builds both axes from frame parameters.
    pub fn new(x: AxisParams, y: AxisParams) -> Self {
        Self {
            x: X::from_params(x),
            y: Y::from_params(y),
        }
    }
}

impl<X: Axis1d, Y: Axis1d> Transform2d for TransformXY<X, Y> {
    #[inline]
    fn map(&self, p: Point) -> Point {
        Point::new(self.x.map(p.x), self.y.map(p.y))
    }
}

/// Linear x, linear y.
pub type TransformLinLin = TransformXY<LinearAxis, LinearAxis>;
/// Log x, linear y.
pub type TransformLogLin = TransformXY<LogAxis, LinearAxis>;
/// Linear x, log y.
pub type TransformLinLog = TransformXY<LinearAxis, LogAxis>;
/// Log x, log y.
pub type TransformLogLog = TransformXY<LogAxis, LogAxis>;

/// Receives the concrete transform chosen for a frame.
pub trait TransformVisitor {
    /// Value produced by the visit.
    type Output;

    /// Called once with the frame's concrete transform.
    fn visit<T: Transform2d>(self, transform: &T) -> Self::Output;
}

/// The per-frame transform, one variant per [`ScaleMode`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlotTransform {
    /// Linear x, linear y.
    LinLin(TransformLinLin),
    /// Log x, linear y.
    LogLin(TransformLogLin),
    /// Linear x, log y.
    LinLog(TransformLinLog),
    /// Log x, log y.
    LogLog(TransformLogLog),
}

impl PlotTransform {
    /// Selects and builds the transform for a viewport.
    pub fn for_viewport(viewport: &Viewport) -> Self {
        let x = viewport.x_params();
        let y = viewport.y_params();
        match viewport.scale_mode() {
            ScaleMode::LinLin => Self::LinLin(TransformXY::new(x, y)),
            ScaleMode::LogLin => Self::LogLin(TransformXY::new(x, y)),
            ScaleMode::LinLog => Self::LinLog(TransformXY::new(x, y)),
            ScaleMode::LogLog => Self::LogLog(TransformXY::new(x, y)),
        }
    }

    /// Returns the scale combination this transform implements.
    pub fn mode(&self) -> ScaleMode {
        match self {
            Self::LinLin(_) => ScaleMode::LinLin,
            Self::LogLin(_) => ScaleMode::LogLin,
            Self::LinLog(_) => ScaleMode::LinLog,
            Self::LogLog(_) => ScaleMode::LogLog,
        }
    }

    /// Hands the concrete transform to `visitor`.
    pub fn dispatch<V: TransformVisitor>(&self, visitor: V) -> V::Output {
        match self {
            Self::LinLin(t) => visitor.visit(t),
            Self::LogLin(t) => visitor.visit(t),
            Self::LinLog(t) => visitor.visit(t),
            Self::LogLog(t) => visitor.visit(t),
        }
    }
}

impl Transform2d for PlotTransform {
    fn map(&self, p: Point) -> Point {
        match self {
            Self::LinLin(t) => t.map(p),
            Self::LogLin(t) => t.map(p),
            Self::LinLog(t) => t.map(p),
            Self::LogLog(t) => t.map(p),
        }
    }
}

/// The active plot area: where it is drawn and which data it shows.
///
/// Data y grows upward while render y grows downward, so `y_range.0` lands on
/// the bottom edge of `rect`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// Plot rectangle in render space; also the cull rectangle.
    pub rect: Rect,
    /// Visible x domain.
    pub x_range: (f64, f64),
    /// Visible y domain.
    pub y_range: (f64, f64),
    /// X axis scale.
    pub x_scale: AxisScale,
    /// Y axis scale.
    pub y_scale: AxisScale,
}

impl Viewport {
    /// Creates a linear/linear viewport.
    pub fn new(rect: Rect, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        Self {
            rect,
            x_range,
            y_range,
            x_scale: AxisScale::Linear,
            y_scale: AxisScale::Linear,
        }
    }

    /// Sets the x axis scale.
    pub fn with_x_scale(mut self, scale: AxisScale) -> Self {
        self.x_scale = scale;
        self
    }

    /// Sets the y axis scale.
    pub fn with_y_scale(mut self, scale: AxisScale) -> Self {
        self.y_scale = scale;
        self
    }

    /// Returns the axis-scale combination.
    pub fn scale_mode(&self) -> ScaleMode {
        ScaleMode::from_axes(self.x_scale, self.y_scale)
    }

    /// Frame parameters of the x axis.
    pub fn x_params(&self) -> AxisParams {
        axis_params(self.rect.x0, self.rect.width(), self.x_range, self.x_scale)
    }

    /// Frame parameters of the y axis (anchored at the bottom edge).
    pub fn y_params(&self) -> AxisParams {
        axis_params(self.rect.y1, -self.rect.height(), self.y_range, self.y_scale)
    }

    /// Builds the frame transform.
    pub fn transform(&self) -> PlotTransform {
        PlotTransform::for_viewport(self)
    }
}

fn axis_params(
    render_min: f64,
    render_extent: f64,
    range: (f64, f64),
    scale: AxisScale,
) -> AxisParams {
    let (mut lo, mut hi) = range;
    if scale == AxisScale::Log {
        lo = lo.max(LOG_DOMAIN_FLOOR);
        hi = hi.max(LOG_DOMAIN_FLOOR);
    }
    let span = hi - lo;
    let slope = if span == 0.0 {
        0.0
    } else {
        render_extent / span
    };
    let log_den = match scale {
        AxisScale::Linear => 0.0,
        AxisScale::Log => (hi / lo).log10(),
    };
    AxisParams {
        render_min,
        domain_min: lo,
        domain_max: hi,
        slope,
        log_den,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn viewport() -> Viewport {
        Viewport::new(Rect::new(10.0, 20.0, 110.0, 220.0), (0.0, 10.0), (0.0, 4.0))
    }

    #[test]
    fn linear_maps_domain_onto_plot_rect() {
        let t = viewport().transform();
        assert_eq!(t.mode(), ScaleMode::LinLin);
        let lo = t.map(Point::new(0.0, 0.0));
        let hi = t.map(Point::new(10.0, 4.0));
        assert!(close(lo.x, 10.0) && close(lo.y, 220.0), "{lo:?}");
        assert!(close(hi.x, 110.0) && close(hi.y, 20.0), "{hi:?}");
    }

    #[test]
    fn log_axis_maps_endpoints_and_decades() {
        let vp = Viewport::new(Rect::new(0.0, 0.0, 300.0, 100.0), (1.0, 1000.0), (0.0, 1.0))
            .with_x_scale(AxisScale::Log);
        let t = vp.transform();
        assert_eq!(t.mode(), ScaleMode::LogLin);
        assert!(close(t.map(Point::new(1.0, 0.0)).x, 0.0));
        assert!(close(t.map(Point::new(10.0, 0.0)).x, 100.0));
        assert!(close(t.map(Point::new(1000.0, 0.0)).x, 300.0));
    }

    #[test]
    fn log_axis_clamps_non_positive_inputs() {
        for v in [0.0, -1.0, -1e300, f64::NEG_INFINITY] {
            let c = LogAxis::clamp_input(v);
            assert!(c > 0.0, "{v} clamped to {c}");
            assert_eq!(c, LOG_EPSILON);
        }
        assert_eq!(LogAxis::clamp_input(2.5), 2.5);

        let vp = viewport().with_y_scale(AxisScale::Log);
        let p = vp.transform().map(Point::new(1.0, -3.0));
        assert!(p.y.is_finite(), "clamped log input must stay finite, got {p:?}");
    }

    #[test]
    fn log_domain_is_floored() {
        let vp = viewport().with_y_scale(AxisScale::Log);
        let y = vp.y_params();
        assert!(y.domain_min > 0.0, "{y:?}");
        assert!(y.log_den.is_finite(), "{y:?}");
    }

    #[test]
    fn scale_mode_round_trips_axes() {
        for x in [AxisScale::Linear, AxisScale::Log] {
            for y in [AxisScale::Linear, AxisScale::Log] {
                let mode = ScaleMode::from_axes(x, y);
                assert_eq!((mode.x(), mode.y()), (x, y));
                let vp = viewport().with_x_scale(x).with_y_scale(y);
                assert_eq!(vp.transform().mode(), mode);
            }
        }
    }

    #[test]
    fn dispatch_matches_direct_mapping() {
        struct MapOne(Point);
        impl TransformVisitor for MapOne {
            type Output = Point;
            fn visit<T: Transform2d>(self, transform: &T) -> Point {
                transform.map(self.0)
            }
        }

        let p = Point::new(3.0, 2.0);
        for vp in [viewport(), viewport().with_x_scale(AxisScale::Log)] {
            let t = vp.transform();
            assert_eq!(t.dispatch(MapOne(p)), t.map(p));
        }
    }

    #[test]
    fn zero_span_collapses_to_render_min() {
        let vp = Viewport::new(Rect::new(0.0, 0.0, 50.0, 50.0), (2.0, 2.0), (0.0, 1.0));
        let p = vp.transform().map(Point::new(7.0, 0.0));
        assert!(close(p.x, 0.0), "{p:?}");
    }
}
