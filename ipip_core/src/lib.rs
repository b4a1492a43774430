// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `ipip_core`: the frame-independent core of a live stream dashboard.
//!
//! This crate provides:
//! - per-stream sample storage over a recycling time window ([`TimeWindowBuffer`],
//!   [`StreamSet`])
//! - data-to-render coordinate transforms with linear or log axes ([`Viewport`],
//!   [`PlotTransform`])
//! - heatmap rasterization of a value grid into colored rectangles
//!   ([`render_heatmap`], [`heatmap_labels`])
//! - a batched triangle output addressed by 16- or 32-bit indices ([`DrawList`],
//!   [`render_primitives`])
//!
//! Scalar streams are drawn as lines straight from [`TimeWindowBuffer::polyline`];
//! vector streams go through [`TimeWindowBuffer::as_grid`] and [`render_heatmap`].
//!
//! Ingestion, payload decoding and presentation are left to the embedding
//! application.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod batch;
#[cfg(not(feature = "std"))]
mod float;
mod grid;
mod heatmap;
mod palette;
mod streams;
mod transform;
mod window;

pub use batch::{
    DrawBatch, DrawIndex, DrawList, PrimitiveRenderer, RectPrimitive, RectRenderer, RectSource,
    RenderStats, Vertex, pack_color, render_primitives,
};
pub use grid::{CellOrder, GridView};
pub use heatmap::{
    CellLabel, HeatmapCells, HeatmapOutcome, HeatmapSpec, LabelFormat, LabelFormatError,
    heatmap_labels, render_heatmap,
};
pub use palette::{ColorRamp, Palette, contrast_text_color};
pub use streams::StreamSet;
pub use transform::{
    Axis1d, AxisParams, AxisScale, LOG_EPSILON, LinearAxis, LogAxis, PlotTransform, ScaleMode,
    Transform2d, TransformLinLin, TransformLinLog, TransformLogLin, TransformLogLog,
    TransformVisitor, TransformXY, Viewport,
};
pub use window::{ExtremaPolicy, FeedOutcome, TimeWindowBuffer};
