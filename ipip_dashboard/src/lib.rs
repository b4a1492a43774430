// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `ipip_dashboard`: the application layer of a live stream dashboard.
//!
//! Samples arrive as JSON payloads on any thread and are handed to the frame
//! loop through an [`ingest_channel`]. Each frame, [`Dashboard::frame`]
//! decodes what was queued, feeds it into per-figure stream buffers, and
//! draws every [`Figure`] into a [`FrameOutput`]: heatmap triangles,
//! polylines and cell labels in render space, ready for any backend.
//!
//! ```
//! use ipip_dashboard::{Dashboard, Settings, ingest_channel};
//! use kurbo::Rect;
//!
//! let (producer, consumer) = ingest_channel();
//! producer
//!     .push_body(r#"{"time": 0.5, "fig": {"sin": 0.48, "heat": [0.1, 0.9]}}"#)
//!     .unwrap();
//!
//! let mut dashboard = Dashboard::new(Settings::default());
//! let frames = dashboard.frame(&consumer, Rect::new(0.0, 0.0, 640.0, 360.0));
//! assert_eq!(frames.len(), 1);
//! assert_eq!(frames[0].lines.len(), 1);
//! ```

mod dashboard;
mod figure;
mod ingest;
mod sample;
mod settings;

pub use dashboard::Dashboard;
pub use figure::{Figure, FrameOutput, StreamLine};
pub use ingest::{Consumer, IngestError, Producer, ingest_channel};
pub use sample::{DecodeError, DecodedPayload, Sample, decode_payload, decode_str};
pub use settings::{FigureSettings, MAX_HISTORY, MIN_HISTORY, Settings, SettingsError};
