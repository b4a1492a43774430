// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-stream sample storage over a recycling time window.
//!
//! Timestamps are wrapped modulo the window span. While wrapped timestamps
//! keep increasing, samples accumulate; the first wrapped timestamp smaller
//! than the last stored one starts a new epoch and clears the buffer.

extern crate alloc;

use alloc::vec::Vec;

use crate::grid::GridView;

/// Which samples feed the running extrema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtremaPolicy {
    /// Only width-1 (scalar) samples update the extrema.
    #[default]
    ScalarOnly,
    /// Every channel of every sample updates the extrema.
    AllChannels,
}

/// What a call to [`TimeWindowBuffer::feed`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedOutcome {
    /// The sample was appended to the current epoch.
    Appended,
    /// The wrapped timestamp went backwards: the buffer was cleared, then the
    /// sample was appended as the first of a new epoch.
    RolledOver,
    /// The sample carried no values and was ignored.
    Ignored,
}

/// Append-only sample store for one stream, reset on every rollover.
///
/// Values are stored sample-major (`values[i * width + j]` is channel `j` of
/// sample `i`). [`Self::as_grid`] transposes them into a reusable scratch
/// buffer for rasterization.
#[derive(Clone, Debug)]
pub struct TimeWindowBuffer {
    span: f64,
    ticks: Vec<f64>,
    values: Vec<f64>,
    width: usize,
    min: f64,
    max: f64,
    extrema_policy: ExtremaPolicy,
    scratch: Vec<f64>,
}

impl TimeWindowBuffer {
    /// Creates an empty buffer with the given window span.
    ///
    /// A non-positive or non-finite span falls back to one time unit.
    pub fn new(span: f64) -> Self {
        Self {
            span: sanitize_span(span).unwrap_or(1.0),
            ticks: Vec::new(),
            values: Vec::new(),
            width: 1,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            extrema_policy: ExtremaPolicy::default(),
            scratch: Vec::new(),
        }
    }

    /// Sets which samples update the running extrema.
    pub fn with_extrema_policy(mut self, policy: ExtremaPolicy) -> Self {
        self.extrema_policy = policy;
        self
    }

    /// Changes the window span; applies from the next [`Self::feed`].
    ///
    /// Invalid spans are ignored.
    pub fn set_span(&mut self, span: f64) {
        match sanitize_span(span) {
            Some(span) => self.span = span,
            None => log::warn!("ignoring invalid window span {span}"),
        }
    }

    /// Window span.
    pub fn span(&self) -> f64 {
        self.span
    }

    /// Appends one sample.
    pub fn feed(&mut self, timestamp: f64, values: &[f64]) -> FeedOutcome {
        if values.is_empty() {
            log::warn!("dropping sample at t={timestamp} with no values");
            return FeedOutcome::Ignored;
        }

        let wrapped = wrap(timestamp, self.span);
        let mut outcome = FeedOutcome::Appended;
        if let Some(&last) = self.ticks.last()
            && wrapped < last
        {
            log::debug!(
                "window rollover: wrapped t={wrapped} < {last}, dropping {} samples",
                self.ticks.len()
            );
            self.reset_epoch();
            outcome = FeedOutcome::RolledOver;
        }
        self.ticks.push(wrapped);

        if values.len() != self.width {
            log::debug!("stream width changed {} -> {}", self.width, values.len());
            self.width = values.len();
        }
        if self.width == 1 || self.extrema_policy == ExtremaPolicy::AllChannels {
            for &v in values {
                self.min = self.min.min(v);
                self.max = self.max.max(v);
            }
        }
        self.values.extend_from_slice(values);
        outcome
    }

    /// Drops every sample and resets the extrema; keeps width and span.
    pub fn clear(&mut self) {
        self.reset_epoch();
    }

    fn reset_epoch(&mut self) {
        self.ticks.clear();
        self.values.clear();
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    /// Whether no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Channel count of the most recent sample.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of whole samples when the values are read at the current width.
    pub fn rows(&self) -> usize {
        self.values.len() / self.width
    }

    /// Wrapped timestamps of the current epoch, in feed order.
    pub fn ticks(&self) -> &[f64] {
        &self.ticks
    }

    /// Raw values, sample-major.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Running minimum; `+inf` until a tracked sample arrives.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Running maximum; `-inf` until a tracked sample arrives.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// `(min, max)` once at least one tracked sample has arrived.
    pub fn extrema(&self) -> Option<(f64, f64)> {
        (self.min <= self.max).then_some((self.min, self.max))
    }

    /// First and last wrapped timestamp of the epoch.
    pub fn tick_range(&self) -> Option<(f64, f64)> {
        Some((*self.ticks.first()?, *self.ticks.last()?))
    }

    /// `(tick, value)` pairs for drawing a scalar stream as a line.
    ///
    /// Uses the first channel of each sample.
    pub fn polyline(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.ticks
            .iter()
            .copied()
            .zip(self.values.chunks_exact(self.width).map(|s| s[0]))
    }

    /// Channel-major matrix of the stored values: one row per channel, one
    /// column per sample.
    ///
    /// The transposed copy lives in a scratch buffer that only grows, so a
    /// steady stream does not reallocate per frame.
    pub fn as_grid(&mut self) -> GridView<'_> {
        let width = self.width;
        let samples = self.rows();
        let n = samples * width;
        if n > self.scratch.len() {
            self.scratch.resize(n, 0.0);
        }
        for (i, sample) in self.values.chunks_exact(width).take(samples).enumerate() {
            for (j, &v) in sample.iter().enumerate() {
                self.scratch[j * samples + i] = v;
            }
        }
        GridView::row_major(&self.scratch[..n], samples)
    }

    /// Current scratch capacity in cells.
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.len()
    }
}

fn sanitize_span(span: f64) -> Option<f64> {
    (span.is_finite() && span > 0.0).then_some(span)
}

/// Maps `timestamp` into `[0, span)`.
fn wrap(timestamp: f64, span: f64) -> f64 {
    let w = timestamp % span;
    let w = if w < 0.0 { w + span } else { w };
    // A tiny negative remainder plus `span` rounds up to `span`.
    if w >= span { 0.0 } else { w }
}
