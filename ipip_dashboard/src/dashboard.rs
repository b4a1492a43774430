// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dashboard context: figures, settings and the per-frame entry points.

use std::collections::BTreeMap;

use ipip_core::{ColorRamp, FeedOutcome};
use ipip_text::{HeuristicTextMeasurer, TextMeasurer};
use kurbo::Rect;
use serde_json::Value;

use crate::figure::{Figure, FrameOutput};
use crate::ingest::Consumer;
use crate::sample::{Sample, decode_payload};
use crate::settings::Settings;

/// All figures of a dashboard and the settings they are drawn with.
///
/// Figures are created on first sample and listed by name.
#[derive(Debug)]
pub struct Dashboard<M = HeuristicTextMeasurer> {
    settings: Settings,
    palette: ColorRamp,
    figures: BTreeMap<String, Figure>,
    measurer: M,
}

impl Dashboard {
    /// Creates an empty dashboard measuring labels heuristically.
    pub fn new(settings: Settings) -> Self {
        Self::with_measurer(settings, HeuristicTextMeasurer)
    }
}

impl<M: TextMeasurer> Dashboard<M> {
    /// Creates an empty dashboard with a custom label measurer.
    pub fn with_measurer(settings: Settings, measurer: M) -> Self {
        let settings = settings.sanitized();
        log::info!(
            "dashboard up: {}s history, palette {}",
            settings.history,
            ColorRamp::preset_name(settings.colormap)
        );
        Self {
            palette: settings.palette(),
            settings,
            figures: BTreeMap::new(),
            measurer,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces the settings and pushes them to every figure.
    pub fn update_settings(&mut self, settings: Settings) {
        let settings = settings.sanitized();
        if settings.history != self.settings.history {
            log::debug!("history now {}s", settings.history);
        }
        self.palette = settings.palette();
        self.settings = settings;
        for figure in self.figures.values_mut() {
            configure(figure, &self.settings);
        }
    }

    /// Figures in name order.
    pub fn figures(&self) -> impl Iterator<Item = &Figure> {
        self.figures.values()
    }

    /// Looks up a figure.
    pub fn figure(&self, name: &str) -> Option<&Figure> {
        self.figures.get(name)
    }

    /// Looks up a figure mutably.
    pub fn figure_mut(&mut self, name: &str) -> Option<&mut Figure> {
        self.figures.get_mut(name)
    }

    /// Stores one sample, creating its figure if needed.
    pub fn apply(&mut self, sample: &Sample) -> FeedOutcome {
        let figure = match self.figures.get_mut(&sample.figure) {
            Some(figure) => figure,
            None => {
                log::debug!("new figure {:?}", sample.figure);
                let mut figure = Figure::new(sample.figure.clone(), self.settings.span());
                configure(&mut figure, &self.settings);
                self.figures.entry(sample.figure.clone()).or_insert(figure)
            }
        };
        figure.feed(sample)
    }

    /// Decodes and stores one payload, returning how many samples it held.
    ///
    /// Malformed streams are logged and skipped.
    pub fn ingest(&mut self, payload: &Value) -> usize {
        let decoded = decode_payload(payload);
        for err in &decoded.errors {
            log::warn!("{err}");
        }
        for sample in &decoded.samples {
            self.apply(sample);
        }
        decoded.samples.len()
    }

    /// Stores every payload queued on `consumer`.
    pub fn drain(&mut self, consumer: &Consumer) -> usize {
        consumer
            .drain()
            .iter()
            .map(|payload| self.ingest(payload))
            .sum()
    }

    /// Draws one figure into `plot_rect`.
    pub fn render(&mut self, figure: &str, plot_rect: Rect) -> Option<FrameOutput> {
        let x_lock = self.settings.lock_x.then(|| self.settings.span());
        let figure = self.figures.get_mut(figure)?;
        let viewport = figure.viewport(plot_rect, x_lock);
        Some(figure.render(viewport, &self.palette, &self.measurer))
    }

    /// Runs one frame: drains `consumer`, then draws every figure into
    /// `plot_rect`, in name order.
    pub fn frame(&mut self, consumer: &Consumer, plot_rect: Rect) -> Vec<FrameOutput> {
        let ingested = self.drain(consumer);
        if ingested > 0 {
            log::trace!("frame: {ingested} samples");
        }
        let x_lock = self.settings.lock_x.then(|| self.settings.span());
        let (palette, measurer) = (&self.palette, &self.measurer);
        self.figures
            .values_mut()
            .map(|figure| {
                let viewport = figure.viewport(plot_rect, x_lock);
                figure.render(viewport, palette, measurer)
            })
            .collect()
    }
}

fn configure(figure: &mut Figure, settings: &Settings) {
    let overrides = settings.figure(figure.name());
    figure.set_span(settings.span());
    figure.color_scale = overrides.color_scale;
    figure.x_scale = overrides.x_scale();
    figure.y_scale = overrides.y_scale();
    figure.label_format = overrides.label_format();
}
