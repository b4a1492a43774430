// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persisted dashboard settings.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ipip_core::{AxisScale, ColorRamp, LabelFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shortest window the dashboard keeps, in seconds.
pub const MIN_HISTORY: f32 = 1.0;
/// Longest window the dashboard keeps, in seconds.
pub const MAX_HISTORY: f32 = 120.0;

/// Why settings could not be loaded or saved.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the file failed.
    #[error("settings file {path:?}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying failure.
        source: io::Error,
    },
    /// The file is not valid settings JSON.
    #[error("settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dashboard-wide settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Window span in seconds.
    pub history: f32,
    /// Palette preset id used for heatmaps.
    pub colormap: u32,
    /// Pin every x axis to `[0, history]`.
    pub lock_x: bool,
    /// Per-figure overrides, keyed by figure name.
    pub figures: BTreeMap<String, FigureSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history: 5.0,
            colormap: 5,
            lock_x: true,
            figures: BTreeMap::new(),
        }
    }
}

/// Per-figure settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureSettings {
    /// Heatmap color-scale limits; `(0, 0)` auto-ranges.
    pub color_scale: (f64, f64),
    /// Logarithmic x axis.
    pub log_x: bool,
    /// Logarithmic y axis.
    pub log_y: bool,
    /// printf-style heatmap cell label format; `None` draws no labels.
    pub label_format: Option<String>,
}

impl FigureSettings {
    /// The x axis scale.
    pub fn x_scale(&self) -> AxisScale {
        if self.log_x {
            AxisScale::Log
        } else {
            AxisScale::Linear
        }
    }

    /// The y axis scale.
    pub fn y_scale(&self) -> AxisScale {
        if self.log_y {
            AxisScale::Log
        } else {
            AxisScale::Linear
        }
    }

    /// The parsed label format.
    ///
    /// An unparsable format is logged and treated as "no labels".
    pub fn label_format(&self) -> Option<LabelFormat> {
        let text = self.label_format.as_deref()?;
        LabelFormat::parse(text)
            .inspect_err(|err| log::warn!("ignoring label format {text:?}: {err}"))
            .ok()
    }
}

impl Settings {
    /// Brings every field into its valid range.
    ///
    /// `history` is clamped to [`MIN_HISTORY`]..=[`MAX_HISTORY`] (a NaN
    /// becomes the default) and `colormap` wraps around the preset count.
    pub fn sanitized(mut self) -> Self {
        self.history = if self.history.is_nan() {
            Self::default().history
        } else {
            self.history.clamp(MIN_HISTORY, MAX_HISTORY)
        };
        self.colormap %= ColorRamp::PRESET_COUNT;
        self
    }

    /// Window span in seconds.
    pub fn span(&self) -> f64 {
        f64::from(self.history)
    }

    /// The heatmap palette.
    pub fn palette(&self) -> ColorRamp {
        ColorRamp::preset(self.colormap)
    }

    /// Overrides for `figure`, or the defaults.
    pub fn figure(&self, figure: &str) -> FigureSettings {
        self.figures.get(figure).cloned().unwrap_or_default()
    }

    /// Reads settings from `path`.
    ///
    /// A missing file yields the defaults. The result is always sanitized.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!("no settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        };
        let settings: Self = serde_json::from_str(&text)?;
        Ok(settings.sanitized())
    }

    /// Writes settings to `path` as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text).map_err(|source| SettingsError::Io {
            path: path.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::process;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(format!("ipip-settings-{}-{name}.json", process::id()))
    }

    #[test]
    fn defaults_match_the_dashboard() {
        let s = Settings::default();
        assert_eq!((s.history, s.colormap, s.lock_x), (5.0, 5, true));
        assert_eq!(s.span(), 5.0);
        assert_eq!(s.palette(), ColorRamp::preset(5));
    }

    #[test]
    fn sanitize_clamps_and_wraps() {
        let s = Settings {
            history: 500.0,
            colormap: ColorRamp::PRESET_COUNT + 2,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!((s.history, s.colormap), (MAX_HISTORY, 2));

        let s = Settings {
            history: f32::NAN,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(s.history, 5.0);

        let s = Settings {
            history: 0.1,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(s.history, MIN_HISTORY);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let s: Settings =
            serde_json::from_str(r#"{"history": 30, "figures": {"fig2": {"log_y": true}}}"#)
                .unwrap();
        assert_eq!((s.history, s.colormap, s.lock_x), (30.0, 5, true));
        let fig2 = s.figure("fig2");
        assert_eq!((fig2.x_scale(), fig2.y_scale()), (AxisScale::Linear, AxisScale::Log));
        assert_eq!(s.figure("other"), FigureSettings::default());
    }

    #[test]
    fn bad_label_format_disables_labels() {
        let fig = FigureSettings {
            label_format: Some("%q".into()),
            ..FigureSettings::default()
        };
        assert_eq!(fig.label_format(), None);
        let fig = FigureSettings {
            label_format: Some("%.99999999999999999999f".into()),
            ..FigureSettings::default()
        };
        assert_eq!(fig.label_format(), None);
        let fig = FigureSettings {
            label_format: Some("%.2f".into()),
            ..FigureSettings::default()
        };
        assert_eq!(fig.label_format().map(|f| f.format(1.0)), Some("1.00".into()));
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("roundtrip");
        let mut s = Settings {
            history: 12.5,
            colormap: 3,
            lock_x: false,
            ..Settings::default()
        };
        s.figures.insert(
            "fig1".into(),
            FigureSettings {
                color_scale: (-1.0, 1.0),
                ..FigureSettings::default()
            },
        );
        s.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, s);
    }

    #[test]
    fn missing_file_gives_defaults_and_garbage_is_an_error() {
        let missing = temp_path("missing");
        assert_eq!(Settings::load(&missing).unwrap(), Settings::default());

        let garbage = temp_path("garbage");
        fs::write(&garbage, "history = 5").unwrap();
        let result = Settings::load(&garbage);
        let _ = fs::remove_file(&garbage);
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }
}
