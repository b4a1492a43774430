// Copyright 2025 the ipip Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Palette sampling: normalized value in, color out.
//!
//! Building palette textures is a renderer concern; the rasterizer only needs
//! [`Palette::sample`]. [`ColorRamp`] is a piecewise-linear implementation
//! with a set of built-in presets addressed by a numeric id, which is what
//! the dashboard settings persist.

use peniko::Color;
use peniko::color::palette::css;
use smallvec::SmallVec;

/// Looks up a color for a normalized value.
pub trait Palette {
    /// Samples the palette at `t`; values outside `[0, 1]` are clamped.
    fn sample(&self, t: f64) -> Color;
}

impl<P: Palette + ?Sized> Palette for &P {
    fn sample(&self, t: f64) -> Color {
        (**self).sample(t)
    }
}

/// Evenly spaced color stops, linearly interpolated in sRGB.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRamp {
    stops: SmallVec<[Color; 12]>,
}

const PRESETS: &[(&str, &[u32])] = &[
    (
        "Default",
        &[
            0x1F77B4, 0xFF7F0E, 0x2CA02C, 0xD62728, 0x9467BD, 0x8C564B, 0xE377C2, 0x7F7F7F,
            0xBCBD22, 0x17BECF,
        ],
    ),
    (
        "Deep",
        &[
            0x4C72B0, 0xDD8452, 0x55A868, 0xC44E52, 0x8172B3, 0x937860, 0xDA8BC3, 0x8C8C8C,
            0xCCB974, 0x64B5CD,
        ],
    ),
    (
        "Dark",
        &[
            0xE41A1C, 0x377EB8, 0x4DAF4A, 0x984EA3, 0xFF7F00, 0xFFFF33, 0xA65628, 0xF781BF,
            0x999999,
        ],
    ),
    (
        "Pastel",
        &[
            0x66C2A5, 0xFC8D62, 0x8DA0CB, 0xE78AC3, 0xA6D854, 0xFFD92F, 0xE5C494, 0xB3B3B3,
        ],
    ),
    (
        "Paired",
        &[
            0xA6CEE3, 0x1F78B4, 0xB2DF8A, 0x33A02C, 0xFB9A99, 0xE31A1C, 0xFDBF6F, 0xFF7F00,
            0xCAB2D6, 0x6A3D9A, 0xFFFF99, 0xB15928,
        ],
    ),
    (
        "Viridis",
        &[
            0x440154, 0x482878, 0x3E4A89, 0x31688E, 0x26828E, 0x1F9E89, 0x35B779, 0x6ECE58,
            0xB5DE2B, 0xFDE725,
        ],
    ),
    (
        "Plasma",
        &[
            0x0D0887, 0x4B03A1, 0x7D03A8, 0xA82296, 0xCB4679, 0xE56B5D, 0xF89441, 0xFDC328,
            0xF0F921,
        ],
    ),
    (
        "Hot",
        &[
            0x000000, 0x4D0000, 0x990000, 0xE60000, 0xFF3300, 0xFF8000, 0xFFCC00, 0xFFFF33,
            0xFFFFFF,
        ],
    ),
    ("Cool", &[0x00FFFF, 0x40BFFF, 0x8080FF, 0xBF40FF, 0xFF00FF]),
    (
        "Pink",
        &[0x1E0000, 0x7E5353, 0xB78D8D, 0xD2C59E, 0xE8E8C5, 0xFFFFFF],
    ),
    (
        "Jet",
        &[
            0x00007F, 0x0000FF, 0x007FFF, 0x00FFFF, 0x7FFF7F, 0xFFFF00, 0xFF7F00, 0xFF0000,
            0x7F0000,
        ],
    ),
    ("Greys", &[0x000000, 0xFFFFFF]),
];

impl ColorRamp {
    /// Number of built-in presets.
    #[allow(clippy::cast_possible_truncation, reason = "a dozen presets")]
    pub const PRESET_COUNT: u32 = PRESETS.len() as u32;

    /// Creates a ramp from explicit stops.
    ///
    /// An empty slice yields a ramp that always samples opaque black.
    pub fn new(stops: &[Color]) -> Self {
        let mut stops: SmallVec<[Color; 12]> = stops.iter().copied().collect();
        if stops.is_empty() {
            stops.push(css::BLACK);
        }
        Self { stops }
    }

    /// Returns a built-in preset; `id` wraps around [`Self::PRESET_COUNT`].
    pub fn preset(id: u32) -> Self {
        let (_, hex) = PRESETS[(id % Self::PRESET_COUNT) as usize];
        Self {
            stops: hex.iter().map(|&rgb| color_from_hex(rgb)).collect(),
        }
    }

    /// Returns the display name of a preset; `id` wraps like [`Self::preset`].
    pub fn preset_name(id: u32) -> &'static str {
        PRESETS[(id % Self::PRESET_COUNT) as usize].0
    }

    /// Returns the color stops.
    pub fn stops(&self) -> &[Color] {
        &self.stops
    }
}

impl Palette for ColorRamp {
    fn sample(&self, t: f64) -> Color {
        let last = self.stops.len() - 1;
        // NaN falls through both comparisons and samples the first stop.
        let t = if t >= 1.0 {
            1.0
        } else if t > 0.0 {
            t
        } else {
            0.0
        };
        let pos = t * last as f64;
        #[allow(
            clippy::cast_possible_truncation,
            reason = "pos is within [0, last], truncation is the floor"
        )]
        let i = (pos as usize).min(last);
        if i == last {
            return self.stops[last];
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "interpolation weight in [0, 1) fits f32"
        )]
        let frac = (pos - i as f64) as f32;
        let a = self.stops[i].components;
        let b = self.stops[i + 1].components;
        Color::new([
            a[0] + (b[0] - a[0]) * frac,
            a[1] + (b[1] - a[1]) * frac,
            a[2] + (b[2] - a[2]) * frac,
            a[3] + (b[3] - a[3]) * frac,
        ])
    }
}

/// Picks black or white text for legibility over `background`.
///
/// Uses Rec. 601 luma with a 0.5 threshold.
pub fn contrast_text_color(background: Color) -> Color {
    let [r, g, b, _] = background.components;
    let luma = 0.299 * r + 0.587 * g + 0.114 * b;
    if luma > 0.5 { css::BLACK } else { css::WHITE }
}

fn color_from_hex(rgb: u32) -> Color {
    let [_, r, g, b] = rgb.to_be_bytes();
    Color::from_rgba8(r, g, b, 255)
}
