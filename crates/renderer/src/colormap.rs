//! Named color ramps sampled into 256-entry lookup tables.

use heatmap_common::HeatmapError;
use std::fmt;
use std::str::FromStr;

/// Number of entries in a sampled lookup table.
pub const LUT_SIZE: usize = 256;

/// Linear segment anchors `(x, y)` for one channel, `x` ascending from 0 to 1.
type Segments = &'static [(f64, f64)];

const HOT_RED: Segments = &[(0.0, 0.0416), (0.365079, 1.0), (1.0, 1.0)];
const HOT_GREEN: Segments = &[(0.0, 0.0), (0.365079, 0.0), (0.746032, 1.0), (1.0, 1.0)];
const HOT_BLUE: Segments = &[(0.0, 0.0), (0.746032, 0.0), (1.0, 1.0)];

/// Supported colormaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Colormap {
    /// Black, red, yellow, white.
    #[default]
    Hot,
    /// Like `Hot` with evenly spaced channel ramps.
    AfmHot,
    GistHeat,
    Gray,
}

impl Colormap {
    pub const ALL: [Colormap; 4] = [
        Colormap::Hot,
        Colormap::AfmHot,
        Colormap::GistHeat,
        Colormap::Gray,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Colormap::Hot => "hot",
            Colormap::AfmHot => "afmhot",
            Colormap::GistHeat => "gist_heat",
            Colormap::Gray => "gray",
        }
    }

    /// Evaluate the continuous ramp at `x` in `[0, 1]`.
    pub fn eval(&self, x: f64) -> [f64; 3] {
        let x = x.clamp(0.0, 1.0);
        match self {
            Colormap::Hot => [
                interpolate(HOT_RED, x),
                interpolate(HOT_GREEN, x),
                interpolate(HOT_BLUE, x),
            ],
            Colormap::AfmHot => [
                (2.0 * x).clamp(0.0, 1.0),
                (2.0 * x - 0.5).clamp(0.0, 1.0),
                (2.0 * x - 1.0).clamp(0.0, 1.0),
            ],
            Colormap::GistHeat => [
                (1.5 * x).clamp(0.0, 1.0),
                (2.0 * x - 1.0).clamp(0.0, 1.0),
                (4.0 * x - 3.0).clamp(0.0, 1.0),
            ],
            Colormap::Gray => [x, x, x],
        }
    }

    /// Sample the ramp into a lookup table.
    pub fn lut(&self) -> ColorLut {
        let mut entries = [[0.0; 3]; LUT_SIZE];
        for (i, entry) in entries.iter_mut().enumerate() {
            *entry = self.eval(i as f64 / (LUT_SIZE - 1) as f64);
        }
        ColorLut { entries }
    }

    /// Map a normalized value through the sampled table.
    pub fn map(&self, value: f64) -> [f64; 3] {
        self.lut().map(value)
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Colormap {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Colormap::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| HeatmapError::UnknownColormap(s.to_string()))
    }
}

/// A colormap sampled at [`LUT_SIZE`] evenly spaced points.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLut {
    entries: [[f64; 3]; LUT_SIZE],
}

impl ColorLut {
    /// Look up `value` (expected in `[0, 1]`). Values outside are clamped,
    /// NaN maps to the first entry.
    #[inline]
    pub fn map(&self, value: f64) -> [f64; 3] {
        let idx = if value.is_nan() || value <= 0.0 {
            0
        } else {
            ((value * LUT_SIZE as f64) as usize).min(LUT_SIZE - 1)
        };
        self.entries[idx]
    }

    /// Color assigned to zero density.
    pub fn background(&self) -> [f64; 3] {
        self.entries[0]
    }

    pub fn entries(&self) -> &[[f64; 3]] {
        &self.entries
    }
}

/// Piecewise-linear interpolation between segment anchors.
fn interpolate(segments: Segments, x: f64) -> f64 {
    for pair in segments.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x <= x1 {
            if x1 == x0 {
                return y1;
            }
            return y0 + (x - x0) / (x1 - x0) * (y1 - y0);
        }
    }
    segments.last().map(|&(_, y)| y).unwrap_or(0.0)
}
