//! Brush configuration and tool size presets.
//!
//! # Responsibility
//! - Define the tool taxonomy shared by geometry building and persistence.
//! - Resolve size-preset indices to concrete width profiles.
//!
//! # Invariants
//! - Preset tables are static; a preset index always resolves (out-of-range
//!   indices clamp to the largest preset instead of failing).
//! - `WidthProfile` widths are surface pixels; eraser radii are normalized
//!   to the drawing surface's unit square.

use serde::{Deserialize, Serialize};

/// Number of size presets per tool.
pub const SIZE_PRESET_COUNT: usize = 6;

/// Drawing tool selected by the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Pressure-sensitive ink pen.
    Pen,
    /// Uniform-width pencil.
    Pencil,
    /// Pressure-sensitive translucent marker.
    Highlighter,
    /// Stroke eraser.
    Eraser,
    /// Laser-pointer style transient marker.
    Pointer,
    /// Text insertion tool; produces no stroke geometry of its own.
    Text,
}

impl ToolKind {
    /// Tools whose stroke width varies with pen pressure.
    pub fn is_pressure_sensitive(self) -> bool {
        matches!(self, Self::Pen | Self::Highlighter)
    }

    /// Tools whose open strokes get rounded end caps.
    ///
    /// The highlighter deliberately omits caps so overlapping ink does not
    /// show a darker rounded tip at the stroke extremities.
    pub fn has_end_caps(self) -> bool {
        !matches!(self, Self::Highlighter)
    }
}

/// Straight 8-bit RGBA color, stored as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Width triple for pressure-sensitive tools, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WidthProfile {
    /// Nominal width used by uniform rendering and dot sizing.
    pub base: f64,
    /// Width at zero pressure.
    pub min_width: f64,
    /// Width at full pressure.
    pub max_width: f64,
}

impl WidthProfile {
    const fn new(base: f64, min_width: f64, max_width: f64) -> Self {
        Self {
            base,
            min_width,
            max_width,
        }
    }

    /// Width at a given pressure value in `[0, 1]`.
    pub fn width_at(&self, pressure: f64) -> f64 {
        self.min_width + pressure.clamp(0.0, 1.0) * (self.max_width - self.min_width)
    }
}

const PEN_PRESETS: [WidthProfile; SIZE_PRESET_COUNT] = [
    WidthProfile::new(1.5, 0.75, 2.25),
    WidthProfile::new(2.5, 1.25, 3.75),
    WidthProfile::new(4.0, 2.0, 6.0),
    WidthProfile::new(6.0, 3.0, 9.0),
    WidthProfile::new(9.0, 4.5, 13.5),
    WidthProfile::new(13.0, 6.5, 19.5),
];

const PENCIL_PRESETS: [WidthProfile; SIZE_PRESET_COUNT] = [
    WidthProfile::new(1.0, 1.0, 1.0),
    WidthProfile::new(2.0, 2.0, 2.0),
    WidthProfile::new(3.0, 3.0, 3.0),
    WidthProfile::new(5.0, 5.0, 5.0),
    WidthProfile::new(8.0, 8.0, 8.0),
    WidthProfile::new(12.0, 12.0, 12.0),
];

const HIGHLIGHTER_PRESETS: [WidthProfile; SIZE_PRESET_COUNT] = [
    WidthProfile::new(8.0, 6.0, 10.0),
    WidthProfile::new(12.0, 9.0, 15.0),
    WidthProfile::new(16.0, 12.0, 20.0),
    WidthProfile::new(22.0, 16.5, 27.5),
    WidthProfile::new(30.0, 22.5, 37.5),
    WidthProfile::new(40.0, 30.0, 50.0),
];

// Pointer and text markers reuse the thin uniform profile.
const MARKER_PRESETS: [WidthProfile; SIZE_PRESET_COUNT] = PENCIL_PRESETS;

/// Eraser radii, normalized to the unit square.
const ERASER_RADII: [f64; SIZE_PRESET_COUNT] = [0.01, 0.02, 0.03, 0.05, 0.08, 0.12];

/// Active brush settings captured at gesture start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrushConfig {
    pub tool: ToolKind,
    pub color: Rgba,
    /// Index into the per-tool preset tables, `0..SIZE_PRESET_COUNT`.
    pub size_preset: usize,
    /// Paint opacity in `[0, 1]`.
    pub opacity: f64,
}

impl BrushConfig {
    pub fn new(tool: ToolKind, color: Rgba, size_preset: usize, opacity: f64) -> Self {
        Self {
            tool,
            color,
            size_preset,
            opacity: opacity.clamp(0.0, 1.0),
        }
    }

    /// Resolves the width profile for this brush's tool and preset.
    pub fn width_profile(&self) -> WidthProfile {
        let index = self.size_preset.min(SIZE_PRESET_COUNT - 1);
        let table = match self.tool {
            ToolKind::Pen => &PEN_PRESETS,
            ToolKind::Pencil => &PENCIL_PRESETS,
            ToolKind::Highlighter => &HIGHLIGHTER_PRESETS,
            ToolKind::Eraser | ToolKind::Pointer | ToolKind::Text => &MARKER_PRESETS,
        };
        table[index]
    }

    /// Resolves the eraser radius (normalized units) for this preset.
    pub fn eraser_radius(&self) -> f64 {
        ERASER_RADII[self.size_preset.min(SIZE_PRESET_COUNT - 1)]
    }
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self::new(ToolKind::Pen, Rgba::BLACK, 2, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{BrushConfig, Rgba, ToolKind, SIZE_PRESET_COUNT};

    #[test]
    fn width_profile_interpolates_pressure() {
        let brush = BrushConfig::new(ToolKind::Pen, Rgba::BLACK, 2, 1.0);
        let profile = brush.width_profile();
        assert!((profile.width_at(0.0) - profile.min_width).abs() < f64::EPSILON);
        assert!((profile.width_at(1.0) - profile.max_width).abs() < f64::EPSILON);
        let mid = profile.width_at(0.5);
        assert!(mid > profile.min_width && mid < profile.max_width);
    }

    #[test]
    fn out_of_range_preset_clamps_to_largest() {
        let brush = BrushConfig::new(ToolKind::Pencil, Rgba::BLACK, 99, 1.0);
        let clamped = BrushConfig::new(ToolKind::Pencil, Rgba::BLACK, SIZE_PRESET_COUNT - 1, 1.0);
        assert_eq!(brush.width_profile(), clamped.width_profile());
        assert!((brush.eraser_radius() - clamped.eraser_radius()).abs() < f64::EPSILON);
    }

    #[test]
    fn pencil_presets_are_uniform_width() {
        let brush = BrushConfig::new(ToolKind::Pencil, Rgba::BLACK, 3, 1.0);
        let profile = brush.width_profile();
        assert!((profile.min_width - profile.max_width).abs() < f64::EPSILON);
        assert!(!ToolKind::Pencil.is_pressure_sensitive());
    }

    #[test]
    fn highlighter_omits_end_caps() {
        assert!(!ToolKind::Highlighter.has_end_caps());
        assert!(ToolKind::Pen.has_end_caps());
    }

    #[test]
    fn opacity_is_clamped_on_construction() {
        let brush = BrushConfig::new(ToolKind::Pen, Rgba::BLACK, 0, 3.0);
        assert!((brush.opacity - 1.0).abs() < f64::EPSILON);
    }
}
