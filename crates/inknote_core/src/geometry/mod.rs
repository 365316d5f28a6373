//! Pure stroke geometry: outline building and eraser hit-testing.
//!
//! # Responsibility
//! - Convert normalized pointer samples into renderable vector geometry.
//! - Decide which strokes a moving eraser circle intersects.
//!
//! # Invariants
//! - Every function here is a side-effect-free function of its inputs and
//!   may run off the canvas serialization path.
//! - Degenerate inputs (empty point lists, zero-length tangents) resolve to
//!   fallback values, never errors; drawing must not crash on malformed
//!   pointer streams.

pub mod eraser;
pub mod outline;

pub use eraser::{hit_test_point, hit_test_sweep, sweep_samples, SWEEP_STEP};
pub use outline::build_geometry;

use crate::model::stroke::PointerSample;
use kurbo::{BezPath, Point};

/// Drawing surface dimensions in pixels, used to denormalize unit-square
/// sample coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Maps a normalized sample into surface coordinates.
    pub fn denormalize(&self, sample: &PointerSample) -> Point {
        Point::new(sample.x * self.width, sample.y * self.height)
    }

    /// Maps a normalized point into surface coordinates.
    pub fn denormalize_point(&self, point: Point) -> Point {
        Point::new(point.x * self.width, point.y * self.height)
    }
}

/// Vector shape derived from one stroke, consumed directly by the rendering
/// collaborator together with the brush's paint description.
#[derive(Debug, Clone)]
pub enum RenderGeometry {
    /// Nothing to draw.
    Empty,
    /// Single-tap dot, drawn as a filled circle.
    Dot { center: Point, radius: f64 },
    /// Smoothed centerline for uniform-width tools; stroked at `width`.
    Centerline { path: BezPath, width: f64 },
    /// Filled pressure-varying outline (contours plus any end caps).
    Outline { path: BezPath },
}

impl RenderGeometry {
    /// Whether the caller has anything to render.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Dot { .. } => false,
            Self::Centerline { path, .. } | Self::Outline { path } => path.elements().is_empty(),
        }
    }
}
