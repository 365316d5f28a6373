//! Pointer samples and finalized strokes.
//!
//! # Responsibility
//! - Define the immutable sample/stroke records produced by gesture capture.
//! - Cache derived data (bounds, render geometry) per finalized stroke.
//!
//! # Invariants
//! - Sample coordinates and pressure are normalized to `[0, 1]`.
//! - A finalized stroke never changes its points or brush; only its id may
//!   be patched after remote confirmation, which leaves derived caches valid.
//! - Persisted strokes must have a non-empty point list.

use crate::geometry::{build_geometry, RenderGeometry, Surface};
use crate::model::brush::BrushConfig;
use kurbo::Rect;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for one finalized stroke.
pub type StrokeId = Uuid;

/// Stable identifier for the canvas that owns a stroke.
pub type CanvasId = Uuid;

/// One normalized pointer/pen sample.
///
/// Produced one-per-input-event by the input collaborator; coordinates are
/// relative to the drawing surface's unit square so geometry stays
/// resolution-independent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub pressure: f64,
}

impl PointerSample {
    /// Creates a sample, clamping all fields into `[0, 1]`.
    ///
    /// Non-finite inputs collapse to `0.0`; malformed pointer streams must
    /// never be able to poison downstream geometry.
    pub fn new(x: f64, y: f64, pressure: f64) -> Self {
        Self {
            x: clamp_unit(x),
            y: clamp_unit(y),
            pressure: clamp_unit(pressure),
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// One finalized freehand mark from a single continuous gesture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub id: StrokeId,
    pub canvas_id: CanvasId,
    pub points: Vec<PointerSample>,
    pub brush: BrushConfig,
    #[serde(skip)]
    bounds: OnceCell<Rect>,
    #[serde(skip)]
    geometry: OnceCell<(Surface, RenderGeometry)>,
}

impl Stroke {
    /// Creates a stroke with a generated id.
    pub fn new(canvas_id: CanvasId, points: Vec<PointerSample>, brush: BrushConfig) -> Self {
        Self::with_id(Uuid::new_v4(), canvas_id, points, brush)
    }

    /// Creates a stroke with a caller-provided id.
    ///
    /// Used by load/confirmation paths where identity already exists
    /// externally.
    pub fn with_id(
        id: StrokeId,
        canvas_id: CanvasId,
        points: Vec<PointerSample>,
        brush: BrushConfig,
    ) -> Self {
        Self {
            id,
            canvas_id,
            points,
            brush,
            bounds: OnceCell::new(),
            geometry: OnceCell::new(),
        }
    }

    /// Replaces the temporary id with a remotely confirmed one.
    ///
    /// Points, brush, and derived caches are untouched; the stroke is
    /// otherwise immutable after finalization.
    pub fn patch_id(&mut self, confirmed: StrokeId) {
        self.id = confirmed;
    }

    /// Axis-aligned bounds of the sample points in normalized space.
    ///
    /// Computed once and cached; `Rect::ZERO` for an empty point list.
    pub fn bounds(&self) -> Rect {
        *self.bounds.get_or_init(|| {
            let mut points = self.points.iter();
            let Some(first) = points.next() else {
                return Rect::ZERO;
            };
            let mut rect = Rect::new(first.x, first.y, first.x, first.y);
            for point in points {
                rect.x0 = rect.x0.min(point.x);
                rect.y0 = rect.y0.min(point.y);
                rect.x1 = rect.x1.max(point.x);
                rect.y1 = rect.y1.max(point.y);
            }
            rect
        })
    }

    /// Render geometry for this stroke on the given surface.
    ///
    /// The geometry is a pure function of `(points, brush, surface)` and is
    /// cached for the first surface it is computed against; rendering at a
    /// different surface size recomputes without disturbing the cache.
    pub fn geometry(&self, surface: Surface) -> RenderGeometry {
        let (cached_surface, geometry) = self
            .geometry
            .get_or_init(|| (surface, build_geometry(&self.points, &self.brush, surface)));
        if *cached_surface == surface {
            geometry.clone()
        } else {
            build_geometry(&self.points, &self.brush, surface)
        }
    }
}
