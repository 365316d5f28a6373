//! Stroke path builder.
//!
//! # Responsibility
//! - Turn an ordered pressure-sample sequence into render geometry: a
//!   quad-smoothed centerline for uniform-width tools, or a pressure-varying
//!   polygon outline for pressure-sensitive tools.
//! - Detect closed shapes and emit end caps for open strokes.
//!
//! # Invariants
//! - Deterministic: identical `(points, brush, surface)` inputs always yield
//!   identical geometry.
//! - A non-empty point list always yields non-empty geometry.

use super::{RenderGeometry, Surface};
use crate::model::brush::BrushConfig;
use crate::model::stroke::PointerSample;
use kurbo::{BezPath, Circle, Point, Shape as _, Vec2};

/// First/last points closer than this fraction of the surface width mark a
/// stroke as a closed shape.
const CLOSED_SHAPE_FRACTION: f64 = 0.01;

/// Tangents shorter than this (surface pixels) are treated as degenerate.
const DEGENERATE_TANGENT_EPSILON: f64 = 1e-9;

/// Flattening tolerance for circular end caps.
const CAP_TOLERANCE: f64 = 0.1;

/// Builds render geometry for one stroke.
///
/// - Empty input yields `RenderGeometry::Empty` (caller must not render).
/// - A single sample yields the tap/dot case.
/// - Two or more samples yield a centerline or a pressure outline depending
///   on the brush's tool.
pub fn build_geometry(
    points: &[PointerSample],
    brush: &BrushConfig,
    surface: Surface,
) -> RenderGeometry {
    if points.is_empty() {
        return RenderGeometry::Empty;
    }

    let denormalized: Vec<Point> = points.iter().map(|p| surface.denormalize(p)).collect();
    let profile = brush.width_profile();

    if let [center] = denormalized.as_slice() {
        let radius = if brush.tool.is_pressure_sensitive() {
            profile.width_at(points[0].pressure) / 2.0
        } else {
            profile.base / 4.0
        };
        return RenderGeometry::Dot {
            center: *center,
            radius,
        };
    }

    let closed = is_closed(&denormalized, surface.width);
    if brush.tool.is_pressure_sensitive() {
        pressure_outline(points, &denormalized, brush, closed)
    } else {
        centerline(&denormalized, profile.base, closed)
    }
}

/// A stroke is closed when it has at least three points and its endpoints
/// nearly coincide relative to the surface width.
fn is_closed(points: &[Point], surface_width: f64) -> bool {
    if points.len() < 3 {
        return false;
    }
    let first = points[0];
    let last = points[points.len() - 1];
    first.distance(last) < CLOSED_SHAPE_FRACTION * surface_width
}

/// Quadratic-Bezier midpoint smoothing: anchors land on consecutive-pair
/// midpoints with the sample itself as control, so the curve stays smooth
/// through noisy input.
fn centerline(points: &[Point], width: f64, closed: bool) -> RenderGeometry {
    let mut path = BezPath::new();
    let last = points[points.len() - 1];

    if closed {
        // The subpath anchors on pair midpoints throughout, so it must
        // start on one too: two extra quads carry the curve around the
        // endpoints back to the start anchor, and close_path joins two
        // coincident points instead of cutting a straight chord.
        let start = points[0].midpoint(points[1]);
        path.move_to(start);
        for i in 1..points.len() - 1 {
            path.quad_to(points[i], points[i].midpoint(points[i + 1]));
        }
        path.quad_to(last, last.midpoint(points[0]));
        path.quad_to(points[0], start);
        path.close_path();
    } else {
        path.move_to(points[0]);
        for i in 1..points.len() - 1 {
            path.quad_to(points[i], points[i].midpoint(points[i + 1]));
        }
        path.line_to(last);
    }

    RenderGeometry::Centerline { path, width }
}

/// Pressure-varying outline: offsets each point along its local normal by
/// half the pressure width, producing parallel left/right vertex chains.
fn pressure_outline(
    samples: &[PointerSample],
    points: &[Point],
    brush: &BrushConfig,
    closed: bool,
) -> RenderGeometry {
    let profile = brush.width_profile();
    let count = points.len();

    let mut widths: Vec<f64> = samples
        .iter()
        .map(|sample| profile.width_at(sample.pressure))
        .collect();
    // The first sample usually lands before the stylus reports real
    // pressure; inheriting the second width avoids a pinched stroke start.
    widths[0] = widths[1];

    let mut left = Vec::with_capacity(count);
    let mut right = Vec::with_capacity(count);
    for i in 0..count {
        let tangent = tangent_at(points, i);
        let normal = Vec2::new(-tangent.y, tangent.x);
        let offset = normal * (widths[i] / 2.0);
        left.push(points[i] + offset);
        right.push(points[i] - offset);
    }

    let mut path = BezPath::new();
    if closed {
        // Two closed contours give the shape a ring-like outline instead of
        // one sealed blob.
        append_contour(&mut path, left.iter().copied());
        append_contour(&mut path, right.iter().rev().copied());
    } else {
        path.move_to(left[0]);
        for point in &left[1..] {
            path.line_to(*point);
        }
        for point in right.iter().rev() {
            path.line_to(*point);
        }
        path.close_path();

        if brush.tool.has_end_caps() {
            append_cap(&mut path, points[0], widths[0] / 2.0);
            append_cap(&mut path, points[count - 1], widths[count - 1] / 2.0);
        }
    }

    RenderGeometry::Outline { path }
}

/// Local tangent via forward difference at the start, centered difference in
/// the interior, and backward difference at the end. Zero-length tangents
/// (duplicate consecutive samples) fall back to a unit default.
fn tangent_at(points: &[Point], index: usize) -> Vec2 {
    let count = points.len();
    let raw = if index == 0 {
        points[1] - points[0]
    } else if index == count - 1 {
        points[count - 1] - points[count - 2]
    } else {
        points[index + 1] - points[index - 1]
    };

    let length = raw.hypot();
    if length < DEGENERATE_TANGENT_EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        raw / length
    }
}

fn append_contour(path: &mut BezPath, mut points: impl Iterator<Item = Point>) {
    let Some(first) = points.next() else {
        return;
    };
    path.move_to(first);
    for point in points {
        path.line_to(point);
    }
    path.close_path();
}

fn append_cap(path: &mut BezPath, center: Point, radius: f64) {
    for element in Circle::new(center, radius).to_path(CAP_TOLERANCE).elements() {
        path.push(*element);
    }
}

#[cfg(test)]
mod tests {
    use super::build_geometry;
    use crate::geometry::{RenderGeometry, Surface};
    use crate::model::brush::{BrushConfig, Rgba, ToolKind};
    use crate::model::stroke::PointerSample;
    use kurbo::PathEl;

    const SURFACE: Surface = Surface {
        width: 1000.0,
        height: 800.0,
    };

    fn pen() -> BrushConfig {
        BrushConfig::new(ToolKind::Pen, Rgba::BLACK, 2, 1.0)
    }

    fn pencil() -> BrushConfig {
        BrushConfig::new(ToolKind::Pencil, Rgba::BLACK, 2, 1.0)
    }

    fn samples(coords: &[(f64, f64)]) -> Vec<PointerSample> {
        coords
            .iter()
            .map(|&(x, y)| PointerSample::new(x, y, 0.5))
            .collect()
    }

    fn subpath_count(path: &kurbo::BezPath) -> usize {
        path.elements()
            .iter()
            .filter(|el| matches!(el, PathEl::MoveTo(_)))
            .count()
    }

    #[test]
    fn empty_input_yields_empty_geometry() {
        assert!(build_geometry(&[], &pen(), SURFACE).is_empty());
    }

    #[test]
    fn single_point_yields_dot_at_denormalized_position() {
        let geometry = build_geometry(&[PointerSample::new(0.5, 0.25, 1.0)], &pen(), SURFACE);
        match geometry {
            RenderGeometry::Dot { center, radius } => {
                assert!((center.x - 500.0).abs() < 1e-9);
                assert!((center.y - 200.0).abs() < 1e-9);
                // Full pressure pen dot: max width / 2.
                let profile = pen().width_profile();
                assert!((radius - profile.max_width / 2.0).abs() < 1e-9);
            }
            other => panic!("expected dot, got {other:?}"),
        }
    }

    #[test]
    fn uniform_dot_radius_is_quarter_base_width() {
        let geometry = build_geometry(&[PointerSample::new(0.5, 0.5, 1.0)], &pencil(), SURFACE);
        match geometry {
            RenderGeometry::Dot { radius, .. } => {
                assert!((radius - pencil().width_profile().base / 4.0).abs() < 1e-9);
            }
            other => panic!("expected dot, got {other:?}"),
        }
    }

    #[test]
    fn two_points_build_open_geometry() {
        let points = samples(&[(0.1, 0.1), (0.4, 0.4)]);
        match build_geometry(&points, &pencil(), SURFACE) {
            RenderGeometry::Centerline { path, width } => {
                assert!(!path.elements().is_empty());
                assert!((width - pencil().width_profile().base).abs() < 1e-9);
                assert!(!path
                    .elements()
                    .iter()
                    .any(|el| matches!(el, PathEl::ClosePath)));
            }
            other => panic!("expected centerline, got {other:?}"),
        }

        match build_geometry(&points, &pen(), SURFACE) {
            // Open pen outline: body contour plus two circular caps.
            RenderGeometry::Outline { path } => assert_eq!(subpath_count(&path), 3),
            other => panic!("expected outline, got {other:?}"),
        }
    }

    #[test]
    fn identical_points_fall_back_to_unit_tangent() {
        let points = samples(&[(0.3, 0.3), (0.3, 0.3), (0.3, 0.3), (0.3, 0.3)]);
        // All-identical points are a closed shape by distance; the builder
        // must survive the zero-length tangents without NaNs.
        match build_geometry(&points, &pen(), SURFACE) {
            RenderGeometry::Outline { path } => {
                for element in path.elements() {
                    if let PathEl::LineTo(p) | PathEl::MoveTo(p) = element {
                        assert!(p.x.is_finite() && p.y.is_finite());
                    }
                }
            }
            other => panic!("expected outline, got {other:?}"),
        }
    }

    #[test]
    fn closed_shape_threshold_is_one_percent_of_width() {
        // Triangle returning to within 1% of surface width: closed.
        let closed_points = samples(&[(0.2, 0.2), (0.5, 0.6), (0.8, 0.2), (0.205, 0.2)]);
        match build_geometry(&closed_points, &pen(), SURFACE) {
            // Closed pen outline: two ring contours, no caps.
            RenderGeometry::Outline { path } => assert_eq!(subpath_count(&path), 2),
            other => panic!("expected outline, got {other:?}"),
        }

        // Moving the last point 2% of the width away flips it open.
        let open_points = samples(&[(0.2, 0.2), (0.5, 0.6), (0.8, 0.2), (0.22, 0.2)]);
        match build_geometry(&open_points, &pen(), SURFACE) {
            RenderGeometry::Outline { path } => assert_eq!(subpath_count(&path), 3),
            other => panic!("expected outline, got {other:?}"),
        }
    }

    #[test]
    fn closed_loop_with_exactly_three_points() {
        let points = samples(&[(0.2, 0.2), (0.5, 0.6), (0.2, 0.2)]);
        match build_geometry(&points, &pencil(), SURFACE) {
            RenderGeometry::Centerline { path, .. } => {
                assert!(path
                    .elements()
                    .iter()
                    .any(|el| matches!(el, PathEl::ClosePath)));
            }
            other => panic!("expected centerline, got {other:?}"),
        }
    }

    #[test]
    fn closed_centerline_seals_without_a_chord() {
        let points = samples(&[(0.2, 0.2), (0.5, 0.6), (0.8, 0.2), (0.2, 0.2)]);
        match build_geometry(&points, &pencil(), SURFACE) {
            RenderGeometry::Centerline { path, .. } => {
                let elements = path.elements();
                let PathEl::MoveTo(start) = elements[0] else {
                    panic!("expected subpath start, got {:?}", elements[0]);
                };
                assert!(matches!(elements.last(), Some(PathEl::ClosePath)));
                // The final curve must land back on the start anchor, so
                // closing the path adds no visible straight segment.
                let PathEl::QuadTo(_, end) = elements[elements.len() - 2] else {
                    panic!("expected quad before close, got {:?}", elements[elements.len() - 2]);
                };
                assert!((start - end).hypot() < 1e-9);
            }
            other => panic!("expected centerline, got {other:?}"),
        }
    }

    #[test]
    fn highlighter_open_stroke_has_no_caps() {
        let brush = BrushConfig::new(ToolKind::Highlighter, Rgba::BLACK, 2, 0.5);
        let points = samples(&[(0.1, 0.1), (0.5, 0.5), (0.9, 0.1)]);
        match build_geometry(&points, &brush, SURFACE) {
            RenderGeometry::Outline { path } => assert_eq!(subpath_count(&path), 1),
            other => panic!("expected outline, got {other:?}"),
        }
    }

    #[test]
    fn building_twice_yields_identical_geometry() {
        let points = samples(&[(0.1, 0.1), (0.3, 0.5), (0.7, 0.2), (0.9, 0.9)]);
        let first = build_geometry(&points, &pen(), SURFACE);
        let second = build_geometry(&points, &pen(), SURFACE);
        match (first, second) {
            (RenderGeometry::Outline { path: a }, RenderGeometry::Outline { path: b }) => {
                assert_eq!(a.elements(), b.elements());
            }
            other => panic!("expected matching outlines, got {other:?}"),
        }
    }
}
