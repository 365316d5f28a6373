//! Eraser hit-testing.
//!
//! # Responsibility
//! - Decide which existing stroke a moving eraser circle intersects first.
//! - Interpolate the eraser sweep so fast gestures cannot skip strokes.
//!
//! # Invariants
//! - Bounding-box rejection runs before any precise test; the hot path is
//!   O(strokes near the cursor), not O(all strokes).
//! - Granularity is whole-stroke: any single hit erases the entire stroke.
//! - First hit wins; the caller is re-invoked per pointer-move event, so
//!   repeated hits across ticks are expected.

use super::Surface;
use crate::model::stroke::{Stroke, StrokeId};
use kurbo::{Point, Rect};

/// Normalized spacing between interpolated sweep samples. At this step the
/// swept circle leaves no gaps larger than its own diameter at typical
/// gesture speeds.
pub const SWEEP_STEP: f64 = 0.01;

/// Interpolates the straight segment `prev -> curr` (normalized space) into
/// `ceil(distance / step) + 1` samples, including both endpoints.
///
/// Coincident endpoints yield a single sample.
pub fn sweep_samples(prev: Point, curr: Point, step: f64) -> Vec<Point> {
    let distance = prev.distance(curr);
    if distance <= 0.0 || step <= 0.0 {
        return vec![prev];
    }

    let count = (distance / step).ceil() as usize + 1;
    (0..count)
        .map(|i| prev.lerp(curr, i as f64 / (count - 1) as f64))
        .collect()
}

/// Stroke-eraser sweep test: returns the first stroke hit by the eraser
/// circle swept from `prev` to `curr`, scanning interpolated samples in
/// order and strokes in order.
///
/// `prev`/`curr` and `radius` are normalized; the precise intersection runs
/// in surface coordinates against the stroke's sample polyline widened by
/// its brush width.
pub fn hit_test_sweep(
    prev: Point,
    curr: Point,
    radius: f64,
    strokes: &[Stroke],
    surface: Surface,
) -> Option<StrokeId> {
    // Denormalized polylines are built at most once per stroke per call,
    // however many sweep samples pass the bounding-box filter.
    let mut polylines: Vec<Option<Vec<Point>>> = vec![None; strokes.len()];

    for sample in sweep_samples(prev, curr, SWEEP_STEP) {
        let eraser_bounds = Rect::new(
            sample.x - radius,
            sample.y - radius,
            sample.x + radius,
            sample.y + radius,
        );
        for (index, stroke) in strokes.iter().enumerate() {
            if !rects_overlap(eraser_bounds, stroke.bounds()) {
                continue;
            }
            let polyline = polylines[index]
                .get_or_insert_with(|| denormalize_polyline(stroke, surface));
            if circle_hits_polyline(sample, radius, polyline, stroke, surface) {
                return Some(stroke.id);
            }
        }
    }
    None
}

/// Point-radius variant for continuous paint-style erasing: a stroke is hit
/// when any of its own samples lies within `radius` of the eraser point.
pub fn hit_test_point(eraser: Point, radius: f64, strokes: &[Stroke]) -> Option<StrokeId> {
    for stroke in strokes {
        if !stroke.bounds().inflate(radius, radius).contains(eraser) {
            continue;
        }
        for sample in &stroke.points {
            let distance = eraser.distance(Point::new(sample.x, sample.y));
            if distance <= radius {
                return Some(stroke.id);
            }
        }
    }
    None
}

fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn denormalize_polyline(stroke: &Stroke, surface: Surface) -> Vec<Point> {
    stroke
        .points
        .iter()
        .map(|sample| surface.denormalize(sample))
        .collect()
}

/// Precise test between the eraser circle and the stroke's render shape,
/// approximated as the sample polyline widened by half the brush width.
fn circle_hits_polyline(
    center: Point,
    radius: f64,
    polyline: &[Point],
    stroke: &Stroke,
    surface: Surface,
) -> bool {
    let center_px = surface.denormalize_point(center);
    let tolerance = radius * surface.width + stroke.brush.width_profile().base / 2.0;

    match polyline {
        [] => false,
        [only] => center_px.distance(*only) <= tolerance,
        _ => polyline
            .windows(2)
            .any(|pair| segment_distance(center_px, pair[0], pair[1]) <= tolerance),
    }
}

/// Distance from `point` to the segment `start..end`.
fn segment_distance(point: Point, start: Point, end: Point) -> f64 {
    let segment = end - start;
    let length_sq = segment.hypot2();
    if length_sq < f64::EPSILON {
        return point.distance(start);
    }

    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}
