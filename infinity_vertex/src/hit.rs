// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Precise hit testing against vertex geometry.
//!
//! These helpers answer "does this point touch the filled interior or the
//! stroked outline of a path?" They model neither joins nor caps; a stroke is
//! treated as the set of points within half its width of the centerline.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{BezPath, ParamCurveNearest, Point, Shape};

/// Parameters shared by all hit tests.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HitParams {
    /// Extra distance, in the same units as the geometry, that still counts as a hit.
    pub tolerance: f64,
}

impl HitParams {
    /// Parameters with the given tolerance.
    #[must_use]
    pub const fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }
}

/// Which part of the geometry was hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HitKind {
    /// The filled interior (or within tolerance of its outline).
    Fill,
    /// The stroked outline.
    Stroke,
}

/// A successful hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitScore {
    /// Distance from the query point to the hit region; `0.0` means inside.
    pub distance: f64,
    /// What was hit.
    pub kind: HitKind,
}

/// Shortest distance from `pt` to the outline of `path`.
///
/// Returns `None` for a path without segments.
#[must_use]
pub fn outline_distance(path: &BezPath, pt: Point) -> Option<f64> {
    path.segments()
        .map(|seg| seg.nearest(pt, 1e-6).distance_sq)
        .reduce(f64::min)
        .map(|d| d.sqrt())
}

/// Tests `pt` against the non-zero filled interior of `path`.
///
/// Points outside the interior still hit when they are within
/// [`HitParams::tolerance`] of the outline.
#[must_use]
pub fn hit_test_fill(path: &BezPath, pt: Point, params: &HitParams) -> Option<HitScore> {
    if path.winding(pt) != 0 {
        return Some(HitScore {
            distance: 0.0,
            kind: HitKind::Fill,
        });
    }
    if params.tolerance <= 0.0 {
        return None;
    }
    let dist = outline_distance(path, pt)?;
    (dist <= params.tolerance).then_some(HitScore {
        distance: dist,
        kind: HitKind::Fill,
    })
}

/// Tests `pt` against the outline of `path` stroked with `half_width`.
#[must_use]
pub fn hit_test_stroke(
    path: &BezPath,
    pt: Point,
    half_width: f64,
    params: &HitParams,
) -> Option<HitScore> {
    let dist = outline_distance(path, pt)?;
    let limit = half_width + params.tolerance;
    (dist <= limit).then_some(HitScore {
        distance: dist,
        kind: HitKind::Stroke,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn square() -> BezPath {
        Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1)
    }

    #[test]
    fn fill_hits_inside_and_within_tolerance() {
        let path = square();
        let inside = hit_test_fill(&path, Point::new(5.0, 5.0), &HitParams::default());
        assert_eq!(inside.map(|h| h.kind), Some(HitKind::Fill));

        let near = Point::new(11.0, 5.0);
        assert!(
            hit_test_fill(&path, near, &HitParams::default()).is_none(),
            "outside without tolerance misses"
        );
        let hit = hit_test_fill(&path, near, &HitParams::with_tolerance(1.5));
        assert!(hit.is_some_and(|h| (h.distance - 1.0).abs() < 1e-9), "{hit:?}");
    }

    #[test]
    fn stroke_hits_band_around_outline() {
        let path = square();
        let params = HitParams::default();
        assert!(hit_test_stroke(&path, Point::new(0.0, 5.0), 1.0, &params).is_some());
        assert!(hit_test_stroke(&path, Point::new(-0.8, 5.0), 1.0, &params).is_some());
        assert!(hit_test_stroke(&path, Point::new(5.0, 5.0), 1.0, &params).is_none());
    }

    #[test]
    fn open_line_has_no_interior() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        let d = outline_distance(&path, Point::new(5.0, 3.0));
        assert!(d.is_some_and(|d| (d - 3.0).abs() < 1e-9), "{d:?}");
    }
}
