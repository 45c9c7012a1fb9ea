// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conversion from vertex sources to `kurbo` paths.

use kurbo::{BezPath, Rect, Shape};

use crate::{Vertex, VertexCommand, VertexSource};

/// Rewinds `source` and converts the whole sequence into a [`BezPath`].
///
/// A `Line` or curve that arrives before any `Move` starts a subpath at its
/// end point. A curve whose control vertices are missing ends the conversion.
pub fn to_bez_path(source: &mut dyn VertexSource) -> BezPath {
    let mut path = BezPath::new();
    if !source.rewind(0) {
        return path;
    }
    let mut vertex = Vertex::default();
    let mut started = false;
    while source.read_vertex(&mut vertex) {
        let end = vertex.point();
        match vertex.command {
            VertexCommand::Move => {
                path.move_to(end);
                started = true;
            }
            VertexCommand::Line if started => path.line_to(end),
            VertexCommand::Curve if started => {
                if !source.read_vertex(&mut vertex) {
                    break;
                }
                path.quad_to(vertex.point(), end);
            }
            VertexCommand::Curve2 if started => {
                if !source.read_vertex(&mut vertex) {
                    break;
                }
                let c1 = vertex.point();
                if !source.read_vertex(&mut vertex) {
                    break;
                }
                path.curve_to(c1, vertex.point(), end);
            }
            VertexCommand::Line | VertexCommand::Curve | VertexCommand::Curve2 => {
                path.move_to(end);
                started = true;
            }
            VertexCommand::Close => {
                if started {
                    path.close_path();
                }
            }
        }
    }
    path
}

/// Tight bounds of the geometry produced by `source`.
///
/// Returns `None` when the source yields no drawable vertices.
pub fn bounds(source: &mut dyn VertexSource) -> Option<Rect> {
    let path = to_bez_path(source);
    if path.elements().is_empty() {
        return None;
    }
    Some(path.bounding_box())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VertexContainer;
    use kurbo::{Circle, PathEl, Point};

    #[test]
    fn curve_vertices_become_path_segments() {
        let mut c = VertexContainer::new();
        c.add_vertex(VertexCommand::Move, 0.0, 0.0);
        c.add_vertex(VertexCommand::Curve, 10.0, 0.0);
        c.add_vertex(VertexCommand::Curve, 5.0, 5.0);
        c.add_vertex(VertexCommand::Close, 0.0, 0.0);
        let path = to_bez_path(&mut c);
        assert_eq!(
            path.elements(),
            &[
                PathEl::MoveTo(Point::new(0.0, 0.0)),
                PathEl::QuadTo(Point::new(5.0, 5.0), Point::new(10.0, 0.0)),
                PathEl::ClosePath,
            ]
        );
    }

    #[test]
    fn bounds_are_tight_for_curves() {
        let circle = Circle::new((50.0, 50.0), 10.0);
        let mut c = VertexContainer::from_shape(&circle, 0.01);
        let b = bounds(&mut c).unwrap();
        assert!((b.x0 - 40.0).abs() < 0.05, "left edge {b:?}");
        assert!((b.y1 - 60.0).abs() < 0.05, "bottom edge {b:?}");
    }

    #[test]
    fn empty_source_has_no_bounds() {
        let mut c = VertexContainer::new();
        assert_eq!(bounds(&mut c), None);
    }

    #[test]
    fn truncated_curve_stops_conversion() {
        let mut c = VertexContainer::new();
        c.add_vertex(VertexCommand::Move, 0.0, 0.0);
        c.add_vertex(VertexCommand::Curve2, 10.0, 0.0);
        c.add_vertex(VertexCommand::Curve2, 3.0, 3.0);
        let path = to_bez_path(&mut c);
        assert_eq!(path.elements().len(), 1, "only the MoveTo survives");
    }
}
