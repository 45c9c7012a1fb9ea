// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The vertex protocol and an owned vertex buffer.

use alloc::boxed::Box;
use alloc::vec::Vec;

use kurbo::{BezPath, PathEl, Point, Shape};

/// Drawing command carried by a [`Vertex`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VertexCommand {
    /// Start a new subpath at the vertex position.
    #[default]
    Move,
    /// Straight line to the vertex position.
    Line,
    /// Quadratic curve to the vertex position; one control vertex follows.
    Curve,
    /// Cubic curve to the vertex position; two control vertices follow.
    Curve2,
    /// Close the current subpath. The coordinates are ignored.
    Close,
}

/// A single vertex record: a command plus absolute coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    /// Command for this vertex.
    pub command: VertexCommand,
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Vertex {
    /// Creates a vertex.
    #[must_use]
    pub const fn new(command: VertexCommand, x: f64, y: f64) -> Self {
        Self { command, x, y }
    }

    /// Returns the vertex position.
    #[must_use]
    pub const fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A restartable, lazily evaluated sequence of vertices.
///
/// Sources are single-consumer: a traversal rewinds, then reads until
/// [`read_vertex`](Self::read_vertex) returns `false`. Reading again requires
/// another rewind.
pub trait VertexSource {
    /// Moves the read cursor to the vertex at `index`.
    ///
    /// Returns `false` if `index` is outside the valid range; the cursor is left
    /// unchanged in that case. Index `0` is always valid, even for an empty source.
    fn rewind(&mut self, index: usize) -> bool;

    /// Reads the vertex under the cursor into `vertex` and advances.
    ///
    /// Returns `false` at the end of the sequence, leaving `vertex` untouched.
    fn read_vertex(&mut self, vertex: &mut Vertex) -> bool;
}

impl<S: VertexSource + ?Sized> VertexSource for &mut S {
    fn rewind(&mut self, index: usize) -> bool {
        (**self).rewind(index)
    }

    fn read_vertex(&mut self, vertex: &mut Vertex) -> bool {
        (**self).read_vertex(vertex)
    }
}

impl<S: VertexSource + ?Sized> VertexSource for Box<S> {
    fn rewind(&mut self, index: usize) -> bool {
        (**self).rewind(index)
    }

    fn read_vertex(&mut self, vertex: &mut Vertex) -> bool {
        (**self).read_vertex(vertex)
    }
}

/// An owned, growable vertex buffer.
///
/// This is the one place where geometry is materialized. Shape geometry that
/// comes from `kurbo` is flattened into a container once and then read lazily
/// through filters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexContainer {
    vertices: Vec<Vertex>,
    cursor: usize,
}

impl VertexContainer {
    /// Creates an empty container.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vertices: Vec::new(),
            cursor: 0,
        }
    }

    /// Appends a vertex.
    pub fn add_vertex(&mut self, command: VertexCommand, x: f64, y: f64) {
        self.vertices.push(Vertex::new(command, x, y));
    }

    /// Number of stored vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if no vertices are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Stored vertices in order.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Removes all vertices and resets the cursor.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.cursor = 0;
    }

    /// Builds a container from path elements.
    pub fn from_path_elements(elements: impl IntoIterator<Item = PathEl>) -> Self {
        let mut out = Self::new();
        for el in elements {
            match el {
                PathEl::MoveTo(p) => out.add_vertex(VertexCommand::Move, p.x, p.y),
                PathEl::LineTo(p) => out.add_vertex(VertexCommand::Line, p.x, p.y),
                PathEl::QuadTo(c, p) => {
                    out.add_vertex(VertexCommand::Curve, p.x, p.y);
                    out.add_vertex(VertexCommand::Curve, c.x, c.y);
                }
                PathEl::CurveTo(c1, c2, p) => {
                    out.add_vertex(VertexCommand::Curve2, p.x, p.y);
                    out.add_vertex(VertexCommand::Curve2, c1.x, c1.y);
                    out.add_vertex(VertexCommand::Curve2, c2.x, c2.y);
                }
                PathEl::ClosePath => out.add_vertex(VertexCommand::Close, 0.0, 0.0),
            }
        }
        out
    }

    /// Builds a container from a `kurbo` path.
    #[must_use]
    pub fn from_path(path: &BezPath) -> Self {
        Self::from_path_elements(path.elements().iter().copied())
    }

    /// Builds a container from any `kurbo` shape, flattening with `tolerance`.
    pub fn from_shape(shape: &impl Shape, tolerance: f64) -> Self {
        Self::from_path_elements(shape.path_elements(tolerance))
    }

    /// Reads `source` from the start into a new container.
    pub fn from_source(source: &mut dyn VertexSource) -> Self {
        let mut out = Self::new();
        if !source.rewind(0) {
            return out;
        }
        let mut vertex = Vertex::default();
        while source.read_vertex(&mut vertex) {
            out.vertices.push(vertex);
        }
        out
    }
}

impl VertexSource for VertexContainer {
    fn rewind(&mut self, index: usize) -> bool {
        if index == 0 || index < self.vertices.len() {
            self.cursor = index;
            true
        } else {
            false
        }
    }

    fn read_vertex(&mut self, vertex: &mut Vertex) -> bool {
        match self.vertices.get(self.cursor) {
            Some(v) => {
                *vertex = *v;
                self.cursor += 1;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;

    fn triangle() -> VertexContainer {
        let mut c = VertexContainer::new();
        c.add_vertex(VertexCommand::Move, 0.0, 0.0);
        c.add_vertex(VertexCommand::Line, 4.0, 0.0);
        c.add_vertex(VertexCommand::Line, 0.0, 3.0);
        c.add_vertex(VertexCommand::Close, 0.0, 0.0);
        c
    }

    #[test]
    fn rewind_rejects_out_of_range_index() {
        let mut c = triangle();
        assert!(c.rewind(3), "last vertex index is valid");
        assert!(!c.rewind(4), "one past the end is not a vertex");
        let mut v = Vertex::default();
        assert!(c.read_vertex(&mut v), "failed rewind keeps the cursor");
        assert_eq!(v.command, VertexCommand::Close);
    }

    #[test]
    fn empty_source_rewinds_to_zero_and_reads_nothing() {
        let mut c = VertexContainer::new();
        assert!(c.rewind(0), "index 0 is valid even when empty");
        let mut v = Vertex::new(VertexCommand::Line, 7.0, 7.0);
        assert!(!c.read_vertex(&mut v), "empty container has no vertices");
        assert_eq!(v, Vertex::new(VertexCommand::Line, 7.0, 7.0));
    }

    #[test]
    fn rewind_to_visited_index_replays() {
        let mut c = triangle();
        let mut v = Vertex::default();
        assert!(c.rewind(0), "rewind to start");
        while c.read_vertex(&mut v) {}
        assert!(c.rewind(1), "rewind to a visited index");
        assert!(c.read_vertex(&mut v), "read after rewind");
        assert_eq!(v, Vertex::new(VertexCommand::Line, 4.0, 0.0));
    }

    #[test]
    fn shape_flattening_keeps_curve_layout() {
        let rect = Rect::new(0.0, 0.0, 2.0, 1.0);
        let c = VertexContainer::from_shape(&rect, 0.1);
        assert_eq!(c.vertices().first().map(|v| v.command), Some(VertexCommand::Move));
        assert_eq!(c.vertices().last().map(|v| v.command), Some(VertexCommand::Close));

        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.curve_to((1.0, 0.0), (2.0, 1.0), (2.0, 2.0));
        let c = VertexContainer::from_path(&path);
        let cmds: Vec<_> = c.vertices().iter().map(|v| v.command).collect();
        assert_eq!(
            cmds,
            [
                VertexCommand::Move,
                VertexCommand::Curve2,
                VertexCommand::Curve2,
                VertexCommand::Curve2
            ]
        );
        assert_eq!(c.vertices()[1].point(), Point::new(2.0, 2.0), "end point first");
        assert_eq!(c.vertices()[2].point(), Point::new(1.0, 0.0), "then first control");
    }
}
