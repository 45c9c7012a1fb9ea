// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy vertex filters.
//!
//! Each filter owns (or borrows) an inner [`VertexSource`] and rewrites vertices
//! one at a time as they are read. Rewinding is forwarded to the inner source.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;
use kurbo::{Affine, Vec2};

use crate::{Vertex, VertexCommand, VertexSource};

/// Applies an affine transform to every vertex of a source.
///
/// The command is preserved and only the coordinates change. Nesting two
/// transformers `T(T(s, m1), m2)` yields the same stream as `T(s, m2 * m1)`.
#[derive(Clone, Debug)]
pub struct VertexTransformer<S> {
    source: S,
    transform: Affine,
}

impl<S: VertexSource> VertexTransformer<S> {
    /// Wraps `source` with `transform`.
    pub const fn new(source: S, transform: Affine) -> Self {
        Self { source, transform }
    }

    /// The transform applied on read.
    #[must_use]
    pub const fn transform(&self) -> Affine {
        self.transform
    }

    /// Replaces the transform. Takes effect on the next read.
    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    /// Unwraps the inner source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: VertexSource> VertexSource for VertexTransformer<S> {
    fn rewind(&mut self, index: usize) -> bool {
        self.source.rewind(index)
    }

    fn read_vertex(&mut self, vertex: &mut Vertex) -> bool {
        if !self.source.read_vertex(vertex) {
            return false;
        }
        if vertex.command != VertexCommand::Close {
            let p = self.transform * vertex.point();
            vertex.x = p.x;
            vertex.y = p.y;
        }
        true
    }
}

/// Offsets every vertex by a fixed vector.
#[derive(Clone, Debug)]
pub struct VertexTranslator<S> {
    source: S,
    offset: Vec2,
}

impl<S: VertexSource> VertexTranslator<S> {
    /// Wraps `source`, moving every vertex by `offset`.
    pub const fn new(source: S, offset: Vec2) -> Self {
        Self { source, offset }
    }
}

impl<S: VertexSource> VertexSource for VertexTranslator<S> {
    fn rewind(&mut self, index: usize) -> bool {
        self.source.rewind(index)
    }

    fn read_vertex(&mut self, vertex: &mut Vertex) -> bool {
        if !self.source.read_vertex(vertex) {
            return false;
        }
        if vertex.command != VertexCommand::Close {
            vertex.x += self.offset.x;
            vertex.y += self.offset.y;
        }
        true
    }
}

/// Snaps vertices to pixel centers.
///
/// Coordinates are floored and moved to the middle of the pixel so that one
/// pixel wide strokes land on a single row or column.
#[derive(Clone, Debug)]
pub struct VertexPixelAligner<S> {
    source: S,
}

impl<S: VertexSource> VertexPixelAligner<S> {
    /// Wraps `source`.
    pub const fn new(source: S) -> Self {
        Self { source }
    }
}

impl<S: VertexSource> VertexSource for VertexPixelAligner<S> {
    fn rewind(&mut self, index: usize) -> bool {
        self.source.rewind(index)
    }

    fn read_vertex(&mut self, vertex: &mut Vertex) -> bool {
        if !self.source.read_vertex(vertex) {
            return false;
        }
        if vertex.command != VertexCommand::Close {
            vertex.x = vertex.x.floor() + 0.5;
            vertex.y = vertex.y.floor() + 0.5;
        }
        true
    }
}
