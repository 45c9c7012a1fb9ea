// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`PaintCanvas`] that records operations instead of rasterizing.
//!
//! It does **not** produce pixels. It is meant for tests and debugging that
//! want to assert on the order and parameters of the operations the render
//! engine emits, including what went into each isolated canvas.

use infinity_scene::{CompositeMode, ImageData, Pattern, StrokeProps};
use infinity_vertex::{VertexSource, to_bez_path};
use kurbo::{Affine, BezPath, Rect, Vec2};
use peniko::Color;

use crate::PaintCanvas;

/// One recorded canvas operation.
#[derive(Clone, Debug, PartialEq)]
pub enum CanvasOp {
    /// The world to device transform changed.
    SetTransform(Affine),
    /// The current path was filled.
    Fill {
        /// Path at the time of the fill, in world coordinates.
        path: BezPath,
        /// Paint source.
        pattern: Pattern,
        /// Paint opacity.
        opacity: f32,
        /// Blend mode.
        blend: CompositeMode,
    },
    /// The current path was stroked.
    Stroke {
        /// Path at the time of the stroke, in world coordinates.
        path: BezPath,
        /// Paint source.
        pattern: Pattern,
        /// Stroke geometry.
        stroke: StrokeProps,
        /// Paint opacity.
        opacity: f32,
        /// Blend mode.
        blend: CompositeMode,
    },
    /// A rectangle was filled with a solid color.
    FillRect {
        /// World-space rectangle.
        rect: Rect,
        /// Fill color.
        color: Color,
        /// Opacity.
        opacity: f32,
    },
    /// The canvas was covered with a color.
    Flood(Color),
    /// Image pixels were drawn.
    DrawImage {
        /// Pixel width of the image.
        width: u32,
        /// Pixel height of the image.
        height: u32,
        /// Pixel grid to world transform.
        transform: Affine,
        /// Opacity.
        opacity: f32,
    },
    /// Another canvas was composited onto this one.
    DrawCanvas {
        /// Device-space area of the source canvas.
        extents: Rect,
        /// Device-space offset it was drawn at.
        offset: Vec2,
        /// Opacity.
        opacity: f32,
        /// Blend mode.
        blend: CompositeMode,
        /// Everything recorded into the source canvas.
        ops: Vec<CanvasOp>,
    },
    /// The canvas was blurred.
    Blur(f64),
    /// The canvas was cleared.
    Clear,
}

/// Records [`CanvasOp`]s in emission order.
#[derive(Clone, Debug)]
pub struct RecordingCanvas {
    extents: Rect,
    transform: Affine,
    path: BezPath,
    ops: Vec<CanvasOp>,
}

impl RecordingCanvas {
    /// A recorder covering `extents` in device space.
    #[must_use]
    pub fn new(extents: Rect) -> Self {
        Self {
            extents,
            transform: Affine::IDENTITY,
            path: BezPath::new(),
            ops: Vec::new(),
        }
    }

    /// Operations recorded so far.
    #[must_use]
    pub fn ops(&self) -> &[CanvasOp] {
        &self.ops
    }

    /// Consumes the recorder and returns its operations.
    #[must_use]
    pub fn into_ops(self) -> Vec<CanvasOp> {
        self.ops
    }

    /// The current path.
    #[must_use]
    pub fn current_path(&self) -> &BezPath {
        &self.path
    }
}

impl PaintCanvas for RecordingCanvas {
    fn extents(&self) -> Rect {
        self.extents
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
        self.ops.push(CanvasOp::SetTransform(transform));
    }

    fn put_vertices(&mut self, source: &mut dyn VertexSource) {
        self.path = to_bez_path(source);
    }

    fn fill_vertices(&mut self, pattern: &Pattern, opacity: f32, blend: CompositeMode) {
        self.ops.push(CanvasOp::Fill {
            path: self.path.clone(),
            pattern: pattern.clone(),
            opacity,
            blend,
        });
    }

    fn stroke_vertices(
        &mut self,
        pattern: &Pattern,
        stroke: &StrokeProps,
        opacity: f32,
        blend: CompositeMode,
    ) {
        self.ops.push(CanvasOp::Stroke {
            path: self.path.clone(),
            pattern: pattern.clone(),
            stroke: *stroke,
            opacity,
            blend,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, opacity: f32, _blend: CompositeMode) {
        self.ops.push(CanvasOp::FillRect {
            rect,
            color,
            opacity,
        });
    }

    fn flood(&mut self, color: Color) {
        self.ops.push(CanvasOp::Flood(color));
    }

    fn draw_image(&mut self, image: &ImageData, transform: Affine, opacity: f32) {
        self.ops.push(CanvasOp::DrawImage {
            width: image.width(),
            height: image.height(),
            transform,
            opacity,
        });
    }

    fn create_canvas(&self, extents: Rect) -> Option<Self> {
        let area = extents.expand();
        if area.is_zero_area() {
            return None;
        }
        Some(Self {
            extents: area,
            transform: self.transform,
            path: BezPath::new(),
            ops: Vec::new(),
        })
    }

    fn draw_canvas(&mut self, source: &Self, offset: Vec2, opacity: f32, blend: CompositeMode) {
        self.ops.push(CanvasOp::DrawCanvas {
            extents: source.extents,
            offset,
            opacity,
            blend,
            ops: source.ops.clone(),
        });
    }

    fn blur(&mut self, radius: f64) {
        self.ops.push(CanvasOp::Blur(radius));
    }

    fn clear(&mut self) {
        self.ops.push(CanvasOp::Clear);
    }
}
