// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The drawing surface contract.

use infinity_scene::{CompositeMode, ImageData, Pattern, StrokeProps};
use infinity_vertex::VertexSource;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use peniko::Color;

/// A drawing surface covering an integer rectangle of device space.
///
/// Geometry is handed over in world coordinates and mapped to device pixels
/// by [`transform`](Self::transform). A canvas keeps one current path, set by
/// [`put_vertices`](Self::put_vertices) and consumed by any number of fills
/// and strokes.
///
/// Secondary canvases from [`create_canvas`](Self::create_canvas) share the
/// device space of their parent, so compositing one into another only needs
/// an extra device-space offset.
pub trait PaintCanvas {
    /// Device-space area covered by the canvas.
    fn extents(&self) -> Rect;

    /// Top-left corner of [`extents`](Self::extents).
    fn origin(&self) -> Point {
        self.extents().origin()
    }

    /// Size of [`extents`](Self::extents).
    fn size(&self) -> Size {
        self.extents().size()
    }

    /// The world to device transform.
    fn transform(&self) -> Affine;

    /// Replaces the world to device transform.
    fn set_transform(&mut self, transform: Affine);

    /// Makes the geometry read from `source` the current path.
    fn put_vertices(&mut self, source: &mut dyn VertexSource);

    /// Fills the current path with the non-zero rule.
    fn fill_vertices(&mut self, pattern: &Pattern, opacity: f32, blend: CompositeMode);

    /// Strokes the current path.
    ///
    /// Inside and outside alignment keep the stroke on one side of the
    /// outline. A width of zero draws a one pixel hairline.
    fn stroke_vertices(
        &mut self,
        pattern: &Pattern,
        stroke: &StrokeProps,
        opacity: f32,
        blend: CompositeMode,
    );

    /// Fills a world-space rectangle.
    fn fill_rect(&mut self, rect: Rect, color: Color, opacity: f32, blend: CompositeMode);

    /// Covers the whole canvas with `color`, replacing what was there.
    fn flood(&mut self, color: Color);

    /// Draws `image` with its pixel grid mapped to world space by `transform`.
    fn draw_image(&mut self, image: &ImageData, transform: Affine, opacity: f32);

    /// A transparent canvas over `extents` with the same transform.
    ///
    /// Returns `None` if the area is empty or too large to allocate.
    fn create_canvas(&self, extents: Rect) -> Option<Self>
    where
        Self: Sized;

    /// Composites `source` onto this canvas, shifted by `offset` device pixels.
    ///
    /// Unbounded modes such as [`CompositeMode::DestinationIn`] treat the area
    /// outside `source` as transparent.
    fn draw_canvas(&mut self, source: &Self, offset: Vec2, opacity: f32, blend: CompositeMode)
    where
        Self: Sized;

    /// Gaussian blur with a kernel `radius` in device pixels. Zero is a no-op.
    fn blur(&mut self, radius: f64);

    /// Makes every pixel transparent.
    fn clear(&mut self);
}

/// Uniform scale factor of `transform`, used to map lengths to device pixels.
#[must_use]
pub fn device_scale(transform: Affine) -> f64 {
    transform.determinant().abs().sqrt()
}

/// Maps a world-space displacement to device space, ignoring translation.
#[must_use]
pub fn device_offset(transform: Affine, offset: Vec2) -> Vec2 {
    let [a, b, c, d, _, _] = transform.as_coeffs();
    Vec2::new(a * offset.x + c * offset.y, b * offset.x + d * offset.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_ignore_translation() {
        let t = Affine::translate((100.0, 50.0)) * Affine::scale(2.0);
        assert_eq!(device_offset(t, Vec2::new(3.0, -1.0)), Vec2::new(6.0, -2.0));
        assert!((device_scale(t) - 2.0).abs() < 1e-12, "uniform scale");
    }
}
