// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raster export.

use infinity_scene::{Document, ExportError, Exporter, NodeId, SceneError};
use kurbo::Affine;
use tracing::debug;

use crate::{PaintCanvas, RasterCanvas, RenderEngine};

/// Exports the painted area of a subtree as a PNG image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PngExporter {
    /// Device pixels per scene unit.
    pub scale: f64,
}

impl Default for PngExporter {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl PngExporter {
    /// An exporter rendering at `scale` pixels per scene unit.
    #[must_use]
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    /// Renders the paint bounds of `root` without encoding.
    ///
    /// The canvas origin is the top-left corner of the scaled paint bounds,
    /// rounded outwards to whole pixels.
    pub fn render(&self, document: &Document, root: NodeId) -> Result<RasterCanvas, ExportError> {
        if !document.is_alive(root) {
            return Err(SceneError::StaleNode(root).into());
        }
        let bbox = document.paint_bbox(root).ok_or(ExportError::Empty)?;
        let view = Affine::scale(self.scale);
        let area = view.transform_rect_bbox(bbox);
        let mut canvas = RasterCanvas::with_extents(area).ok_or(ExportError::Empty)?;
        canvas.set_transform(view);
        RenderEngine::new(document).render(&mut canvas, root);
        debug!(?root, ?area, scale = self.scale, "rendered export");
        Ok(canvas)
    }
}

impl Exporter for PngExporter {
    fn extensions(&self) -> &[&str] {
        &["png"]
    }

    async fn export(&self, document: &Document, root: NodeId) -> Result<Vec<u8>, ExportError> {
        self.render(document, root)?.encode_png()
    }
}
