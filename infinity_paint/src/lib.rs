// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Infinity Paint: rendering and hit testing for Infinity documents.
//!
//! The [`RenderEngine`] walks an [`infinity_scene::Document`] and resolves each
//! element's style chain against a [`PaintCanvas`]:
//!
//! - vector effects rewrite the element's vertex source,
//! - paint entries fill or stroke it in chain order,
//! - filters and effects run on an isolated canvas sized to the element's
//!   paint bounds, which is then composited with the element's opacity and
//!   blend mode.
//!
//! Elements without filters, effects, opacity or blend paint straight onto
//! the parent canvas.
//!
//! Two canvases ship with the crate:
//!
//! - [`RasterCanvas`]: premultiplied RGBA pixels rasterized with `tiny-skia`.
//! - [`RecordingCanvas`]: an ordered log of [`CanvasOp`]s, for tests and
//!   debugging.
//!
//! [`RenderEngine::hit_test`] mirrors painting front to back, and
//! [`PngExporter`] plugs raster output into the [`infinity_scene::Exporter`]
//! interface.
//!
//! ## Minimal example
//!
//! ```rust
//! use infinity_paint::{RasterCanvas, RenderEngine};
//! use infinity_scene::{Document, Element, PatternPaint, RectangleProps};
//! use kurbo::{Affine, Rect};
//! use peniko::Color;
//!
//! let mut doc = Document::new();
//! let page = doc.create(Element::page("Page", Rect::new(0.0, 0.0, 40.0, 40.0)));
//! doc.append_child(doc.root(), page).unwrap();
//! let layer = doc.create(Element::layer("Layer"));
//! doc.append_child(page, layer).unwrap();
//! let rect = doc.create(Element::Rectangle(RectangleProps::default()));
//! doc.set_transform(rect, Affine::translate((20.0, 20.0)) * Affine::scale(10.0)).unwrap();
//! doc.update_style(rect, |s| s.push(PatternPaint::fill(Color::BLACK))).unwrap();
//! doc.append_child(layer, rect).unwrap();
//!
//! let mut canvas = RasterCanvas::new(40, 40).unwrap();
//! RenderEngine::new(&doc).render(&mut canvas, doc.root());
//! assert_eq!(canvas.pixel(20, 20), Some([0, 0, 0, 255]));
//! assert_eq!(canvas.pixel(5, 5), Some([0, 0, 0, 0]));
//! ```

mod blur;
mod canvas;
mod engine;
mod export;
mod raster;
mod recording;

pub use canvas::{PaintCanvas, device_offset, device_scale};
pub use engine::{Hit, HitTestOptions, Hits, PaintMode, RenderEngine, RenderOptions};
pub use export::PngExporter;
pub use raster::RasterCanvas;
pub use recording::{CanvasOp, RecordingCanvas};

pub use infinity_vertex::hit::HitKind;
