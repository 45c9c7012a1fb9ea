// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag-to-create shape tools.

use alloc::vec;

use infinity_paint::PaintCanvas;
use infinity_scene::{
    Anchor, CompositeMode, Document, Element, EllipseProps, NodeId, PathProps, Pattern,
    RectangleProps, SceneError, StrokeProps,
};
use infinity_vertex::{VertexPixelAligner, VertexTransformer};
use kurbo::{Affine, Line, Point, Rect};
use tracing::{debug, warn};

use crate::editors::paint_center_cross;
use crate::{DragState, Editor, Modifiers, PointerEvent, Tool, ToolState};

/// Creates and reshapes the element a [`ShapeTool`] draws.
///
/// `area` and `line` are in scene coordinates. `update_shape` may run many
/// times per drag and must leave the shape in the same state for the same
/// arguments.
pub trait ShapeFactory {
    /// Name of the tool.
    fn name(&self) -> &'static str;

    /// Creates a detached, unstyled shape.
    fn create_shape(&self, doc: &mut Document) -> Result<NodeId, SceneError> {
        let _ = doc;
        Err(SceneError::Unsupported("create_shape"))
    }

    /// Fits `shape` to the drag `area` and `line`.
    fn update_shape(
        &self,
        doc: &mut Document,
        shape: NodeId,
        area: Rect,
        line: Line,
    ) -> Result<(), SceneError> {
        let _ = (doc, shape, area, line);
        Err(SceneError::Unsupported("update_shape"))
    }

    /// Whether the drag preview shows a center cross.
    fn paint_center_cross(&self) -> bool {
        false
    }
}

/// Maps the unit square onto `area`.
fn fit_unit_square(area: Rect) -> Affine {
    Affine::translate(area.center().to_vec2())
        * Affine::scale_non_uniform(area.width() / 2.0, area.height() / 2.0)
}

/// Draws [`Element::Rectangle`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct RectangleFactory;

impl ShapeFactory for RectangleFactory {
    fn name(&self) -> &'static str {
        "Rectangle"
    }

    fn create_shape(&self, doc: &mut Document) -> Result<NodeId, SceneError> {
        Ok(doc.create(Element::Rectangle(RectangleProps::default())))
    }

    fn update_shape(
        &self,
        doc: &mut Document,
        shape: NodeId,
        area: Rect,
        _line: Line,
    ) -> Result<(), SceneError> {
        doc.set_transform(shape, fit_unit_square(area))
    }

    fn paint_center_cross(&self) -> bool {
        true
    }
}

/// Draws [`Element::Ellipse`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct EllipseFactory;

impl ShapeFactory for EllipseFactory {
    fn name(&self) -> &'static str {
        "Ellipse"
    }

    fn create_shape(&self, doc: &mut Document) -> Result<NodeId, SceneError> {
        Ok(doc.create(Element::Ellipse(EllipseProps::default())))
    }

    fn update_shape(
        &self,
        doc: &mut Document,
        shape: NodeId,
        area: Rect,
        _line: Line,
    ) -> Result<(), SceneError> {
        doc.set_transform(shape, fit_unit_square(area))
    }

    fn paint_center_cross(&self) -> bool {
        true
    }
}

/// Draws straight lines as open two-anchor [`Element::Path`]s.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineFactory;

impl ShapeFactory for LineFactory {
    fn name(&self) -> &'static str {
        "Line"
    }

    fn create_shape(&self, doc: &mut Document) -> Result<NodeId, SceneError> {
        Ok(doc.create(Element::Path(PathProps::default())))
    }

    fn update_shape(
        &self,
        doc: &mut Document,
        shape: NodeId,
        _area: Rect,
        line: Line,
    ) -> Result<(), SceneError> {
        doc.update_element(shape, |element| {
            if let Element::Path(path) = element {
                path.anchors = vec![
                    Anchor::corner(line.p0.x, line.p0.y),
                    Anchor::corner(line.p1.x, line.p1.y),
                ];
                path.closed = false;
            }
        })?;
        doc.set_transform(shape, Affine::IDENTITY)
    }
}

/// Drag area and line between `start` and `current`.
///
/// With `keep_ratio` the area becomes a square along the longer side and the
/// line snaps to a multiple of 45 degrees. With `from_center` both are
/// mirrored around `start`.
#[must_use]
pub fn drag_geometry(
    start: Point,
    current: Point,
    keep_ratio: bool,
    from_center: bool,
) -> (Rect, Line) {
    let (x0, y0) = (start.x, start.y);
    let (mut x1, mut y1) = (current.x, current.y);
    let (mut x2, mut y2) = (x1, y1);

    if keep_ratio {
        let w = (x1 - x0).abs();
        let h = (y1 - y0).abs();
        let w_sign = if x1 < x0 { -1.0 } else { 1.0 };
        let h_sign = if y1 < y0 { -1.0 } else { 1.0 };
        if w >= h {
            x1 = x0 + w * w_sign;
            y1 = y0 + w * h_sign;
            y2 = if w < 2.0 * h { y1 } else { y0 };
        } else {
            x1 = x0 + h * w_sign;
            y1 = y0 + h * h_sign;
            x2 = if h < 2.0 * w { x1 } else { x0 };
        }
    }

    if from_center {
        let (dx, dy) = (x1 - x0, y1 - y0);
        let (lx, ly) = (x2 - x0, y2 - y0);
        (
            Rect::from_points((x0 - dx, y0 - dy), (x0 + dx, y0 + dy)),
            Line::new((x0 - lx, y0 - ly), (x0 + lx, y0 + ly)),
        )
    } else {
        (
            Rect::from_points((x0, y0), (x1, y1)),
            Line::new((x0, y0), (x2, y2)),
        )
    }
}

/// A tool that creates a shape by dragging.
///
/// The shape is created on the first move and kept detached while the drag
/// lasts. Releasing the pointer inserts it into the active layer and selects
/// it; a drag without extent discards it.
#[derive(Clone, Debug)]
pub struct ShapeTool<F> {
    factory: F,
    keep_ratio: bool,
    from_center: bool,
    state: ToolState,
    drag: DragState,
    shape: Option<NodeId>,
    area: Option<Rect>,
}

impl<F: ShapeFactory> ShapeTool<F> {
    /// A tool drawing with `factory`; Shift keeps the ratio and Option draws
    /// from the center.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            keep_ratio: true,
            from_center: true,
            state: ToolState::Idle,
            drag: DragState::default(),
            shape: None,
            area: None,
        }
    }

    /// Whether Shift keeps the ratio.
    #[must_use]
    pub fn with_keep_ratio(mut self, keep_ratio: bool) -> Self {
        self.keep_ratio = keep_ratio;
        self
    }

    /// Whether Option draws from the center.
    #[must_use]
    pub fn with_from_center(mut self, from_center: bool) -> Self {
        self.from_center = from_center;
        self
    }

    /// The factory.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// The shape being drawn.
    #[must_use]
    pub fn shape(&self) -> Option<NodeId> {
        self.shape
    }

    fn preview_area(&self, editor: &Editor) -> Option<Rect> {
        let bbox = editor.document().geometry_bbox(self.shape?)?;
        Some(editor.view().transform_rect_bbox(bbox).inflate(1.0, 1.0))
    }

    fn invalidate_preview(&self, editor: &mut Editor) {
        if let Some(area) = self.preview_area(editor) {
            editor.invalidate(area);
        }
    }

    fn discard(&mut self, editor: &mut Editor) {
        self.invalidate_preview(editor);
        if let Some(shape) = self.shape.take()
            && let Err(err) = editor.document_mut().destroy(shape)
        {
            warn!(tool = self.factory.name(), %err, "could not destroy discarded shape");
        }
        self.area = None;
    }

    fn create(&mut self, editor: &mut Editor) -> Option<NodeId> {
        if let Some(shape) = self.shape {
            return Some(shape);
        }
        let name = self.factory.name();
        let style = editor.options().shape_style.clone();
        let doc = editor.document_mut();
        let created = self.factory.create_shape(doc).and_then(|shape| {
            if let Err(err) = doc.set_style(shape, style) {
                if let Err(cleanup) = doc.destroy(shape) {
                    warn!(tool = name, %cleanup, "could not destroy unstyled shape");
                }
                return Err(err);
            }
            Ok(shape)
        });
        match created {
            Ok(shape) => {
                debug!(tool = self.factory.name(), ?shape, "shape created");
                self.shape = Some(shape);
                Some(shape)
            }
            Err(err) => {
                warn!(tool = self.factory.name(), %err, "shape creation failed");
                self.state = ToolState::Idle;
                self.drag.end();
                None
            }
        }
    }
}

impl<F: ShapeFactory> Tool for ShapeTool<F> {
    fn name(&self) -> &'static str {
        self.factory.name()
    }

    fn state(&self) -> ToolState {
        self.state
    }

    fn pointer_down(&mut self, _editor: &mut Editor, event: &PointerEvent) {
        if self.state != ToolState::Idle {
            return;
        }
        self.drag.start(event.position);
        self.state = ToolState::Tracking;
        debug!(tool = self.factory.name(), "tracking");
    }

    fn pointer_move(&mut self, editor: &mut Editor, event: &PointerEvent) {
        if self.state != ToolState::Tracking {
            return;
        }
        self.drag.update(event.position);
        let Some(start) = self.drag.origin() else {
            return;
        };
        if start == event.position {
            return;
        }
        let Some(shape) = self.create(editor) else {
            return;
        };

        let (area, line) = drag_geometry(
            start,
            event.position,
            self.keep_ratio && event.modifiers.contains(Modifiers::SHIFT),
            self.from_center && event.modifiers.contains(Modifiers::OPTION),
        );
        let to_scene = editor.view().inverse();
        let area = to_scene.transform_rect_bbox(area);
        let line = Line::new(to_scene * line.p0, to_scene * line.p1);

        self.invalidate_preview(editor);
        if let Err(err) = self
            .factory
            .update_shape(editor.document_mut(), shape, area, line)
        {
            warn!(tool = self.factory.name(), %err, "shape update failed");
            self.discard(editor);
            self.drag.end();
            self.state = ToolState::Idle;
            return;
        }
        self.area = Some(area);
        self.invalidate_preview(editor);
    }

    fn pointer_up(&mut self, editor: &mut Editor, _event: &PointerEvent) {
        let state = core::mem::take(&mut self.state);
        self.drag.end();
        if state != ToolState::Tracking {
            return;
        }
        let Some(shape) = self.shape else {
            return;
        };
        let has_extent = self
            .area
            .is_some_and(|area| area.width() > 0.0 || area.height() > 0.0);
        if !has_extent {
            debug!(tool = self.factory.name(), "empty drag, shape discarded");
            self.discard(editor);
            return;
        }
        self.invalidate_preview(editor);
        match editor.insert_element(shape) {
            Ok(()) => {
                self.shape = None;
                self.area = None;
            }
            Err(err) => {
                warn!(tool = self.factory.name(), %err, "shape insertion failed");
                self.discard(editor);
            }
        }
    }

    fn cancel(&mut self, editor: &mut Editor) {
        if self.state != ToolState::Tracking {
            return;
        }
        self.discard(editor);
        self.drag.end();
        self.state = ToolState::Cancelled;
        debug!(tool = self.factory.name(), "cancelled");
    }

    fn deactivate(&mut self, editor: &mut Editor) {
        self.discard(editor);
        self.drag.end();
        self.state = ToolState::Idle;
    }

    fn paint(&self, editor: &Editor, canvas: &mut dyn PaintCanvas) {
        let Some(shape) = self.shape else {
            return;
        };
        let Some(source) = editor.document().raw_vertices(shape) else {
            return;
        };
        let color = editor.options().selection_color;
        let saved = canvas.transform();
        canvas.set_transform(Affine::IDENTITY);

        let mut outline = VertexPixelAligner::new(VertexTransformer::new(source, editor.view()));
        canvas.put_vertices(&mut outline);
        let stroke = StrokeProps {
            width: 1.0,
            ..StrokeProps::default()
        };
        canvas.stroke_vertices(&Pattern::Solid(color), &stroke, 1.0, CompositeMode::Normal);

        if self.factory.paint_center_cross()
            && let Some(bbox) = editor.document().geometry_bbox(shape)
        {
            let bbox = editor.view().transform_rect_bbox(bbox);
            paint_center_cross(canvas, bbox, editor.options().center_cross_size, color);
        }
        canvas.set_transform(saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinity_scene::LayerSetProps;

    #[test]
    fn keep_ratio_squares_the_area() {
        let (area, line) = drag_geometry(Point::ZERO, Point::new(10.0, -4.0), true, false);
        assert_eq!(area, Rect::new(0.0, -10.0, 10.0, 0.0));
        assert_eq!(line, Line::new((0.0, 0.0), (10.0, 0.0)), "shallow lines snap flat");

        let (_, line) = drag_geometry(Point::ZERO, Point::new(10.0, 8.0), true, false);
        assert_eq!(line, Line::new((0.0, 0.0), (10.0, 10.0)), "steep lines snap diagonal");
    }

    #[test]
    fn from_center_mirrors_around_the_start() {
        let (area, line) =
            drag_geometry(Point::new(50.0, 50.0), Point::new(60.0, 55.0), false, true);
        assert_eq!(area, Rect::new(40.0, 45.0, 60.0, 55.0));
        assert_eq!(line, Line::new((40.0, 45.0), (60.0, 55.0)));
    }

    #[test]
    fn rejected_shape_style_leaves_no_node_behind() {
        let mut editor = Editor::new_with_page(
            "Page",
            Rect::new(0.0, 0.0, 100.0, 100.0),
            crate::EditorOptions::default(),
        )
        .unwrap();
        let before = editor.document().node_count();

        struct Unstylable;
        impl ShapeFactory for Unstylable {
            fn name(&self) -> &'static str {
                "Unstylable"
            }
            fn create_shape(&self, doc: &mut Document) -> Result<NodeId, SceneError> {
                Ok(doc.create(Element::LayerSet(LayerSetProps::default())))
            }
        }
        let mut tool = ShapeTool::new(Unstylable);
        tool.pointer_down(&mut editor, &PointerEvent::down((10.0, 10.0)));
        tool.pointer_move(&mut editor, &PointerEvent::moved((40.0, 40.0)));
        assert_eq!(tool.state(), ToolState::Idle, "creation failure ends the gesture");
        assert_eq!(tool.shape(), None);
        assert_eq!(editor.document().node_count(), before, "the unstyled shape was destroyed");
    }

    #[test]
    fn base_factory_hooks_are_unsupported() {
        struct Bare;
        impl ShapeFactory for Bare {
            fn name(&self) -> &'static str {
                "Bare"
            }
        }
        let mut doc = Document::new();
        assert_eq!(
            Bare.create_shape(&mut doc),
            Err(SceneError::Unsupported("create_shape"))
        );
    }
}
