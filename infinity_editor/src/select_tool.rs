// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Click, marquee and move selection tools.

use alloc::vec::Vec;

use infinity_paint::{PaintCanvas, device_offset};
use infinity_scene::{
    CompositeMode, Document, ElementFlags, ElementTag, NodeId, Pattern, StrokeProps,
};
use infinity_vertex::{VertexContainer, VertexPixelAligner};
use kurbo::{Affine, Rect};
use tracing::{debug, warn};

use crate::{DragState, Editor, EditorFlags, Modifiers, PointerEvent, Tool, ToolState};

/// Which elements a [`SelectTool`] picks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectTarget {
    /// Items placed directly in a layer.
    Pointer,
    /// Layers.
    Layer,
    /// Pages.
    Page,
}

impl SelectTarget {
    /// The element `target` selects when `element` is clicked.
    ///
    /// Walks from `element` up through its ancestors to the first node of the
    /// target kind. Locked nodes are not selectable.
    #[must_use]
    pub fn selectable_element(self, doc: &Document, element: NodeId) -> Option<NodeId> {
        let found = core::iter::once(element)
            .chain(doc.ancestors(element))
            .find(|&n| self.matches(doc, n))?;
        (!doc.flags(found).contains(ElementFlags::LOCKED)).then_some(found)
    }

    fn matches(self, doc: &Document, node: NodeId) -> bool {
        match self {
            Self::Pointer => doc
                .parent(node)
                .is_some_and(|p| doc.tag(p) == Some(ElementTag::Layer)),
            Self::Layer => doc.tag(node) == Some(ElementTag::Layer),
            Self::Page => doc.tag(node) == Some(ElementTag::Page),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum Gesture {
    #[default]
    None,
    Move,
    Marquee(Option<Rect>),
}

/// Selects elements of one [`SelectTarget`] kind.
///
/// A click selects the element under the pointer and Shift-click toggles it.
/// Dragging a selected element moves the selection; dragging from empty space
/// selects everything fully inside the dragged rectangle.
#[derive(Clone, Debug)]
pub struct SelectTool {
    target: SelectTarget,
    state: ToolState,
    drag: DragState,
    gesture: Gesture,
    hover: Option<NodeId>,
}

impl SelectTool {
    /// A tool selecting `target` elements.
    #[must_use]
    pub fn new(target: SelectTarget) -> Self {
        Self {
            target,
            state: ToolState::Idle,
            drag: DragState::default(),
            gesture: Gesture::None,
            hover: None,
        }
    }

    /// The kind of element this tool selects.
    #[must_use]
    pub fn target(&self) -> SelectTarget {
        self.target
    }

    /// The current marquee in view pixels.
    #[must_use]
    pub fn marquee(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Marquee(rect) => rect,
            _ => None,
        }
    }

    fn element_at(&self, editor: &Editor, event: &PointerEvent) -> Option<NodeId> {
        let doc = editor.document();
        editor
            .hit_test(event.position)
            .iter()
            .find_map(|hit| self.target.selectable_element(doc, hit.element))
    }

    fn set_hover(&mut self, editor: &mut Editor, element: Option<NodeId>) {
        if self.hover == element {
            return;
        }
        if let Some(old) = self.hover.take() {
            editor.set_editor_flag(old, EditorFlags::HIGHLIGHTED, false);
        }
        if let Some(new) = element {
            editor.set_editor_flag(new, EditorFlags::HIGHLIGHTED, true);
        }
        self.hover = element;
    }

    fn invalidate_marquee(&self, editor: &mut Editor) {
        if let Some(rect) = self.marquee() {
            editor.invalidate(rect.inflate(1.0, 1.0));
        }
    }

    fn enclosed(&self, editor: &Editor, marquee: Rect) -> Vec<NodeId> {
        let doc = editor.document();
        let view = editor.view();
        doc.descendants(doc.root())
            .filter(|&n| self.target.selectable_element(doc, n) == Some(n))
            .filter(|&n| {
                doc.geometry_bbox(n)
                    .is_some_and(|bbox| encloses(marquee, view.transform_rect_bbox(bbox)))
            })
            .collect()
    }
}

fn encloses(outer: Rect, inner: Rect) -> bool {
    outer.x0 <= inner.x0 && outer.y0 <= inner.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

impl Tool for SelectTool {
    fn name(&self) -> &'static str {
        match self.target {
            SelectTarget::Pointer => "Pointer",
            SelectTarget::Layer => "Layer",
            SelectTarget::Page => "Page",
        }
    }

    fn state(&self) -> ToolState {
        self.state
    }

    fn pointer_down(&mut self, editor: &mut Editor, event: &PointerEvent) {
        if self.state != ToolState::Idle {
            return;
        }
        let extend = event.modifiers.contains(Modifiers::SHIFT);
        self.gesture = match self.element_at(editor, event) {
            Some(element) if extend => {
                editor.update_selection(|s| s.toggle(element));
                Gesture::None
            }
            Some(element) => {
                if !editor.selection().contains(&element) {
                    editor.update_selection(|s| s.select_only(element));
                }
                Gesture::Move
            }
            None => {
                if !extend {
                    editor.update_selection(|s| s.clear());
                }
                Gesture::Marquee(None)
            }
        };
        self.drag.start(event.position);
        self.state = ToolState::Tracking;
        debug!(tool = self.name(), gesture = ?self.gesture, "tracking");
    }

    fn pointer_move(&mut self, editor: &mut Editor, event: &PointerEvent) {
        match self.state {
            ToolState::Idle => {
                let hover = self.element_at(editor, event);
                self.set_hover(editor, hover);
                return;
            }
            ToolState::Cancelled => return,
            ToolState::Tracking => {}
        }
        self.drag.update(event.position);
        match self.gesture {
            Gesture::None => {}
            Gesture::Move => {
                if let Some(offset) = self.drag.total_offset(event.position) {
                    let offset = device_offset(editor.view().inverse(), offset);
                    editor.preview_transform(Affine::translate(offset));
                }
            }
            Gesture::Marquee(_) => {
                self.invalidate_marquee(editor);
                self.gesture = Gesture::Marquee(
                    self.drag
                        .origin()
                        .map(|origin| Rect::from_points(origin, event.position)),
                );
                self.invalidate_marquee(editor);
            }
        }
    }

    fn pointer_up(&mut self, editor: &mut Editor, event: &PointerEvent) {
        let state = core::mem::take(&mut self.state);
        let gesture = core::mem::take(&mut self.gesture);
        let offset = self
            .drag
            .total_offset(event.position)
            .filter(|offset| offset.hypot2() > 0.0);
        self.drag.end();
        if state != ToolState::Tracking {
            return;
        }
        match gesture {
            Gesture::None => {}
            Gesture::Move => match offset {
                Some(offset) => {
                    let offset = device_offset(editor.view().inverse(), offset);
                    editor.preview_transform(Affine::translate(offset));
                    if let Err(err) = editor.apply_transform() {
                        warn!(tool = self.name(), %err, "move rejected");
                    }
                }
                None => editor.reset_transform(),
            },
            Gesture::Marquee(rect) => {
                if let Some(rect) = rect {
                    editor.invalidate(rect.inflate(1.0, 1.0));
                    let found = self.enclosed(editor, rect);
                    if event.modifiers.contains(Modifiers::SHIFT) {
                        editor.update_selection(|s| found.into_iter().for_each(|n| s.add(n)));
                    } else {
                        editor.update_selection(|s| s.replace_with(found));
                    }
                }
            }
        }
    }

    fn cancel(&mut self, editor: &mut Editor) {
        if self.state != ToolState::Tracking {
            return;
        }
        match self.gesture {
            Gesture::Move => editor.reset_transform(),
            Gesture::Marquee(_) => self.invalidate_marquee(editor),
            Gesture::None => {}
        }
        self.gesture = Gesture::None;
        self.drag.end();
        self.state = ToolState::Cancelled;
        debug!(tool = self.name(), "cancelled");
    }

    fn deactivate(&mut self, editor: &mut Editor) {
        self.set_hover(editor, None);
    }

    fn paint(&self, editor: &Editor, canvas: &mut dyn PaintCanvas) {
        let Some(rect) = self.marquee() else {
            return;
        };
        let saved = canvas.transform();
        canvas.set_transform(Affine::IDENTITY);
        let mut outline = VertexPixelAligner::new(VertexContainer::from_shape(&rect, 0.1));
        canvas.put_vertices(&mut outline);
        let stroke = StrokeProps {
            width: 1.0,
            ..StrokeProps::default()
        };
        let color = editor.options().selection_color;
        canvas.stroke_vertices(&Pattern::Solid(color), &stroke, 1.0, CompositeMode::Normal);
        canvas.set_transform(saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinity_scene::{Element, RectangleProps};

    #[test]
    fn targets_walk_up_to_their_kind() {
        let mut doc = Document::new();
        let page = doc.create(Element::page("Page", Rect::new(0.0, 0.0, 10.0, 10.0)));
        doc.append_child(doc.root(), page).unwrap();
        let layer = doc.create(Element::layer("Layer"));
        doc.append_child(page, layer).unwrap();
        let group = doc.create(Element::Group);
        doc.append_child(layer, group).unwrap();
        let rect = doc.create(Element::Rectangle(RectangleProps::default()));
        doc.append_child(group, rect).unwrap();

        assert_eq!(SelectTarget::Pointer.selectable_element(&doc, rect), Some(group));
        assert_eq!(SelectTarget::Layer.selectable_element(&doc, rect), Some(layer));
        assert_eq!(SelectTarget::Page.selectable_element(&doc, rect), Some(page));
        assert_eq!(SelectTarget::Layer.selectable_element(&doc, page), None);

        doc.set_flag(group, ElementFlags::LOCKED, true).unwrap();
        assert_eq!(SelectTarget::Pointer.selectable_element(&doc, rect), None);
    }
}
