// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The editing session.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use infinity_paint::{HitTestOptions, Hits, PaintCanvas, RenderEngine};
use infinity_scene::{
    Change, ChangeEvent, Damage, Document, Element, ElementTag, ListenerId, NodeId, SceneError,
};
use kurbo::{Affine, Point, Rect};
use tracing::{debug, trace};

use crate::{EditorFlags, EditorOptions, Editors, Selection, ToolError};

/// A document together with its interaction state.
///
/// The editor owns the document, the selection, the element editor overlay
/// and the view transform that maps scene coordinates to view pixels. It
/// listens to every change of the document; [`process_changes`] turns them
/// into view damage and keeps the overlay and selection consistent with the
/// tree.
///
/// [`process_changes`]: Self::process_changes
pub struct Editor {
    document: Document,
    editors: Editors,
    selection: Selection<NodeId>,
    current_page: Option<NodeId>,
    current_layer: Option<NodeId>,
    view: Affine,
    damage: Damage,
    changes: Rc<RefCell<Vec<ChangeEvent>>>,
    listener: ListenerId,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("document", &self.document)
            .field("selection", &self.selection)
            .field("current_page", &self.current_page)
            .field("current_layer", &self.current_layer)
            .field("view", &self.view)
            .field("open_editors", &self.editors.len())
            .finish_non_exhaustive()
    }
}

impl Editor {
    /// Starts editing `document`.
    ///
    /// The first page, if any, becomes the current page.
    #[must_use]
    pub fn new(mut document: Document, options: EditorOptions) -> Self {
        let changes: Rc<RefCell<Vec<ChangeEvent>>> = Rc::default();
        let sink = Rc::clone(&changes);
        let root = document.root();
        let listener = document.subscribe(root, move |event| sink.borrow_mut().push(*event));
        let current_page = document
            .children(root)
            .iter()
            .copied()
            .find(|&c| document.tag(c) == Some(ElementTag::Page));
        Self {
            document,
            editors: Editors::new(options),
            selection: Selection::new(),
            current_page,
            current_layer: None,
            view: Affine::IDENTITY,
            damage: Damage::default(),
            changes,
            listener,
        }
    }

    /// A fresh document with one page named `name` covering `bounds`, holding
    /// one empty layer.
    pub fn new_with_page(
        name: &str,
        bounds: Rect,
        options: EditorOptions,
    ) -> Result<Self, ToolError> {
        let mut document = Document::new();
        let page = document.create(Element::page(name, bounds));
        document.append_child(document.root(), page)?;
        let layer = document.create(Element::layer("Layer 1"));
        document.append_child(page, layer)?;
        let mut editor = Self::new(document, options);
        editor.current_page = Some(page);
        editor.current_layer = Some(layer);
        editor.changes.borrow_mut().clear();
        Ok(editor)
    }

    /// The edited document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access to the document.
    ///
    /// Call [`process_changes`](Self::process_changes) after mutating.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// The element editor overlay.
    #[must_use]
    pub fn editors(&self) -> &Editors {
        &self.editors
    }

    /// The selected elements.
    #[must_use]
    pub fn selection(&self) -> &Selection<NodeId> {
        &self.selection
    }

    /// Overlay and tool settings.
    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        self.editors.options()
    }

    /// Scene to view transform.
    #[must_use]
    pub fn view(&self) -> Affine {
        self.view
    }

    /// Replaces the scene to view transform and damages the whole view.
    pub fn set_view(&mut self, view: Affine) {
        self.view = view;
        if let Some(bbox) = self.document.paint_bbox(self.document.root()) {
            self.damage.add(view.transform_rect_bbox(bbox));
        }
    }

    /// Pending view damage.
    #[must_use]
    pub fn damage(&self) -> &Damage {
        &self.damage
    }

    /// Drains the pending view damage.
    pub fn take_damage(&mut self) -> Vec<Rect> {
        self.damage.take()
    }

    /// Records an extra view-space rectangle to repaint.
    pub fn invalidate(&mut self, area: Rect) {
        self.damage.add(area);
    }

    /// The page new content goes to.
    #[must_use]
    pub fn current_page(&self) -> Option<NodeId> {
        self.current_page.filter(|&p| self.document.is_attached(p))
    }

    /// Makes `page` the current page and forgets the current layer.
    pub fn set_current_page(&mut self, page: NodeId) -> Result<(), ToolError> {
        if self.document.tag(page) != Some(ElementTag::Page) {
            return Err(SceneError::Unsupported("set_current_page").into());
        }
        if !self.document.is_attached(page) {
            return Err(ToolError::Detached(page));
        }
        self.current_page = Some(page);
        self.current_layer = None;
        Ok(())
    }

    /// Makes `layer` the target of new elements.
    pub fn set_current_layer(&mut self, layer: NodeId) -> Result<(), ToolError> {
        if self.document.tag(layer) != Some(ElementTag::Layer) {
            return Err(SceneError::Unsupported("set_current_layer").into());
        }
        if !self.document.is_attached(layer) {
            return Err(ToolError::Detached(layer));
        }
        self.current_page = self
            .document
            .ancestors(layer)
            .find(|&a| self.document.tag(a) == Some(ElementTag::Page));
        self.current_layer = Some(layer);
        Ok(())
    }

    /// The layer new elements are inserted into.
    ///
    /// This is the current layer while it is attached, and otherwise the
    /// first layer of the current page.
    #[must_use]
    pub fn active_layer(&self) -> Option<NodeId> {
        if let Some(layer) = self.current_layer
            && self.document.is_attached(layer)
        {
            return Some(layer);
        }
        let page = self.current_page()?;
        self.document
            .descendants(page)
            .find(|&n| self.document.tag(n) == Some(ElementTag::Layer))
    }

    /// Applies the document changes seen since the last call.
    ///
    /// Invalidated scene areas become view damage, editors of removed
    /// elements close and removed elements leave the selection.
    pub fn process_changes(&mut self) {
        let events = core::mem::take(&mut *self.changes.borrow_mut());
        if events.is_empty() {
            return;
        }
        trace!(count = events.len(), "processing document changes");
        for event in &events {
            if let Change::Invalidate { area } = event.change {
                self.damage.add(self.view.transform_rect_bbox(area));
            }
            self.editors.sync(&self.document, event);
        }
        let doc = &self.document;
        self.selection.retain(|&id| doc.is_attached(id));
        self.editors.close_detached(&self.document);
    }

    /// Changes the selection through `f` and updates the SELECTED flags.
    ///
    /// Detached elements never stay selected.
    pub fn update_selection(&mut self, f: impl FnOnce(&mut Selection<NodeId>)) {
        let before: Vec<NodeId> = self.selection.items().to_vec();
        f(&mut self.selection);
        let doc = &self.document;
        self.selection.retain(|&id| doc.is_attached(id));

        for &id in before.iter().filter(|&id| !self.selection.contains(id)) {
            self.editors.remove_flag(
                &self.document,
                id,
                EditorFlags::SELECTED,
                self.view,
                &mut self.damage,
            );
        }
        for &id in self.selection.iter().filter(|&id| !before.contains(id)) {
            self.editors.set_flag(
                &self.document,
                id,
                EditorFlags::SELECTED,
                self.view,
                &mut self.damage,
            );
        }
        debug!(selected = self.selection.len(), "selection updated");
    }

    /// Sets or clears an overlay flag on the editor of `element`.
    ///
    /// SELECTED is owned by the selection; use
    /// [`update_selection`](Self::update_selection) for it.
    pub fn set_editor_flag(&mut self, element: NodeId, flag: EditorFlags, on: bool) -> bool {
        let flag = flag.difference(EditorFlags::SELECTED);
        if flag.is_empty() {
            return false;
        }
        let (doc, view) = (&self.document, self.view);
        if on {
            self.editors
                .set_flag(doc, element, flag, view, &mut self.damage)
        } else {
            self.editors
                .remove_flag(doc, element, flag, view, &mut self.damage)
        }
    }

    /// Appends the detached `element` to the active layer and selects it.
    pub fn insert_element(&mut self, element: NodeId) -> Result<(), ToolError> {
        let layer = self.active_layer().ok_or(ToolError::NoActiveLayer)?;
        self.document.append_child(layer, element)?;
        debug!(?element, ?layer, "element inserted");
        self.process_changes();
        self.update_selection(|s| s.select_only(element));
        Ok(())
    }

    /// Previews `transform`, in scene coordinates, on every selected element.
    pub fn preview_transform(&mut self, transform: Affine) {
        for &id in self.selection.items() {
            self.editors
                .transform(&self.document, id, transform, self.view, &mut self.damage);
        }
    }

    /// Writes the pending previews into the document.
    ///
    /// Every selected element is attempted; the first rejection is returned.
    pub fn apply_transform(&mut self) -> Result<(), ToolError> {
        let mut result = Ok(());
        for &id in self.selection.items() {
            let applied =
                self.editors
                    .apply_transform(&mut self.document, id, self.view, &mut self.damage);
            if let Err(err) = applied {
                self.editors
                    .reset_transform(&self.document, id, self.view, &mut self.damage);
                if result.is_ok() {
                    result = Err(err.into());
                }
            }
        }
        self.process_changes();
        result
    }

    /// Discards the pending previews.
    pub fn reset_transform(&mut self) {
        for &id in self.selection.items() {
            self.editors
                .reset_transform(&self.document, id, self.view, &mut self.damage);
        }
    }

    /// Elements under the view point `point`, front-most first.
    #[must_use]
    pub fn hit_test(&self, point: Point) -> Hits {
        self.hit_test_with(point, &self.default_hit_options())
    }

    /// [`hit_test`](Self::hit_test) with explicit options.
    #[must_use]
    pub fn hit_test_with(&self, point: Point, options: &HitTestOptions<'_>) -> Hits {
        RenderEngine::new(&self.document).hit_test(self.document.root(), point, self.view, options)
    }

    fn default_hit_options(&self) -> HitTestOptions<'static> {
        HitTestOptions {
            tolerance: self.options().hit_tolerance,
            ..HitTestOptions::default()
        }
    }

    /// Paints the document through the view, then the overlay.
    pub fn render<C: PaintCanvas>(&self, canvas: &mut C) {
        canvas.set_transform(self.view);
        RenderEngine::new(&self.document).render(canvas, self.document.root());
        self.paint_overlay(canvas);
    }

    /// Paints the element editor decorations in view pixels.
    pub fn paint_overlay(&self, canvas: &mut dyn PaintCanvas) {
        if let Some(root) = self.editors.root() {
            self.editors.paint(&self.document, root, self.view, canvas);
        }
    }

    /// Ends the session and hands back the document.
    #[must_use]
    pub fn into_document(mut self) -> Document {
        self.document.unsubscribe(self.listener);
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infinity_scene::RectangleProps;

    #[test]
    fn new_with_page_has_an_active_layer() {
        let editor =
            Editor::new_with_page("Page", Rect::new(0.0, 0.0, 100.0, 100.0), EditorOptions::default())
                .unwrap();
        let layer = editor.active_layer().unwrap();
        assert_eq!(editor.document().tag(layer), Some(ElementTag::Layer));
        assert!(editor.damage().is_empty(), "setup does not count as damage");
    }

    #[test]
    fn removed_elements_leave_the_selection() {
        let mut editor =
            Editor::new_with_page("Page", Rect::new(0.0, 0.0, 100.0, 100.0), EditorOptions::default())
                .unwrap();
        let rect = editor
            .document_mut()
            .create(Element::Rectangle(RectangleProps::default()));
        editor.insert_element(rect).unwrap();
        assert_eq!(editor.selection().items(), &[rect]);
        assert!(editor.editors().contains(rect));

        let layer = editor.active_layer().unwrap();
        editor.document_mut().remove_child(layer, rect).unwrap();
        editor.process_changes();
        assert!(editor.selection().is_empty(), "detached elements are deselected");
        assert!(!editor.editors().contains(rect), "their editors close");
    }
}
