// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element editor overlay.
//!
//! Editors are decorators keyed by the element they decorate. They mirror the
//! shape of the element tree only as far as something is decorated: opening
//! an editor opens its ancestors, and an editor without flags, children or a
//! transform preview is closed again. Nothing here is stored in the document.

use alloc::boxed::Box;
use alloc::vec::Vec;

use hashbrown::HashMap;
use infinity_paint::PaintCanvas;
use infinity_scene::{
    Change, ChangeEvent, CompositeMode, Damage, Document, ElementTag, NodeId, Pattern, SceneError,
    StrokeProps,
};
use infinity_vertex::{
    VertexCommand, VertexContainer, VertexPixelAligner, VertexSource, VertexTransformer,
};
use kurbo::{Affine, Point, Rect};
use tracing::{debug, trace};

use crate::EditorOptions;

bitflags::bitflags! {
    /// Decoration state of one editor.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct EditorFlags: u8 {
        /// Part of the selection: outline and handles.
        const SELECTED    = 0b0000_0001;
        /// Under the pointer: outline in the highlight color.
        const HIGHLIGHTED = 0b0000_0010;
        /// Has keyboard focus.
        const FOCUSED     = 0b0000_0100;
        /// Shows per-type detail handles.
        const DETAIL      = 0b0000_1000;
        /// Outline only; handles are hidden while a preview is active.
        const OUTLINE     = 0b0001_0000;
    }
}

/// Which decoration an editor draws, chosen by element tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EditorKind {
    /// The scene root.
    Root,
    /// A page.
    Page,
    /// A layer or layer set.
    Layer,
    /// A group or shape set.
    Container,
    /// A rectangle, ellipse, path or image.
    Shape,
    /// A slice.
    Slice,
}

impl EditorKind {
    /// The editor kind for elements tagged `tag`.
    #[must_use]
    pub const fn for_tag(tag: ElementTag) -> Self {
        match tag {
            ElementTag::Scene => Self::Root,
            ElementTag::Page => Self::Page,
            ElementTag::LayerSet | ElementTag::Layer => Self::Layer,
            ElementTag::Group | ElementTag::ShapeSet => Self::Container,
            ElementTag::Slice => Self::Slice,
            ElementTag::Rectangle | ElementTag::Ellipse | ElementTag::Path | ElementTag::Image => {
                Self::Shape
            }
        }
    }

    /// Returns `true` if selected editors of this kind draw resize handles.
    #[must_use]
    pub const fn has_handles(self) -> bool {
        matches!(self, Self::Container | Self::Shape | Self::Slice)
    }

    const fn outlines_geometry(self) -> bool {
        matches!(self, Self::Shape | Self::Slice)
    }
}

/// A corner of a decoration bbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Minimum x, minimum y.
    TopLeft,
    /// Maximum x, minimum y.
    TopRight,
    /// Maximum x, maximum y.
    BottomRight,
    /// Minimum x, maximum y.
    BottomLeft,
}

impl Corner {
    /// All corners in clockwise order.
    pub const ALL: [Self; 4] = [
        Self::TopLeft,
        Self::TopRight,
        Self::BottomRight,
        Self::BottomLeft,
    ];

    /// This corner of `rect`.
    #[must_use]
    pub fn of(self, rect: Rect) -> Point {
        match self {
            Self::TopLeft => Point::new(rect.x0, rect.y0),
            Self::TopRight => Point::new(rect.x1, rect.y0),
            Self::BottomRight => Point::new(rect.x1, rect.y1),
            Self::BottomLeft => Point::new(rect.x0, rect.y1),
        }
    }
}

/// An interactive part of a decoration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Part {
    /// A resize handle at a bbox corner.
    ResizeHandle(Corner),
}

/// Result of [`Editors::part_at`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PartInfo {
    /// The decorated element.
    pub element: NodeId,
    /// The part under the point.
    pub part: Part,
}

/// Decoration state for one element.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementEditor {
    element: NodeId,
    kind: EditorKind,
    flags: EditorFlags,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    transform: Option<Affine>,
}

impl ElementEditor {
    /// The decorated element.
    #[must_use]
    pub fn element(&self) -> NodeId {
        self.element
    }

    /// Decoration kind.
    #[must_use]
    pub fn kind(&self) -> EditorKind {
        self.kind
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> EditorFlags {
        self.flags
    }

    /// Element of the parent editor.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Elements of the open child editors, in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The pending transform preview, in scene coordinates.
    #[must_use]
    pub fn transform(&self) -> Option<Affine> {
        self.transform
    }

    fn to_view(&self, view: Affine) -> Affine {
        self.transform.map_or(view, |t| view * t)
    }

    fn is_decorated(&self) -> bool {
        self.flags
            .intersects(EditorFlags::SELECTED | EditorFlags::HIGHLIGHTED)
    }

    fn shows_handles(&self) -> bool {
        self.flags.contains(EditorFlags::SELECTED)
            && !self.flags.contains(EditorFlags::OUTLINE)
            && self.kind.has_handles()
    }
}

/// Registry of open element editors.
#[derive(Clone, Debug, Default)]
pub struct Editors {
    editors: HashMap<NodeId, ElementEditor>,
    root: Option<NodeId>,
    options: EditorOptions,
}

impl Editors {
    /// An empty registry drawing with `options`.
    #[must_use]
    pub fn new(options: EditorOptions) -> Self {
        Self {
            editors: HashMap::new(),
            root: None,
            options,
        }
    }

    /// Overlay sizes and colors.
    #[must_use]
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// The editor of `element`, if open.
    #[must_use]
    pub fn get(&self, element: NodeId) -> Option<&ElementEditor> {
        self.editors.get(&element)
    }

    /// Returns `true` if `element` has an open editor.
    #[must_use]
    pub fn contains(&self, element: NodeId) -> bool {
        self.editors.contains_key(&element)
    }

    /// Number of open editors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.editors.len()
    }

    /// Returns `true` if no editor is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// Element of the top-most open editor.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Opens the editor of `element` and of every ancestor.
    ///
    /// Returns `None` for elements that are not attached to the document.
    /// Opening an open editor returns it unchanged.
    pub fn open(&mut self, doc: &Document, element: NodeId) -> Option<&ElementEditor> {
        if !self.editors.contains_key(&element) {
            if !doc.is_attached(element) {
                return None;
            }
            let kind = EditorKind::for_tag(doc.tag(element)?);
            let parent = doc.parent(element);
            if let Some(parent) = parent {
                self.open(doc, parent)?;
            }
            self.editors.insert(
                element,
                ElementEditor {
                    element,
                    kind,
                    flags: EditorFlags::empty(),
                    parent,
                    children: Vec::new(),
                    transform: None,
                },
            );
            match parent {
                Some(parent) => self.link(doc, parent, element),
                None => self.root = Some(element),
            }
            debug!(?element, ?kind, "editor opened");
        }
        self.editors.get(&element)
    }

    fn link(&mut self, doc: &Document, parent: NodeId, child: NodeId) {
        let siblings = doc.children(parent);
        let rank = |id: NodeId| siblings.iter().position(|&c| c == id);
        let own = rank(child);
        if let Some(editor) = self.editors.get_mut(&parent) {
            let at = editor
                .children
                .iter()
                .position(|&c| rank(c) > own)
                .unwrap_or(editor.children.len());
            editor.children.insert(at, child);
        }
    }

    /// Closes the editor of `element` after closing its children.
    ///
    /// Returns `false` if it was not open.
    pub fn close(&mut self, element: NodeId) -> bool {
        let Some(children) = self.editors.get(&element).map(|e| e.children.clone()) else {
            return false;
        };
        for child in children {
            self.close(child);
        }
        let Some(editor) = self.editors.remove(&element) else {
            return false;
        };
        if let Some(parent) = editor.parent
            && let Some(parent) = self.editors.get_mut(&parent)
        {
            parent.children.retain(|&c| c != element);
        }
        if self.root == Some(element) {
            self.root = None;
        }
        debug!(?element, "editor closed");
        true
    }

    /// Closes editors whose elements left the document.
    pub fn sync(&mut self, doc: &Document, event: &ChangeEvent) {
        if let Change::AfterRemove { child } = event.change
            && self.editors.contains_key(&child)
            && !doc.is_attached(child)
        {
            self.close(child);
            self.prune(event.target);
        }
    }

    /// Closes every editor whose element is no longer attached.
    pub fn close_detached(&mut self, doc: &Document) {
        let dead: Vec<NodeId> = self
            .editors
            .keys()
            .copied()
            .filter(|&id| !doc.is_attached(id))
            .collect();
        for id in dead {
            self.close(id);
        }
    }

    /// Sets `flag` on the editor of `element`, opening it if needed.
    ///
    /// The decoration areas before and after the change go into `damage`.
    /// Returns `false` if the flag was already set or the element is detached.
    pub fn set_flag(
        &mut self,
        doc: &Document,
        element: NodeId,
        flag: EditorFlags,
        view: Affine,
        damage: &mut Damage,
    ) -> bool {
        let Some(editor) = self.open(doc, element) else {
            return false;
        };
        if editor.flags.contains(flag) {
            return false;
        }
        self.update(doc, element, view, damage, |e| e.flags.insert(flag));
        true
    }

    /// Clears `flag` on the editor of `element`.
    ///
    /// Editors left without flags, children or preview are closed.
    pub fn remove_flag(
        &mut self,
        doc: &Document,
        element: NodeId,
        flag: EditorFlags,
        view: Affine,
        damage: &mut Damage,
    ) -> bool {
        if !self
            .editors
            .get(&element)
            .is_some_and(|e| e.flags.intersects(flag))
        {
            return false;
        }
        self.update(doc, element, view, damage, |e| e.flags.remove(flag));
        self.prune(element);
        true
    }

    fn update(
        &mut self,
        doc: &Document,
        element: NodeId,
        view: Affine,
        damage: &mut Damage,
        f: impl FnOnce(&mut ElementEditor),
    ) {
        if let Some(before) = self.invalidate(doc, element, view) {
            damage.add(before);
        }
        if let Some(editor) = self.editors.get_mut(&element) {
            f(editor);
        }
        if let Some(after) = self.invalidate(doc, element, view) {
            damage.add(after);
        }
    }

    fn prune(&mut self, element: NodeId) {
        let mut current = Some(element);
        while let Some(id) = current {
            let Some(editor) = self.editors.get(&id) else {
                break;
            };
            if !editor.flags.is_empty() || !editor.children.is_empty() || editor.transform.is_some()
            {
                break;
            }
            current = editor.parent;
            self.close(id);
        }
    }

    /// Screen area covered by the decoration of `element`.
    ///
    /// This is the geometry bbox in view space grown by the bbox margin and
    /// the handle size. Undecorated editors cover nothing.
    #[must_use]
    pub fn invalidate(&self, doc: &Document, element: NodeId, view: Affine) -> Option<Rect> {
        let editor = self.editors.get(&element)?;
        if !editor.is_decorated() {
            return None;
        }
        let grow = self.options.bbox_margin + self.options.annotation_size;
        Some(self.view_bbox(doc, editor, view)?.inflate(grow, grow))
    }

    fn view_bbox(&self, doc: &Document, editor: &ElementEditor, view: Affine) -> Option<Rect> {
        let bbox = doc.geometry_bbox(editor.element)?;
        Some(editor.to_view(view).transform_rect_bbox(bbox))
    }

    /// Paints the decoration of `element`, then of its child editors.
    ///
    /// Decorations are drawn in view pixels; the canvas transform is restored
    /// afterwards.
    pub fn paint(
        &self,
        doc: &Document,
        element: NodeId,
        view: Affine,
        canvas: &mut dyn PaintCanvas,
    ) {
        let Some(editor) = self.editors.get(&element) else {
            return;
        };
        if editor.is_decorated() {
            let saved = canvas.transform();
            canvas.set_transform(Affine::IDENTITY);
            self.paint_decoration(doc, editor, view, canvas);
            canvas.set_transform(saved);
        }
        for &child in &editor.children {
            self.paint(doc, child, view, canvas);
        }
    }

    fn paint_decoration(
        &self,
        doc: &Document,
        editor: &ElementEditor,
        view: Affine,
        canvas: &mut dyn PaintCanvas,
    ) {
        let color = if editor.flags.contains(EditorFlags::HIGHLIGHTED) {
            self.options.highlight_color
        } else {
            self.options.selection_color
        };
        let Some(bbox) = self.view_bbox(doc, editor, view) else {
            return;
        };
        trace!(element = ?editor.element, ?bbox, "paint decoration");

        let outline: Option<Box<dyn VertexSource>> = if editor.kind.outlines_geometry() {
            doc.raw_vertices(editor.element).map(|source| {
                Box::new(VertexPixelAligner::new(VertexTransformer::new(
                    source,
                    editor.to_view(view),
                ))) as Box<dyn VertexSource>
            })
        } else {
            Some(Box::new(VertexPixelAligner::new(VertexContainer::from_shape(
                &bbox, 0.1,
            ))))
        };
        if let Some(mut outline) = outline {
            canvas.put_vertices(&mut outline);
            let stroke = StrokeProps {
                width: 1.0,
                ..StrokeProps::default()
            };
            canvas.stroke_vertices(&Pattern::Solid(color), &stroke, 1.0, CompositeMode::Normal);
        }

        if editor.flags.contains(EditorFlags::SELECTED | EditorFlags::DETAIL)
            && editor.kind == EditorKind::Shape
        {
            paint_center_cross(canvas, bbox, self.options.center_cross_size, color);
        }

        if editor.shows_handles() {
            let half = self.options.annotation_size / 2.0;
            for corner in Corner::ALL {
                let at = corner.of(bbox);
                let handle = Rect::new(at.x - half, at.y - half, at.x + half, at.y + half);
                canvas.fill_rect(handle, color, 1.0, CompositeMode::Normal);
            }
        }
    }

    /// The handle of an open editor under the view point `point`.
    ///
    /// Later children are tested before earlier ones and before their parent.
    #[must_use]
    pub fn part_at(
        &self,
        doc: &Document,
        point: Point,
        view: Affine,
        tolerance: f64,
    ) -> Option<PartInfo> {
        self.part_in(doc, self.root?, point, view, tolerance)
    }

    fn part_in(
        &self,
        doc: &Document,
        element: NodeId,
        point: Point,
        view: Affine,
        tolerance: f64,
    ) -> Option<PartInfo> {
        let editor = self.editors.get(&element)?;
        for &child in editor.children.iter().rev() {
            if let Some(part) = self.part_in(doc, child, point, view, tolerance) {
                return Some(part);
            }
        }
        if !editor.shows_handles() {
            return None;
        }
        let bbox = self.view_bbox(doc, editor, view)?;
        let reach = self.options.annotation_size / 2.0 + tolerance;
        Corner::ALL
            .into_iter()
            .find(|corner| {
                let at = corner.of(bbox);
                (point.x - at.x).abs() <= reach && (point.y - at.y).abs() <= reach
            })
            .map(|corner| PartInfo {
                element,
                part: Part::ResizeHandle(corner),
            })
    }

    /// Previews `transform`, in scene coordinates, on the editor of `element`.
    ///
    /// The decoration switches to outline mode until the preview is applied
    /// or reset.
    pub fn transform(
        &mut self,
        doc: &Document,
        element: NodeId,
        transform: Affine,
        view: Affine,
        damage: &mut Damage,
    ) -> bool {
        if self.open(doc, element).is_none() {
            return false;
        }
        self.update(doc, element, view, damage, |e| {
            e.transform = Some(transform);
            e.flags.insert(EditorFlags::OUTLINE);
        });
        true
    }

    /// Writes the preview of `element` into the document and clears it.
    ///
    /// The preview is kept if the element rejects the transform.
    pub fn apply_transform(
        &mut self,
        doc: &mut Document,
        element: NodeId,
        view: Affine,
        damage: &mut Damage,
    ) -> Result<(), SceneError> {
        let Some(transform) = self.editors.get(&element).and_then(|e| e.transform) else {
            return Ok(());
        };
        let parent = doc.parent_transform(element);
        doc.transform_by(element, parent.inverse() * transform * parent)?;
        self.reset_transform(doc, element, view, damage);
        Ok(())
    }

    /// Discards the preview of `element`.
    pub fn reset_transform(
        &mut self,
        doc: &Document,
        element: NodeId,
        view: Affine,
        damage: &mut Damage,
    ) {
        if self.editors.get(&element).is_none_or(|e| e.transform.is_none()) {
            return;
        }
        self.update(doc, element, view, damage, |e| {
            e.transform = None;
            e.flags.remove(EditorFlags::OUTLINE);
        });
        self.prune(element);
    }
}

/// Strokes a diagonal cross of `size` view pixels at the center of `bbox`.
///
/// Nothing is drawn unless `bbox` is more than four crosses wide and high.
pub(crate) fn paint_center_cross(
    canvas: &mut dyn PaintCanvas,
    bbox: Rect,
    size: f64,
    color: peniko::Color,
) {
    let min = size * 4.0;
    if bbox.width() <= min || bbox.height() <= min {
        return;
    }
    let center = bbox.center();
    let (cx, cy) = (center.x.floor() + 0.5, center.y.floor() + 0.5);
    let r = size / 2.0 + 0.5;
    let mut cross = VertexContainer::new();
    cross.add_vertex(VertexCommand::Move, cx - r, cy - r);
    cross.add_vertex(VertexCommand::Line, cx + r, cy + r);
    cross.add_vertex(VertexCommand::Move, cx + r, cy - r);
    cross.add_vertex(VertexCommand::Line, cx - r, cy + r);
    canvas.put_vertices(&mut cross);
    let stroke = StrokeProps {
        width: 1.0,
        ..StrokeProps::default()
    };
    canvas.stroke_vertices(&Pattern::Solid(color), &stroke, 1.0, CompositeMode::Normal);
}
