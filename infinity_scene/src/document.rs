// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The element arena: tree structure, properties and change dispatch.

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Affine, Rect};
use tracing::{debug, trace};

use crate::event::Listener;
use crate::{
    Capabilities, Change, ChangeEvent, Element, ElementFlags, ElementTag, ListenerId, NodeId,
    Property, SceneError, Style, validate_insertion,
};

/// Per-node record. Capability components are present exactly when the
/// variant declares the capability.
#[derive(Clone, Debug)]
pub(crate) struct NodeData {
    pub(crate) element: Element,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<Vec<NodeId>>,
    pub(crate) transform: Option<Affine>,
    pub(crate) style: Option<Style>,
    pub(crate) flags: ElementFlags,
    pub(crate) load_revision: u32,
}

impl NodeData {
    pub(crate) fn new(element: Element) -> Self {
        let caps = element.tag().capabilities();
        Self {
            element,
            parent: None,
            children: caps.contains(Capabilities::CONTAINER).then(Vec::new),
            transform: caps
                .contains(Capabilities::TRANSFORM)
                .then_some(Affine::IDENTITY),
            style: caps.contains(Capabilities::STYLABLE).then(Style::new),
            flags: ElementFlags::empty(),
            load_revision: 0,
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// A document: an arena of elements rooted at a [`Element::Scene`].
///
/// Nodes are created detached with [`create`](Self::create) and attached with
/// [`append_child`](Self::append_child) or
/// [`insert_child_before`](Self::insert_child_before). Removing a node only
/// detaches it; it stays alive for re-insertion until
/// [`destroy`](Self::destroy) frees it.
///
/// Every mutation emits [`ChangeEvent`]s to listeners registered with
/// [`subscribe`](Self::subscribe) on the node or one of its ancestors.
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    listeners: HashMap<NodeId, Vec<(ListenerId, Listener)>>,
    next_listener: u64,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let live = self.node_count();
        let listeners: usize = self.listeners.values().map(Vec::len).sum();
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("live_nodes", &live)
            .field("listeners", &listeners)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates a document holding only the root scene.
    #[must_use]
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 1),
            listeners: HashMap::new(),
            next_listener: 1,
        };
        doc.root = doc.alloc(NodeData::new(Element::Scene));
        doc
    }

    /// The root scene.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Creates a detached node holding `element`.
    pub fn create(&mut self, element: Element) -> NodeId {
        let id = self.alloc(NodeData::new(element));
        trace!(?id, "created node");
        id
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "documents never approach u32::MAX slots"
    )]
    pub(crate) fn alloc(&mut self, data: NodeData) -> NodeId {
        if let Some(idx) = self.free.pop() {
            let slot = &mut self.slots[idx as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.data = Some(data);
            NodeId::new(idx, slot.generation)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 1,
                data: Some(data),
            });
            NodeId::new(idx, 1)
        }
    }

    /// Frees a single slot without touching links. Used to unwind partial work.
    pub(crate) fn release(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.idx())
            && slot.generation == id.generation()
            && slot.data.take().is_some()
        {
            self.free.push(id.0);
            self.listeners.remove(&id);
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&NodeData> {
        let slot = self.slots.get(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.data.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        let slot = self.slots.get_mut(id.idx())?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.data.as_mut()
    }

    pub(crate) fn live(&self, id: NodeId) -> Result<&NodeData, SceneError> {
        self.node(id).ok_or(SceneError::StaleNode(id))
    }

    /// Returns `true` if `id` refers to a node that has not been destroyed.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Number of live nodes, attached or not, including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Returns `true` if `id` is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let mut top = id;
        while let Some(parent) = self.parent(top) {
            top = parent;
        }
        top == self.root
    }

    // --- read access ---

    /// The element stored at `id`.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id).map(|n| &n.element)
    }

    /// The variant tag of `id`.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<ElementTag> {
        self.node(id).map(|n| n.element.tag())
    }

    /// The parent of `id`, if attached to one.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    /// Children of `id` in paint order. Empty for leaves and stale handles.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id)
            .and_then(|n| n.children.as_deref())
            .unwrap_or(&[])
    }

    /// First (bottom-most) child.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    /// Last (top-most) child.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    /// The sibling painted right after `id`.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let at = siblings.iter().position(|&c| c == id)?;
        siblings.get(at + 1).copied()
    }

    /// The sibling painted right before `id`.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(id)?);
        let at = siblings.iter().position(|&c| c == id)?;
        at.checked_sub(1).and_then(|i| siblings.get(i).copied())
    }

    /// Ancestors of `id`, nearest first. Does not include `id`.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// `id` and all of its descendants in pre-order (paint order).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: if self.is_alive(id) {
                alloc::vec![id]
            } else {
                Vec::new()
            },
        }
    }

    /// The local transform of `id`, or `None` for variants without one.
    #[must_use]
    pub fn transform(&self, id: NodeId) -> Option<Affine> {
        self.node(id)?.transform
    }

    /// The style chain of `id`, or `None` for variants that are not stylable.
    #[must_use]
    pub fn style(&self, id: NodeId) -> Option<&Style> {
        self.node(id)?.style.as_ref()
    }

    /// Flags of `id`; empty for stale handles.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> ElementFlags {
        self.node(id).map(|n| n.flags).unwrap_or_default()
    }

    /// Returns `true` if `id` or any ancestor is hidden.
    #[must_use]
    pub fn is_hidden(&self, id: NodeId) -> bool {
        core::iter::once(id)
            .chain(self.ancestors(id))
            .any(|n| self.flags(n).contains(ElementFlags::HIDDEN))
    }

    // --- structure ---

    /// Appends `child` as the last (top-most) child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.insert_child_before(parent, child, None)
    }

    /// Inserts `child` into `parent` right before `reference`, or last when
    /// `reference` is `None`.
    ///
    /// All checks happen before the child list is touched, so on error the
    /// tree is unchanged and no events are emitted.
    pub fn insert_child_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), SceneError> {
        let parent_node = self.live(parent)?;
        let parent_tag = parent_node.element.tag();
        let child_node = self.live(child)?;
        let child_tag = child_node.element.tag();
        if child_node.parent.is_some() || child == self.root {
            return Err(SceneError::AlreadyAttached(child));
        }
        if child == parent || self.ancestors(parent).any(|a| a == child) {
            return Err(SceneError::WouldCycle);
        }
        if !validate_insertion(parent_tag, child_tag) {
            debug!(?parent_tag, ?child_tag, "rejected insertion");
            return Err(SceneError::InvalidInsertion {
                parent: parent_tag,
                child: child_tag,
            });
        }
        let siblings = self.children(parent);
        let index = match reference {
            None => siblings.len(),
            Some(r) => siblings
                .iter()
                .position(|&c| c == r)
                .ok_or(SceneError::NotAChild { parent, child: r })?,
        };

        self.emit(parent, Change::BeforeInsert { child });
        if let Some(list) = self.node_mut(parent).and_then(|n| n.children.as_mut()) {
            list.insert(index, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        debug!(?parent, ?child, index, "inserted child");
        self.emit(parent, Change::AfterInsert { child });
        if let Some(area) = self.invalidation_area(child) {
            self.emit(parent, Change::Invalidate { area });
        }
        Ok(())
    }

    /// Detaches `child` from `parent`. The child stays alive.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.live(parent)?;
        if self.live(child)?.parent != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        let area = self.invalidation_area(child);
        self.emit(parent, Change::BeforeRemove { child });
        if let Some(list) = self.node_mut(parent).and_then(|n| n.children.as_mut()) {
            list.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        debug!(?parent, ?child, "removed child");
        self.emit(parent, Change::AfterRemove { child });
        if let Some(area) = area {
            self.emit(parent, Change::Invalidate { area });
        }
        Ok(())
    }

    /// Frees a detached subtree. Every handle into it becomes stale.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), SceneError> {
        if self.live(id)?.parent.is_some() || id == self.root {
            return Err(SceneError::AlreadyAttached(id));
        }
        let doomed: Vec<NodeId> = self.descendants(id).collect();
        for node in &doomed {
            self.release(*node);
        }
        debug!(?id, count = doomed.len(), "destroyed subtree");
        Ok(())
    }

    // --- properties ---

    /// Replaces the variant properties of `id`. The variant itself must not change.
    pub fn set_element(&mut self, id: NodeId, element: Element) -> Result<(), SceneError> {
        self.update_element(id, |e| *e = element)
    }

    /// Edits the variant properties of `id` in place.
    ///
    /// Fails with [`SceneError::Unsupported`] if `edit` changes the variant.
    pub fn update_element(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut Element),
    ) -> Result<(), SceneError> {
        self.change_property(id, Property::Element, |node| {
            let mut element = node.element.clone();
            edit(&mut element);
            if element.tag() != node.element.tag() {
                return Err(SceneError::Unsupported("changing an element's variant"));
            }
            node.element = element;
            Ok(())
        })
    }

    /// Replaces the transform of `id`.
    pub fn set_transform(&mut self, id: NodeId, transform: Affine) -> Result<(), SceneError> {
        self.change_property(id, Property::Transform, |node| match &mut node.transform {
            Some(t) => {
                *t = transform;
                Ok(())
            }
            None => Err(SceneError::Unsupported("set_transform")),
        })
    }

    /// Applies `transform` after the current transform of `id`.
    pub fn transform_by(&mut self, id: NodeId, transform: Affine) -> Result<(), SceneError> {
        self.change_property(id, Property::Transform, |node| match &mut node.transform {
            Some(t) => {
                *t = transform * *t;
                Ok(())
            }
            None => Err(SceneError::Unsupported("transform_by")),
        })
    }

    /// Replaces the style chain of `id`.
    pub fn set_style(&mut self, id: NodeId, style: Style) -> Result<(), SceneError> {
        style.validate()?;
        self.change_property(id, Property::Style, |node| match &mut node.style {
            Some(s) => {
                *s = style;
                Ok(())
            }
            None => Err(SceneError::Unsupported("set_style")),
        })
    }

    /// Edits the style chain of `id`; the edit is discarded if it fails.
    pub fn update_style(
        &mut self,
        id: NodeId,
        edit: impl FnOnce(&mut Style) -> Result<(), SceneError>,
    ) -> Result<(), SceneError> {
        self.change_property(id, Property::Style, |node| {
            let current = node
                .style
                .as_mut()
                .ok_or(SceneError::Unsupported("update_style"))?;
            let mut style = current.clone();
            edit(&mut style)?;
            style.validate()?;
            *current = style;
            Ok(())
        })
    }

    /// Replaces the flags of `id`.
    pub fn set_flags(&mut self, id: NodeId, flags: ElementFlags) -> Result<(), SceneError> {
        if self.live(id)?.flags == flags {
            return Ok(());
        }
        self.change_property(id, Property::Flags, |node| {
            node.flags = flags;
            Ok(())
        })
    }

    /// Sets or clears `flag` on `id`.
    pub fn set_flag(&mut self, id: NodeId, flag: ElementFlags, on: bool) -> Result<(), SceneError> {
        let mut flags = self.live(id)?.flags;
        flags.set(flag, on);
        self.set_flags(id, flags)
    }

    /// Runs `edit` on the node record and emits the property and repaint events.
    ///
    /// `edit` must leave the record untouched when it returns an error.
    pub(crate) fn change_property(
        &mut self,
        id: NodeId,
        property: Property,
        edit: impl FnOnce(&mut NodeData) -> Result<(), SceneError>,
    ) -> Result<(), SceneError> {
        let before = self.invalidation_area(id);
        let node = self.node_mut(id).ok_or(SceneError::StaleNode(id))?;
        edit(node)?;
        trace!(?id, ?property, "property changed");
        self.emit(id, Change::PropertyChange { property });
        let after = self.invalidation_area(id);
        let area = match (before, after) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        };
        if let Some(area) = area {
            self.emit(id, Change::Invalidate { area });
        }
        Ok(())
    }

    /// Paint bounds of an attached, visible node.
    fn invalidation_area(&self, id: NodeId) -> Option<Rect> {
        if !self.is_attached(id) {
            return None;
        }
        self.paint_bbox(id)
    }

    // --- listeners ---

    /// Registers `listener` for changes at `node` and its descendants.
    pub fn subscribe(
        &mut self,
        node: NodeId,
        listener: impl FnMut(&ChangeEvent) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners
            .entry(node)
            .or_default()
            .push((id, alloc::boxed::Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, listener: ListenerId) -> bool {
        let mut found = false;
        self.listeners.retain(|_, list| {
            let before = list.len();
            list.retain(|(id, _)| *id != listener);
            found |= list.len() != before;
            !list.is_empty()
        });
        found
    }

    /// Delivers a change to `target` and then to each of its ancestors.
    pub(crate) fn emit(&mut self, target: NodeId, change: Change) {
        if self.listeners.is_empty() {
            return;
        }
        let event = ChangeEvent { target, change };
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(list) = self.listeners.get_mut(&node) {
                for (_, listener) in list.iter_mut() {
                    listener(&event);
                }
            }
            current = self.parent(node);
        }
    }
}

/// Pre-order iterator returned by [`Document::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let next = self.stack.pop()?;
        self.stack
            .extend(self.document.children(next).iter().rev().copied());
        Some(next)
    }
}
