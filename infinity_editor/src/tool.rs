// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tools and the tool registry.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use infinity_paint::PaintCanvas;
use kurbo::Point;
use tracing::debug;

use crate::{
    Editor, EllipseFactory, LineFactory, RectangleFactory, SelectTarget, SelectTool, ShapeTool,
    ToolError,
};

/// Where a tool is in its gesture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ToolState {
    /// Waiting for a pointer press.
    #[default]
    Idle,
    /// Following a pressed pointer.
    Tracking,
    /// The gesture was aborted; the rest of it is ignored until release.
    Cancelled,
}

bitflags::bitflags! {
    /// Keyboard modifiers held during a pointer event.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Shift: keep ratio, extend selection.
        const SHIFT  = 0b01;
        /// Option/Alt: from center.
        const OPTION = 0b10;
    }
}

/// Pointer phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// Button pressed.
    Down,
    /// Pointer moved.
    Move,
    /// Button released.
    Up,
}

/// A pointer event in view pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    /// Phase.
    pub kind: PointerKind,
    /// Position in view pixels.
    pub position: Point,
    /// Held modifiers.
    pub modifiers: Modifiers,
}

impl PointerEvent {
    /// A press at `position`.
    #[must_use]
    pub fn down(position: impl Into<Point>) -> Self {
        Self::new(PointerKind::Down, position.into())
    }

    /// A move to `position`.
    #[must_use]
    pub fn moved(position: impl Into<Point>) -> Self {
        Self::new(PointerKind::Move, position.into())
    }

    /// A release at `position`.
    #[must_use]
    pub fn up(position: impl Into<Point>) -> Self {
        Self::new(PointerKind::Up, position.into())
    }

    /// The same event with `modifiers` held.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    const fn new(kind: PointerKind, position: Point) -> Self {
        Self {
            kind,
            position,
            modifiers: Modifiers::empty(),
        }
    }
}

/// Name under which a tool is registered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ToolId(pub &'static str);

impl ToolId {
    /// Selects top-level layer items.
    pub const POINTER: Self = Self("pointer");
    /// Selects layers.
    pub const LAYER: Self = Self("layer");
    /// Selects pages.
    pub const PAGE: Self = Self("page");
    /// Draws rectangles.
    pub const RECTANGLE: Self = Self("rectangle");
    /// Draws ellipses.
    pub const ELLIPSE: Self = Self("ellipse");
    /// Draws lines.
    pub const LINE: Self = Self("line");
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// An interaction handler that turns pointer events into document edits.
///
/// Tools recover from their own failures: a rejected mutation is logged and
/// the tool returns to [`ToolState::Idle`] with the document unchanged.
pub trait Tool {
    /// Human-readable name.
    fn name(&self) -> &'static str;

    /// Current gesture state.
    fn state(&self) -> ToolState;

    /// Pointer pressed.
    fn pointer_down(&mut self, editor: &mut Editor, event: &PointerEvent);

    /// Pointer moved, pressed or not.
    fn pointer_move(&mut self, editor: &mut Editor, event: &PointerEvent);

    /// Pointer released.
    fn pointer_up(&mut self, editor: &mut Editor, event: &PointerEvent);

    /// Aborts the current gesture, undoing its previews.
    fn cancel(&mut self, editor: &mut Editor);

    /// Whether another tool may take over now.
    fn is_deactivatable(&self) -> bool {
        self.state() != ToolState::Tracking
    }

    /// Called when another tool takes over.
    fn deactivate(&mut self, editor: &mut Editor) {
        let _ = editor;
    }

    /// Paints gesture feedback in view pixels.
    fn paint(&self, editor: &Editor, canvas: &mut dyn PaintCanvas) {
        let _ = (editor, canvas);
    }

    /// Routes `event` by kind.
    fn handle(&mut self, editor: &mut Editor, event: &PointerEvent) {
        match event.kind {
            PointerKind::Down => self.pointer_down(editor, event),
            PointerKind::Move => self.pointer_move(editor, event),
            PointerKind::Up => self.pointer_up(editor, event),
        }
    }
}

/// The set of available tools and which one is active.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<(ToolId, Box<dyn Tool>)>,
    active: Option<usize>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<ToolId> = self.tools.iter().map(|(id, _)| *id).collect();
        f.debug_struct("ToolRegistry")
            .field("tools", &ids)
            .field("active", &self.active_id())
            .finish()
    }
}

impl ToolRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the selection and shape tools, with the pointer
    /// tool active.
    #[must_use]
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();
        registry.register(ToolId::POINTER, SelectTool::new(SelectTarget::Pointer));
        registry.register(ToolId::LAYER, SelectTool::new(SelectTarget::Layer));
        registry.register(ToolId::PAGE, SelectTool::new(SelectTarget::Page));
        registry.register(ToolId::RECTANGLE, ShapeTool::new(RectangleFactory));
        registry.register(ToolId::ELLIPSE, ShapeTool::new(EllipseFactory));
        registry.register(ToolId::LINE, ShapeTool::new(LineFactory));
        registry.active = Some(0);
        registry
    }

    /// Adds `tool` under `id`, replacing a tool registered under the same id.
    pub fn register(&mut self, id: ToolId, tool: impl Tool + 'static) {
        let tool: Box<dyn Tool> = Box::new(tool);
        match self.tools.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = tool,
            None => self.tools.push((id, tool)),
        }
    }

    /// Registered ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = ToolId> + '_ {
        self.tools.iter().map(|(id, _)| *id)
    }

    /// Id of the active tool.
    #[must_use]
    pub fn active_id(&self) -> Option<ToolId> {
        self.active.map(|i| self.tools[i].0)
    }

    /// The active tool.
    #[must_use]
    pub fn active(&self) -> Option<&dyn Tool> {
        self.active.map(|i| &*self.tools[i].1)
    }

    /// Makes the tool registered as `id` active.
    ///
    /// Fails with [`ToolError::Busy`] while the active tool is tracking a
    /// gesture, leaving it active.
    pub fn activate(&mut self, editor: &mut Editor, id: ToolId) -> Result<(), ToolError> {
        let index = self
            .tools
            .iter()
            .position(|(existing, _)| *existing == id)
            .ok_or(ToolError::UnknownTool(id))?;
        if self.active == Some(index) {
            return Ok(());
        }
        if let Some(current) = self.active {
            let (current_id, tool) = &mut self.tools[current];
            if !tool.is_deactivatable() {
                return Err(ToolError::Busy(*current_id));
            }
            tool.deactivate(editor);
        }
        self.active = Some(index);
        debug!(tool = %id, "tool activated");
        Ok(())
    }

    /// Forwards `event` to the active tool and processes the resulting
    /// document changes.
    pub fn dispatch(&mut self, editor: &mut Editor, event: &PointerEvent) {
        if let Some(index) = self.active {
            self.tools[index].1.handle(editor, event);
        }
        editor.process_changes();
    }

    /// Cancels the gesture of the active tool.
    pub fn cancel(&mut self, editor: &mut Editor) {
        if let Some(index) = self.active {
            self.tools[index].1.cancel(editor);
        }
        editor.process_changes();
    }

    /// Paints the feedback of the active tool.
    pub fn paint(&self, editor: &Editor, canvas: &mut dyn PaintCanvas) {
        if let Some(tool) = self.active() {
            tool.paint(editor, canvas);
        }
    }
}
