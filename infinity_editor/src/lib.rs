// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Infinity Editor: interactive editing on top of an Infinity document.
//!
//! An [`Editor`] owns a [`Document`](infinity_scene::Document) together with
//! everything that is interaction state rather than content:
//!
//! - the [`Selection`] of elements,
//! - the element editor overlay ([`Editors`]), a registry of decorators keyed
//!   by element that paint outlines and handles without touching the model,
//! - the view transform and the view-space [`Damage`](infinity_scene::Damage)
//!   the host repaints.
//!
//! [`Tool`]s are small state machines (`Idle`, `Tracking`, `Cancelled`) that
//! turn [`PointerEvent`]s into document edits. A [`ToolRegistry`] holds the
//! available tools and routes events to the active one:
//!
//! - [`ShapeTool`] drags out rectangles, ellipses and lines through a
//!   [`ShapeFactory`].
//! - [`SelectTool`] clicks, marquee-selects and moves elements of one
//!   [`SelectTarget`] kind.
//!
//! ## Minimal example
//!
//! ```rust
//! use infinity_editor::{Editor, EditorOptions, PointerEvent, ToolId, ToolRegistry};
//! use infinity_scene::ElementTag;
//! use kurbo::Rect;
//!
//! let mut editor =
//!     Editor::new_with_page("Page", Rect::new(0.0, 0.0, 200.0, 200.0), EditorOptions::default())
//!         .unwrap();
//! let mut tools = ToolRegistry::with_default_tools();
//! tools.activate(&mut editor, ToolId::RECTANGLE).unwrap();
//!
//! tools.dispatch(&mut editor, &PointerEvent::down((20.0, 20.0)));
//! tools.dispatch(&mut editor, &PointerEvent::moved((80.0, 60.0)));
//! tools.dispatch(&mut editor, &PointerEvent::up((80.0, 60.0)));
//!
//! let rect = *editor.selection().primary().unwrap();
//! assert_eq!(editor.document().tag(rect), Some(ElementTag::Rectangle));
//! assert_eq!(
//!     editor.document().geometry_bbox(rect),
//!     Some(Rect::new(20.0, 20.0, 80.0, 60.0))
//! );
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod drag;
mod editor;
mod editors;
mod error;
mod options;
mod select_tool;
mod selection;
mod shape_tool;
mod tool;

pub use drag::DragState;
pub use editor::Editor;
pub use editors::{Corner, EditorFlags, EditorKind, Editors, ElementEditor, Part, PartInfo};
pub use error::ToolError;
pub use options::EditorOptions;
pub use select_tool::{SelectTarget, SelectTool};
pub use selection::Selection;
pub use shape_tool::{
    EllipseFactory, LineFactory, RectangleFactory, ShapeFactory, ShapeTool, drag_geometry,
};
pub use tool::{Modifiers, PointerEvent, PointerKind, Tool, ToolId, ToolRegistry, ToolState};
