// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Infinity Scene: the document model of a vector graphics editor.
//!
//! A [`Document`] is an arena of elements rooted at a scene. The hierarchy is
//! typed: pages live under the scene, layers and layer sets under pages,
//! shapes and groups under layers. [`validate_insertion`] is the single rule
//! table, and every structural mutation checks it before touching the tree.
//!
//! - [`Element`]: a closed set of variants with variant-specific properties.
//! - [`Capabilities`]: which shared behaviors (transform, style, children) a
//!   variant is composed of. Components are present on a node exactly when
//!   its variant declares them.
//! - [`Style`]: an ordered chain of vector effects, effects, filters and paints.
//!   Paint entries always come last.
//! - [`ChangeEvent`]: synchronous notification of every mutation, bubbling from
//!   the target node to the root.
//! - [`Damage`]: an accumulator for the repaint areas those events carry.
//! - [`Blob`]: the persisted form of a subtree, with [`Importer`] and
//!   [`Exporter`] as the asynchronous file boundary.
//!
//! ## Identity and liveness
//!
//! Nodes are addressed by generational [`NodeId`] handles. Removing a node from
//! its parent only detaches it; [`Document::destroy`] frees it, after which old
//! handles are rejected. Asynchronous work (image loads, imports) holds a handle
//! or a [`LoadTicket`] and checks liveness before it mutates anything.
//!
//! ## Minimal example
//!
//! ```rust
//! use infinity_scene::{Document, Element, PatternPaint, RectangleProps};
//! use kurbo::{Affine, Rect};
//! use peniko::Color;
//!
//! let mut doc = Document::new();
//! let page = doc.create(Element::page("Page 1", Rect::new(0.0, 0.0, 200.0, 100.0)));
//! doc.append_child(doc.root(), page).unwrap();
//! let layer = doc.create(Element::layer("Layer 1"));
//! doc.append_child(page, layer).unwrap();
//!
//! let rect = doc.create(Element::Rectangle(RectangleProps::default()));
//! doc.set_transform(rect, Affine::translate((50.0, 50.0)) * Affine::scale(30.0)).unwrap();
//! doc.update_style(rect, |s| s.push(PatternPaint::fill(Color::BLACK))).unwrap();
//! doc.append_child(layer, rect).unwrap();
//!
//! assert_eq!(doc.paint_bbox(rect), Some(Rect::new(20.0, 20.0, 80.0, 80.0)));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod damage;
mod document;
mod element;
mod error;
mod event;
mod geometry;
mod image;
mod io;
mod serialize;
mod style;
mod types;

pub use damage::Damage;
pub use document::{Descendants, Document};
pub use element::{
    Anchor, Element, ElementTag, EllipseProps, ImageProps, LayerProps, LayerSetProps, PageProps,
    PathProps, RectangleProps, SliceProps, validate_insertion,
};
pub use error::{ExportError, ImportError, LoadError, SceneError, SerializationError};
pub use event::{Change, ChangeEvent, Property};
pub use geometry::local_geometry;
pub use image::{ImageData, ImageLoader, ImageState, LoadTicket, load_image};
pub use io::{Exporter, Importer, JsonExporter, JsonImporter};
pub use serialize::Blob;
pub use style::{
    CompositeMode, EffectEntry, FilterEntry, GradientStop, LineCap, LineJoin, PaintKind, Pattern,
    PatternPaint, ShadowEffect, StrokeAlignment, StrokeProps, Style, StyleEntry, VectorEffect,
    add_insets,
};
pub use types::{Capabilities, ElementFlags, ListenerId, NodeId};
