// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Infinity Vertex: lazy vertex sources and vertex filters.
//!
//! Every piece of geometry in the editor is expressed as a [`VertexSource`]: a
//! restartable, lazily evaluated sequence of [`Vertex`] records. Shapes produce
//! sources, transforms and vector effects wrap sources, and canvases consume them.
//!
//! The protocol is deliberately tiny:
//! - [`VertexSource::rewind`] moves the read cursor to a vertex index and reports
//!   whether that index is valid.
//! - [`VertexSource::read_vertex`] fills a caller-provided [`Vertex`] and advances.
//!
//! Filters such as [`VertexTransformer`] never materialize the source they wrap.
//! Each read pulls exactly one vertex from the inner source and rewrites it, so
//! nesting filters composes them in construction order (innermost first).
//!
//! ## Curves
//!
//! A [`VertexCommand::Curve`] vertex carries the end point of a quadratic segment
//! and is followed by one control vertex. A [`VertexCommand::Curve2`] vertex carries
//! the end point of a cubic segment and is followed by two control vertices. Control
//! vertices repeat the command of the curve they belong to.
//!
//! ## Minimal example
//!
//! ```rust
//! use infinity_vertex::{Vertex, VertexCommand, VertexContainer, VertexSource, VertexTransformer};
//! use kurbo::Affine;
//!
//! let mut square = VertexContainer::new();
//! square.add_vertex(VertexCommand::Move, 0.0, 0.0);
//! square.add_vertex(VertexCommand::Line, 1.0, 0.0);
//! square.add_vertex(VertexCommand::Line, 1.0, 1.0);
//! square.add_vertex(VertexCommand::Close, 0.0, 0.0);
//!
//! let mut scaled = VertexTransformer::new(&mut square, Affine::scale(10.0));
//! let mut vertex = Vertex::default();
//! assert!(scaled.rewind(0));
//! assert!(scaled.read_vertex(&mut vertex));
//! assert!(scaled.read_vertex(&mut vertex));
//! assert_eq!((vertex.x, vertex.y), (10.0, 0.0));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod hit;
mod path;
mod source;
mod transform;

pub use path::{bounds, to_bez_path};
pub use source::{Vertex, VertexCommand, VertexContainer, VertexSource};
pub use transform::{VertexPixelAligner, VertexTransformer, VertexTranslator};
