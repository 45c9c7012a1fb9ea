// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::string::String;

use crate::{ElementTag, NodeId};

/// Failure of a structural or property mutation.
///
/// The document is left unchanged whenever one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    /// The child's variant may not live under the parent's variant.
    #[error("{child:?} cannot be inserted under {parent:?}")]
    InvalidInsertion {
        /// Tag of the would-be parent.
        parent: ElementTag,
        /// Tag of the rejected child.
        child: ElementTag,
    },
    /// The operation is not implemented for this variant.
    #[error("`{0}` is not supported here")]
    Unsupported(&'static str),
    /// The handle refers to a destroyed node.
    #[error("node {0:?} is no longer alive")]
    StaleNode(NodeId),
    /// The node is not a child of the given parent.
    #[error("{child:?} is not a child of {parent:?}")]
    NotAChild {
        /// The parent that was searched.
        parent: NodeId,
        /// The missing child or reference node.
        child: NodeId,
    },
    /// The node must be detached first.
    #[error("node {0:?} already has a parent")]
    AlreadyAttached(NodeId),
    /// The node is an ancestor of the target parent.
    #[error("inserting the node would make it its own ancestor")]
    WouldCycle,
    /// A non-paint style entry was placed after a paint entry.
    #[error("style entries must not follow a paint entry")]
    InvalidStyleOrder,
    /// A numeric style parameter is NaN or infinite.
    #[error("style parameter `{0}` must be finite")]
    NonFiniteStyleValue(&'static str),
    /// Serializing the subtree failed.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
}

/// Failure to turn a [`Blob`](crate::Blob) back into elements, or the reverse.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    /// The type tag names no known variant.
    #[error("unknown element type `{0}`")]
    UnknownType(String),
    /// A property could not be decoded or is not allowed on the variant.
    #[error("malformed property `{property}` on `{kind}`: {reason}")]
    MalformedProperty {
        /// Type tag of the offending blob.
        kind: String,
        /// Property name.
        property: String,
        /// Decoder message.
        reason: String,
    },
    /// The root of a document blob must be a scene, and a scene cannot be restored as a subtree.
    #[error("expected a {expected} blob, found `{found}`")]
    RootMismatch {
        /// What the caller asked for.
        expected: &'static str,
        /// The type tag found.
        found: String,
    },
    /// The JSON text itself is invalid.
    #[error("invalid JSON: {0}")]
    Json(String),
}

/// Failure of an asynchronous resource load.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The loader could not produce the resource.
    #[error("resource load failed: {0}")]
    Failed(String),
    /// The element was destroyed, detached or reloaded before the result arrived.
    #[error("load result arrived for a detached or superseded element")]
    Stale,
    /// The node is not an image.
    #[error("node is not an image")]
    NotAnImage,
    /// Pixel data does not match the declared size.
    #[error("pixel buffer of {len} bytes does not match {width}x{height}")]
    InvalidData {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Actual byte length.
        len: usize,
    },
}

/// Failure of an [`Importer`](crate::Importer).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ImportError {
    /// The data could not be decoded.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    /// The decoded subtree does not fit under the target parent.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Failure of an [`Exporter`](crate::Exporter).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// The subtree could not be read.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// The subtree could not be encoded.
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    /// Nothing visible to export.
    #[error("nothing to export")]
    Empty,
    /// The output encoder failed.
    #[error("encoding failed: {0}")]
    Encode(String),
}
