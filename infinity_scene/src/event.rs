// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notification.
//!
//! Every mutation of a [`Document`](crate::Document) emits [`ChangeEvent`]s.
//! They are delivered synchronously, first to listeners on the target node and
//! then to listeners on each ancestor up to the root. Structural events target
//! the parent whose child list changed; property events target the changed node.

use alloc::boxed::Box;

use kurbo::Rect;

use crate::NodeId;

/// Which part of a node a [`Change::PropertyChange`] refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// Variant properties ([`Element`](crate::Element)).
    Element,
    /// The affine transform.
    Transform,
    /// The style chain.
    Style,
    /// [`ElementFlags`](crate::ElementFlags).
    Flags,
}

/// What changed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Change {
    /// `child` is about to be inserted into the target.
    BeforeInsert {
        /// The incoming child.
        child: NodeId,
    },
    /// `child` was inserted into the target.
    AfterInsert {
        /// The inserted child.
        child: NodeId,
    },
    /// `child` is about to be removed from the target.
    BeforeRemove {
        /// The outgoing child.
        child: NodeId,
    },
    /// `child` was removed from the target.
    AfterRemove {
        /// The removed child, now detached.
        child: NodeId,
    },
    /// A property of the target changed.
    PropertyChange {
        /// The property.
        property: Property,
    },
    /// An area of the scene needs repainting.
    Invalidate {
        /// Area in scene coordinates.
        area: Rect,
    },
}

/// A change and the node it happened at.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChangeEvent {
    /// Node the change happened at.
    pub target: NodeId,
    /// The change.
    pub change: Change,
}

pub(crate) type Listener = Box<dyn FnMut(&ChangeEvent)>;
