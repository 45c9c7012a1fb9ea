// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles and flag sets shared across the document model.

/// Identifier for a node in a [`Document`](crate::Document).
///
/// A small, copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On create, a fresh slot is allocated with generation `1`.
/// - Detaching a node does not free it; the handle stays valid and the node can
///   be inserted again.
/// - On [`destroy`](crate::Document::destroy), the slot is freed and every
///   `NodeId` that pointed to it becomes stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new,
///   distinct `NodeId`.
///
/// ### Liveness
///
/// Use [`Document::is_alive`](crate::Document::is_alive) to check whether a
/// `NodeId` still refers to a live node. Asynchronous work holds on to a
/// `NodeId` as its liveness token and checks it before touching the document.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    pub(crate) const fn generation(self) -> u32 {
        self.1
    }
}

bitflags::bitflags! {
    /// Per-element flags controlling painting, hit testing and editing.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u32 {
        /// Not painted and not hit.
        const HIDDEN      = 0b0000_0001;
        /// Painted, but not selectable by tools.
        const LOCKED      = 0b0000_0010;
        /// Not painted; still hit testable and editable.
        const NO_PAINT    = 0b0000_0100;
        /// A container that answers hit tests for its whole paint area.
        const HIT_AS_UNIT = 0b0000_1000;
    }
}

impl ElementFlags {
    /// Flags written by [`Document::serialize`](crate::Document::serialize).
    pub const PERSISTED: Self = Self::HIDDEN.union(Self::LOCKED).union(Self::HIT_AS_UNIT);
}

bitflags::bitflags! {
    /// Orthogonal behaviors an element variant is composed of.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Owns an affine transform applied to itself and its children.
        const TRANSFORM = 0b001;
        /// Owns a style chain.
        const STYLABLE  = 0b010;
        /// Holds child elements.
        const CONTAINER = 0b100;
    }
}

/// Handle returned by [`Document::subscribe`](crate::Document::subscribe).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(pub(crate) u64);
