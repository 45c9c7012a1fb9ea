// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use infinity_scene::{NodeId, SceneError};

use crate::ToolId;

/// Failure of an editing operation started by a tool or by the host.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// The document rejected the mutation.
    #[error(transparent)]
    Scene(#[from] SceneError),
    /// The active tool is in the middle of a gesture.
    #[error("tool `{0}` cannot be deactivated while tracking")]
    Busy(ToolId),
    /// No tool is registered under this id.
    #[error("no tool registered as `{0}`")]
    UnknownTool(ToolId),
    /// There is no layer to insert new elements into.
    #[error("no active layer")]
    NoActiveLayer,
    /// The element is not part of the document tree.
    #[error("element {0:?} is not attached to the document")]
    Detached(NodeId),
}
