// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asynchronous import and export of element subtrees.

use alloc::vec::Vec;
use core::future::Future;

use tracing::{debug, warn};

use crate::{Blob, Document, ExportError, ImportError, NodeId};

/// Turns external data into elements.
pub trait Importer {
    /// File extensions this importer understands, without the dot.
    fn extensions(&self) -> &[&str];

    /// Decodes `data` and attaches the result under `parent`.
    ///
    /// On success the new subtree's root is returned. On failure the document
    /// is left as it was.
    fn import(
        &self,
        data: &[u8],
        document: &mut Document,
        parent: NodeId,
    ) -> impl Future<Output = Result<NodeId, ImportError>>;
}

/// Turns an element subtree into external data. Exporting never mutates.
pub trait Exporter {
    /// File extensions this exporter produces, without the dot.
    fn extensions(&self) -> &[&str];

    /// Encodes `root` and its descendants.
    fn export(
        &self,
        document: &Document,
        root: NodeId,
    ) -> impl Future<Output = Result<Vec<u8>, ExportError>>;
}

/// Imports [`Blob`] JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonImporter;

impl Importer for JsonImporter {
    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    async fn import(
        &self,
        data: &[u8],
        document: &mut Document,
        parent: NodeId,
    ) -> Result<NodeId, ImportError> {
        let blob = Blob::from_slice(data)?;
        let node = document.restore(&blob)?;
        if let Err(err) = document.append_child(parent, node) {
            warn!(%err, "imported subtree rejected by its parent");
            document.destroy(node)?;
            return Err(err.into());
        }
        debug!(?node, ?parent, "imported subtree");
        Ok(node)
    }
}

/// Exports [`Blob`] JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    async fn export(&self, document: &Document, root: NodeId) -> Result<Vec<u8>, ExportError> {
        let blob = document.serialize(root)?;
        Ok(blob.to_json()?.into_bytes())
    }
}
