// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persistence of element subtrees as [`Blob`]s.
//!
//! A blob carries the element's type name under `@type`, its properties as
//! sibling keys and its children under `$`:
//!
//! ```json
//! { "@type": "layer", "name": "Background", "$": [ { "@type": "rectangle" } ] }
//! ```
//!
//! Only properties that differ from the variant defaults are written.
//! Transforms, styles and persisted flags use the reserved keys `transform`,
//! `style` and `flags`.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use kurbo::Affine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::document::NodeData;
use crate::{
    Capabilities, Document, Element, ElementFlags, ElementTag, NodeId, SceneError,
    SerializationError, Style,
};

const TRANSFORM: &str = "transform";
const STYLE: &str = "style";
const FLAGS: &str = "flags";

/// Serialized form of an element subtree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    /// Element type name, as given by [`ElementTag::name`].
    #[serde(rename = "@type")]
    pub kind: String,
    /// Properties keyed by name, in key order.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
    /// Child blobs in paint order.
    #[serde(rename = "$", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl Blob {
    /// Encodes the blob as compact JSON.
    pub fn to_json(&self) -> Result<String, SerializationError> {
        serde_json::to_string(self).map_err(json_error)
    }

    /// Decodes a blob from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SerializationError> {
        serde_json::from_str(text).map_err(json_error)
    }

    /// Decodes a blob from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SerializationError> {
        serde_json::from_slice(bytes).map_err(json_error)
    }
}

fn json_error(err: serde_json::Error) -> SerializationError {
    SerializationError::Json(err.to_string())
}

fn malformed(kind: &str, property: &str, reason: impl ToString) -> SerializationError {
    SerializationError::MalformedProperty {
        kind: kind.into(),
        property: property.into(),
        reason: reason.to_string(),
    }
}

/// Serializes `props`, keeping only the fields that differ from `P::default()`.
fn changed_fields<P: Serialize + Default>(props: &P) -> Result<Map<String, Value>, SerializationError> {
    let Value::Object(mut fields) = serde_json::to_value(props).map_err(json_error)? else {
        return Ok(Map::new());
    };
    if let Value::Object(defaults) = serde_json::to_value(P::default()).map_err(json_error)? {
        fields.retain(|key, value| defaults.get(key) != Some(value));
    }
    Ok(fields)
}

fn element_fields(element: &Element) -> Result<Map<String, Value>, SerializationError> {
    match element {
        Element::Scene | Element::Group | Element::ShapeSet => Ok(Map::new()),
        Element::Page(p) => changed_fields(p),
        Element::LayerSet(p) => changed_fields(p),
        Element::Layer(p) => changed_fields(p),
        Element::Rectangle(p) => changed_fields(p),
        Element::Ellipse(p) => changed_fields(p),
        Element::Path(p) => changed_fields(p),
        Element::Image(p) => changed_fields(p),
        Element::Slice(p) => changed_fields(p),
    }
}

fn parse_props<P: DeserializeOwned>(
    tag: ElementTag,
    fields: Map<String, Value>,
) -> Result<P, SerializationError> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| malformed(tag.name(), "*", e))
}

fn parse_element(tag: ElementTag, fields: Map<String, Value>) -> Result<Element, SerializationError> {
    Ok(match tag {
        ElementTag::Scene => Element::Scene,
        ElementTag::Group => Element::Group,
        ElementTag::ShapeSet => Element::ShapeSet,
        ElementTag::Page => Element::Page(parse_props(tag, fields)?),
        ElementTag::LayerSet => Element::LayerSet(parse_props(tag, fields)?),
        ElementTag::Layer => Element::Layer(parse_props(tag, fields)?),
        ElementTag::Rectangle => Element::Rectangle(parse_props(tag, fields)?),
        ElementTag::Ellipse => Element::Ellipse(parse_props(tag, fields)?),
        ElementTag::Path => Element::Path(parse_props(tag, fields)?),
        ElementTag::Image => Element::Image(parse_props(tag, fields)?),
        ElementTag::Slice => Element::Slice(parse_props(tag, fields)?),
    })
}

impl Document {
    /// Serializes `id` and its descendants.
    pub fn serialize(&self, id: NodeId) -> Result<Blob, SceneError> {
        let node = self.live(id)?;
        let mut properties = element_fields(&node.element)?;
        if let Some(transform) = node.transform
            && transform != Affine::IDENTITY
        {
            let coeffs = serde_json::to_value(transform.as_coeffs()).map_err(json_error)?;
            properties.insert(TRANSFORM.into(), coeffs);
        }
        if let Some(style) = &node.style
            && !style.is_default()
        {
            properties.insert(STYLE.into(), serde_json::to_value(style).map_err(json_error)?);
        }
        let flags = node.flags & ElementFlags::PERSISTED;
        if !flags.is_empty() {
            properties.insert(FLAGS.into(), Value::from(flags.bits()));
        }
        let children = self
            .children(id)
            .iter()
            .map(|&child| self.serialize(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Blob {
            kind: node.element.tag().name().into(),
            properties,
            children,
        })
    }

    /// Rebuilds a detached subtree from `blob` and returns its root.
    ///
    /// Children are linked directly, without consulting the insertion rules,
    /// so a subtree can be restored before its eventual parent exists. On
    /// failure every node created by the attempt is freed.
    pub fn restore(&mut self, blob: &Blob) -> Result<NodeId, SerializationError> {
        if blob.kind == ElementTag::Scene.name() {
            return Err(SerializationError::RootMismatch {
                expected: "element",
                found: blob.kind.clone(),
            });
        }
        let mut created = Vec::new();
        match self.restore_node(blob, &mut created) {
            Ok(id) => {
                debug!(?id, nodes = created.len(), "restored subtree");
                Ok(id)
            }
            Err(err) => {
                warn!(%err, nodes = created.len(), "restore failed, discarding partial subtree");
                for id in created {
                    self.release(id);
                }
                Err(err)
            }
        }
    }

    fn restore_node(
        &mut self,
        blob: &Blob,
        created: &mut Vec<NodeId>,
    ) -> Result<NodeId, SerializationError> {
        let tag = ElementTag::from_name(&blob.kind)
            .ok_or_else(|| SerializationError::UnknownType(blob.kind.clone()))?;
        let kind = tag.name();
        let caps = tag.capabilities();
        let mut fields = blob.properties.clone();
        let transform = fields.remove(TRANSFORM);
        let style = fields.remove(STYLE);
        let flags = fields.remove(FLAGS);

        let mut data = NodeData::new(parse_element(tag, fields)?);
        if let Some(value) = transform {
            if !caps.contains(Capabilities::TRANSFORM) {
                return Err(malformed(kind, TRANSFORM, "element has no transform"));
            }
            let coeffs: [f64; 6] =
                serde_json::from_value(value).map_err(|e| malformed(kind, TRANSFORM, e))?;
            data.transform = Some(Affine::new(coeffs));
        }
        if let Some(value) = style {
            if !caps.contains(Capabilities::STYLABLE) {
                return Err(malformed(kind, STYLE, "element is not stylable"));
            }
            let style: Style =
                serde_json::from_value(value).map_err(|e| malformed(kind, STYLE, e))?;
            style.validate().map_err(|e| malformed(kind, STYLE, e))?;
            data.style = Some(style);
        }
        if let Some(value) = flags {
            let bits = value
                .as_u64()
                .and_then(|b| u32::try_from(b).ok())
                .ok_or_else(|| malformed(kind, FLAGS, "expected an unsigned integer"))?;
            data.flags = ElementFlags::from_bits_truncate(bits) & ElementFlags::PERSISTED;
        }
        if !blob.children.is_empty() && !caps.contains(Capabilities::CONTAINER) {
            return Err(malformed(kind, "$", "element cannot hold children"));
        }

        let id = self.alloc(data);
        created.push(id);
        for child_blob in &blob.children {
            let child = self.restore_node(child_blob, created)?;
            if let Some(node) = self.node_mut(child) {
                node.parent = Some(id);
            }
            if let Some(list) = self.node_mut(id).and_then(|n| n.children.as_mut()) {
                list.push(child);
            }
        }
        Ok(id)
    }

    /// Serializes the whole document.
    pub fn to_blob(&self) -> Result<Blob, SceneError> {
        self.serialize(self.root())
    }

    /// Builds a document from a blob produced by [`to_blob`](Self::to_blob).
    pub fn from_blob(blob: &Blob) -> Result<Self, SerializationError> {
        if blob.kind != ElementTag::Scene.name() {
            return Err(SerializationError::RootMismatch {
                expected: ElementTag::Scene.name(),
                found: blob.kind.clone(),
            });
        }
        let mut document = Self::new();
        let root = document.root();
        for child_blob in &blob.children {
            let child = document.restore(child_blob)?;
            if let Some(node) = document.node_mut(child) {
                node.parent = Some(root);
            }
            if let Some(list) = document.node_mut(root).and_then(|n| n.children.as_mut()) {
                list.push(child);
            }
        }
        Ok(document)
    }
}
