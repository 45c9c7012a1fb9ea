// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Asynchronous image loading guarded by liveness tickets.
//!
//! Image pixels arrive after the element exists. A load is split in two so
//! the host can keep using the document while the future is pending:
//!
//! 1. [`Document::begin_image_load`] marks the image pending and hands out a
//!    [`LoadTicket`].
//! 2. [`Document::finish_image_load`] applies the result, but only if the
//!    ticket still refers to a live, attached image whose load was not
//!    superseded by a later `begin_image_load`.
//!
//! [`load_image`] runs both steps around an [`ImageLoader`].

use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::future::Future;

use tracing::{debug, warn};

use crate::{Change, Document, Element, LoadError, NodeId, Property, SceneError};

/// Decoded pixels: premultiplied RGBA8, row-major, no padding.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Arc<Vec<u8>>,
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl ImageData {
    /// Wraps a premultiplied RGBA8 buffer of `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, LoadError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if width == 0 || height == 0 || expected != Some(pixels.len()) {
            return Err(LoadError::InvalidData {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: Arc::new(pixels),
        })
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied RGBA8 bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Where an image's pixels are in their lifecycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageState {
    /// Not loaded yet, or a load is in flight.
    #[default]
    Pending,
    /// Pixels are available.
    Ready(ImageData),
    /// The last load failed.
    Failed(String),
}

impl ImageState {
    /// The pixels, if loaded.
    #[must_use]
    pub fn data(&self) -> Option<&ImageData> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// Proof that a load was started for a particular element.
///
/// A ticket becomes stale when its element is destroyed or detached, or when
/// another load is started for the same element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    node: NodeId,
    revision: u32,
}

impl LoadTicket {
    /// The image element this ticket was issued for.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// Fetches and decodes image sources.
pub trait ImageLoader {
    /// Loads the pixels referenced by `source`.
    fn load(&self, source: &str) -> impl Future<Output = Result<ImageData, LoadError>>;
}

impl Document {
    /// Marks the image at `id` pending and issues a ticket for its next result.
    pub fn begin_image_load(&mut self, id: NodeId) -> Result<LoadTicket, SceneError> {
        let node = self.node_mut(id).ok_or(SceneError::StaleNode(id))?;
        let Element::Image(props) = &mut node.element else {
            return Err(SceneError::Unsupported("begin_image_load"));
        };
        props.state = ImageState::Pending;
        node.load_revision = node.load_revision.wrapping_add(1);
        let ticket = LoadTicket {
            node: id,
            revision: node.load_revision,
        };
        debug!(?id, revision = ticket.revision, "image load started");
        Ok(ticket)
    }

    /// Applies a load result for `ticket`.
    ///
    /// Returns [`LoadError::Stale`] and leaves the document untouched if the
    /// element is gone, detached or has a newer load in flight. Otherwise the
    /// image becomes [`ImageState::Ready`] or [`ImageState::Failed`] and the
    /// load error, if any, is returned.
    pub fn finish_image_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<ImageData, LoadError>,
    ) -> Result<(), LoadError> {
        let id = ticket.node;
        let current = self.node(id).map(|n| n.load_revision);
        if current != Some(ticket.revision) || !self.is_attached(id) {
            warn!(?id, "dropping stale image load result");
            return Err(LoadError::Stale);
        }
        if !matches!(self.element(id), Some(Element::Image(_))) {
            return Err(LoadError::NotAnImage);
        }
        let (state, outcome) = match result {
            Ok(data) => {
                debug!(?id, width = data.width, height = data.height, "image ready");
                (ImageState::Ready(data), Ok(()))
            }
            Err(err) => {
                warn!(?id, %err, "image load failed");
                (ImageState::Failed(err.to_string()), Err(err))
            }
        };
        self.change_property(id, Property::Element, |node| {
            if let Element::Image(props) = &mut node.element {
                props.state = state;
            }
            Ok(())
        })
        .map_err(|_| LoadError::Stale)?;
        outcome
    }

    /// Emits a repaint for an image whose pixels changed outside the document.
    pub fn invalidate_image(&mut self, id: NodeId) {
        if self.is_attached(id)
            && let Some(area) = self.paint_bbox(id)
        {
            self.emit(id, Change::Invalidate { area });
        }
    }
}

/// Starts a load for `id`, awaits `loader` and applies the result.
///
/// The document is borrowed for the whole call; hosts that need the document
/// while the load is in flight call the two halves themselves.
pub async fn load_image(
    loader: &impl ImageLoader,
    document: &mut Document,
    id: NodeId,
) -> Result<(), LoadError> {
    let ticket = document.begin_image_load(id).map_err(|err| match err {
        SceneError::StaleNode(_) => LoadError::Stale,
        _ => LoadError::NotAnImage,
    })?;
    let source = match document.element(id) {
        Some(Element::Image(props)) => props.source.clone(),
        _ => return Err(LoadError::NotAnImage),
    };
    let result = loader.load(&source).await;
    document.finish_image_load(ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImageProps;
    use alloc::vec;
    use kurbo::Rect;

    fn attached_image(doc: &mut Document) -> NodeId {
        let page = doc.create(Element::page("P", Rect::new(0.0, 0.0, 10.0, 10.0)));
        let root = doc.root();
        doc.append_child(root, page).unwrap();
        let layer = doc.create(Element::layer("L"));
        doc.append_child(page, layer).unwrap();
        let image = doc.create(Element::Image(ImageProps {
            source: "pixel.png".into(),
            width: 1.0,
            height: 1.0,
            ..ImageProps::default()
        }));
        doc.append_child(layer, image).unwrap();
        image
    }

    fn pixel() -> ImageData {
        ImageData::new(1, 1, vec![255, 0, 0, 255]).unwrap()
    }

    #[test]
    fn image_data_checks_buffer_length() {
        assert_eq!(
            ImageData::new(2, 2, vec![0; 15]),
            Err(LoadError::InvalidData {
                width: 2,
                height: 2,
                len: 15
            })
        );
    }

    #[test]
    fn newer_load_supersedes_older_ticket() {
        let mut doc = Document::new();
        let image = attached_image(&mut doc);
        let first = doc.begin_image_load(image).unwrap();
        let second = doc.begin_image_load(image).unwrap();

        assert_eq!(doc.finish_image_load(first, Ok(pixel())), Err(LoadError::Stale));
        assert!(
            matches!(doc.element(image), Some(Element::Image(p)) if p.state == ImageState::Pending),
            "stale result is ignored"
        );
        assert_eq!(doc.finish_image_load(second, Ok(pixel())), Ok(()));
        assert!(
            matches!(doc.element(image), Some(Element::Image(p)) if p.state.data().is_some()),
            "current ticket applies"
        );
    }

    #[test]
    fn detached_image_drops_result() {
        let mut doc = Document::new();
        let image = attached_image(&mut doc);
        let ticket = doc.begin_image_load(image).unwrap();
        let layer = doc.parent(image).unwrap();
        doc.remove_child(layer, image).unwrap();
        assert_eq!(doc.finish_image_load(ticket, Ok(pixel())), Err(LoadError::Stale));
    }

    #[test]
    fn failure_is_recorded_and_reported() {
        let mut doc = Document::new();
        let image = attached_image(&mut doc);
        let ticket = doc.begin_image_load(image).unwrap();
        let err = LoadError::Failed("404".into());
        assert_eq!(doc.finish_image_load(ticket, Err(err.clone())), Err(err));
        assert!(
            matches!(doc.element(image), Some(Element::Image(p)) if matches!(p.state, ImageState::Failed(_))),
            "failure is visible on the element"
        );
    }

    #[test]
    fn non_images_get_no_ticket() {
        let mut doc = Document::new();
        let group = doc.create(Element::Group);
        assert_eq!(
            doc.begin_image_load(group),
            Err(SceneError::Unsupported("begin_image_load"))
        );
    }
}
