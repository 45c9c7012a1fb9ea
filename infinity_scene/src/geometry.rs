// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element geometry, world transforms and bounding boxes.
//!
//! Shapes describe their outline in local coordinates: rectangles, ellipses
//! and slices use the square `[-1, 1]²`, images `[0, width] × [0, height]`,
//! and paths their own anchors. Everything else is derived by mapping the
//! local outline through the world transform.

use alloc::boxed::Box;

use infinity_vertex::{VertexContainer, VertexSource, VertexTransformer, bounds};
use kurbo::{Affine, Circle, Rect, RoundedRect};

use crate::{Document, Element, ElementFlags, ElementTag, NodeId};

/// Accuracy of curve approximation for unit-sized local geometry.
const LOCAL_TOLERANCE: f64 = 1e-4;

const UNIT_SQUARE: Rect = Rect::new(-1.0, -1.0, 1.0, 1.0);

/// The local outline of `element`, or `None` for variants without geometry.
#[must_use]
pub fn local_geometry(element: &Element) -> Option<VertexContainer> {
    let container = match element {
        Element::Rectangle(props) if props.rounding > 0.0 => {
            let shape = RoundedRect::from_rect(UNIT_SQUARE, props.rounding.min(1.0));
            VertexContainer::from_shape(&shape, LOCAL_TOLERANCE)
        }
        Element::Rectangle(_) | Element::Slice(_) => {
            VertexContainer::from_shape(&UNIT_SQUARE, LOCAL_TOLERANCE)
        }
        Element::Ellipse(_) => {
            VertexContainer::from_shape(&Circle::new((0.0, 0.0), 1.0), LOCAL_TOLERANCE)
        }
        Element::Path(props) => VertexContainer::from_path(&props.to_path()),
        Element::Image(props) => VertexContainer::from_shape(
            &Rect::new(0.0, 0.0, props.width, props.height),
            LOCAL_TOLERANCE,
        ),
        _ => return None,
    };
    Some(container)
}

impl Document {
    /// Product of every transform from the root down to and including `id`.
    #[must_use]
    pub fn world_transform(&self, id: NodeId) -> Affine {
        core::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|n| self.transform(n))
            .fold(Affine::IDENTITY, |acc, local| local * acc)
    }

    /// The world transform of `id`'s parent: the space its local transform maps into.
    #[must_use]
    pub fn parent_transform(&self, id: NodeId) -> Affine {
        self.parent(id)
            .map_or(Affine::IDENTITY, |p| self.world_transform(p))
    }

    /// World-space outline of `id` before vector effects.
    #[must_use]
    pub fn raw_vertices(&self, id: NodeId) -> Option<Box<dyn VertexSource>> {
        let local = local_geometry(self.element(id)?)?;
        Some(Box::new(VertexTransformer::new(local, self.world_transform(id))))
    }

    /// World-space outline of `id` with its vector effects applied in chain order.
    #[must_use]
    pub fn vertices(&self, id: NodeId) -> Option<Box<dyn VertexSource>> {
        let mut source = self.raw_vertices(id)?;
        if let Some(style) = self.style(id) {
            for effect in style.vector_effects() {
                source = effect.apply(source);
            }
        }
        Some(source)
    }

    /// Bounds of the untransformed-by-effects geometry in world space.
    ///
    /// Containers report the union of their visible children; pages add their
    /// own rectangle. Hidden elements have no geometry bounds.
    #[must_use]
    pub fn geometry_bbox(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id)?;
        if node.flags.contains(ElementFlags::HIDDEN) {
            return None;
        }
        if node.element.tag().is_shape() {
            return bounds(&mut self.raw_vertices(id)?);
        }
        let own = match &node.element {
            Element::Page(props) => Some(props.bounds()),
            _ => None,
        };
        self.children(id)
            .iter()
            .filter_map(|&c| self.geometry_bbox(c))
            .fold(own, |acc, r| Some(acc.map_or(r, |a| a.union(r))))
    }

    /// Area in world space that painting `id` can touch.
    ///
    /// Shapes use their effected geometry inflated by the style padding.
    /// Containers use the union of their children's paint bounds inflated by
    /// their own padding; pages also cover their rectangle. Slices and hidden
    /// elements paint nothing.
    #[must_use]
    pub fn paint_bbox(&self, id: NodeId) -> Option<Rect> {
        let node = self.node(id)?;
        if node.flags.contains(ElementFlags::HIDDEN) {
            return None;
        }
        let padding = node.style.as_ref().map(crate::Style::padding).unwrap_or_default();
        let tag = node.element.tag();
        if tag == ElementTag::Slice {
            return None;
        }
        if tag.is_shape() {
            let geometry = bounds(&mut self.vertices(id)?)?;
            return Some(geometry + padding);
        }
        let own = match &node.element {
            Element::Page(props) => Some(props.bounds()),
            _ => None,
        };
        let content = self
            .children(id)
            .iter()
            .filter_map(|&c| self.paint_bbox(c))
            .fold(None, |acc: Option<Rect>, r| Some(acc.map_or(r, |a| a.union(r))))
            .map(|r| r + padding);
        match (own, content) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterEntry, PatternPaint, RectangleProps, Style, VectorEffect};
    use peniko::Color;

    fn assert_rect_near(actual: Option<Rect>, expected: Rect) {
        let actual = actual.expect("bounds exist");
        let close = (actual.x0 - expected.x0).abs() < 1e-6
            && (actual.y0 - expected.y0).abs() < 1e-6
            && (actual.x1 - expected.x1).abs() < 1e-6
            && (actual.y1 - expected.y1).abs() < 1e-6;
        assert!(close, "{actual:?} != {expected:?}");
    }

    fn layer(doc: &mut Document) -> NodeId {
        let page = doc.create(Element::page("P", Rect::new(0.0, 0.0, 200.0, 200.0)));
        let root = doc.root();
        doc.append_child(root, page).unwrap();
        let layer = doc.create(Element::layer("L"));
        doc.append_child(page, layer).unwrap();
        layer
    }

    fn square(doc: &mut Document, center: (f64, f64), half: f64) -> NodeId {
        let id = doc.create(Element::Rectangle(RectangleProps::default()));
        doc.set_transform(id, Affine::translate(center) * Affine::scale(half))
            .unwrap();
        id
    }

    #[test]
    fn unit_geometry_maps_through_world_transform() {
        let mut doc = Document::new();
        let layer = layer(&mut doc);
        let group = doc.create(Element::Group);
        doc.set_transform(group, Affine::translate((100.0, 0.0))).unwrap();
        doc.append_child(layer, group).unwrap();
        let rect = square(&mut doc, (10.0, 10.0), 5.0);
        doc.append_child(group, rect).unwrap();

        assert_rect_near(doc.geometry_bbox(rect), Rect::new(105.0, 5.0, 115.0, 15.0));
        assert_rect_near(doc.geometry_bbox(group), Rect::new(105.0, 5.0, 115.0, 15.0));
    }

    #[test]
    fn paint_bbox_adds_style_padding() {
        let mut doc = Document::new();
        let rect = square(&mut doc, (50.0, 50.0), 30.0);
        let style = Style::from_entries([
            FilterEntry::Blur { radius: 2.0 }.into(),
            PatternPaint::fill(Color::BLACK).into(),
            PatternPaint::stroke(Color::BLACK, 10.0).into(),
        ])
        .unwrap();
        doc.set_style(rect, style).unwrap();
        assert_rect_near(doc.paint_bbox(rect), Rect::new(13.0, 13.0, 87.0, 87.0));
        assert_rect_near(doc.geometry_bbox(rect), Rect::new(20.0, 20.0, 80.0, 80.0));
    }

    #[test]
    fn vector_effects_move_paint_but_not_geometry() {
        let mut doc = Document::new();
        let rect = square(&mut doc, (0.0, 0.0), 1.0);
        doc.update_style(rect, |s| s.push(VectorEffect::Offset { dx: 10.0, dy: 0.0 }))
            .unwrap();
        assert_rect_near(doc.paint_bbox(rect), Rect::new(9.0, -1.0, 11.0, 1.0));
        assert_rect_near(doc.geometry_bbox(rect), Rect::new(-1.0, -1.0, 1.0, 1.0));
    }

    #[test]
    fn pages_cover_their_rect_and_hidden_children_are_ignored() {
        let mut doc = Document::new();
        let layer = layer(&mut doc);
        let page = doc.parent(layer).unwrap();
        let inside = square(&mut doc, (10.0, 10.0), 5.0);
        let outside = square(&mut doc, (300.0, 10.0), 5.0);
        doc.append_child(layer, inside).unwrap();
        doc.append_child(layer, outside).unwrap();
        assert_rect_near(doc.paint_bbox(page), Rect::new(0.0, 0.0, 305.0, 200.0));

        doc.set_flag(outside, ElementFlags::HIDDEN, true).unwrap();
        assert_rect_near(doc.paint_bbox(page), Rect::new(0.0, 0.0, 200.0, 200.0));
        assert_eq!(doc.paint_bbox(outside), None);
    }

    #[test]
    fn slices_have_geometry_but_paint_nothing() {
        let mut doc = Document::new();
        let slice = doc.create(Element::Slice(crate::SliceProps::default()));
        doc.set_transform(slice, Affine::scale(4.0)).unwrap();
        assert_rect_near(doc.geometry_bbox(slice), Rect::new(-4.0, -4.0, 4.0, 4.0));
        assert_eq!(doc.paint_bbox(slice), None);
        let empty = doc.create(Element::Group);
        assert_eq!(doc.paint_bbox(empty), None, "empty group");
    }
}
