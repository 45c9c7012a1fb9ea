// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `infinity_scene` crate.
//!
//! These exercise the document as a host sees it: building a typed tree,
//! observing changes through listeners and `Damage`, persisting through the
//! importer/exporter pair, and loading image pixels asynchronously.

use std::cell::RefCell;
use std::rc::Rc;

use infinity_scene::{
    Change, ChangeEvent, Damage, Document, Element, ElementFlags, Exporter, ImageData,
    ImageLoader, ImageProps, ImageState, Importer, JsonExporter, JsonImporter, LoadError, NodeId,
    PatternPaint, RectangleProps, SceneError, load_image,
};
use kurbo::{Affine, Rect};
use peniko::Color;

fn document_with_layer() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let root = doc.root();
    let page = doc.create(Element::page("Page", Rect::new(0.0, 0.0, 400.0, 300.0)));
    doc.append_child(root, page).unwrap();
    let layer = doc.create(Element::layer("Layer"));
    doc.append_child(page, layer).unwrap();
    (doc, page, layer)
}

fn filled_rect(doc: &mut Document, area: Rect) -> NodeId {
    let id = doc.create(Element::Rectangle(RectangleProps::default()));
    doc.set_transform(
        id,
        Affine::translate(area.center().to_vec2())
            * Affine::scale_non_uniform(area.width() / 2.0, area.height() / 2.0),
    )
    .unwrap();
    doc.update_style(id, |s| s.push(PatternPaint::fill(Color::BLACK)))
        .unwrap();
    id
}

#[test]
fn root_listener_collects_damage_for_the_whole_document() {
    let (mut doc, _, layer) = document_with_layer();
    let damage = Rc::new(RefCell::new(Damage::default()));
    let sink = Rc::clone(&damage);
    let root = doc.root();
    doc.subscribe(root, move |event: &ChangeEvent| sink.borrow_mut().record(event));

    let rect = filled_rect(&mut doc, Rect::new(10.0, 10.0, 30.0, 30.0));
    assert!(damage.borrow().is_empty(), "detached edits produce no damage");

    doc.append_child(layer, rect).unwrap();
    doc.set_transform(rect, Affine::translate((100.0, 10.0)) * Affine::scale(10.0))
        .unwrap();
    doc.set_flag(rect, ElementFlags::HIDDEN, true).unwrap();

    let rects = damage.borrow_mut().take();
    assert_eq!(
        rects,
        vec![
            Rect::new(10.0, 10.0, 30.0, 30.0),
            Rect::new(10.0, 0.0, 110.0, 30.0),
            Rect::new(90.0, 0.0, 110.0, 20.0),
        ],
        "insert, move (old and new area), then hide"
    );
}

#[test]
fn structural_events_target_the_parent() {
    let (mut doc, page, layer) = document_with_layer();
    let seen: Rc<RefCell<Vec<ChangeEvent>>> = Rc::default();
    let sink = Rc::clone(&seen);
    doc.subscribe(page, move |e: &ChangeEvent| sink.borrow_mut().push(*e));

    let rect = filled_rect(&mut doc, Rect::new(0.0, 0.0, 5.0, 5.0));
    doc.append_child(layer, rect).unwrap();
    doc.remove_child(layer, rect).unwrap();

    let seen = seen.borrow();
    let structural: Vec<_> = seen
        .iter()
        .filter(|e| !matches!(e.change, Change::Invalidate { .. }))
        .collect();
    assert_eq!(structural.len(), 4, "{structural:?}");
    assert!(structural.iter().all(|e| e.target == layer), "events target the layer");
    assert_eq!(structural[3].change, Change::AfterRemove { child: rect });
}

#[test]
fn typed_hierarchy_is_enforced_everywhere() {
    let (mut doc, page, layer) = document_with_layer();
    let rect = filled_rect(&mut doc, Rect::new(0.0, 0.0, 5.0, 5.0));
    assert!(
        matches!(
            doc.append_child(page, rect),
            Err(SceneError::InvalidInsertion { .. })
        ),
        "shapes need a layer"
    );
    let other = doc.create(Element::page("Other", Rect::ZERO));
    assert!(doc.append_child(layer, other).is_err(), "pages only go under the scene");
    assert_eq!(doc.children(layer), &[] as &[NodeId]);
}

#[test]
fn json_round_trip_through_importer_and_exporter() {
    let (mut doc, page, layer) = document_with_layer();
    let rect = filled_rect(&mut doc, Rect::new(20.0, 20.0, 60.0, 40.0));
    doc.append_child(layer, rect).unwrap();
    assert_eq!(JsonExporter.extensions(), &["json"]);

    let bytes = pollster::block_on(JsonExporter.export(&doc, layer)).unwrap();
    doc.remove_child(page, layer).unwrap();
    doc.destroy(layer).unwrap();
    assert!(!doc.is_alive(rect), "original content is gone");

    let restored = pollster::block_on(JsonImporter.import(&bytes, &mut doc, page)).unwrap();
    let copy = doc.children(restored)[0];
    assert_eq!(doc.paint_bbox(copy), Some(Rect::new(20.0, 20.0, 60.0, 40.0)));
    assert_eq!(
        doc.style(copy).map(|s| s.entries().len()),
        Some(1),
        "style survives the trip"
    );
}

struct FakeLoader;

impl ImageLoader for FakeLoader {
    async fn load(&self, source: &str) -> Result<ImageData, LoadError> {
        match source {
            "red.raw" => ImageData::new(2, 1, vec![255, 0, 0, 255, 255, 0, 0, 255]),
            other => Err(LoadError::Failed(format!("no such file: {other}"))),
        }
    }
}

fn image(doc: &mut Document, layer: NodeId, source: &str) -> NodeId {
    let id = doc.create(Element::Image(ImageProps {
        source: source.into(),
        width: 2.0,
        height: 1.0,
        ..ImageProps::default()
    }));
    doc.append_child(layer, id).unwrap();
    id
}

#[test]
fn image_loads_resolve_against_live_elements() {
    let (mut doc, _, layer) = document_with_layer();
    let ok = image(&mut doc, layer, "red.raw");
    let missing = image(&mut doc, layer, "blue.raw");

    pollster::block_on(load_image(&FakeLoader, &mut doc, ok)).unwrap();
    let Some(Element::Image(props)) = doc.element(ok) else {
        panic!("still an image");
    };
    assert_eq!(props.state.data().map(ImageData::width), Some(2));

    let err = pollster::block_on(load_image(&FakeLoader, &mut doc, missing));
    assert!(matches!(err, Err(LoadError::Failed(_))), "{err:?}");

    // A ticket outliving its element is rejected without touching the document.
    let ticket = doc.begin_image_load(ok).unwrap();
    doc.remove_child(layer, ok).unwrap();
    doc.destroy(ok).unwrap();
    let pixels = ImageData::new(1, 1, vec![0, 0, 0, 0]).unwrap();
    assert_eq!(doc.finish_image_load(ticket, Ok(pixels)), Err(LoadError::Stale));
    assert!(
        matches!(doc.element(missing), Some(Element::Image(p)) if matches!(p.state, ImageState::Failed(_))),
        "unrelated image is unaffected"
    );
}
