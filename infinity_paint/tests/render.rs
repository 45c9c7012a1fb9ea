// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `infinity_paint` crate.
//!
//! Pixel-level behavior is checked on `RasterCanvas`; the order and nesting of
//! canvas operations is checked on `RecordingCanvas`.

use infinity_paint::{
    CanvasOp, HitKind, HitTestOptions, PaintCanvas, PngExporter, RasterCanvas, RecordingCanvas,
    RenderEngine,
};
use infinity_scene::{
    CompositeMode, Document, EffectEntry, Element, ElementFlags, Exporter, FilterEntry,
    ImageData, ImageProps, NodeId, PatternPaint, RectangleProps, ShadowEffect,
};
use kurbo::{Affine, Point, Rect};
use peniko::Color;

const RED: Color = Color::from_rgba8(255, 0, 0, 255);

fn document() -> (Document, NodeId, NodeId) {
    let mut doc = Document::new();
    let page = doc.create(Element::page("Page", Rect::new(0.0, 0.0, 100.0, 100.0)));
    let root = doc.root();
    doc.append_child(root, page).unwrap();
    let layer = doc.create(Element::layer("Layer"));
    doc.append_child(page, layer).unwrap();
    (doc, page, layer)
}

fn rectangle(doc: &mut Document, parent: NodeId, area: Rect, paints: &[PatternPaint]) -> NodeId {
    let id = doc.create(Element::Rectangle(RectangleProps::default()));
    doc.set_transform(
        id,
        Affine::translate(area.center().to_vec2())
            * Affine::scale_non_uniform(area.width() / 2.0, area.height() / 2.0),
    )
    .unwrap();
    for paint in paints {
        doc.update_style(id, |s| s.push(paint.clone())).unwrap();
    }
    doc.append_child(parent, id).unwrap();
    id
}

fn rasterize(doc: &Document) -> RasterCanvas {
    let mut canvas = RasterCanvas::new(100, 100).unwrap();
    RenderEngine::new(doc).render(&mut canvas, doc.root());
    canvas
}

fn record(doc: &Document) -> Vec<CanvasOp> {
    let mut canvas = RecordingCanvas::new(Rect::new(0.0, 0.0, 100.0, 100.0));
    RenderEngine::new(doc).render(&mut canvas, doc.root());
    canvas.into_ops()
}

#[test]
fn stroke_straddles_the_filled_rectangle() {
    let (mut doc, page, layer) = document();
    rectangle(
        &mut doc,
        layer,
        Rect::new(20.0, 20.0, 80.0, 80.0),
        &[PatternPaint::fill(Color::BLACK), PatternPaint::stroke(RED, 10.0)],
    );
    let canvas = rasterize(&doc);
    assert_eq!(canvas.pixel(14, 50), Some([0, 0, 0, 0]), "outside the stroke");
    assert_eq!(canvas.pixel(16, 50), Some([255, 0, 0, 255]), "outer half of the stroke");
    assert_eq!(canvas.pixel(24, 50), Some([255, 0, 0, 255]), "inner half covers the fill");
    assert_eq!(canvas.pixel(26, 50), Some([0, 0, 0, 255]), "fill inside the stroke");
    assert_eq!(canvas.pixel(50, 50), Some([0, 0, 0, 255]), "center");

    let exporter = PngExporter::default();
    let exported = exporter.render(&doc, page).unwrap();
    assert_eq!(
        exported.extents(),
        Rect::new(0.0, 0.0, 100.0, 100.0),
        "a page exports its whole area"
    );
    let png = pollster::block_on(exporter.export(&doc, layer)).unwrap();
    assert!(png.starts_with(b"\x89PNG"), "png signature");
}

#[test]
fn paints_and_siblings_draw_in_order() {
    let (mut doc, _, layer) = document();
    rectangle(
        &mut doc,
        layer,
        Rect::new(10.0, 10.0, 30.0, 30.0),
        &[PatternPaint::fill(Color::BLACK), PatternPaint::stroke(RED, 2.0)],
    );
    rectangle(
        &mut doc,
        layer,
        Rect::new(20.0, 20.0, 40.0, 40.0),
        &[PatternPaint::fill(Color::WHITE)],
    );
    let kinds: Vec<&str> = record(&doc)
        .iter()
        .map(|op| match op {
            CanvasOp::Fill { .. } => "fill",
            CanvasOp::Stroke { .. } => "stroke",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["fill", "stroke", "fill"]);
}

#[test]
fn opacity_isolates_the_element() {
    let (mut doc, _, layer) = document();
    let id = rectangle(
        &mut doc,
        layer,
        Rect::new(10.0, 10.0, 30.0, 30.0),
        &[PatternPaint::fill(Color::BLACK)],
    );
    doc.update_style(id, |s| {
        s.set_opacity(0.5);
        Ok(())
    })
    .unwrap();
    let ops = record(&doc);
    let [CanvasOp::DrawCanvas { opacity, blend, ops: inner, extents, .. }] = ops.as_slice() else {
        panic!("expected one isolated canvas: {ops:?}");
    };
    assert_eq!(*opacity, 0.5);
    assert_eq!(*blend, CompositeMode::Normal);
    assert_eq!(*extents, Rect::new(10.0, 10.0, 30.0, 30.0));
    assert!(matches!(inner.as_slice(), [CanvasOp::Fill { opacity, .. }] if *opacity == 1.0), "{inner:?}");
}

#[test]
fn drop_shadow_composites_beneath_the_content() {
    let (mut doc, _, layer) = document();
    let id = rectangle(
        &mut doc,
        layer,
        Rect::new(10.0, 10.0, 30.0, 30.0),
        &[PatternPaint::fill(Color::WHITE)],
    );
    let shadow = ShadowEffect {
        x: 2.0,
        y: 2.0,
        radius: 3.0,
        color: Color::BLACK,
        inner: false,
    };
    doc.update_style(id, |s| s.insert(0, EffectEntry::Shadow(shadow)))
        .unwrap();
    let ops = record(&doc);
    let [CanvasOp::DrawCanvas { ops: shade, .. }, CanvasOp::DrawCanvas { ops: content, .. }] =
        ops.as_slice()
    else {
        panic!("shadow then content: {ops:?}");
    };
    assert!(
        matches!(
            shade.as_slice(),
            [
                CanvasOp::Flood(_),
                CanvasOp::DrawCanvas { blend: CompositeMode::DestinationIn, .. },
                CanvasOp::Blur(r),
            ] if *r == 3.0
        ),
        "{shade:?}"
    );
    assert!(matches!(content.as_slice(), [CanvasOp::Fill { .. }]), "{content:?}");

    let canvas = rasterize(&doc);
    let [_, _, _, under] = canvas.pixel(31, 31).unwrap();
    assert!(under > 0, "shadow shows below and to the right");
    assert_eq!(canvas.pixel(20, 20), Some([255, 255, 255, 255]), "content on top");
}

#[test]
fn zero_radius_blur_is_bit_identical() {
    let paints = [PatternPaint::fill(Color::BLACK), PatternPaint::stroke(RED, 3.0)];
    let (mut plain, _, layer) = document();
    rectangle(&mut plain, layer, Rect::new(10.5, 12.0, 61.0, 47.3), &paints);
    let (mut blurred, _, layer) = document();
    let id = rectangle(&mut blurred, layer, Rect::new(10.5, 12.0, 61.0, 47.3), &paints);
    blurred
        .update_style(id, |s| s.insert(0, FilterEntry::Blur { radius: 0.0 }))
        .unwrap();
    assert_eq!(
        rasterize(&plain).pixmap().data(),
        rasterize(&blurred).pixmap().data(),
        "no-op filter changes nothing"
    );
}

#[test]
fn hidden_and_no_paint_elements_are_skipped() {
    let (mut doc, _, layer) = document();
    let black = [PatternPaint::fill(Color::BLACK)];
    let hidden = rectangle(&mut doc, layer, Rect::new(0.0, 0.0, 10.0, 10.0), &black);
    let ghost = rectangle(&mut doc, layer, Rect::new(20.0, 0.0, 30.0, 10.0), &black);
    doc.set_flag(hidden, ElementFlags::HIDDEN, true).unwrap();
    doc.set_flag(ghost, ElementFlags::NO_PAINT, true).unwrap();
    assert!(record(&doc).is_empty(), "nothing paints");

    let engine = RenderEngine::new(&doc);
    let at = |x, y| {
        engine
            .hit_test(doc.root(), Point::new(x, y), Affine::IDENTITY, &HitTestOptions::default())
            .first()
            .map(|h| h.element)
    };
    assert_eq!(at(25.0, 5.0), Some(ghost), "unpainted elements still hit");
    assert_ne!(at(5.0, 5.0), Some(hidden), "hidden elements never hit");
}

#[test]
fn images_draw_their_pixels_once_loaded() {
    let (mut doc, _, layer) = document();
    let image = doc.create(Element::Image(ImageProps {
        source: "strip".into(),
        width: 20.0,
        height: 10.0,
        ..ImageProps::default()
    }));
    doc.set_transform(image, Affine::translate((10.0, 10.0))).unwrap();
    doc.append_child(layer, image).unwrap();
    assert!(rasterize(&doc).pixel(15, 15).is_some_and(|p| p[3] == 0), "pending");

    let ticket = doc.begin_image_load(image).unwrap();
    let pixels = ImageData::new(2, 1, vec![255, 0, 0, 255, 0, 0, 255, 255]).unwrap();
    doc.finish_image_load(ticket, Ok(pixels)).unwrap();
    let canvas = rasterize(&doc);
    let [r, _, b, a] = canvas.pixel(11, 15).unwrap();
    assert!(r > 240 && b < 15 && a == 255, "left pixel is red: {r} {b} {a}");
    let [r, _, b, a] = canvas.pixel(28, 15).unwrap();
    assert!(b > 240 && r < 15 && a == 255, "right pixel is blue: {r} {b} {a}");
    assert_eq!(canvas.pixel(35, 15), Some([0, 0, 0, 0]), "nothing past the image");
}

#[test]
fn front_most_shape_wins_the_hit() {
    let (mut doc, page, layer) = document();
    let a = rectangle(
        &mut doc,
        layer,
        Rect::new(10.0, 10.0, 50.0, 50.0),
        &[PatternPaint::fill(Color::BLACK)],
    );
    let b = rectangle(
        &mut doc,
        layer,
        Rect::new(30.0, 30.0, 70.0, 70.0),
        &[PatternPaint::fill(Color::WHITE), PatternPaint::stroke(RED, 4.0)],
    );
    let engine = RenderEngine::new(&doc);
    let point = Point::new(40.0, 40.0);

    let first = engine.hit_test(doc.root(), point, Affine::IDENTITY, &HitTestOptions::default());
    assert_eq!(first.len(), 1, "{first:?}");
    assert_eq!(first[0].element, b, "later sibling is in front");
    assert_eq!(first[0].entry, Some(0), "the fill is the only paint under the point");

    let edge = engine.hit_test(
        doc.root(),
        Point::new(31.0, 40.0),
        Affine::IDENTITY,
        &HitTestOptions::default(),
    );
    assert_eq!(edge[0].entry, Some(1), "the stroke is painted last so it is tested first");
    assert_eq!(edge[0].kind, HitKind::Stroke);

    let stacked = engine.hit_test(
        doc.root(),
        point,
        Affine::IDENTITY,
        &HitTestOptions {
            stacked: true,
            ..HitTestOptions::default()
        },
    );
    let order: Vec<NodeId> = stacked.iter().map(|h| h.element).collect();
    assert_eq!(order, [b, a, page], "front to back");

    let zoomed = engine.hit_test(
        doc.root(),
        Point::new(160.0, 160.0),
        Affine::scale(4.0),
        &HitTestOptions::default(),
    );
    assert_eq!(zoomed[0].element, b, "points are in device space");
}

#[test]
fn groups_can_answer_as_a_unit() {
    let (mut doc, _, layer) = document();
    let group = doc.create(Element::Group);
    doc.append_child(layer, group).unwrap();
    let inner = rectangle(
        &mut doc,
        group,
        Rect::new(10.0, 10.0, 20.0, 20.0),
        &[PatternPaint::stroke(Color::BLACK, 2.0)],
    );
    let engine = RenderEngine::new(&doc);
    let center = Point::new(15.0, 15.0);
    let hits = engine.hit_test(doc.root(), center, Affine::IDENTITY, &HitTestOptions::default());
    assert_ne!(hits[0].element, inner, "stroke-only interior is empty");

    let edge = engine.hit_test(
        doc.root(),
        Point::new(10.5, 15.0),
        Affine::IDENTITY,
        &HitTestOptions::default(),
    );
    assert_eq!(edge[0].element, inner);

    doc.set_flag(group, ElementFlags::HIT_AS_UNIT, true).unwrap();
    let engine = RenderEngine::new(&doc);
    let unit = engine.hit_test(doc.root(), center, Affine::IDENTITY, &HitTestOptions::default());
    assert_eq!(unit[0].element, group, "the group answers for its whole area");
    assert_eq!(unit[0].entry, None);
}
