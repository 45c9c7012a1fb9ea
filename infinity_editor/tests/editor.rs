// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `infinity_editor` crate.
//!
//! Tools are driven through a `ToolRegistry` the way a host would; overlay
//! painting is checked on a `RecordingCanvas`.

use infinity_editor::{
    Corner, Editor, EditorFlags, EditorOptions, LineFactory, Modifiers, Part, PartInfo,
    PointerEvent, RectangleFactory, ShapeFactory, ToolError, ToolId, ToolRegistry, ToolState,
};
use infinity_paint::{CanvasOp, RecordingCanvas};
use infinity_scene::{Document, Element, ElementTag, NodeId, RectangleProps};
use kurbo::{Affine, Line, Point, Rect};

fn session() -> (Editor, ToolRegistry) {
    let editor = Editor::new_with_page(
        "Page",
        Rect::new(0.0, 0.0, 200.0, 200.0),
        EditorOptions::default(),
    )
    .unwrap();
    (editor, ToolRegistry::with_default_tools())
}

fn drag(editor: &mut Editor, tools: &mut ToolRegistry, from: (f64, f64), to: (f64, f64)) {
    tools.dispatch(editor, &PointerEvent::down(from));
    tools.dispatch(editor, &PointerEvent::moved(to));
    tools.dispatch(editor, &PointerEvent::up(to));
}

fn draw_rectangle(editor: &mut Editor, tools: &mut ToolRegistry, area: Rect) -> NodeId {
    tools.activate(editor, ToolId::RECTANGLE).unwrap();
    drag(editor, tools, (area.x0, area.y0), (area.x1, area.y1));
    tools.activate(editor, ToolId::POINTER).unwrap();
    *editor.selection().primary().unwrap()
}

fn strokes(canvas: &RecordingCanvas) -> usize {
    canvas
        .ops()
        .iter()
        .filter(|op| matches!(op, CanvasOp::Stroke { .. }))
        .count()
}

fn overlay_strokes(editor: &Editor) -> usize {
    let mut canvas = RecordingCanvas::new(Rect::new(0.0, 0.0, 200.0, 200.0));
    editor.paint_overlay(&mut canvas);
    strokes(&canvas)
}

#[test]
fn rectangle_tool_inserts_and_selects() {
    let (mut editor, mut tools) = session();
    let rect = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 80.0, 60.0));

    let doc = editor.document();
    assert_eq!(doc.tag(rect), Some(ElementTag::Rectangle));
    assert_eq!(doc.parent(rect), editor.active_layer());
    assert_eq!(doc.geometry_bbox(rect), Some(Rect::new(20.0, 20.0, 80.0, 60.0)));
    assert_eq!(
        doc.style(rect),
        Some(&editor.options().shape_style),
        "new shapes get the default shape style"
    );
    let flags = editor.editors().get(rect).unwrap().flags();
    assert!(flags.contains(EditorFlags::SELECTED), "new shapes are selected");
    assert!(!editor.damage().is_empty(), "the new shape is damaged");
}

#[test]
fn shift_keeps_the_ratio() {
    let (mut editor, mut tools) = session();
    tools.activate(&mut editor, ToolId::RECTANGLE).unwrap();
    tools.dispatch(&mut editor, &PointerEvent::down((10.0, 10.0)));
    let wide = PointerEvent::moved((70.0, 30.0)).with_modifiers(Modifiers::SHIFT);
    tools.dispatch(&mut editor, &wide);
    tools.dispatch(&mut editor, &PointerEvent::up((70.0, 30.0)));

    let rect = *editor.selection().primary().unwrap();
    assert_eq!(
        editor.document().geometry_bbox(rect),
        Some(Rect::new(10.0, 10.0, 70.0, 70.0))
    );
}

#[test]
fn updating_a_shape_twice_is_idempotent() {
    let mut doc = Document::new();
    let area = Rect::new(5.0, 10.0, 45.0, 30.0);
    let line = Line::new((5.0, 10.0), (45.0, 30.0));

    let rect = RectangleFactory.create_shape(&mut doc).unwrap();
    RectangleFactory.update_shape(&mut doc, rect, area, line).unwrap();
    let first = doc.transform(rect);
    RectangleFactory.update_shape(&mut doc, rect, area, line).unwrap();
    assert_eq!(doc.transform(rect), first);

    let path = LineFactory.create_shape(&mut doc).unwrap();
    LineFactory.update_shape(&mut doc, path, area, line).unwrap();
    let first = doc.element(path).cloned();
    LineFactory.update_shape(&mut doc, path, area, line).unwrap();
    assert_eq!(doc.element(path).cloned(), first);
    assert_eq!(
        doc.geometry_bbox(path),
        Some(Rect::new(5.0, 10.0, 45.0, 30.0))
    );
}

#[test]
fn cancel_discards_the_shape_until_release() {
    let (mut editor, mut tools) = session();
    let before = editor.document().node_count();
    tools.activate(&mut editor, ToolId::ELLIPSE).unwrap();
    tools.dispatch(&mut editor, &PointerEvent::down((10.0, 10.0)));
    tools.dispatch(&mut editor, &PointerEvent::moved((50.0, 50.0)));
    assert_eq!(editor.document().node_count(), before + 1, "preview shape exists");

    tools.cancel(&mut editor);
    assert_eq!(tools.active().unwrap().state(), ToolState::Cancelled);
    assert_eq!(editor.document().node_count(), before, "preview shape destroyed");

    tools.dispatch(&mut editor, &PointerEvent::moved((60.0, 60.0)));
    tools.dispatch(&mut editor, &PointerEvent::up((60.0, 60.0)));
    assert_eq!(tools.active().unwrap().state(), ToolState::Idle);
    assert_eq!(editor.document().node_count(), before, "nothing was inserted");
    assert!(editor.selection().is_empty());
}

#[test]
fn click_without_drag_creates_nothing() {
    let (mut editor, mut tools) = session();
    let before = editor.document().node_count();
    tools.activate(&mut editor, ToolId::RECTANGLE).unwrap();
    tools.dispatch(&mut editor, &PointerEvent::down((10.0, 10.0)));
    tools.dispatch(&mut editor, &PointerEvent::moved((10.0, 10.0)));
    tools.dispatch(&mut editor, &PointerEvent::up((10.0, 10.0)));
    assert_eq!(editor.document().node_count(), before);
    assert_eq!(tools.active().unwrap().state(), ToolState::Idle);
}

#[test]
fn failed_insertion_returns_the_tool_to_idle() {
    let mut editor = Editor::new(Document::new(), EditorOptions::default());
    let mut tools = ToolRegistry::with_default_tools();
    tools.activate(&mut editor, ToolId::RECTANGLE).unwrap();
    drag(&mut editor, &mut tools, (10.0, 10.0), (40.0, 40.0));

    assert_eq!(tools.active().unwrap().state(), ToolState::Idle);
    assert_eq!(editor.document().node_count(), 1, "only the scene is left");
    assert!(editor.selection().is_empty());
}

#[test]
fn registry_refuses_to_switch_while_tracking() {
    let (mut editor, mut tools) = session();
    tools.activate(&mut editor, ToolId::RECTANGLE).unwrap();
    tools.dispatch(&mut editor, &PointerEvent::down((10.0, 10.0)));
    assert_eq!(
        tools.activate(&mut editor, ToolId::POINTER),
        Err(ToolError::Busy(ToolId::RECTANGLE))
    );
    assert_eq!(tools.active_id(), Some(ToolId::RECTANGLE));

    tools.dispatch(&mut editor, &PointerEvent::up((10.0, 10.0)));
    assert_eq!(tools.activate(&mut editor, ToolId::POINTER), Ok(()));
    assert_eq!(
        tools.activate(&mut editor, ToolId("lasso")),
        Err(ToolError::UnknownTool(ToolId("lasso")))
    );
}

#[test]
fn layer_tool_selects_the_containing_layer() {
    let (mut editor, mut tools) = session();
    let rect = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 80.0, 60.0));
    let layer = editor.document().parent(rect).unwrap();

    tools.activate(&mut editor, ToolId::LAYER).unwrap();
    tools.dispatch(&mut editor, &PointerEvent::down((50.0, 40.0)));
    tools.dispatch(&mut editor, &PointerEvent::up((50.0, 40.0)));
    assert_eq!(editor.selection().items(), &[layer]);
    assert!(
        !editor.editors().contains(rect),
        "the shape editor closed with its selection"
    );
}

#[test]
fn shift_click_toggles() {
    let (mut editor, mut tools) = session();
    let a = draw_rectangle(&mut editor, &mut tools, Rect::new(10.0, 10.0, 40.0, 40.0));
    let b = draw_rectangle(&mut editor, &mut tools, Rect::new(100.0, 100.0, 140.0, 140.0));
    assert_eq!(editor.selection().items(), &[b]);

    let shift_down = PointerEvent::down((25.0, 25.0)).with_modifiers(Modifiers::SHIFT);
    tools.dispatch(&mut editor, &shift_down);
    tools.dispatch(&mut editor, &PointerEvent::up((25.0, 25.0)));
    assert_eq!(editor.selection().items(), &[b, a]);

    tools.dispatch(&mut editor, &shift_down);
    tools.dispatch(&mut editor, &PointerEvent::up((25.0, 25.0)));
    assert_eq!(editor.selection().items(), &[b]);
}

#[test]
fn dragging_a_selection_previews_then_moves() {
    let (mut editor, mut tools) = session();
    let rect = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 80.0, 60.0));

    tools.dispatch(&mut editor, &PointerEvent::down((50.0, 40.0)));
    tools.dispatch(&mut editor, &PointerEvent::moved((60.0, 45.0)));
    let preview = editor.editors().get(rect).unwrap();
    assert_eq!(preview.transform(), Some(Affine::translate((10.0, 5.0))));
    assert!(preview.flags().contains(EditorFlags::OUTLINE), "handles hide while moving");
    assert_eq!(
        editor.document().geometry_bbox(rect),
        Some(Rect::new(20.0, 20.0, 80.0, 60.0)),
        "the document is untouched during the preview"
    );

    tools.dispatch(&mut editor, &PointerEvent::up((60.0, 45.0)));
    assert_eq!(
        editor.document().geometry_bbox(rect),
        Some(Rect::new(30.0, 25.0, 90.0, 65.0))
    );
    let editor_state = editor.editors().get(rect).unwrap();
    assert_eq!(editor_state.transform(), None);
    assert!(!editor_state.flags().contains(EditorFlags::OUTLINE));
}

#[test]
fn cancelling_a_move_restores_the_preview() {
    let (mut editor, mut tools) = session();
    let rect = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 80.0, 60.0));
    tools.dispatch(&mut editor, &PointerEvent::down((50.0, 40.0)));
    tools.dispatch(&mut editor, &PointerEvent::moved((90.0, 90.0)));
    tools.cancel(&mut editor);
    tools.dispatch(&mut editor, &PointerEvent::up((90.0, 90.0)));

    assert_eq!(editor.editors().get(rect).unwrap().transform(), None);
    assert_eq!(
        editor.document().geometry_bbox(rect),
        Some(Rect::new(20.0, 20.0, 80.0, 60.0))
    );
}

#[test]
fn marquee_selects_enclosed_items() {
    let (mut editor, mut tools) = session();
    let a = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 60.0, 60.0));
    let _b = draw_rectangle(&mut editor, &mut tools, Rect::new(120.0, 20.0, 190.0, 60.0));

    tools.dispatch(&mut editor, &PointerEvent::down((150.0, 150.0)));
    assert!(editor.selection().is_empty(), "clicking empty space deselects");
    tools.dispatch(&mut editor, &PointerEvent::moved((5.0, 5.0)));

    let mut canvas = RecordingCanvas::new(Rect::new(0.0, 0.0, 200.0, 200.0));
    tools.paint(&editor, &mut canvas);
    assert_eq!(strokes(&canvas), 1, "the marquee is drawn");

    tools.dispatch(&mut editor, &PointerEvent::up((5.0, 5.0)));
    assert_eq!(editor.selection().items(), &[a], "only fully enclosed items");
}

#[test]
fn group_selection_draws_one_outline_per_selected_editor() {
    let (mut editor, _) = session();
    let layer = editor.active_layer().unwrap();
    let doc = editor.document_mut();
    let group = doc.create(Element::Group);
    doc.append_child(layer, group).unwrap();
    let mut shapes = Vec::new();
    for x in [20.0, 100.0] {
        let shape = doc.create(Element::Rectangle(RectangleProps::default()));
        doc.set_transform(shape, Affine::translate((x + 20.0, 50.0)) * Affine::scale(20.0))
            .unwrap();
        doc.append_child(group, shape).unwrap();
        shapes.push(shape);
    }
    editor.process_changes();

    editor.update_selection(|s| s.select_only(group));
    assert_eq!(overlay_strokes(&editor), 1, "one outline for the group");

    editor.update_selection(|s| s.add(shapes[0]));
    assert_eq!(overlay_strokes(&editor), 2, "plus one for the selected child");

    editor.update_selection(|s| s.clear());
    assert_eq!(overlay_strokes(&editor), 0);
    assert!(editor.editors().is_empty(), "unused editors are closed");
}

#[test]
fn handles_are_found_at_bbox_corners() {
    let (mut editor, mut tools) = session();
    let rect = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 80.0, 60.0));
    editor.set_view(Affine::scale(2.0));

    let editors = editor.editors();
    let doc = editor.document();
    let view = editor.view();
    assert_eq!(
        editors.part_at(doc, Point::new(161.0, 119.0), view, 0.0),
        Some(PartInfo {
            element: rect,
            part: Part::ResizeHandle(Corner::BottomRight),
        })
    );
    assert_eq!(editors.part_at(doc, Point::new(100.0, 80.0), view, 0.0), None);
}

#[test]
fn removed_elements_lose_selection_and_editor() {
    let (mut editor, mut tools) = session();
    let rect = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 80.0, 60.0));
    let layer = editor.document().parent(rect).unwrap();

    let doc = editor.document_mut();
    doc.remove_child(layer, rect).unwrap();
    doc.destroy(rect).unwrap();
    editor.process_changes();

    assert!(editor.selection().is_empty());
    assert!(!editor.editors().contains(rect));
    assert!(editor.editors().is_empty(), "ancestor editors are pruned too");
}

#[test]
fn selection_damage_is_in_view_space() {
    let (mut editor, mut tools) = session();
    let rect = draw_rectangle(&mut editor, &mut tools, Rect::new(20.0, 20.0, 80.0, 60.0));
    editor.update_selection(|s| s.clear());
    editor.set_view(Affine::scale(2.0));
    editor.take_damage();

    editor.update_selection(|s| s.select_only(rect));
    let grow = 1.0 + 6.0;
    assert_eq!(
        editor.take_damage(),
        vec![Rect::new(40.0, 40.0, 160.0, 120.0).inflate(grow, grow)]
    );
}
