// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint and hit-test traversal of a [`Document`].

use core::fmt;

use infinity_scene::{
    CompositeMode, Document, EffectEntry, Element, ElementFlags, FilterEntry, NodeId, PaintKind,
    Pattern, ShadowEffect, StrokeAlignment, StrokeProps, Style,
};
use infinity_vertex::hit::{HitKind, HitParams, HitScore, hit_test_fill, hit_test_stroke};
use infinity_vertex::{VertexContainer, to_bez_path};
use kurbo::{Affine, Point, Rect, Shape, Vec2};
use peniko::Color;
use smallvec::SmallVec;
use tracing::trace;

use crate::{PaintCanvas, device_offset, device_scale};

/// How elements are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PaintMode {
    /// Styles are resolved and painted.
    #[default]
    Full,
    /// Shape geometry is drawn as hairlines; styles are ignored.
    Outline,
}

/// Options for [`RenderEngine::render`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Full or outline rendering.
    pub mode: PaintMode,
    /// Device-space area being repainted; elements outside it are skipped.
    pub clip: Option<Rect>,
    /// Hairline color in [`PaintMode::Outline`].
    pub outline_color: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: PaintMode::Full,
            clip: None,
            outline_color: Color::BLACK,
        }
    }
}

/// Options for [`RenderEngine::hit_test`].
#[derive(Clone, Copy, Default)]
pub struct HitTestOptions<'a> {
    /// Extra distance in device pixels that still counts as a hit.
    pub tolerance: f64,
    /// Collect every hit front to back instead of stopping at the first.
    pub stacked: bool,
    /// Maximum depth below the start node; `None` is unlimited.
    pub level: Option<usize>,
    /// Filters which elements may be reported. Rejected elements are still
    /// descended into.
    pub acceptor: Option<&'a dyn Fn(&Document, NodeId) -> bool>,
}

impl fmt::Debug for HitTestOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitTestOptions")
            .field("tolerance", &self.tolerance)
            .field("stacked", &self.stacked)
            .field("level", &self.level)
            .field("acceptor", &self.acceptor.is_some())
            .finish()
    }
}

/// One element reported by [`RenderEngine::hit_test`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hit {
    /// The element that was hit.
    pub element: NodeId,
    /// Style chain index of the paint entry that was hit, if any.
    pub entry: Option<usize>,
    /// Whether an interior or an outline was hit.
    pub kind: HitKind,
}

/// Hits in front-to-back order.
pub type Hits = SmallVec<[Hit; 4]>;

/// Walks a document to paint it or to find what lies under a point.
///
/// The engine borrows the document immutably, so a render pass always sees a
/// consistent tree.
#[derive(Clone, Copy, Debug)]
pub struct RenderEngine<'a> {
    document: &'a Document,
    options: RenderOptions,
}

impl<'a> RenderEngine<'a> {
    /// An engine with default options.
    #[must_use]
    pub fn new(document: &'a Document) -> Self {
        Self::with_options(document, RenderOptions::default())
    }

    /// An engine with the given options.
    #[must_use]
    pub fn with_options(document: &'a Document, options: RenderOptions) -> Self {
        Self { document, options }
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Paints `root` and its descendants onto `canvas`.
    ///
    /// The canvas transform maps world coordinates to device pixels and is
    /// left unchanged.
    pub fn render<C: PaintCanvas>(&self, canvas: &mut C, root: NodeId) {
        self.render_node(canvas, root);
    }

    fn render_node<C: PaintCanvas>(&self, canvas: &mut C, id: NodeId) {
        let doc = self.document;
        let Some(element) = doc.element(id) else {
            return;
        };
        if doc
            .flags(id)
            .intersects(ElementFlags::HIDDEN | ElementFlags::NO_PAINT)
        {
            return;
        }
        let Some(bbox) = doc.paint_bbox(id) else {
            return;
        };
        let device = canvas.transform().transform_rect_bbox(bbox);
        if !overlaps(device, canvas.extents())
            || self.options.clip.is_some_and(|clip| !overlaps(device, clip))
        {
            trace!(?id, "culled");
            return;
        }
        trace!(?id, tag = element.tag().name(), "render");

        if self.options.mode == PaintMode::Outline {
            self.render_outline(canvas, id, element);
            return;
        }
        match element {
            Element::Page(props) => {
                if let Some(color) = props.color {
                    canvas.fill_rect(props.bounds(), color, 1.0, CompositeMode::Normal);
                }
                self.render_children(canvas, id);
            }
            Element::Slice(_) => {}
            _ => match doc.style(id) {
                Some(style) => self.render_styled(canvas, id, element, style, device),
                None => self.render_children(canvas, id),
            },
        }
    }

    fn render_children<C: PaintCanvas>(&self, canvas: &mut C, id: NodeId) {
        for &child in self.document.children(id) {
            self.render_node(canvas, child);
        }
    }

    fn render_outline<C: PaintCanvas>(&self, canvas: &mut C, id: NodeId, element: &Element) {
        let hairline = StrokeProps {
            width: 0.0,
            ..StrokeProps::default()
        };
        let pattern = Pattern::Solid(self.options.outline_color);
        let mut drew = false;
        if let Element::Page(props) = element {
            let mut page = VertexContainer::from_shape(&props.bounds(), 0.1);
            canvas.put_vertices(&mut page);
            drew = true;
        } else if let Some(mut source) = self.document.raw_vertices(id) {
            canvas.put_vertices(&mut *source);
            drew = true;
        }
        if drew {
            canvas.stroke_vertices(&pattern, &hairline, 1.0, CompositeMode::Normal);
        }
        self.render_children(canvas, id);
    }

    fn render_styled<C: PaintCanvas>(
        &self,
        canvas: &mut C,
        id: NodeId,
        element: &Element,
        style: &Style,
        device: Rect,
    ) {
        if !style.needs_isolation() {
            self.paint_entries(canvas, id, element, style);
            self.render_children(canvas, id);
            return;
        }

        let scale = device_scale(canvas.transform());
        let pad = style.padding();
        let reach = pad.x0.max(pad.y0).max(pad.x1).max(pad.y1) * scale;
        let area = device.intersect(canvas.extents().inflate(reach, reach));
        let Some(mut content) = canvas.create_canvas(area) else {
            return;
        };
        trace!(?id, ?area, "isolated");
        self.paint_entries(&mut content, id, element, style);
        self.render_children(&mut content, id);
        for filter in style.filters() {
            match *filter {
                FilterEntry::Blur { radius } => content.blur(radius * scale),
            }
        }

        for effect in style.effects() {
            let EffectEntry::Shadow(shadow) = *effect;
            if !shadow.inner {
                drop_shadow(canvas, &content, &shadow, style.opacity());
            }
        }
        for effect in style.effects() {
            let EffectEntry::Shadow(shadow) = *effect;
            if shadow.inner {
                inner_shadow(&mut content, &shadow);
            }
        }
        canvas.draw_canvas(&content, Vec2::ZERO, style.opacity(), style.blend());
    }

    fn paint_entries<C: PaintCanvas>(
        &self,
        canvas: &mut C,
        id: NodeId,
        element: &Element,
        style: &Style,
    ) {
        let doc = self.document;
        if let Element::Image(props) = element
            && let Some(data) = props.state.data()
        {
            let to_world = doc.world_transform(id)
                * Affine::scale_non_uniform(
                    props.width / f64::from(data.width()),
                    props.height / f64::from(data.height()),
                );
            canvas.draw_image(data, to_world, 1.0);
        }

        let mut paints = style.paints().filter(|(_, p)| p.is_visible()).peekable();
        if paints.peek().is_none() {
            return;
        }
        let Some(mut source) = doc.vertices(id) else {
            return;
        };
        canvas.put_vertices(&mut *source);
        for (_, paint) in paints {
            match paint.kind {
                PaintKind::Fill => {
                    canvas.fill_vertices(&paint.pattern, paint.opacity, paint.blend);
                }
                PaintKind::Stroke(stroke) => {
                    canvas.stroke_vertices(&paint.pattern, &stroke, paint.opacity, paint.blend);
                }
            }
        }
    }

    /// Elements under `point`, front-most first.
    ///
    /// `point` and [`HitTestOptions::tolerance`] are in device pixels; `view`
    /// maps world coordinates to device pixels. Children are tested before
    /// their parent and later siblings before earlier ones, matching the
    /// reverse of paint order.
    #[must_use]
    pub fn hit_test(
        &self,
        root: NodeId,
        point: Point,
        view: Affine,
        options: &HitTestOptions<'_>,
    ) -> Hits {
        let mut hits = Hits::new();
        self.hit_node(root, point, view, options, 0, &mut hits);
        hits
    }

    /// Returns `true` once traversal should stop.
    fn hit_node(
        &self,
        id: NodeId,
        point: Point,
        view: Affine,
        options: &HitTestOptions<'_>,
        depth: usize,
        hits: &mut Hits,
    ) -> bool {
        let doc = self.document;
        let Some(element) = doc.element(id) else {
            return false;
        };
        let flags = doc.flags(id);
        if flags.contains(ElementFlags::HIDDEN) {
            return false;
        }
        let Some(bbox) = doc.paint_bbox(id) else {
            return false;
        };
        let tolerance = options.tolerance.max(0.0);
        let device = view
            .transform_rect_bbox(bbox)
            .inflate(tolerance, tolerance);
        if !contains(device, point) {
            return false;
        }
        trace!(?id, depth, "hit test");

        let accepted = options.acceptor.is_none_or(|accept| accept(doc, id));
        if accepted && flags.contains(ElementFlags::HIT_AS_UNIT) && !doc.children(id).is_empty() {
            hits.push(Hit {
                element: id,
                entry: None,
                kind: HitKind::Fill,
            });
            return !options.stacked;
        }

        if options.level.is_none_or(|level| depth < level) {
            for &child in doc.children(id).iter().rev() {
                if self.hit_node(child, point, view, options, depth + 1, hits) {
                    return true;
                }
            }
        }

        if !accepted {
            return false;
        }
        match self.hit_element(id, element, point, view, tolerance) {
            Some(hit) => {
                hits.push(hit);
                !options.stacked
            }
            None => false,
        }
    }

    fn hit_element(
        &self,
        id: NodeId,
        element: &Element,
        point: Point,
        view: Affine,
        tolerance: f64,
    ) -> Option<Hit> {
        let doc = self.document;
        let params = HitParams::with_tolerance(tolerance);
        let whole = |score: HitScore| Hit {
            element: id,
            entry: None,
            kind: score.kind,
        };
        match element {
            Element::Page(props) => {
                let area = view.transform_rect_bbox(props.bounds()).inflate(tolerance, tolerance);
                contains(area, point).then_some(Hit {
                    element: id,
                    entry: None,
                    kind: HitKind::Fill,
                })
            }
            Element::Image(_) => {
                let outline = view * to_bez_path(&mut *doc.raw_vertices(id)?);
                hit_test_fill(&outline, point, &params).map(whole)
            }
            _ => {
                let style = doc.style(id)?;
                let path = view * to_bez_path(&mut *doc.vertices(id)?);
                let scale = device_scale(view);
                let inside = || path.winding(point) != 0;
                style
                    .paints()
                    .rev()
                    .filter(|(_, paint)| paint.is_visible())
                    .find_map(|(index, paint)| {
                        let score = match paint.kind {
                            PaintKind::Fill => hit_test_fill(&path, point, &params),
                            PaintKind::Stroke(stroke) => {
                                let width = stroke.width * scale;
                                match stroke.alignment {
                                    StrokeAlignment::Center => {
                                        hit_test_stroke(&path, point, width * 0.5, &params)
                                    }
                                    StrokeAlignment::Inside => {
                                        hit_test_stroke(&path, point, width, &params)
                                            .filter(|s| inside() || s.distance <= tolerance)
                                    }
                                    StrokeAlignment::Outside => {
                                        hit_test_stroke(&path, point, width, &params)
                                            .filter(|s| !inside() || s.distance <= tolerance)
                                    }
                                }
                            }
                        }?;
                        Some(Hit {
                            element: id,
                            entry: Some(index),
                            kind: score.kind,
                        })
                    })
            }
        }
    }
}

/// Paints a blurred, offset copy of `content`'s coverage beneath it.
fn drop_shadow<C: PaintCanvas>(parent: &mut C, content: &C, shadow: &ShadowEffect, opacity: f32) {
    let Some(mut shade) = parent.create_canvas(content.extents()) else {
        return;
    };
    let offset = device_offset(parent.transform(), Vec2::new(shadow.x, shadow.y));
    shade.flood(shadow.color);
    shade.draw_canvas(content, offset, 1.0, CompositeMode::DestinationIn);
    shade.blur(shadow.radius * device_scale(parent.transform()));
    parent.draw_canvas(&shade, Vec2::ZERO, opacity, CompositeMode::Normal);
}

/// Darkens the inside edges of `content` opposite the shadow offset.
fn inner_shadow<C: PaintCanvas>(content: &mut C, shadow: &ShadowEffect) {
    let Some(mut shade) = content.create_canvas(content.extents()) else {
        return;
    };
    let offset = device_offset(content.transform(), Vec2::new(shadow.x, shadow.y));
    shade.flood(shadow.color);
    shade.draw_canvas(content, offset, 1.0, CompositeMode::DestinationOut);
    shade.blur(shadow.radius * device_scale(content.transform()));
    shade.draw_canvas(content, Vec2::ZERO, 1.0, CompositeMode::DestinationIn);
    content.draw_canvas(&shade, Vec2::ZERO, 1.0, CompositeMode::SourceAtop);
}

/// Closed-interval overlap, so zero-width boxes still count.
fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn contains(r: Rect, p: Point) -> bool {
    p.x >= r.x0 && p.x <= r.x1 && p.y >= r.y0 && p.y <= r.y1
}
