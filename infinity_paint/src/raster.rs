// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A [`PaintCanvas`] that rasterizes with `tiny-skia`.

use core::fmt;

use infinity_scene::{
    CompositeMode, ExportError, ImageData, LineCap, LineJoin, Pattern, StrokeAlignment,
    StrokeProps,
};
use infinity_vertex::{VertexSource, to_bez_path};
use kurbo::{Affine, BezPath, PathEl, Rect, Vec2};
use peniko::Color;
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, GradientStop, IntSize, Mask, Paint, Path, PathBuilder,
    Pixmap, PixmapPaint, PremultipliedColorU8, Shader, SpreadMode, Stroke, Transform,
};

use crate::PaintCanvas;
use crate::blur::gaussian_blur;

/// A premultiplied RGBA8 pixel buffer placed at an integer device origin.
pub struct RasterCanvas {
    pixmap: Pixmap,
    origin: (i32, i32),
    transform: Affine,
    path: Option<Path>,
}

impl fmt::Debug for RasterCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterCanvas")
            .field("origin", &self.origin)
            .field("width", &self.pixmap.width())
            .field("height", &self.pixmap.height())
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}

impl RasterCanvas {
    /// A transparent canvas of `width × height` pixels at the device origin.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            origin: (0, 0),
            transform: Affine::IDENTITY,
            path: None,
        })
    }

    /// A transparent canvas covering `extents`, expanded to whole pixels.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "extents are finite and whole after `expand`; the integer conversions are checked"
    )]
    pub fn with_extents(extents: Rect) -> Option<Self> {
        let area = extents.expand();
        if !area.is_finite() || area.width() < 1.0 || area.height() < 1.0 {
            return None;
        }
        let width = u32::try_from(area.width() as i64).ok()?;
        let height = u32::try_from(area.height() as i64).ok()?;
        let mut canvas = Self::new(width, height)?;
        canvas.origin = (
            i32::try_from(area.x0 as i64).ok()?,
            i32::try_from(area.y0 as i64).ok()?,
        );
        Some(canvas)
    }

    /// Premultiplied RGBA of the device pixel at `(x, y)`.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let px = u32::try_from(x - self.origin.0).ok()?;
        let py = u32::try_from(y - self.origin.1).ok()?;
        let p = self.pixmap.pixel(px, py)?;
        Some([p.red(), p.green(), p.blue(), p.alpha()])
    }

    /// The underlying pixmap.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Consumes the canvas and returns its pixmap.
    #[must_use]
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Encodes the pixels as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        self.pixmap
            .encode_png()
            .map_err(|e| ExportError::Encode(e.to_string()))
    }

    fn device_transform(&self, transform: Affine) -> Transform {
        let shift = Affine::translate((-f64::from(self.origin.0), -f64::from(self.origin.1)));
        to_skia_transform(shift * transform)
    }

    fn clear_outside(&mut self, x: i32, y: i32, width: u32, height: u32) {
        let stride = self.pixmap.width() as usize;
        let (x1, y1) = (x.saturating_add_unsigned(width), y.saturating_add_unsigned(height));
        for (i, px) in self.pixmap.pixels_mut().iter_mut().enumerate() {
            let (cx, cy) = (i % stride, i / stride);
            let inside = i32::try_from(cx).is_ok_and(|cx| cx >= x && cx < x1)
                && i32::try_from(cy).is_ok_and(|cy| cy >= y && cy < y1);
            if !inside {
                *px = PremultipliedColorU8::TRANSPARENT;
            }
        }
    }
}

impl PaintCanvas for RasterCanvas {
    fn extents(&self) -> Rect {
        let (x, y) = (f64::from(self.origin.0), f64::from(self.origin.1));
        Rect::new(
            x,
            y,
            x + f64::from(self.pixmap.width()),
            y + f64::from(self.pixmap.height()),
        )
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn put_vertices(&mut self, source: &mut dyn VertexSource) {
        self.path = to_skia_path(&to_bez_path(source));
    }

    fn fill_vertices(&mut self, pattern: &Pattern, opacity: f32, blend: CompositeMode) {
        let Some(paint) = make_paint(pattern, opacity, blend) else {
            return;
        };
        let ts = self.device_transform(self.transform);
        if let Some(path) = &self.path {
            self.pixmap.fill_path(path, &paint, FillRule::Winding, ts, None);
        }
    }

    fn stroke_vertices(
        &mut self,
        pattern: &Pattern,
        stroke: &StrokeProps,
        opacity: f32,
        blend: CompositeMode,
    ) {
        let Some(paint) = make_paint(pattern, opacity, blend) else {
            return;
        };
        let ts = self.device_transform(self.transform);
        let Some(path) = &self.path else {
            return;
        };
        if stroke.alignment == StrokeAlignment::Center {
            let style = make_stroke(stroke, stroke.width);
            self.pixmap.stroke_path(path, &paint, &style, ts, None);
            return;
        }
        // One-sided strokes are centered strokes of twice the width, masked
        // by the fill area or its complement.
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        mask.fill_path(path, FillRule::Winding, true, ts);
        if stroke.alignment == StrokeAlignment::Outside {
            mask.invert();
        }
        let style = make_stroke(stroke, stroke.width * 2.0);
        self.pixmap.stroke_path(path, &paint, &style, ts, Some(&mask));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color, opacity: f32, blend: CompositeMode) {
        let Some(paint) = make_paint(&Pattern::Solid(color), opacity, blend) else {
            return;
        };
        let ts = self.device_transform(self.transform);
        if let Some(rect) = tiny_skia::Rect::from_ltrb(
            f64_to_f32(rect.x0),
            f64_to_f32(rect.y0),
            f64_to_f32(rect.x1),
            f64_to_f32(rect.y1),
        ) {
            self.pixmap.fill_rect(rect, &paint, ts, None);
        }
    }

    fn flood(&mut self, color: Color) {
        self.pixmap.fill(to_skia_color(color, 1.0));
    }

    fn draw_image(&mut self, image: &ImageData, transform: Affine, opacity: f32) {
        let Some(size) = IntSize::from_wh(image.width(), image.height()) else {
            return;
        };
        let Some(pixels) = Pixmap::from_vec(image.pixels().to_vec(), size) else {
            return;
        };
        let paint = PixmapPaint {
            opacity,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Bilinear,
        };
        let ts = self.device_transform(self.transform * transform);
        self.pixmap.draw_pixmap(0, 0, pixels.as_ref(), &paint, ts, None);
    }

    fn create_canvas(&self, extents: Rect) -> Option<Self> {
        let mut canvas = Self::with_extents(extents)?;
        canvas.transform = self.transform;
        Some(canvas)
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "offsets are rounded to whole device pixels"
    )]
    fn draw_canvas(&mut self, source: &Self, offset: Vec2, opacity: f32, blend: CompositeMode) {
        let x = source.origin.0 - self.origin.0 + offset.x.round() as i32;
        let y = source.origin.1 - self.origin.1 + offset.y.round() as i32;
        let paint = PixmapPaint {
            opacity,
            blend_mode: map_blend(blend),
            quality: FilterQuality::Nearest,
        };
        self.pixmap
            .draw_pixmap(x, y, source.pixmap.as_ref(), &paint, Transform::identity(), None);
        if blend.is_unbounded() {
            self.clear_outside(x, y, source.pixmap.width(), source.pixmap.height());
        }
    }

    fn blur(&mut self, radius: f64) {
        gaussian_blur(&mut self.pixmap, radius);
    }

    fn clear(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "tiny-skia consumes f32; precision loss from f64 geometry is acceptable"
)]
fn f64_to_f32(v: f64) -> f32 {
    v as f32
}

fn to_skia_transform(xf: Affine) -> Transform {
    let [a, b, c, d, e, f] = xf.as_coeffs();
    // kurbo stores [sx, ky, kx, sy, tx, ty]; tiny-skia's from_row uses the same order.
    Transform::from_row(
        f64_to_f32(a),
        f64_to_f32(b),
        f64_to_f32(c),
        f64_to_f32(d),
        f64_to_f32(e),
        f64_to_f32(f),
    )
}

fn to_skia_path(path: &BezPath) -> Option<Path> {
    let mut pb = PathBuilder::new();
    let p = |pt: kurbo::Point| (f64_to_f32(pt.x), f64_to_f32(pt.y));
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(a) => {
                let (x, y) = p(a);
                pb.move_to(x, y);
            }
            PathEl::LineTo(a) => {
                let (x, y) = p(a);
                pb.line_to(x, y);
            }
            PathEl::QuadTo(c, a) => {
                let ((cx, cy), (x, y)) = (p(c), p(a));
                pb.quad_to(cx, cy, x, y);
            }
            PathEl::CurveTo(c1, c2, a) => {
                let ((x1, y1), (x2, y2), (x, y)) = (p(c1), p(c2), p(a));
                pb.cubic_to(x1, y1, x2, y2, x, y);
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

fn to_skia_color(color: Color, opacity: f32) -> tiny_skia::Color {
    let c = color.multiply_alpha(opacity.clamp(0.0, 1.0)).to_rgba8();
    tiny_skia::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn make_shader(pattern: &Pattern, opacity: f32) -> Option<Shader<'static>> {
    match pattern {
        Pattern::Solid(color) => Some(Shader::SolidColor(to_skia_color(*color, opacity))),
        Pattern::LinearGradient { start, end, stops } => {
            let stops = stops
                .iter()
                .map(|s| GradientStop::new(s.offset, to_skia_color(s.color, opacity)))
                .collect();
            tiny_skia::LinearGradient::new(
                tiny_skia::Point::from_xy(f64_to_f32(start.0), f64_to_f32(start.1)),
                tiny_skia::Point::from_xy(f64_to_f32(end.0), f64_to_f32(end.1)),
                stops,
                SpreadMode::Pad,
                Transform::identity(),
            )
        }
    }
}

fn make_paint(pattern: &Pattern, opacity: f32, blend: CompositeMode) -> Option<Paint<'static>> {
    let mut paint = Paint::default();
    paint.shader = make_shader(pattern, opacity)?;
    paint.blend_mode = map_blend(blend);
    paint.anti_alias = true;
    Some(paint)
}

fn make_stroke(props: &StrokeProps, width: f64) -> Stroke {
    Stroke {
        width: f64_to_f32(width.max(0.0)),
        miter_limit: f64_to_f32(props.miter_limit),
        line_cap: match props.cap {
            LineCap::Butt => tiny_skia::LineCap::Butt,
            LineCap::Round => tiny_skia::LineCap::Round,
            LineCap::Square => tiny_skia::LineCap::Square,
        },
        line_join: match props.join {
            LineJoin::Miter => tiny_skia::LineJoin::Miter,
            LineJoin::Round => tiny_skia::LineJoin::Round,
            LineJoin::Bevel => tiny_skia::LineJoin::Bevel,
        },
        dash: None,
    }
}

fn map_blend(mode: CompositeMode) -> BlendMode {
    match mode {
        CompositeMode::Normal => BlendMode::SourceOver,
        CompositeMode::Multiply => BlendMode::Multiply,
        CompositeMode::Screen => BlendMode::Screen,
        CompositeMode::Overlay => BlendMode::Overlay,
        CompositeMode::Darken => BlendMode::Darken,
        CompositeMode::Lighten => BlendMode::Lighten,
        CompositeMode::ColorDodge => BlendMode::ColorDodge,
        CompositeMode::ColorBurn => BlendMode::ColorBurn,
        CompositeMode::HardLight => BlendMode::HardLight,
        CompositeMode::SoftLight => BlendMode::SoftLight,
        CompositeMode::Difference => BlendMode::Difference,
        CompositeMode::Exclusion => BlendMode::Exclusion,
        CompositeMode::Hue => BlendMode::Hue,
        CompositeMode::Saturation => BlendMode::Saturation,
        CompositeMode::Color => BlendMode::Color,
        CompositeMode::Luminosity => BlendMode::Luminosity,
        CompositeMode::SourceAtop => BlendMode::SourceAtop,
        CompositeMode::SourceIn => BlendMode::SourceIn,
        CompositeMode::SourceOut => BlendMode::SourceOut,
        CompositeMode::DestinationOver => BlendMode::DestinationOver,
        CompositeMode::DestinationAtop => BlendMode::DestinationAtop,
        CompositeMode::DestinationIn => BlendMode::DestinationIn,
        CompositeMode::DestinationOut => BlendMode::DestinationOut,
        CompositeMode::Xor => BlendMode::Xor,
        CompositeMode::Lighter => BlendMode::Plus,
        CompositeMode::Copy => BlendMode::Source,
    }
}
