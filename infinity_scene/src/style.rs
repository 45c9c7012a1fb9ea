// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style chains: ordered, typed entries that turn geometry into pixels.
//!
//! A [`Style`] holds four categories of [`StyleEntry`]:
//!
//! - [`VectorEffect`]: rewrites the vertex source before anything is painted.
//! - [`EffectEntry`]: canvas-level work around the element content, either
//!   before it (drop shadow) or after it (inner shadow).
//! - [`FilterEntry`]: raster post-processing of the painted content.
//! - [`PatternPaint`]: a fill or stroke with a color or gradient.
//!
//! Paint entries terminate the chain: once a paint entry is present only
//! further paint entries may follow. [`Style::push`] and [`Style::insert`]
//! enforce this.
//!
//! Every entry declares the [`Insets`] it needs beyond the geometric bounds;
//! [`Style::padding`] sums them.

use alloc::boxed::Box;
use alloc::vec::Vec;

use infinity_vertex::{VertexPixelAligner, VertexSource, VertexTranslator};
use kurbo::{Insets, Point, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};

use crate::SceneError;

/// How a source is combined with what is already on the canvas.
///
/// The blend modes mix colors and composite with source-over; the Porter-Duff
/// operators only decide coverage.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeMode {
    /// Source over destination.
    #[default]
    Normal,
    /// Multiply blend.
    Multiply,
    /// Screen blend.
    Screen,
    /// Overlay blend.
    Overlay,
    /// Darken blend.
    Darken,
    /// Lighten blend.
    Lighten,
    /// Color dodge blend.
    ColorDodge,
    /// Color burn blend.
    ColorBurn,
    /// Hard light blend.
    HardLight,
    /// Soft light blend.
    SoftLight,
    /// Difference blend.
    Difference,
    /// Exclusion blend.
    Exclusion,
    /// Hue blend.
    Hue,
    /// Saturation blend.
    Saturation,
    /// Color blend.
    Color,
    /// Luminosity blend.
    Luminosity,
    /// Source where the destination is opaque, destination elsewhere.
    SourceAtop,
    /// Source only where the destination is opaque.
    SourceIn,
    /// Source only where the destination is transparent.
    SourceOut,
    /// Destination over source.
    DestinationOver,
    /// Destination where the source is opaque, source elsewhere.
    DestinationAtop,
    /// Keep the destination only where the source is opaque.
    DestinationIn,
    /// Keep the destination only where the source is transparent.
    DestinationOut,
    /// Exclusive or of coverage.
    Xor,
    /// Additive.
    Lighter,
    /// Replace the destination with the source.
    Copy,
}

impl CompositeMode {
    /// Operators that also change the destination outside the source area.
    #[must_use]
    pub const fn is_unbounded(self) -> bool {
        matches!(
            self,
            Self::SourceIn | Self::SourceOut | Self::DestinationIn | Self::DestinationAtop | Self::Copy
        )
    }
}

/// Serde adapter storing a [`Color`] as `#rrggbbaa`.
pub(crate) mod color_hex {
    use alloc::format;
    use alloc::string::String;

    use peniko::Color;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        let c = color.to_rgba8();
        let text = format!("#{:02x}{:02x}{:02x}{:02x}", c.r, c.g, c.b, c.a);
        serializer.serialize_str(&text)
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).ok_or_else(|| D::Error::custom(format!("invalid color `{text}`")))
    }

    pub(crate) fn parse(text: &str) -> Option<Color> {
        let hex = text.strip_prefix('#')?;
        if hex.len() != 8 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, channel(6)?))
    }

    pub(crate) mod option {
        use alloc::string::String;

        use peniko::Color;
        use serde::{Deserialize, Deserializer, Serializer};

        pub(crate) fn serialize<S: Serializer>(
            color: &Option<Color>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match color {
                Some(color) => super::serialize(color, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Color>, D::Error> {
            use serde::de::Error as _;
            match Option::<String>::deserialize(deserializer)? {
                Some(text) => super::parse(&text)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom("invalid color")),
                None => Ok(None),
            }
        }
    }
}

/// A gradient color stop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    /// Position along the gradient, `0.0..=1.0`.
    pub offset: f32,
    /// Color at the stop.
    #[serde(with = "color_hex")]
    pub color: Color,
}

/// What a paint entry paints with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// A solid color.
    Solid(#[serde(with = "color_hex")] Color),
    /// A linear gradient between two points in scene coordinates.
    LinearGradient {
        /// Start point.
        start: (f64, f64),
        /// End point.
        end: (f64, f64),
        /// Color stops in ascending offset order.
        stops: Vec<GradientStop>,
    },
}

impl Pattern {
    /// Start and end of a linear gradient.
    #[must_use]
    pub fn gradient_line(&self) -> Option<(Point, Point)> {
        match self {
            Self::Solid(_) => None,
            Self::LinearGradient { start, end, .. } => {
                Some((Point::from(*start), Point::from(*end)))
            }
        }
    }
}

impl From<Color> for Pattern {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

/// Where a stroke sits relative to the outline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrokeAlignment {
    /// Centered on the outline.
    #[default]
    Center,
    /// Entirely inside the filled area.
    Inside,
    /// Entirely outside the filled area.
    Outside,
}

/// End cap of open strokes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCap {
    /// Flat, ending at the endpoint.
    Butt,
    /// Rounded.
    Round,
    /// Flat, extending half the width past the endpoint.
    #[default]
    Square,
}

/// Corner join of strokes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineJoin {
    /// Sharp corners up to the miter limit.
    #[default]
    Miter,
    /// Rounded corners.
    Round,
    /// Cut-off corners.
    Bevel,
}

/// Stroke geometry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeProps {
    /// Stroke width in scene units.
    pub width: f64,
    /// Placement relative to the outline.
    pub alignment: StrokeAlignment,
    /// End cap.
    pub cap: LineCap,
    /// Corner join.
    pub join: LineJoin,
    /// Miter limit as a multiple of the width.
    pub miter_limit: f64,
}

impl Default for StrokeProps {
    fn default() -> Self {
        Self {
            width: 1.0,
            alignment: StrokeAlignment::Center,
            cap: LineCap::Square,
            join: LineJoin::Miter,
            miter_limit: 10.0,
        }
    }
}

/// Fill or stroke.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaintKind {
    /// Fill the interior with the non-zero rule.
    Fill,
    /// Stroke the outline.
    Stroke(StrokeProps),
}

/// A paint entry: fills or strokes the element's vertex source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternPaint {
    /// Fill or stroke.
    pub kind: PaintKind,
    /// What to paint with.
    pub pattern: Pattern,
    /// Opacity in `0.0..=1.0`.
    #[serde(default = "one")]
    pub opacity: f32,
    /// How the paint combines with what is below it.
    #[serde(default)]
    pub blend: CompositeMode,
}

fn one() -> f32 {
    1.0
}

impl PatternPaint {
    /// A fill with `pattern`.
    pub fn fill(pattern: impl Into<Pattern>) -> Self {
        Self {
            kind: PaintKind::Fill,
            pattern: pattern.into(),
            opacity: 1.0,
            blend: CompositeMode::Normal,
        }
    }

    /// A centered stroke of `width` with `pattern`.
    pub fn stroke(pattern: impl Into<Pattern>, width: f64) -> Self {
        Self {
            kind: PaintKind::Stroke(StrokeProps {
                width,
                ..StrokeProps::default()
            }),
            pattern: pattern.into(),
            opacity: 1.0,
            blend: CompositeMode::Normal,
        }
    }

    /// Replaces the stroke alignment; fills are returned unchanged.
    #[must_use]
    pub fn aligned(mut self, alignment: StrokeAlignment) -> Self {
        if let PaintKind::Stroke(stroke) = &mut self.kind {
            stroke.alignment = alignment;
        }
        self
    }

    /// Replaces the opacity.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Replaces the composite mode.
    #[must_use]
    pub fn with_blend(mut self, blend: CompositeMode) -> Self {
        self.blend = blend;
        self
    }

    /// Pixels needed beyond the geometry.
    #[must_use]
    pub fn padding(&self) -> Insets {
        match self.kind {
            PaintKind::Fill => Insets::ZERO,
            PaintKind::Stroke(stroke) if !stroke.width.is_finite() => Insets::ZERO,
            PaintKind::Stroke(stroke) => match stroke.alignment {
                StrokeAlignment::Center => Insets::uniform(stroke.width * 0.5),
                StrokeAlignment::Outside => Insets::uniform(stroke.width),
                StrokeAlignment::Inside => Insets::ZERO,
            },
        }
    }

    /// Whether painting this entry can change any pixel.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
            && match self.kind {
                PaintKind::Fill => true,
                PaintKind::Stroke(stroke) => stroke.width.is_finite() && stroke.width > 0.0,
            }
    }
}

/// Raster post-processing applied after the paint entries.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterEntry {
    /// Gaussian blur; the radius is the extent of the kernel in scene units.
    Blur {
        /// Kernel radius.
        radius: f64,
    },
}

impl FilterEntry {
    /// Pixels needed beyond the geometry.
    #[must_use]
    pub fn padding(&self) -> Insets {
        match *self {
            Self::Blur { .. } if self.is_noop() => Insets::ZERO,
            Self::Blur { radius } => Insets::uniform(radius),
        }
    }

    /// A filter that leaves pixels untouched.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match *self {
            Self::Blur { radius } => !radius.is_finite() || radius <= 0.0,
        }
    }
}

/// Geometric rewrite of the vertex source.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VectorEffect {
    /// Move every vertex.
    Offset {
        /// Horizontal offset.
        dx: f64,
        /// Vertical offset.
        dy: f64,
    },
    /// Snap every vertex to a pixel center.
    PixelAlign,
}

impl VectorEffect {
    /// Wraps `source`. Effects that change nothing return it unchanged.
    pub fn apply<'a>(&self, source: Box<dyn VertexSource + 'a>) -> Box<dyn VertexSource + 'a> {
        match *self {
            Self::Offset { dx, dy } if dx == 0.0 && dy == 0.0 => source,
            Self::Offset { dx, dy } => Box::new(VertexTranslator::new(source, Vec2::new(dx, dy))),
            Self::PixelAlign => Box::new(VertexPixelAligner::new(source)),
        }
    }
}

/// A shadow around or inside the element content.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowEffect {
    /// Horizontal offset.
    pub x: f64,
    /// Vertical offset.
    pub y: f64,
    /// Blur radius.
    pub radius: f64,
    /// Shadow color.
    #[serde(with = "color_hex")]
    pub color: Color,
    /// Inner shadows are drawn over the content and clipped to it.
    pub inner: bool,
}

impl Default for ShadowEffect {
    fn default() -> Self {
        Self {
            x: 5.0,
            y: 5.0,
            radius: 5.0,
            color: Color::from_rgba8(0, 0, 0, 128),
            inner: false,
        }
    }
}

/// Canvas-level work around the element content.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectEntry {
    /// Drop or inner shadow.
    Shadow(ShadowEffect),
}

impl EffectEntry {
    /// Post effects run after the content has been painted.
    #[must_use]
    pub fn is_post(&self) -> bool {
        match self {
            Self::Shadow(shadow) => shadow.inner,
        }
    }

    /// Pixels needed beyond the geometry.
    #[must_use]
    pub fn padding(&self) -> Insets {
        match *self {
            Self::Shadow(_) if self.is_noop() => Insets::ZERO,
            Self::Shadow(s) if s.inner => Insets::ZERO,
            Self::Shadow(s) => Insets::new(
                (s.radius - s.x).max(0.0),
                (s.radius - s.y).max(0.0),
                (s.radius + s.x).max(0.0),
                (s.radius + s.y).max(0.0),
            ),
        }
    }

    /// An effect that cannot change any pixel.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match self {
            Self::Shadow(s) => {
                ![s.x, s.y, s.radius].iter().all(|v| v.is_finite())
                    || s.color.to_rgba8().a == 0
                    || (s.radius <= 0.0 && s.x == 0.0 && s.y == 0.0)
            }
        }
    }
}

/// One entry of a [`Style`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleEntry {
    /// Geometric rewrite.
    VectorEffect(VectorEffect),
    /// Canvas-level effect.
    Effect(EffectEntry),
    /// Raster filter.
    Filter(FilterEntry),
    /// Fill or stroke.
    Paint(PatternPaint),
}

impl StyleEntry {
    /// `true` for fills and strokes.
    #[must_use]
    pub fn is_paint(&self) -> bool {
        matches!(self, Self::Paint(_))
    }

    /// Pixels needed beyond the geometry.
    #[must_use]
    pub fn padding(&self) -> Insets {
        match self {
            Self::VectorEffect(_) => Insets::ZERO,
            Self::Effect(e) => e.padding(),
            Self::Filter(f) => f.padding(),
            Self::Paint(p) => p.padding(),
        }
    }

    /// Name of the first NaN or infinite numeric parameter.
    fn non_finite_parameter(&self) -> Option<&'static str> {
        let first = |params: &[(&'static str, f64)]| {
            params
                .iter()
                .find(|(_, v)| !v.is_finite())
                .map(|&(name, _)| name)
        };
        match self {
            Self::VectorEffect(VectorEffect::Offset { dx, dy }) => {
                first(&[("dx", *dx), ("dy", *dy)])
            }
            Self::Effect(EffectEntry::Shadow(s)) => {
                first(&[("x", s.x), ("y", s.y), ("radius", s.radius)])
            }
            Self::Filter(FilterEntry::Blur { radius }) => first(&[("radius", *radius)]),
            Self::Paint(PatternPaint {
                kind: PaintKind::Stroke(stroke),
                ..
            }) => first(&[("width", stroke.width), ("miter_limit", stroke.miter_limit)]),
            Self::VectorEffect(VectorEffect::PixelAlign) | Self::Paint(_) => None,
        }
    }

    fn check_finite(&self) -> Result<(), SceneError> {
        match self.non_finite_parameter() {
            Some(name) => Err(SceneError::NonFiniteStyleValue(name)),
            None => Ok(()),
        }
    }
}

impl From<PatternPaint> for StyleEntry {
    fn from(paint: PatternPaint) -> Self {
        Self::Paint(paint)
    }
}

impl From<FilterEntry> for StyleEntry {
    fn from(filter: FilterEntry) -> Self {
        Self::Filter(filter)
    }
}

impl From<VectorEffect> for StyleEntry {
    fn from(effect: VectorEffect) -> Self {
        Self::VectorEffect(effect)
    }
}

impl From<EffectEntry> for StyleEntry {
    fn from(effect: EffectEntry) -> Self {
        Self::Effect(effect)
    }
}

/// An ordered style chain plus the composite settings of the element itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Style {
    entries: Vec<StyleEntry>,
    #[serde(default = "one")]
    opacity: f32,
    #[serde(default)]
    blend: CompositeMode,
}

impl Default for Style {
    fn default() -> Self {
        Self::new()
    }
}

impl Style {
    /// An empty chain with full opacity.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            opacity: 1.0,
            blend: CompositeMode::Normal,
        }
    }

    /// Builds a chain, validating entry order.
    pub fn from_entries(
        entries: impl IntoIterator<Item = StyleEntry>,
    ) -> Result<Self, SceneError> {
        let mut style = Self::new();
        for entry in entries {
            style.push(entry)?;
        }
        Ok(style)
    }

    /// Appends `entry`.
    ///
    /// Fails with [`SceneError::InvalidStyleOrder`] if a non-paint entry would
    /// follow a paint entry, and with [`SceneError::NonFiniteStyleValue`] for
    /// NaN or infinite parameters.
    pub fn push(&mut self, entry: impl Into<StyleEntry>) -> Result<(), SceneError> {
        let entry = entry.into();
        entry.check_finite()?;
        if !entry.is_paint() && self.entries.iter().any(StyleEntry::is_paint) {
            return Err(SceneError::InvalidStyleOrder);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Inserts `entry` at `index` (clamped to the length).
    pub fn insert(&mut self, index: usize, entry: impl Into<StyleEntry>) -> Result<(), SceneError> {
        let entry = entry.into();
        entry.check_finite()?;
        let index = index.min(self.entries.len());
        let before = &self.entries[..index];
        let after = &self.entries[index..];
        let misplaced = if entry.is_paint() {
            after.iter().any(|e| !e.is_paint())
        } else {
            before.iter().any(StyleEntry::is_paint)
        };
        if misplaced {
            return Err(SceneError::InvalidStyleOrder);
        }
        self.entries.insert(index, entry);
        Ok(())
    }

    /// Removes and returns the entry at `index`.
    pub fn remove(&mut self, index: usize) -> Option<StyleEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Checks ordering and parameter values, e.g. after deserializing.
    pub fn validate(&self) -> Result<(), SceneError> {
        self.entries.iter().try_for_each(StyleEntry::check_finite)?;
        let first_paint = self
            .entries
            .iter()
            .position(StyleEntry::is_paint)
            .unwrap_or(self.entries.len());
        if self.entries[first_paint..].iter().all(StyleEntry::is_paint) {
            Ok(())
        } else {
            Err(SceneError::InvalidStyleOrder)
        }
    }

    /// Entries in chain order.
    #[must_use]
    pub fn entries(&self) -> &[StyleEntry] {
        &self.entries
    }

    /// `true` when the chain has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Opacity the element content is composited with.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Sets the element opacity, clamped to `0.0..=1.0`.
    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    /// Composite mode of the element content.
    #[must_use]
    pub fn blend(&self) -> CompositeMode {
        self.blend
    }

    /// Sets the element composite mode.
    pub fn set_blend(&mut self, blend: CompositeMode) {
        self.blend = blend;
    }

    /// Paint entries with their chain indices.
    pub fn paints(&self) -> impl DoubleEndedIterator<Item = (usize, &PatternPaint)> + '_ {
        self.entries.iter().enumerate().filter_map(|(i, e)| match e {
            StyleEntry::Paint(p) => Some((i, p)),
            _ => None,
        })
    }

    /// Filter entries that change pixels.
    pub fn filters(&self) -> impl Iterator<Item = &FilterEntry> + '_ {
        self.entries.iter().filter_map(|e| match e {
            StyleEntry::Filter(f) if !f.is_noop() => Some(f),
            _ => None,
        })
    }

    /// Vector effects in chain order.
    pub fn vector_effects(&self) -> impl Iterator<Item = &VectorEffect> + '_ {
        self.entries.iter().filter_map(|e| match e {
            StyleEntry::VectorEffect(v) => Some(v),
            _ => None,
        })
    }

    /// Effects that change pixels.
    pub fn effects(&self) -> impl Iterator<Item = &EffectEntry> + '_ {
        self.entries.iter().filter_map(|e| match e {
            StyleEntry::Effect(x) if !x.is_noop() => Some(x),
            _ => None,
        })
    }

    /// Sum of the padding of every entry.
    #[must_use]
    pub fn padding(&self) -> Insets {
        self.entries.iter().map(StyleEntry::padding).fold(Insets::ZERO, add_insets)
    }

    /// Whether the content must be rendered on its own surface first.
    #[must_use]
    pub fn needs_isolation(&self) -> bool {
        self.opacity < 1.0
            || self.blend != CompositeMode::Normal
            || self.filters().next().is_some()
            || self.effects().next().is_some()
    }

    /// Whether serialization can skip this style.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self == &Self::new()
    }
}

/// Component-wise sum of two insets.
#[must_use]
pub fn add_insets(a: Insets, b: Insets) -> Insets {
    Insets::new(a.x0 + b.x0, a.y0 + b.y0, a.x1 + b.x1, a.y1 + b.y1)
}
