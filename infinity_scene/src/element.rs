// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element variants, their capabilities and the insertion rules between them.

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{BezPath, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

use crate::Capabilities;
use crate::image::ImageState;
use crate::style::color_hex;

/// Field-less tag identifying an [`Element`] variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementTag {
    /// Document root.
    Scene,
    /// A page (artboard) directly under the scene.
    Page,
    /// A folder of layers.
    LayerSet,
    /// A layer holding shapes and groups.
    Layer,
    /// A transformable group of shapes.
    Group,
    /// A group that behaves like a single compound shape.
    ShapeSet,
    /// A rectangle.
    Rectangle,
    /// An ellipse.
    Ellipse,
    /// A path built from anchor points.
    Path,
    /// A raster image.
    Image,
    /// An export region; never painted.
    Slice,
}

impl ElementTag {
    /// Every tag, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Scene,
        Self::Page,
        Self::LayerSet,
        Self::Layer,
        Self::Group,
        Self::ShapeSet,
        Self::Rectangle,
        Self::Ellipse,
        Self::Path,
        Self::Image,
        Self::Slice,
    ];

    /// Stable name used as the serialized type tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Scene => "scene",
            Self::Page => "page",
            Self::LayerSet => "layerSet",
            Self::Layer => "layer",
            Self::Group => "group",
            Self::ShapeSet => "shapeSet",
            Self::Rectangle => "rectangle",
            Self::Ellipse => "ellipse",
            Self::Path => "path",
            Self::Image => "image",
            Self::Slice => "slice",
        }
    }

    /// Inverse of [`name`](Self::name).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }

    /// The capabilities this variant is composed of.
    #[must_use]
    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Scene | Self::Page | Self::LayerSet => Capabilities::CONTAINER,
            Self::Layer => Capabilities::CONTAINER.union(Capabilities::STYLABLE),
            Self::Group | Self::ShapeSet => Capabilities::CONTAINER
                .union(Capabilities::TRANSFORM)
                .union(Capabilities::STYLABLE),
            Self::Rectangle | Self::Ellipse | Self::Path | Self::Image => {
                Capabilities::TRANSFORM.union(Capabilities::STYLABLE)
            }
            Self::Slice => Capabilities::TRANSFORM,
        }
    }

    /// Tags this variant may be inserted under.
    #[must_use]
    pub const fn allowed_parents(self) -> &'static [Self] {
        match self {
            Self::Scene => &[],
            Self::Page => &[Self::Scene],
            Self::LayerSet | Self::Layer => &[Self::Page, Self::LayerSet],
            Self::Group | Self::ShapeSet => {
                &[Self::Layer, Self::LayerSet, Self::Group, Self::ShapeSet]
            }
            Self::Rectangle | Self::Ellipse | Self::Path | Self::Image => {
                &[Self::Layer, Self::Group, Self::ShapeSet]
            }
            Self::Slice => &[Self::Layer],
        }
    }

    /// Leaf variants that carry their own geometry.
    #[must_use]
    pub const fn is_shape(self) -> bool {
        matches!(
            self,
            Self::Rectangle | Self::Ellipse | Self::Path | Self::Image | Self::Slice
        )
    }
}

/// Returns `true` if an element tagged `child` may be inserted under `parent`.
///
/// This is the single source of truth for the typed hierarchy; every
/// structural mutation in [`Document`](crate::Document) consults it first.
#[must_use]
pub fn validate_insertion(parent: ElementTag, child: ElementTag) -> bool {
    child.allowed_parents().contains(&parent)
}

/// Page properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageProps {
    /// Display name.
    pub name: String,
    /// Left edge in scene coordinates.
    pub x: f64,
    /// Top edge in scene coordinates.
    pub y: f64,
    /// Width in scene units.
    pub width: f64,
    /// Height in scene units.
    pub height: f64,
    /// Background color; transparent when unset.
    #[serde(with = "color_hex::option", skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl Default for PageProps {
    fn default() -> Self {
        Self {
            name: String::new(),
            x: 0.0,
            y: 0.0,
            width: 800.0,
            height: 600.0,
            color: None,
        }
    }
}

impl PageProps {
    /// The page rectangle in scene coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }
}

/// Layer set properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerSetProps {
    /// Display name.
    pub name: String,
}

/// Layer properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerProps {
    /// Display name.
    pub name: String,
    /// Color used for selection outlines of this layer's content.
    #[serde(with = "color_hex")]
    pub outline_color: Color,
}

impl Default for LayerProps {
    fn default() -> Self {
        Self {
            name: String::new(),
            outline_color: Color::from_rgba8(0, 168, 255, 255),
        }
    }
}

/// Rectangle properties.
///
/// The geometry is the square `[-1, 1]²` mapped by the element transform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleProps {
    /// Corner rounding as a fraction of the half extent, in `0.0..=1.0`.
    pub rounding: f64,
}

/// Ellipse properties.
///
/// The geometry is the unit circle mapped by the element transform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EllipseProps {}

/// One anchor of a [`PathProps`] path, in local coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anchor {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Control point of the segment arriving at this anchor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_in: Option<(f64, f64)>,
    /// Control point of the segment leaving this anchor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_out: Option<(f64, f64)>,
}

impl Anchor {
    /// A corner anchor without handles.
    #[must_use]
    pub const fn corner(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            handle_in: None,
            handle_out: None,
        }
    }

    fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Path properties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathProps {
    /// Anchors in drawing order.
    pub anchors: Vec<Anchor>,
    /// Whether the last anchor connects back to the first.
    pub closed: bool,
}

impl PathProps {
    /// Builds the local outline.
    ///
    /// A segment is cubic when either of its end anchors carries a handle on
    /// that side, and straight otherwise.
    #[must_use]
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(first) = self.anchors.first() else {
            return path;
        };
        path.move_to(first.point());
        let segment = |path: &mut BezPath, from: &Anchor, to: &Anchor| {
            if from.handle_out.is_some() || to.handle_in.is_some() {
                let c1 = from.handle_out.map_or(from.point(), Point::from);
                let c2 = to.handle_in.map_or(to.point(), Point::from);
                path.curve_to(c1, c2, to.point());
            } else {
                path.line_to(to.point());
            }
        };
        for pair in self.anchors.windows(2) {
            segment(&mut path, &pair[0], &pair[1]);
        }
        if self.closed {
            if let Some(last) = self.anchors.last()
                && self.anchors.len() > 1
            {
                segment(&mut path, last, first);
            }
            path.close_path();
        }
        path
    }
}

/// Image properties.
///
/// The geometry is `[0, width] × [0, height]` mapped by the element transform.
/// Only the source reference is persisted; pixels are loaded asynchronously.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageProps {
    /// Where the pixels come from; interpreted by the host's loader.
    pub source: String,
    /// Natural width in scene units.
    pub width: f64,
    /// Natural height in scene units.
    pub height: f64,
    /// Load state.
    #[serde(skip)]
    pub state: ImageState,
}

/// Slice properties.
///
/// The geometry is the square `[-1, 1]²` mapped by the element transform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceProps {
    /// Export name.
    pub name: String,
}

/// A node's variant and its variant-specific properties.
///
/// Behaviors shared between variants (transform, style, children) are not
/// stored here; they live on the node record and are present exactly when
/// [`ElementTag::capabilities`] says so.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    /// Document root.
    Scene,
    /// A page.
    Page(PageProps),
    /// A folder of layers.
    LayerSet(LayerSetProps),
    /// A layer.
    Layer(LayerProps),
    /// A group.
    Group,
    /// A compound shape.
    ShapeSet,
    /// A rectangle.
    Rectangle(RectangleProps),
    /// An ellipse.
    Ellipse(EllipseProps),
    /// A path.
    Path(PathProps),
    /// A raster image.
    Image(ImageProps),
    /// An export region.
    Slice(SliceProps),
}

impl Element {
    /// Tag of this variant.
    #[must_use]
    pub const fn tag(&self) -> ElementTag {
        match self {
            Self::Scene => ElementTag::Scene,
            Self::Page(_) => ElementTag::Page,
            Self::LayerSet(_) => ElementTag::LayerSet,
            Self::Layer(_) => ElementTag::Layer,
            Self::Group => ElementTag::Group,
            Self::ShapeSet => ElementTag::ShapeSet,
            Self::Rectangle(_) => ElementTag::Rectangle,
            Self::Ellipse(_) => ElementTag::Ellipse,
            Self::Path(_) => ElementTag::Path,
            Self::Image(_) => ElementTag::Image,
            Self::Slice(_) => ElementTag::Slice,
        }
    }

    /// An element with default properties for `tag`.
    #[must_use]
    pub fn with_defaults(tag: ElementTag) -> Self {
        match tag {
            ElementTag::Scene => Self::Scene,
            ElementTag::Page => Self::Page(PageProps::default()),
            ElementTag::LayerSet => Self::LayerSet(LayerSetProps::default()),
            ElementTag::Layer => Self::Layer(LayerProps::default()),
            ElementTag::Group => Self::Group,
            ElementTag::ShapeSet => Self::ShapeSet,
            ElementTag::Rectangle => Self::Rectangle(RectangleProps::default()),
            ElementTag::Ellipse => Self::Ellipse(EllipseProps::default()),
            ElementTag::Path => Self::Path(PathProps::default()),
            ElementTag::Image => Self::Image(ImageProps::default()),
            ElementTag::Slice => Self::Slice(SliceProps::default()),
        }
    }

    /// A page with the given name and bounds.
    #[must_use]
    pub fn page(name: &str, bounds: Rect) -> Self {
        Self::Page(PageProps {
            name: name.into(),
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            color: None,
        })
    }

    /// A layer with the given name.
    #[must_use]
    pub fn layer(name: &str) -> Self {
        Self::Layer(LayerProps {
            name: name.into(),
            ..LayerProps::default()
        })
    }

    /// The display name for named variants.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Page(p) => Some(&p.name),
            Self::LayerSet(p) => Some(&p.name),
            Self::Layer(p) => Some(&p.name),
            Self::Slice(p) => Some(&p.name),
            _ => None,
        }
    }
}
