// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use infinity_scene::{PatternPaint, Style};
use peniko::Color;

/// Sizes and colors of the editing overlay, plus defaults for new shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorOptions {
    /// Side length of a regular handle annotation, in view pixels.
    pub annotation_size: f64,
    /// Side length of a small handle annotation, in view pixels.
    pub small_annotation_size: f64,
    /// Size of the center cross drawn while creating shapes.
    pub center_cross_size: f64,
    /// Extra pixels around every decoration bbox.
    pub bbox_margin: f64,
    /// Outline color of selected elements.
    pub selection_color: Color,
    /// Outline color of highlighted elements; wins over the selection color.
    pub highlight_color: Color,
    /// Hit-test tolerance for tools, in view pixels.
    pub hit_tolerance: f64,
    /// Style given to shapes created by shape tools.
    pub shape_style: Style,
}

impl Default for EditorOptions {
    fn default() -> Self {
        let shape_style = Style::from_entries([
            PatternPaint::fill(Color::WHITE).into(),
            PatternPaint::stroke(Color::BLACK, 1.0).into(),
        ])
        .unwrap_or_default();
        Self {
            annotation_size: 6.0,
            small_annotation_size: 4.0,
            center_cross_size: 4.0,
            bbox_margin: 1.0,
            selection_color: Color::from_rgb8(0, 120, 215),
            highlight_color: Color::from_rgb8(255, 140, 0),
            hit_tolerance: 2.0,
            shape_style,
        }
    }
}
