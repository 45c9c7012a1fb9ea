// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Separable Gaussian blur over premultiplied pixels.

use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Normalized 1D kernel for a blur whose extent is `radius` pixels.
///
/// The standard deviation is a third of the radius, so the kernel covers
/// three sigmas on each side. The half width never exceeds `limit`, since
/// taps past the image edge only repeat the clamped edge pixel.
#[expect(
    clippy::cast_possible_truncation,
    reason = "the half width is clamped to `limit` before casting"
)]
fn kernel(radius: f64, limit: usize) -> (Vec<f32>, usize) {
    let half = radius.ceil().clamp(0.0, limit as f64) as usize;
    if half == 0 {
        return (Vec::new(), 0);
    }
    let sigma = (radius / 3.0) as f32;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (0..=half * 2)
        .map(|i| {
            let x = i as f32 - half as f32;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        for w in &mut weights {
            *w /= sum;
        }
    }
    (weights, half)
}

/// One pass along rows (`horizontal`) or columns, clamping at the edges.
fn pass(
    src: &[[f32; 4]],
    dst: &mut [[f32; 4]],
    width: usize,
    height: usize,
    weights: &[f32],
    half: usize,
    horizontal: bool,
) {
    for y in 0..height {
        for x in 0..width {
            let mut acc = [0.0_f32; 4];
            for (i, w) in weights.iter().enumerate() {
                let (sx, sy) = if horizontal {
                    ((x + i).saturating_sub(half).min(width - 1), y)
                } else {
                    (x, (y + i).saturating_sub(half).min(height - 1))
                };
                let sample = src[sy * width + sx];
                for (a, s) in acc.iter_mut().zip(sample) {
                    *a += s * w;
                }
            }
            dst[y * width + x] = acc;
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "channel values are clamped to [0, 255] before casting"
)]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Blurs `pixmap` in place. A non-positive radius leaves it untouched.
pub(crate) fn gaussian_blur(pixmap: &mut Pixmap, radius: f64) {
    if radius.is_nan() || radius <= 0.0 {
        return;
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let (weights, half) = kernel(radius, width.max(height));
    if weights.is_empty() {
        return;
    }
    let src: Vec<[f32; 4]> = pixmap
        .pixels()
        .iter()
        .map(|p| {
            [
                f32::from(p.red()),
                f32::from(p.green()),
                f32::from(p.blue()),
                f32::from(p.alpha()),
            ]
        })
        .collect();
    let mut temp = vec![[0.0; 4]; src.len()];
    let mut dst = vec![[0.0; 4]; src.len()];
    pass(&src, &mut temp, width, height, &weights, half, true);
    pass(&temp, &mut dst, width, height, &weights, half, false);

    for (px, v) in pixmap.pixels_mut().iter_mut().zip(&dst) {
        let a = to_u8(v[3]);
        // Rounding can push a color channel past alpha; premultiplied storage forbids that.
        let c = |x: f32| to_u8(x).min(a);
        *px = PremultipliedColorU8::from_rgba(c(v[0]), c(v[1]), c(v[2]), a)
            .unwrap_or(PremultipliedColorU8::TRANSPARENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::{Color, Paint, Rect, Transform};

    fn dot() -> Pixmap {
        let mut pixmap = Pixmap::new(21, 21).unwrap();
        let mut paint = Paint::default();
        paint.set_color(Color::BLACK);
        pixmap.fill_rect(
            Rect::from_xywh(10.0, 10.0, 1.0, 1.0).unwrap(),
            &paint,
            Transform::identity(),
            None,
        );
        pixmap
    }

    fn alpha(pixmap: &Pixmap, x: u32, y: u32) -> u8 {
        pixmap.pixel(x, y).map_or(0, |p| p.alpha())
    }

    #[test]
    fn zero_radius_is_identity() {
        let mut pixmap = dot();
        let before = pixmap.clone();
        gaussian_blur(&mut pixmap, 0.0);
        assert_eq!(pixmap.data(), before.data(), "nothing changed");
    }

    #[test]
    fn blur_spreads_within_radius() {
        let mut pixmap = dot();
        gaussian_blur(&mut pixmap, 3.0);
        assert!(alpha(&pixmap, 10, 10) < 255, "center lost coverage");
        assert!(alpha(&pixmap, 11, 10) > 0, "neighbor gained coverage");
        assert_eq!(alpha(&pixmap, 14, 10), 0, "beyond the radius stays clear");
        assert_eq!(alpha(&pixmap, 11, 10), alpha(&pixmap, 9, 10), "symmetric");
    }

    #[test]
    fn kernel_is_normalized() {
        let (weights, half) = kernel(4.5, 64);
        assert_eq!(half, 5);
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5, "sum {sum}");
    }

    #[test]
    fn huge_radii_are_bounded_by_the_image() {
        let (weights, half) = kernel(1e8, 21);
        assert_eq!(half, 21, "half width saturates at the image size");
        assert_eq!(weights.len(), 43, "kernel has 2 * half + 1 taps");

        let mut pixmap = dot();
        gaussian_blur(&mut pixmap, f64::INFINITY);
        gaussian_blur(&mut pixmap, 1e8);
        assert!(alpha(&pixmap, 10, 10) < 255, "coverage spread out");
    }
}
