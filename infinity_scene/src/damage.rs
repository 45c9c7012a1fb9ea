// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Accumulated repaint areas for the host view.

use alloc::vec::Vec;
use kurbo::Rect;

use crate::{Change, ChangeEvent};

/// Regions that need repainting since the host last drained them.
///
/// `Damage` is intentionally coarse: rectangles may overlap and are not
/// deduplicated. The host decides how to coalesce them and when to repaint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Damage {
    /// Rectangles that should be repainted, in the order they were reported.
    pub dirty_rects: Vec<Rect>,
}

impl Damage {
    /// Records `rect`. Empty or non-finite rectangles are ignored.
    pub fn add(&mut self, rect: Rect) {
        if rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0 {
            self.dirty_rects.push(rect);
        }
    }

    /// Records the area of an [`Change::Invalidate`] event; other events are ignored.
    pub fn record(&mut self, event: &ChangeEvent) {
        if let Change::Invalidate { area } = event.change {
            self.add(area);
        }
    }

    /// Returns `true` when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirty_rects.is_empty()
    }

    /// Returns the union of all damage rects.
    #[must_use]
    pub fn union_rect(&self) -> Option<Rect> {
        let mut it = self.dirty_rects.iter().copied();
        let first = it.next()?;
        Some(it.fold(first, |acc, r| acc.union(r)))
    }

    /// Drains the pending rectangles.
    pub fn take(&mut self) -> Vec<Rect> {
        core::mem::take(&mut self.dirty_rects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_covers_every_rect_and_take_drains() {
        let mut damage = Damage::default();
        damage.add(Rect::new(0.0, 0.0, 10.0, 10.0));
        damage.add(Rect::new(20.0, 5.0, 30.0, 8.0));
        damage.add(Rect::new(3.0, 3.0, 3.0, 9.0));
        assert_eq!(damage.dirty_rects.len(), 2, "zero-width rects are dropped");
        assert_eq!(damage.union_rect(), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
        assert_eq!(damage.take().len(), 2);
        assert!(damage.is_empty(), "take leaves nothing behind");
        assert_eq!(damage.union_rect(), None);
    }
}
