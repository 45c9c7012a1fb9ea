// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer drag tracking in view coordinates.

use kurbo::{Point, Vec2};

/// Start and last pointer positions of a drag gesture.
///
/// [`update`](Self::update) yields the step since the previous position and
/// [`total_offset`](Self::total_offset) the displacement since the start;
/// tools use the former for incremental feedback and the latter to rebuild
/// previews from scratch on every move.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DragState {
    origin: Option<Point>,
    last: Option<Point>,
}

impl DragState {
    /// Begins a drag at `pos`, discarding any previous one.
    pub fn start(&mut self, pos: Point) {
        self.origin = Some(pos);
        self.last = Some(pos);
    }

    /// Records `pos` and returns the step since the previous position.
    pub fn update(&mut self, pos: Point) -> Option<Vec2> {
        self.origin?;
        let step = self.last.map(|last| pos - last);
        self.last = Some(pos);
        step
    }

    /// Displacement of `pos` from the start of the drag.
    #[must_use]
    pub fn total_offset(&self, pos: Point) -> Option<Vec2> {
        self.origin.map(|origin| pos - origin)
    }

    /// Where the drag started.
    #[must_use]
    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    /// The most recent position.
    #[must_use]
    pub fn last(&self) -> Option<Point> {
        self.last
    }

    /// Ends the drag.
    pub fn end(&mut self) {
        *self = Self::default();
    }

    /// Returns `true` between [`start`](Self::start) and [`end`](Self::end).
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.origin.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_add_up_to_the_total() {
        let mut drag = DragState::default();
        assert_eq!(drag.update(Point::new(3.0, 3.0)), None, "idle drags report nothing");

        drag.start(Point::new(10.0, 20.0));
        assert!(drag.is_dragging());
        assert_eq!(drag.update(Point::new(15.0, 25.0)), Some(Vec2::new(5.0, 5.0)));
        assert_eq!(drag.update(Point::new(12.0, 30.0)), Some(Vec2::new(-3.0, 5.0)));
        assert_eq!(
            drag.total_offset(Point::new(12.0, 30.0)),
            Some(Vec2::new(2.0, 10.0))
        );
        assert_eq!(drag.last(), Some(Point::new(12.0, 30.0)));

        drag.end();
        assert!(!drag.is_dragging());
        assert_eq!(drag.total_offset(Point::ZERO), None);
    }

    #[test]
    fn restarting_resets_the_origin() {
        let mut drag = DragState::default();
        drag.start(Point::ZERO);
        drag.update(Point::new(10.0, 10.0));
        drag.start(Point::new(50.0, 60.0));
        assert_eq!(drag.origin(), Some(Point::new(50.0, 60.0)));
        assert_eq!(drag.update(Point::new(55.0, 60.0)), Some(Vec2::new(5.0, 0.0)));
    }
}
