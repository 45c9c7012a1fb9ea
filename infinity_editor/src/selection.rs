// Copyright 2025 the Infinity Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered element selection with primary, anchor and revision.

use alloc::vec::Vec;

/// The set of selected elements.
///
/// Keys are kept in selection order without duplicates. The **primary** key is
/// the most recently added one and drives single-element commands; the
/// **anchor** is the reference point for range gestures. The **revision**
/// counter changes only when contents, primary or anchor change, so observers
/// can cheaply tell whether anything happened.
///
/// Only equality is required of `T`, so generational handles such as
/// [`NodeId`](infinity_scene::NodeId) work as-is.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection<T> {
    items: Vec<T>,
    primary: Option<usize>,
    anchor: Option<usize>,
    revision: u64,
}

impl<T> Selection<T> {
    /// An empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            primary: None,
            anchor: None,
            revision: 0,
        }
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of selected keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Selected keys in selection order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Iterates the selected keys.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// The most recently added key.
    #[must_use]
    pub fn primary(&self) -> Option<&T> {
        self.primary.and_then(|i| self.items.get(i))
    }

    /// The reference key for range gestures.
    #[must_use]
    pub fn anchor(&self) -> Option<&T> {
        self.anchor.and_then(|i| self.items.get(i))
    }

    /// Change counter; unchanged by no-op calls.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Deselects everything.
    pub fn clear(&mut self) {
        if self.items.is_empty() && self.primary.is_none() && self.anchor.is_none() {
            return;
        }
        self.items.clear();
        self.primary = None;
        self.anchor = None;
        self.bump();
    }

    /// Keeps only the keys for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let mut idx = self.items.len();
        let mut changed = false;
        while idx > 0 {
            idx -= 1;
            if !keep(&self.items[idx]) {
                self.remove_at(idx);
                changed = true;
            }
        }
        if changed {
            self.bump();
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn remove_at(&mut self, idx: usize) {
        self.items.remove(idx);
        let shift = |slot: &mut Option<usize>| match *slot {
            Some(i) if i == idx => *slot = None,
            Some(i) if i > idx => *slot = Some(i - 1),
            _ => {}
        };
        shift(&mut self.primary);
        shift(&mut self.anchor);
    }
}

impl<T: PartialEq> Selection<T> {
    /// Returns `true` if `key` is selected.
    #[must_use]
    pub fn contains(&self, key: &T) -> bool {
        self.position(key).is_some()
    }

    /// Replaces the selection with `key`, which becomes primary and anchor.
    pub fn select_only(&mut self, key: T) {
        if self.items.len() == 1
            && self.items[0] == key
            && self.primary == Some(0)
            && self.anchor == Some(0)
        {
            return;
        }
        self.items.clear();
        self.items.push(key);
        self.primary = Some(0);
        self.anchor = Some(0);
        self.bump();
    }

    /// Adds `key` if missing and makes it primary. The anchor is kept.
    pub fn add(&mut self, key: T) {
        match self.position(&key) {
            Some(idx) if self.primary == Some(idx) => {}
            Some(idx) => {
                self.primary = Some(idx);
                self.bump();
            }
            None => {
                self.items.push(key);
                self.primary = Some(self.items.len() - 1);
                self.bump();
            }
        }
    }

    /// Removes `key` if present.
    pub fn remove(&mut self, key: &T) {
        if let Some(idx) = self.position(key) {
            self.remove_at(idx);
            self.bump();
        }
    }

    /// Removes `key` if selected, otherwise adds it as primary.
    pub fn toggle(&mut self, key: T) {
        if let Some(idx) = self.position(&key) {
            self.remove_at(idx);
            self.bump();
        } else {
            self.items.push(key);
            self.primary = Some(self.items.len() - 1);
            self.bump();
        }
    }

    /// Replaces the selection with `keys`, ignoring duplicates.
    ///
    /// The first key becomes primary. The anchor survives if its key is still
    /// selected and otherwise moves to the first key.
    pub fn replace_with(&mut self, keys: impl IntoIterator<Item = T>) {
        let mut next: Vec<T> = Vec::new();
        for key in keys {
            if !next.contains(&key) {
                next.push(key);
            }
        }
        let primary = (!next.is_empty()).then_some(0);
        let anchor = self
            .anchor()
            .and_then(|old| next.iter().position(|k| k == old))
            .or(primary);
        if next == self.items && primary == self.primary && anchor == self.anchor {
            return;
        }
        self.items = next;
        self.primary = primary;
        self.anchor = anchor;
        self.bump();
    }

    fn position(&self, key: &T) -> Option<usize> {
        self.items.iter().position(|k| k == key)
    }
}
