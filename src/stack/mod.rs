//! Most-recently-used ordering of top-level app windows
//!
//! The `WindowStack` keeps the raw order (index 0 is the oldest entry, the last
//! index the most recent) with an id → position lookup. The `StackManager` adds the
//! current-position pointer on top of it. Home is never an entry: when Home is
//! displayed the pointer is the Home sentinel (`None`).
//!
//! Only top-level app windows that are the root of their same-origin chain are
//! entries. Chain children belong to their root's group.


use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::window::WindowId;

/// Ordered set of window ids with O(1) position lookup
///
/// # Examples
///
/// ```
/// use strata::stack::WindowStack;
/// use strata::window::WindowId;
///
/// let mut stack = WindowStack::new();
/// stack.push(WindowId(1));
/// stack.push(WindowId(2));
///
/// assert_eq!(stack.top(), Some(WindowId(2)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WindowStack {
    /// Entries from least to most recently used
    entries: Vec<WindowId>,

    /// Fast lookup: window ID → position in stack
    positions: HashMap<WindowId, usize>,
}

impl WindowStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a window on top. Returns `false` if it was already present.
    pub fn push(&mut self, id: WindowId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }

        self.positions.insert(id, self.entries.len());
        self.entries.push(id);
        true
    }

    /// Adds a window at the bottom. Returns `false` if it was already present.
    pub fn push_bottom(&mut self, id: WindowId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }

        self.entries.insert(0, id);
        self.rebuild_positions();
        true
    }

    /// Removes a window, returning the position it had
    pub fn remove(&mut self, id: WindowId) -> Option<usize> {
        let pos = self.positions.remove(&id)?;
        self.entries.remove(pos);
        self.rebuild_positions();
        Some(pos)
    }

    /// Moves a window to the top. Returns `false` if it wasn't in the stack.
    pub fn raise_to_top(&mut self, id: WindowId) -> bool {
        if self.top() == Some(id) {
            return true;
        }
        if self.remove(id).is_some() {
            self.push(id);
            true
        } else {
            false
        }
    }

    pub fn entries(&self) -> &[WindowId] {
        &self.entries
    }

    pub fn top(&self) -> Option<WindowId> {
        self.entries.last().copied()
    }

    pub fn get(&self, position: usize) -> Option<WindowId> {
        self.entries.get(position).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn position(&self, id: WindowId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    fn rebuild_positions(&mut self) {
        self.positions.clear();
        for (i, &id) in self.entries.iter().enumerate() {
            self.positions.insert(id, i);
        }
    }
}

/// Published copy of the stack: full sequence and current index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StackSnapshot {
    pub entries: Vec<WindowId>,
    /// `None` is the Home sentinel
    pub current: Option<usize>,
}

/// Stack plus current-position pointer
///
/// Every mutation returns `Some(snapshot)` when the published state changed, so
/// the caller emits exactly one stack-changed per structural change.
#[derive(Debug, Default)]
pub struct StackManager {
    stack: WindowStack,
    current: Option<WindowId>,
    published: StackSnapshot,
}

impl StackManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new top-level app window was created
    pub fn on_created(&mut self, id: WindowId, stay_background: bool) -> Option<StackSnapshot> {
        if stay_background {
            let was_empty = self.stack.is_empty();
            self.stack.push_bottom(id);
            if was_empty {
                self.current = Some(id);
            }
        } else {
            if let Some(current) = self.current {
                self.stack.raise_to_top(current);
            }
            self.stack.push(id);
            self.current = Some(id);
        }
        debug!("stack: created {} (background={})", id, stay_background);
        self.commit()
    }

    /// A launch request matched an already running entry
    pub fn on_launch_existing(
        &mut self,
        id: WindowId,
        stay_background: bool,
    ) -> Option<StackSnapshot> {
        if stay_background || !self.stack.contains(id) {
            return None;
        }
        if let Some(current) = self.current {
            self.stack.raise_to_top(current);
        }
        self.stack.raise_to_top(id);
        self.commit()
    }

    /// A group root started opening and becomes the current entry
    pub fn on_opening(&mut self, root: WindowId) -> Option<StackSnapshot> {
        if !self.stack.contains(root) {
            return None;
        }
        self.current = Some(root);
        self.commit()
    }

    /// Home started opening: the current entry goes on top and the pointer
    /// becomes the Home sentinel
    pub fn on_home(&mut self) -> Option<StackSnapshot> {
        if let Some(current) = self.current.take() {
            self.stack.raise_to_top(current);
        }
        self.commit()
    }

    /// Remove a destroyed window
    pub fn remove(&mut self, id: WindowId) -> Option<StackSnapshot> {
        let removed = self.stack.remove(id)?;
        if self.current == Some(id) {
            self.current = self.stack.get(removed.saturating_sub(1));
        }
        debug!("stack: removed {} from position {}", id, removed);
        self.commit()
    }

    /// Entry below `id`
    pub fn below(&self, id: WindowId) -> Option<WindowId> {
        let position = self.stack.position(id)?;
        position.checked_sub(1).and_then(|p| self.stack.get(p))
    }

    /// Entry above `id`
    pub fn above(&self, id: WindowId) -> Option<WindowId> {
        let position = self.stack.position(id)?;
        self.stack.get(position + 1)
    }

    pub fn current(&self) -> Option<WindowId> {
        self.current
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current.and_then(|id| self.stack.position(id))
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.stack.contains(id)
    }

    pub fn entries(&self) -> &[WindowId] {
        self.stack.entries()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn snapshot(&self) -> StackSnapshot {
        StackSnapshot {
            entries: self.stack.entries().to_vec(),
            current: self.current_index(),
        }
    }

    fn commit(&mut self) -> Option<StackSnapshot> {
        let snapshot = self.snapshot();
        if snapshot == self.published {
            return None;
        }
        self.published = snapshot.clone();
        Some(snapshot)
    }
}
