//! The bidirectional data window: the ordered, deduplicated set of items
//! currently materialized for rendering.
//!
//! The window never talks to a data source or a viewport. It only keeps two
//! invariants on every mutation: keys are unique, and items are sorted by key
//! in the order chosen at construction.

mod key;

pub use key::{ItemKey, TimelineItem};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;

/// One end of the window as rendered top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
}

impl Edge {
    pub fn opposite(self) -> Self {
        match self {
            Edge::Top => Edge::Bottom,
            Edge::Bottom => Edge::Top,
        }
    }

    /// The load direction that fills this edge.
    pub fn direction(self) -> Direction {
        match self {
            Edge::Top => Direction::Backward,
            Edge::Bottom => Direction::Forward,
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Top => write!(f, "top"),
            Edge::Bottom => write!(f, "bottom"),
        }
    }
}

/// Pagination direction. `Backward` items land above the first item,
/// `Forward` items below the last one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn edge(self) -> Edge {
        match self {
            Direction::Forward => Edge::Bottom,
            Direction::Backward => Edge::Top,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}

/// Rendering order of keys from top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn compare<K: Ord>(self, a: &K, b: &K) -> Ordering {
        match self {
            SortOrder::Ascending => a.cmp(b),
            SortOrder::Descending => b.cmp(a),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "ascending"),
            SortOrder::Descending => write!(f, "descending"),
        }
    }
}

/// What a merge did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    /// Novel items inserted.
    pub added: usize,
    /// Incoming items dropped because their key was already present.
    pub duplicates: usize,
    /// Novel items that sort before the previous first item.
    pub above: usize,
    /// Novel items that sort after the previous last item.
    pub below: usize,
}

/// Result of a replace-if-present-else-insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Replaced(usize),
    Inserted(usize),
}

#[derive(Debug, Clone)]
pub struct Window<T: TimelineItem> {
    items: Vec<T>,
    keys: HashSet<T::Key>,
    order: SortOrder,
    revision: u64,
}

impl<T: TimelineItem> Default for Window<T> {
    fn default() -> Self {
        Self::new(SortOrder::default())
    }
}

impl<T: TimelineItem> Window<T> {
    pub fn new(order: SortOrder) -> Self {
        Self {
            items: Vec::new(),
            keys: HashSet::new(),
            order,
            revision: 0,
        }
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Bumped on every mutation that changed the item list.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn first_key(&self) -> Option<T::Key> {
        self.items.first().map(TimelineItem::key)
    }

    pub fn last_key(&self) -> Option<T::Key> {
        self.items.last().map(TimelineItem::key)
    }

    pub fn edge_key(&self, edge: Edge) -> Option<T::Key> {
        match edge {
            Edge::Top => self.first_key(),
            Edge::Bottom => self.last_key(),
        }
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.keys.contains(key)
    }

    pub fn position(&self, key: &T::Key) -> Option<usize> {
        if !self.keys.contains(key) {
            return None;
        }
        self.search(key).ok()
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.position(key).map(|index| &self.items[index])
    }

    pub fn keys_in_order(&self) -> Vec<T::Key> {
        self.items.iter().map(TimelineItem::key).collect()
    }

    /// True when `key` would be placed after the current last item.
    pub fn sorts_after_last(&self, key: &T::Key) -> bool {
        match self.items.last() {
            Some(last) => self.order.compare(key, &last.key()) == Ordering::Greater,
            None => true,
        }
    }

    /// True when `key` would be placed before the current first item.
    pub fn sorts_before_first(&self, key: &T::Key) -> bool {
        match self.items.first() {
            Some(first) => self.order.compare(key, &first.key()) == Ordering::Less,
            None => true,
        }
    }

    /// Merges a page of items. Only keys not already present are added; the
    /// result is re-sorted so new items land at their sorted position rather
    /// than wherever they arrived.
    pub fn merge<I>(&mut self, incoming: I) -> MergeOutcome
    where
        I: IntoIterator<Item = T>,
    {
        let first = self.first_key();
        let last = self.last_key();
        let mut outcome = MergeOutcome::default();
        let mut novel = Vec::new();

        for item in incoming {
            let key = item.key();
            if self.keys.contains(&key) {
                outcome.duplicates += 1;
                continue;
            }

            if let Some(first) = &first
                && self.order.compare(&key, first) == Ordering::Less
            {
                outcome.above += 1;
            }
            if let Some(last) = &last
                && self.order.compare(&key, last) == Ordering::Greater
            {
                outcome.below += 1;
            }

            self.keys.insert(key);
            novel.push(item);
        }

        if novel.is_empty() {
            return outcome;
        }

        outcome.added = novel.len();
        self.items.extend(novel);
        self.sort();
        self.revision += 1;
        outcome
    }

    /// Removes up to `count` items from `edge` and returns them in window
    /// order.
    pub fn trim(&mut self, edge: Edge, count: usize) -> Vec<T> {
        let count = count.min(self.items.len());
        if count == 0 {
            return Vec::new();
        }

        let removed: Vec<T> = match edge {
            Edge::Top => self.items.drain(..count).collect(),
            Edge::Bottom => {
                let start = self.items.len() - count;
                self.items.drain(start..).collect()
            }
        };

        for item in &removed {
            self.keys.remove(&item.key());
        }
        self.revision += 1;
        removed
    }

    /// Replaces the item with the same key. Returns `false` when the key is
    /// not in the window (it may already have been trimmed).
    pub fn update(&mut self, item: T) -> bool {
        let key = item.key();
        match self.position(&key) {
            Some(index) => {
                self.items[index] = item;
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: &T::Key) -> Option<T> {
        let index = self.position(key)?;
        self.keys.remove(key);
        self.revision += 1;
        Some(self.items.remove(index))
    }

    pub fn upsert(&mut self, item: T) -> Upsert {
        let key = item.key();
        let result = match self.search(&key) {
            Ok(index) => {
                self.items[index] = item;
                Upsert::Replaced(index)
            }
            Err(index) => {
                self.keys.insert(key);
                self.items.insert(index, item);
                Upsert::Inserted(index)
            }
        };
        self.revision += 1;
        result
    }

    /// Swaps in an externally transformed item list. Duplicates are dropped
    /// (first occurrence wins) and the order is restored.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items.clear();
        self.keys.clear();
        for item in items {
            if self.keys.insert(item.key()) {
                self.items.push(item);
            }
        }
        self.sort();
        self.revision += 1;
    }

    pub fn take_items(&mut self) -> Vec<T> {
        self.keys.clear();
        self.revision += 1;
        std::mem::take(&mut self.items)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
        self.revision += 1;
    }

    fn search(&self, key: &T::Key) -> Result<usize, usize> {
        let order = self.order;
        self.items
            .binary_search_by(|probe| order.compare(&probe.key(), key))
    }

    fn sort(&mut self) {
        let order = self.order;
        self.items.sort_by(|a, b| order.compare(&a.key(), &b.key()));
    }
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod window_tests;
