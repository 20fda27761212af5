//! Viewport side of the engine: the adapter interface a UI layer implements,
//! the scroll tracker, and a terminal implementation backed by ratatui.

mod line_viewport;
mod scroll_tracker;

pub use line_viewport::{LineViewport, RenderFn};
pub use scroll_tracker::{ScrollDirection, ScrollTracker};

use crate::window::{Edge, TimelineItem};

/// Vertical extent of a rendered item in content coordinates (0 is the top
/// of the scrollable content).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBounds {
    pub top: f64,
    pub bottom: f64,
}

impl ElementBounds {
    pub fn new(top: f64, bottom: f64) -> Self {
        Self { top, bottom }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Overlaps `[start, end]` (inclusive on both ends, so an element that
    /// touches the margin counts as visible).
    pub fn intersects(&self, start: f64, end: f64) -> bool {
        self.bottom >= start && self.top <= end
    }
}

/// What the engine needs from a UI layer. Implementations exist for web
/// DOM-style containers, native list views or terminal scroll regions; the
/// engine never touches anything else.
pub trait ViewportAdapter<T: TimelineItem> {
    /// Re-render for `items` and return once geometry reflects them. This is
    /// the post-layout, pre-paint point at which scroll corrections run.
    fn layout(&mut self, items: &[T]);

    fn content_height(&self) -> f64;

    fn viewport_height(&self) -> f64;

    fn scroll_offset(&self) -> f64;

    /// May clamp `offset` into the scrollable range.
    fn set_scroll_offset(&mut self, offset: f64);

    /// `None` when the element is not (or no longer) rendered.
    fn measure(&self, key: &T::Key) -> Option<ElementBounds>;

    fn max_scroll_offset(&self) -> f64 {
        (self.content_height() - self.viewport_height()).max(0.0)
    }

    fn is_at_bottom(&self) -> bool {
        self.scroll_offset() >= self.max_scroll_offset() - 0.5
    }

    fn is_at_top(&self) -> bool {
        self.scroll_offset() <= 0.5
    }

    fn is_pinned_to(&self, edge: Edge) -> bool {
        match edge {
            Edge::Top => self.is_at_top(),
            Edge::Bottom => self.is_at_bottom(),
        }
    }

    fn scroll_to_edge(&mut self, edge: Edge) {
        match edge {
            Edge::Top => self.set_scroll_offset(0.0),
            Edge::Bottom => {
                let max = self.max_scroll_offset();
                self.set_scroll_offset(max);
            }
        }
    }
}

/// Geometry snapshot taken right before a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollAnchor<K> {
    pub content_height_before: f64,
    pub scroll_offset_before: f64,
    /// First item overlapping the viewport top, with its top coordinate.
    pub visible: Option<(K, f64)>,
    pub pinned_top: bool,
    pub pinned_bottom: bool,
}

impl<K: Clone> ScrollAnchor<K> {
    pub fn capture<T, V>(viewport: &V, items: &[T]) -> Self
    where
        T: TimelineItem<Key = K>,
        V: ViewportAdapter<T>,
    {
        let offset = viewport.scroll_offset();
        let visible = first_visible(viewport, items, offset);

        Self {
            content_height_before: viewport.content_height(),
            scroll_offset_before: offset,
            visible,
            pinned_top: viewport.is_at_top(),
            pinned_bottom: viewport.is_at_bottom(),
        }
    }

    pub fn was_pinned_to(&self, edge: Edge) -> bool {
        match edge {
            Edge::Top => self.pinned_top,
            Edge::Bottom => self.pinned_bottom,
        }
    }
}

fn first_visible<T, V>(viewport: &V, items: &[T], offset: f64) -> Option<(T::Key, f64)>
where
    T: TimelineItem,
    V: ViewportAdapter<T>,
{
    // Items are laid out in order, so bounds are monotonic in the index.
    let index = items.partition_point(|item| {
        viewport
            .measure(&item.key())
            .is_some_and(|bounds| bounds.bottom <= offset)
    });
    let item = items.get(index)?;
    let key = item.key();
    let bounds = viewport.measure(&key)?;
    Some((key, bounds.top))
}

/// Counts items lying entirely outside the viewport beyond `edge`.
pub fn count_offscreen<T, V>(viewport: &V, items: &[T], edge: Edge) -> Option<usize>
where
    T: TimelineItem,
    V: ViewportAdapter<T>,
{
    let offset = viewport.scroll_offset();
    let viewport_end = offset + viewport.viewport_height();
    let mut count = 0;

    match edge {
        Edge::Top => {
            for item in items {
                let bounds = viewport.measure(&item.key())?;
                if bounds.bottom <= offset {
                    count += 1;
                } else {
                    break;
                }
            }
        }
        Edge::Bottom => {
            for item in items.iter().rev() {
                let bounds = viewport.measure(&item.key())?;
                if bounds.top >= viewport_end {
                    count += 1;
                } else {
                    break;
                }
            }
        }
    }

    Some(count)
}
