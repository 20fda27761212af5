use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, ScrollbarState, Wrap};
use std::collections::HashMap;
use std::sync::Arc;

use super::{ElementBounds, ViewportAdapter};
use crate::window::TimelineItem;

/// Presentation callback: pure function of the item.
pub type RenderFn<T> = Arc<dyn Fn(&T) -> Vec<Line<'static>> + Send + Sync>;

struct RenderedRow<K> {
    key: K,
    top: usize,
    height: usize,
    lines: Vec<Line<'static>>,
}

/// Terminal scroll region. Geometry is measured in wrapped lines at the
/// current width.
pub struct LineViewport<T: TimelineItem> {
    width: u16,
    height: u16,
    offset: usize,
    content_height: usize,
    render: RenderFn<T>,
    rows: Vec<RenderedRow<T::Key>>,
    index: HashMap<T::Key, usize>,
}

impl<T: TimelineItem> LineViewport<T> {
    pub fn new(width: u16, height: u16, render: RenderFn<T>) -> Self {
        Self {
            width,
            height,
            offset: 0,
            content_height: 0,
            render,
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Changes the region size. Heights depend on the width, so the caller
    /// must lay the items out again afterwards.
    pub fn resize(&mut self, width: u16, height: u16) -> bool {
        let changed = width != self.width || height != self.height;
        self.width = width;
        self.height = height;
        changed
    }

    pub fn scroll_by(&mut self, delta: i64) {
        let target = (self.offset as i64 + delta).max(0) as usize;
        self.offset = target.min(self.max_offset());
    }

    fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.height as usize)
    }

    fn measure_lines(&self, lines: &[Line<'static>]) -> usize {
        if lines.is_empty() {
            return 1;
        }
        Paragraph::new(lines.to_vec())
            .wrap(Wrap { trim: false })
            .line_count(self.width.max(1))
            .max(1)
    }

    /// Lines of every row overlapping the viewport plus the number of lines
    /// to skip at the top of the first row.
    pub fn visible_lines(&self, highlight: Option<&T::Key>, style: Style) -> (Vec<Line<'static>>, u16) {
        let start = self.offset;
        let end = start + self.height as usize;
        let mut lines = Vec::new();
        let mut skip = 0;

        let first = self.rows.partition_point(|row| row.top + row.height <= start);
        for (i, row) in self.rows[first..].iter().enumerate() {
            if row.top >= end {
                break;
            }
            if i == 0 {
                skip = start.saturating_sub(row.top);
            }
            let highlighted = highlight.is_some_and(|key| *key == row.key);
            lines.extend(row.lines.iter().cloned().map(|line| {
                if highlighted {
                    line.patch_style(style)
                } else {
                    line
                }
            }));
        }

        (lines, skip.min(u16::MAX as usize) as u16)
    }

    pub fn scrollbar_state(&self) -> ScrollbarState {
        ScrollbarState::default()
            .content_length(self.content_height)
            .viewport_content_length(self.height as usize)
            .position(self.offset)
    }

    pub fn needs_scrollbar(&self) -> bool {
        self.content_height > self.height as usize
    }
}

impl<T: TimelineItem> ViewportAdapter<T> for LineViewport<T> {
    fn layout(&mut self, items: &[T]) {
        let mut rows = Vec::with_capacity(items.len());
        let mut index = HashMap::with_capacity(items.len());
        let mut top = 0;

        for item in items {
            let lines = (self.render)(item);
            let height = self.measure_lines(&lines);
            let key = item.key();
            index.insert(key.clone(), rows.len());
            rows.push(RenderedRow {
                key,
                top,
                height,
                lines,
            });
            top += height;
        }

        self.rows = rows;
        self.index = index;
        self.content_height = top;
        self.offset = self.offset.min(self.max_offset());
    }

    fn content_height(&self) -> f64 {
        self.content_height as f64
    }

    fn viewport_height(&self) -> f64 {
        self.height as f64
    }

    fn scroll_offset(&self) -> f64 {
        self.offset as f64
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        let target = offset.round().max(0.0) as usize;
        self.offset = target.min(self.max_offset());
    }

    fn measure(&self, key: &T::Key) -> Option<ElementBounds> {
        let row = self.rows.get(*self.index.get(key)?)?;
        Some(ElementBounds::new(
            row.top as f64,
            (row.top + row.height) as f64,
        ))
    }
}
