//! Trim scheduling. The policy only decides *when* and *how much*; the
//! engine performs the eviction through its scroll-preserving commit.

use std::time::Instant;

use crate::config::WindowConfig;
use crate::viewport::ScrollDirection;
use crate::window::Edge;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTrim {
    pub edge: Edge,
    pub due: Instant,
}

/// The edge the user is moving away from.
pub fn trailing_edge(direction: ScrollDirection) -> Edge {
    match direction {
        ScrollDirection::Down => Edge::Top,
        ScrollDirection::Up => Edge::Bottom,
    }
}

/// Whether `edge` may be trimmed now: the window is over the edge's limit
/// and more than the guard band lies offscreen beyond it.
pub fn qualifies(config: &WindowConfig, edge: Edge, len: usize, offscreen: usize) -> bool {
    len > config.trim_limit(edge) && offscreen > config.guard_band_size
}

/// Items to evict in one batch. Never touches the guard band.
pub fn batch_size(config: &WindowConfig, offscreen: usize) -> usize {
    offscreen
        .saturating_sub(config.guard_band_size)
        .min(config.trim_threshold)
}

#[derive(Debug, Default)]
pub struct TrimPolicy {
    last_evaluated: Option<Instant>,
    pending: Option<PendingTrim>,
}

impl TrimPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<PendingTrim> {
        self.pending
    }

    /// Scroll-event evaluation, throttled to `trim_throttle_ms`. Each
    /// qualifying evaluation pushes the deadline back by the edge's debounce.
    /// `offscreen` returns `None` when geometry could not be read.
    pub fn on_scroll(
        &mut self,
        config: &WindowConfig,
        direction: Option<ScrollDirection>,
        len: usize,
        offscreen: impl FnOnce(Edge) -> Option<usize>,
        now: Instant,
    ) -> Option<PendingTrim> {
        if let Some(last) = self.last_evaluated
            && now.saturating_duration_since(last) < config.trim_throttle()
        {
            return self.pending;
        }
        self.last_evaluated = Some(now);

        let edge = trailing_edge(direction?);
        if self.pending.is_some_and(|pending| pending.edge != edge) {
            self.pending = None;
        }

        if let Some(count) = offscreen(edge)
            && qualifies(config, edge, len, count)
        {
            self.pending = Some(PendingTrim {
                edge,
                due: now + config.debounce(edge),
            });
        }
        self.pending
    }

    /// Unthrottled follow-up after a trim ran. Schedules another batch when
    /// the edge still qualifies but never postpones an existing deadline.
    pub fn reevaluate(
        &mut self,
        config: &WindowConfig,
        edge: Edge,
        len: usize,
        offscreen: Option<usize>,
        now: Instant,
    ) -> Option<PendingTrim> {
        if self.pending.is_none()
            && let Some(count) = offscreen
            && qualifies(config, edge, len, count)
        {
            self.pending = Some(PendingTrim {
                edge,
                due: now + config.debounce(edge),
            });
        }
        self.pending
    }

    /// Takes the pending trim if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<Edge> {
        match self.pending {
            Some(pending) if pending.due <= now => {
                self.pending = None;
                Some(pending.edge)
            }
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn reset(&mut self) {
        self.pending = None;
        self.last_evaluated = None;
    }
}
