//! The windowed list engine.
//!
//! `TimelineEngine` owns the data window and the viewport adapter and is the
//! only thing allowed to mutate either. Every mutation goes through
//! [`TimelineEngine::commit`], which captures a scroll anchor, applies the
//! change, lets the adapter lay out and then corrects the scroll offset so
//! the content under the user does not move.
//!
//! The engine never awaits. Loads are handed out as [`LoadTicket`]s; whoever
//! runs the fetch reports back through [`TimelineEngine::complete_load`].

use indexmap::IndexMap;
use std::collections::VecDeque;
use std::time::Instant;
use thiserror::Error;

use crate::config::WindowConfig;
use crate::console::console;
use crate::orchestrator::{EdgeState, EdgeStatus, LoadOrchestrator, LoadTicket};
use crate::source::{FetchError, LoadRequest, PageSource};
use crate::trim::{self, TrimPolicy};
use crate::viewport::{ScrollAnchor, ScrollTracker, ViewportAdapter, count_offscreen};
use crate::window::{Direction, Edge, TimelineItem, Upsert, Window};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Load result belongs to a discarded window")]
    Stale,

    #[error("The {0} edge is already loading or cooling down")]
    EdgeBusy(Edge),
}

/// A queued external transform of the full item list.
pub type Transform<T> = Box<dyn FnOnce(Vec<T>) -> Vec<T> + Send>;

#[derive(Debug, Clone, PartialEq)]
pub struct LoadPage<T> {
    /// The page as the source returned it.
    pub items: Vec<T>,
    /// Items that were new to the window.
    pub added: usize,
    pub has_more: bool,
    /// A jump page that did not contain the key it was opened at.
    pub target_missing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Replaced,
    Inserted,
    /// The item lies in a range owned by pagination and was not inserted.
    Dropped,
    /// Past the live edge while a page that may reach the live end is in
    /// flight. Replayed if that page re-attaches the window.
    Held,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollToOutcome<K> {
    Scrolled,
    Loading(LoadTicket<K>),
    /// A jump to this key is already loading.
    Busy,
}

/// Read-only copy of the engine state for consumers.
#[derive(Debug, Clone)]
pub struct WindowSnapshot<T: TimelineItem> {
    pub items: Vec<T>,
    pub revision: u64,
    pub generation: u64,
    pub scroll_offset: f64,
    pub content_height: f64,
    pub viewport_height: f64,
    pub top: EdgeStatus,
    pub bottom: EdgeStatus,
    pub highlighted: Option<T::Key>,
    pub detached: bool,
    pub pending_trim: Option<Edge>,
}

impl<T: TimelineItem> WindowSnapshot<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn edge(&self, edge: Edge) -> EdgeStatus {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mutation {
    /// A page merged at the top. Carries the scroll velocity at commit time
    /// and how many items landed above the previous first one.
    Prepend { velocity: f64, above: usize },
    Append,
    /// Carries the height removed above the first retained item, if it
    /// could be measured.
    TrimTop { removed: Option<f64> },
    TrimBottom,
    /// Push, update, delete, transform or relayout.
    External,
    Reset,
}

impl Mutation {
    fn label(self) -> &'static str {
        match self {
            Mutation::Prepend { .. } => "prepend",
            Mutation::Append => "append",
            Mutation::TrimTop { .. } => "top trim",
            Mutation::TrimBottom => "bottom trim",
            Mutation::External => "anchor",
            Mutation::Reset => "reset",
        }
    }
}

pub struct TimelineEngine<T: TimelineItem, V: ViewportAdapter<T>> {
    config: WindowConfig,
    window: Window<T>,
    viewport: V,
    tracker: ScrollTracker,
    orchestrator: LoadOrchestrator,
    trim_policy: TrimPolicy,
    commands: VecDeque<Transform<T>>,
    live_edge: Edge,
    highlighted: Option<T::Key>,
    pending_scroll_to: Option<T::Key>,
    held_pushes: IndexMap<T::Key, T>,
    detached: bool,
}

impl<T: TimelineItem, V: ViewportAdapter<T>> TimelineEngine<T, V> {
    pub fn new(config: WindowConfig, viewport: V) -> Self {
        Self {
            window: Window::new(config.order),
            viewport,
            tracker: ScrollTracker::new(config.velocity_idle()),
            orchestrator: LoadOrchestrator::new(config.exhausted_cooldown()),
            trim_policy: TrimPolicy::new(),
            commands: VecDeque::new(),
            live_edge: config.live_edge(),
            highlighted: None,
            pending_scroll_to: None,
            held_pushes: IndexMap::new(),
            detached: true,
            config,
        }
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn window(&self) -> &Window<T> {
        &self.window
    }

    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    /// Direct adapter access for geometry changes such as a resize. Call
    /// [`relayout`](Self::relayout) or [`on_scroll`](Self::on_scroll)
    /// afterwards so the engine sees the change.
    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    pub fn edge_status(&self, edge: Edge) -> EdgeStatus {
        self.orchestrator.status(edge)
    }

    pub fn generation(&self) -> u64 {
        self.orchestrator.generation()
    }

    pub fn highlighted(&self) -> Option<&T::Key> {
        self.highlighted.as_ref()
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted = None;
    }

    /// True while the window does not reach the live end, so live pushes
    /// past the live edge are left to pagination.
    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn live_edge(&self) -> Edge {
        self.live_edge
    }

    /// Edge with a debounced trim waiting to fire.
    pub fn pending_trim(&self) -> Option<Edge> {
        self.trim_policy.pending().map(|pending| pending.edge)
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Pushes waiting for a live-edge page to land.
    pub fn held_pushes(&self) -> usize {
        self.held_pushes.len()
    }

    pub fn snapshot(&self) -> WindowSnapshot<T> {
        WindowSnapshot {
            items: self.window.items().to_vec(),
            revision: self.window.revision(),
            generation: self.orchestrator.generation(),
            scroll_offset: self.viewport.scroll_offset(),
            content_height: self.viewport.content_height(),
            viewport_height: self.viewport.viewport_height(),
            top: self.orchestrator.status(Edge::Top),
            bottom: self.orchestrator.status(Edge::Bottom),
            highlighted: self.highlighted.clone(),
            detached: self.detached,
            pending_trim: self.pending_trim(),
        }
    }

    /// Starts filling an empty window: from the live end when `anchor` is
    /// `None`, otherwise with a jump load that opens at `anchor`.
    pub fn begin_initial_load(
        &mut self,
        anchor: Option<T::Key>,
        now: Instant,
    ) -> Option<LoadTicket<T::Key>> {
        let size = self.config.page_size;
        let request = match anchor {
            Some(key) => {
                self.pending_scroll_to = Some(key.clone());
                self.detached = true;
                LoadRequest::jump(key, size)
            }
            None => {
                let direction = self.live_edge.opposite().direction();
                LoadRequest {
                    direction,
                    anchor: None,
                    size,
                    inclusive: false,
                }
            }
        };
        self.issue(request, now)
    }

    fn issue(&mut self, request: LoadRequest<T::Key>, now: Instant) -> Option<LoadTicket<T::Key>> {
        let ticket = self.orchestrator.issue(request, now)?;
        console().load_started(
            ticket.edge,
            &ticket.request.anchor_label(),
            ticket.request.size,
        );
        Some(ticket)
    }

    /// Applies the result of a fetch started from `ticket`. Stale tickets
    /// are reported and never merged; a failure leaves the window untouched
    /// and the edge loadable again.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket<T::Key>,
        result: Result<Vec<T>, FetchError>,
        now: Instant,
    ) -> Result<LoadPage<T>, EngineError> {
        if !self.orchestrator.is_current(&ticket) {
            console().debug(&format!(
                "dropping stale {} load (ticket {}, generation {})",
                ticket.edge, ticket.id, ticket.generation
            ));
            return Err(EngineError::Stale);
        }

        let items = match result {
            Ok(items) => items,
            Err(error) => {
                self.orchestrator.fail(&ticket);
                console().fetch_failed(ticket.edge, &error.short_message());
                self.settle_held_pushes();
                return Err(EngineError::Fetch(error));
            }
        };

        let velocity = self.tracker.velocity(now);
        let edge = ticket.edge;
        let page = items.clone();
        let outcome = self.commit_with(|window| {
            let outcome = window.merge(items);
            let mutation = match edge {
                Edge::Top => Mutation::Prepend {
                    velocity,
                    above: outcome.above,
                },
                Edge::Bottom => Mutation::Append,
            };
            (mutation, outcome)
        });

        let has_more = page.len() >= ticket.request.size && outcome.added > 0;
        self.orchestrator.finish(&ticket, has_more, now);
        console().load_finished(ticket.edge, outcome.added, has_more);

        // A page read from the live end, or one that ran dry there, holds
        // the newest items.
        if ticket.is_initial() || (ticket.edge == self.live_edge && !has_more) {
            self.detached = false;
        }

        if ticket.is_initial() {
            self.viewport.scroll_to_edge(self.live_edge);
            self.tracker.rebase(self.viewport.scroll_offset());
        }

        let mut target_missing = false;
        if ticket.is_jump()
            && let Some(key) = self.pending_scroll_to.take()
            && !self.reveal(&key)
        {
            console().debug(&format!("jump target {:?} is not in the loaded page", key));
            target_missing = true;
        }

        self.settle_held_pushes();

        Ok(LoadPage {
            items: page,
            added: outcome.added,
            has_more,
            target_missing,
        })
    }

    /// Runs one fetch inline for callers without a session.
    pub async fn load_more(
        &mut self,
        source: &dyn PageSource<T>,
        request: LoadRequest<T::Key>,
        now: Instant,
    ) -> Result<LoadPage<T>, EngineError> {
        let edge = request.edge();
        let ticket = self
            .issue(request, now)
            .ok_or(EngineError::EdgeBusy(edge))?;
        let result = source.fetch_page(&ticket.request).await;
        self.complete_load(ticket, result, now)
    }

    /// Feeds a scroll event: updates the tracker, evaluates the trim policy
    /// and checks both edge sentinels.
    pub fn on_scroll(&mut self, now: Instant) -> Vec<LoadTicket<T::Key>> {
        let offset = self.viewport.scroll_offset();
        let direction = self.tracker.record(offset, now);

        let viewport = &self.viewport;
        let items = self.window.items();
        self.trim_policy.on_scroll(
            &self.config,
            direction,
            items.len(),
            |edge| count_offscreen(viewport, items, edge),
            now,
        );

        self.poll_edges(now)
    }

    pub fn scroll_by(&mut self, delta: f64, now: Instant) -> Vec<LoadTicket<T::Key>> {
        let target = self.viewport.scroll_offset() + delta;
        self.viewport.set_scroll_offset(target);
        self.on_scroll(now)
    }

    /// Periodic housekeeping: queued transforms, due trims, re-armed edges.
    pub fn tick(&mut self, now: Instant) -> Vec<LoadTicket<T::Key>> {
        self.flush_commands();

        if let Some(edge) = self.trim_policy.take_due(now) {
            self.run_due_trim(edge, now);
        }

        self.poll_edges(now)
    }

    /// Issues tickets for every edge whose sentinel is within its scroll
    /// margin. An empty window retries its initial or jump load.
    pub fn poll_edges(&mut self, now: Instant) -> Vec<LoadTicket<T::Key>> {
        self.orchestrator.refresh(now);

        if self.window.is_empty() {
            let anchor = self.pending_scroll_to.clone();
            return self.begin_initial_load(anchor, now).into_iter().collect();
        }

        let mut tickets = Vec::new();
        for edge in [Edge::Top, Edge::Bottom] {
            if edge == self.live_edge && !self.detached {
                continue;
            }
            if !self.orchestrator.is_ready(edge, now) || !self.sentinel_visible(edge) {
                continue;
            }
            let Some(anchor) = self.window.edge_key(edge) else {
                continue;
            };
            let request = LoadRequest {
                direction: edge.direction(),
                anchor: Some(anchor),
                size: self.config.page_size,
                inclusive: false,
            };
            if let Some(ticket) = self.issue(request, now) {
                tickets.push(ticket);
            }
        }
        tickets
    }

    fn sentinel_visible(&self, edge: Edge) -> bool {
        let Some(key) = self.window.edge_key(edge) else {
            return false;
        };
        let Some(bounds) = self.viewport.measure(&key) else {
            return false;
        };
        let margin = self.config.scroll_margin(edge);
        let offset = self.viewport.scroll_offset();
        bounds.intersects(offset - margin, offset + self.viewport.viewport_height() + margin)
    }

    fn run_due_trim(&mut self, edge: Edge, now: Instant) {
        let Some(offscreen) = count_offscreen(&self.viewport, self.window.items(), edge) else {
            return;
        };
        if trim::qualifies(&self.config, edge, self.window.len(), offscreen) {
            let count = trim::batch_size(&self.config, offscreen);
            self.trim(edge, count);
        }

        let offscreen = count_offscreen(&self.viewport, self.window.items(), edge);
        self.trim_policy
            .reevaluate(&self.config, edge, self.window.len(), offscreen, now);
    }

    /// Evicts `count` items from `edge` and keeps the visible content in
    /// place. Any load in flight on that edge is orphaned.
    pub fn trim(&mut self, edge: Edge, count: usize) -> Vec<T> {
        let count = count.min(self.window.len());
        if count == 0 {
            return Vec::new();
        }

        let mutation = match edge {
            Edge::Top => {
                let removed = match self.window.items().get(count) {
                    Some(first_kept) => self
                        .viewport
                        .measure(&first_kept.key())
                        .map(|bounds| bounds.top),
                    None => Some(self.viewport.content_height()),
                };
                Mutation::TrimTop { removed }
            }
            Edge::Bottom => Mutation::TrimBottom,
        };

        let removed = self.commit(mutation, |window| window.trim(edge, count));

        if edge == self.live_edge {
            self.detached = true;
        }
        self.orchestrator.release(edge);
        self.settle_held_pushes();
        if let Some(key) = &self.highlighted
            && !self.window.contains(key)
        {
            self.highlighted = None;
        }

        console().trimmed(edge, removed.len(), self.window.len());
        removed
    }

    /// Replaces an item in place. Returns `false` if its key is not in the
    /// window.
    pub fn update_item(&mut self, item: T) -> bool {
        if !self.window.contains(&item.key()) {
            return false;
        }
        self.commit(Mutation::External, |window| window.update(item))
    }

    pub fn delete_item(&mut self, key: &T::Key) -> Option<T> {
        if !self.window.contains(key) {
            return None;
        }
        if self.highlighted.as_ref() == Some(key) {
            self.highlighted = None;
        }
        self.commit(Mutation::External, |window| window.remove(key))
    }

    /// Replace-if-present-else-insert for an item delivered by the push
    /// channel. No fetch is involved.
    pub fn push_live(&mut self, item: T) -> PushOutcome {
        let key = item.key();
        if !self.window.contains(&key) && !self.accepts_insert(&key) {
            if self.awaiting_live_page() && !self.beyond_history(&key) {
                console().debug(&format!(
                    "holding push for {:?} until the pending page lands",
                    key
                ));
                self.held_pushes.insert(key, item);
                return PushOutcome::Held;
            }
            console().debug(&format!("dropping push for {:?} outside the loaded range", key));
            return PushOutcome::Dropped;
        }

        match self.commit(Mutation::External, |window| window.upsert(item)) {
            Upsert::Replaced(_) => PushOutcome::Replaced,
            Upsert::Inserted(_) => PushOutcome::Inserted,
        }
    }

    fn accepts_insert(&self, key: &T::Key) -> bool {
        if self.window.is_empty() {
            // The pending page owns whatever range it will cover.
            return !self.detached && self.orchestrator.in_flight() == 0;
        }
        if self.beyond_history(key) {
            return false;
        }
        !(self.detached && self.beyond_edge(self.live_edge, key))
    }

    /// Sorts before the non-live edge of a non-empty window.
    fn beyond_history(&self, key: &T::Key) -> bool {
        !self.window.is_empty() && self.beyond_edge(self.live_edge.opposite(), key)
    }

    /// A load is in flight whose page may reach the live end and re-attach
    /// the window.
    fn awaiting_live_page(&self) -> bool {
        let live_loading = matches!(
            self.orchestrator.state(self.live_edge),
            EdgeState::Loading { .. }
        );
        live_loading || (self.window.is_empty() && self.orchestrator.in_flight() > 0)
    }

    /// Replays held pushes once no awaited page is left in flight. If the
    /// window did not re-attach they are discarded; pagination reaches them.
    fn settle_held_pushes(&mut self) {
        if self.held_pushes.is_empty() || self.awaiting_live_page() {
            return;
        }
        let held = std::mem::take(&mut self.held_pushes);
        if self.detached {
            console().debug(&format!("discarding {} held pushes", held.len()));
            return;
        }
        for (_, item) in held {
            self.push_live(item);
        }
    }

    fn beyond_edge(&self, edge: Edge, key: &T::Key) -> bool {
        match edge {
            Edge::Top => self.window.sorts_before_first(key),
            Edge::Bottom => self.window.sorts_after_last(key),
        }
    }

    /// Queues a transform of the whole item list. Applied by
    /// [`flush_commands`](Self::flush_commands) or the next tick.
    pub fn update_elements<F>(&mut self, transform: F)
    where
        F: FnOnce(Vec<T>) -> Vec<T> + Send + 'static,
    {
        self.commands.push_back(Box::new(transform));
    }

    /// Applies every queued transform in one commit. Returns how many ran.
    pub fn flush_commands(&mut self) -> usize {
        if self.commands.is_empty() {
            return 0;
        }

        let commands: Vec<Transform<T>> = self.commands.drain(..).collect();
        let count = commands.len();
        self.commit(Mutation::External, move |window| {
            let items = commands
                .into_iter()
                .fold(window.take_items(), |items, transform| transform(items));
            window.replace_all(items);
        });

        if let Some(key) = &self.highlighted
            && !self.window.contains(key)
        {
            self.highlighted = None;
        }
        count
    }

    /// Scrolls `key` to the viewport top and highlights it. A key outside
    /// the window replaces the window with a jump load opened at the key.
    pub fn scroll_to_key(&mut self, key: T::Key, now: Instant) -> ScrollToOutcome<T::Key> {
        if self.window.contains(&key) {
            self.reveal(&key);
            return ScrollToOutcome::Scrolled;
        }

        // Jump loads always run forward.
        let jump_in_flight = matches!(
            self.orchestrator.state(Direction::Forward.edge()),
            EdgeState::Loading { .. }
        );
        if self.pending_scroll_to.as_ref() == Some(&key) && jump_in_flight {
            return ScrollToOutcome::Busy;
        }

        self.reset();
        match self.begin_initial_load(Some(key), now) {
            Some(ticket) => ScrollToOutcome::Loading(ticket),
            None => ScrollToOutcome::Busy,
        }
    }

    /// Scrolls to and highlights `key`. Returns `false` when it has no
    /// layout, leaving scroll and highlight alone.
    fn reveal(&mut self, key: &T::Key) -> bool {
        let Some(bounds) = self.viewport.measure(key) else {
            return false;
        };
        self.viewport.set_scroll_offset(bounds.top);
        self.tracker.rebase(self.viewport.scroll_offset());
        self.highlighted = Some(key.clone());
        true
    }

    /// Re-lays out the current items, e.g. after the viewport was resized,
    /// keeping the first visible item in place.
    pub fn relayout(&mut self) {
        self.commit(Mutation::External, |_| ());
    }

    /// Empties the window and starts a new generation. Loads still in
    /// flight will complete as stale.
    pub fn reset(&mut self) -> u64 {
        let generation = self.orchestrator.invalidate();
        self.trim_policy.reset();
        self.tracker.reset();
        self.commands.clear();
        self.highlighted = None;
        self.pending_scroll_to = None;
        self.held_pushes.clear();
        self.detached = true;
        self.commit(Mutation::Reset, Window::clear);
        self.viewport.set_scroll_offset(0.0);
        generation
    }

    /// The scroll-preserving mutation routine. Runs synchronously from
    /// anchor capture to correction.
    fn commit<R>(&mut self, mutation: Mutation, mutate: impl FnOnce(&mut Window<T>) -> R) -> R {
        self.commit_with(|window| (mutation, mutate(window)))
    }

    /// Like [`commit`](Self::commit) for mutations whose kind depends on
    /// what they changed.
    fn commit_with<R>(&mut self, mutate: impl FnOnce(&mut Window<T>) -> (Mutation, R)) -> R {
        let anchor = ScrollAnchor::capture(&self.viewport, self.window.items());
        let was_empty = self.window.is_empty();

        let (mutation, result) = mutate(&mut self.window);
        self.viewport.layout(self.window.items());
        self.reconcile(mutation, &anchor, was_empty);
        self.tracker.rebase(self.viewport.scroll_offset());

        result
    }

    fn reconcile(&mut self, mutation: Mutation, anchor: &ScrollAnchor<T::Key>, was_empty: bool) {
        let before = anchor.scroll_offset_before;
        let current = self.viewport.scroll_offset();

        let target = match mutation {
            Mutation::Prepend { velocity, above } => {
                if was_empty {
                    None
                } else if above == 0 {
                    self.anchor_target(anchor)
                } else {
                    let grown = self.viewport.content_height() - anchor.content_height_before;
                    Some(before + grown + velocity * self.config.velocity_correction_ms)
                }
            }
            Mutation::TrimTop { removed } => removed.map(|removed| {
                let already_moved = (before - current).max(0.0);
                current - (removed - already_moved).max(0.0)
            }),
            Mutation::Append | Mutation::External => {
                if self.config.follow_live_edge
                    && !self.detached
                    && anchor.was_pinned_to(self.live_edge)
                {
                    self.viewport.scroll_to_edge(self.live_edge);
                    return;
                }
                if mutation == Mutation::External {
                    self.anchor_target(anchor)
                } else {
                    None
                }
            }
            Mutation::TrimBottom | Mutation::Reset => None,
        };

        if let Some(target) = target
            && target != current
        {
            self.viewport.set_scroll_offset(target);
            console().scroll_corrected(mutation.label(), current, self.viewport.scroll_offset());
        }
    }

    /// Offset that keeps the anchored item where it was on screen.
    fn anchor_target(&self, anchor: &ScrollAnchor<T::Key>) -> Option<f64> {
        let (key, top_before) = anchor.visible.as_ref()?;
        let after = self.viewport.measure(key)?;
        Some(anchor.scroll_offset_before + (after.top - top_before))
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod engine_tests;
