//! Async driver around a [`TimelineEngine`].
//!
//! The session spawns one tokio task per load ticket and funnels the results
//! back through a channel, so every engine mutation still happens on the
//! task that owns the session, in the order results arrive. Live pushes come
//! from a [`PushBus`] subscription for the current stream.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};

use crate::config::WindowConfig;
use crate::engine::{
    EngineError, PushOutcome, ScrollToOutcome, TimelineEngine, WindowSnapshot,
};
use crate::orchestrator::LoadTicket;
use crate::push_bus::{PushBus, StreamId, Subscription};
use crate::source::{FetchError, PageSource};
use crate::viewport::ViewportAdapter;
use crate::window::{Edge, TimelineItem};

struct Completion<T: TimelineItem> {
    ticket: LoadTicket<T::Key>,
    result: Result<Vec<T>, FetchError>,
}

/// What happened as a result of one awaited input.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Loaded {
        edge: Edge,
        added: usize,
        has_more: bool,
        /// A jump landed on a page without its target.
        target_missing: bool,
    },
    LoadFailed {
        edge: Edge,
        error: FetchError,
    },
    /// A load finished after its stream or edge was discarded.
    StaleDropped {
        edge: Edge,
    },
    Pushed(PushOutcome),
}

pub struct TimelineSession<T: TimelineItem, V: ViewportAdapter<T>> {
    engine: TimelineEngine<T, V>,
    source: Arc<dyn PageSource<T>>,
    stream: StreamId,
    bus: PushBus<T>,
    subscription: Subscription<T>,
    completion_tx: mpsc::UnboundedSender<Completion<T>>,
    completion_rx: mpsc::UnboundedReceiver<Completion<T>>,
    snapshots: watch::Sender<WindowSnapshot<T>>,
    last_error: Option<FetchError>,
    dispatched: usize,
}

impl<T, V> TimelineSession<T, V>
where
    T: TimelineItem + Send + Sync + 'static,
    T::Key: Send + Sync + 'static,
    V: ViewportAdapter<T>,
{
    pub fn new(
        config: WindowConfig,
        viewport: V,
        source: Arc<dyn PageSource<T>>,
        bus: PushBus<T>,
        stream: StreamId,
    ) -> Self {
        let engine = TimelineEngine::new(config, viewport);
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(engine.snapshot());
        let subscription = bus.subscribe(stream);

        Self {
            engine,
            source,
            stream,
            bus,
            subscription,
            completion_tx,
            completion_rx,
            snapshots,
            last_error: None,
            dispatched: 0,
        }
    }

    pub fn engine(&self) -> &TimelineEngine<T, V> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut TimelineEngine<T, V> {
        &mut self.engine
    }

    pub fn stream(&self) -> StreamId {
        self.stream
    }

    pub fn source_name(&self) -> &'static str {
        self.source.source_name()
    }

    /// The most recent fetch failure, cleared by the next successful load.
    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    /// Number of fetch tasks spawned so far.
    pub fn dispatched(&self) -> usize {
        self.dispatched
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<WindowSnapshot<T>> {
        self.snapshots.subscribe()
    }

    /// Kicks off the initial load from the live end.
    pub fn start(&mut self, now: Instant) {
        let tickets = self.engine.begin_initial_load(None, now).into_iter().collect();
        self.dispatch(tickets);
        self.publish();
    }

    /// Spawns one fetch per ticket. Results re-enter through
    /// [`next_event`](Self::next_event).
    pub fn dispatch(&mut self, tickets: Vec<LoadTicket<T::Key>>) {
        for ticket in tickets {
            let source = Arc::clone(&self.source);
            let sender = self.completion_tx.clone();
            self.dispatched += 1;

            tokio::spawn(async move {
                let result = source.fetch_page(&ticket.request).await;
                let _ = sender.send(Completion { ticket, result });
            });
        }
    }

    /// Waits for the next load completion or live push and applies it.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        tokio::select! {
            Some(completion) = self.completion_rx.recv() => {
                Some(self.apply_completion(completion, Instant::now()))
            }
            Some(item) = self.subscription.recv() => {
                Some(self.apply_push(item))
            }
            else => None,
        }
    }

    fn apply_completion(&mut self, completion: Completion<T>, now: Instant) -> SessionEvent {
        let edge = completion.ticket.edge;
        let event = match self
            .engine
            .complete_load(completion.ticket, completion.result, now)
        {
            Ok(page) => {
                self.last_error = None;
                // A short page may leave the sentinel in view.
                let tickets = self.engine.poll_edges(now);
                self.dispatch(tickets);
                SessionEvent::Loaded {
                    edge,
                    added: page.added,
                    has_more: page.has_more,
                    target_missing: page.target_missing,
                }
            }
            Err(EngineError::Fetch(error)) => {
                self.last_error = Some(error.clone());
                SessionEvent::LoadFailed { edge, error }
            }
            Err(EngineError::Stale | EngineError::EdgeBusy(_)) => SessionEvent::StaleDropped { edge },
        };
        self.publish();
        event
    }

    fn apply_push(&mut self, item: T) -> SessionEvent {
        let outcome = self.engine.push_live(item);
        self.publish();
        SessionEvent::Pushed(outcome)
    }

    pub fn on_scroll(&mut self, now: Instant) {
        let tickets = self.engine.on_scroll(now);
        self.dispatch(tickets);
        self.publish();
    }

    pub fn scroll_by(&mut self, delta: f64, now: Instant) {
        let tickets = self.engine.scroll_by(delta, now);
        self.dispatch(tickets);
        self.publish();
    }

    pub fn tick(&mut self, now: Instant) {
        let tickets = self.engine.tick(now);
        self.dispatch(tickets);
        self.publish();
    }

    pub fn scroll_to_key(&mut self, key: T::Key, now: Instant) -> ScrollToOutcome<T::Key> {
        let outcome = self.engine.scroll_to_key(key, now);
        if let ScrollToOutcome::Loading(ticket) = &outcome {
            self.dispatch(vec![ticket.clone()]);
        }
        self.publish();
        outcome
    }

    pub fn update_elements<F>(&mut self, transform: F)
    where
        F: FnOnce(Vec<T>) -> Vec<T> + Send + 'static,
    {
        self.engine.update_elements(transform);
    }

    /// Points the session at another stream. The window is reset, the push
    /// subscription moves, and loads still in flight for the old stream
    /// will be dropped as stale.
    pub fn switch_stream(&mut self, stream: StreamId, source: Arc<dyn PageSource<T>>, now: Instant) {
        self.bus.unsubscribe(&self.subscription);
        self.subscription = self.bus.subscribe(stream);
        self.stream = stream;
        self.source = source;
        self.last_error = None;

        self.engine.reset();
        self.start(now);
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.engine.snapshot());
    }
}
