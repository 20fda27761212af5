//! Per-edge load bookkeeping: at most one fetch in flight per edge, a
//! cooldown after an edge runs dry, and a generation counter that lets
//! completions from a discarded stream be recognised and dropped.

use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

use crate::source::LoadRequest;
use crate::window::Edge;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    Idle,
    Loading { ticket: u64 },
    CoolingDown { until: Instant },
}

/// Coarse, serializable view of an [`EdgeState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStatus {
    Idle,
    Loading,
    CoolingDown,
}

impl From<EdgeState> for EdgeStatus {
    fn from(state: EdgeState) -> Self {
        match state {
            EdgeState::Idle => EdgeStatus::Idle,
            EdgeState::Loading { .. } => EdgeStatus::Loading,
            EdgeState::CoolingDown { .. } => EdgeStatus::CoolingDown,
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeStatus::Idle => write!(f, "idle"),
            EdgeStatus::Loading => write!(f, "loading"),
            EdgeStatus::CoolingDown => write!(f, "cooling down"),
        }
    }
}

/// Permission to run one fetch. The generation is the liveness flag
/// captured when the ticket was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket<K> {
    pub id: u64,
    pub edge: Edge,
    pub generation: u64,
    pub request: LoadRequest<K>,
}

impl<K> LoadTicket<K> {
    /// Opened by the initial load from the live end.
    pub fn is_initial(&self) -> bool {
        self.request.anchor.is_none()
    }

    /// Opened by a jump to a key outside the window.
    pub fn is_jump(&self) -> bool {
        self.request.inclusive
    }
}

#[derive(Debug)]
pub struct LoadOrchestrator {
    top: EdgeState,
    bottom: EdgeState,
    generation: u64,
    next_ticket: u64,
    cooldown: Duration,
}

impl LoadOrchestrator {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            top: EdgeState::Idle,
            bottom: EdgeState::Idle,
            generation: 0,
            next_ticket: 1,
            cooldown,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self, edge: Edge) -> EdgeState {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
        }
    }

    pub fn status(&self, edge: Edge) -> EdgeStatus {
        self.state(edge).into()
    }

    fn state_mut(&mut self, edge: Edge) -> &mut EdgeState {
        match edge {
            Edge::Top => &mut self.top,
            Edge::Bottom => &mut self.bottom,
        }
    }

    /// Moves edges whose cooldown has elapsed back to `Idle`.
    pub fn refresh(&mut self, now: Instant) {
        for edge in [Edge::Top, Edge::Bottom] {
            let state = self.state_mut(edge);
            if let EdgeState::CoolingDown { until } = *state
                && until <= now
            {
                *state = EdgeState::Idle;
            }
        }
    }

    pub fn is_ready(&self, edge: Edge, now: Instant) -> bool {
        match self.state(edge) {
            EdgeState::Idle => true,
            EdgeState::Loading { .. } => false,
            EdgeState::CoolingDown { until } => until <= now,
        }
    }

    /// Issues a ticket for `request` unless its edge is loading or cooling
    /// down. A refused trigger is dropped, not queued.
    pub fn issue<K>(&mut self, request: LoadRequest<K>, now: Instant) -> Option<LoadTicket<K>> {
        let edge = request.edge();
        if !self.is_ready(edge, now) {
            return None;
        }

        let id = self.next_ticket;
        self.next_ticket += 1;
        *self.state_mut(edge) = EdgeState::Loading { ticket: id };

        Some(LoadTicket {
            id,
            edge,
            generation: self.generation,
            request,
        })
    }

    /// A ticket is current while its generation is live and its edge still
    /// waits for exactly this ticket.
    pub fn is_current<K>(&self, ticket: &LoadTicket<K>) -> bool {
        ticket.generation == self.generation
            && self.state(ticket.edge) == EdgeState::Loading { ticket: ticket.id }
    }

    /// Records a successful completion. `has_more == false` starts the
    /// cooldown. Returns `false` (and changes nothing) for a stale ticket.
    pub fn finish<K>(&mut self, ticket: &LoadTicket<K>, has_more: bool, now: Instant) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let cooldown = self.cooldown;
        *self.state_mut(ticket.edge) = if has_more {
            EdgeState::Idle
        } else {
            EdgeState::CoolingDown {
                until: now + cooldown,
            }
        };
        true
    }

    /// Records a failed fetch. The edge is loadable again immediately.
    pub fn fail<K>(&mut self, ticket: &LoadTicket<K>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        *self.state_mut(ticket.edge) = EdgeState::Idle;
        true
    }

    /// Returns `edge` to `Idle` after it was trimmed: a cooldown ends early
    /// and an in-flight ticket is orphaned, since its anchor is gone.
    pub fn release(&mut self, edge: Edge) {
        *self.state_mut(edge) = EdgeState::Idle;
    }

    /// Starts a new generation. Every outstanding ticket becomes stale.
    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.top = EdgeState::Idle;
        self.bottom = EdgeState::Idle;
        self.generation
    }

    pub fn in_flight(&self) -> usize {
        [self.top, self.bottom]
            .iter()
            .filter(|state| matches!(state, EdgeState::Loading { .. }))
            .count()
    }
}
