//! Headless run of the engine against the mock source. A seeded script
//! scrolls, jumps, pushes live messages and injects failures while every
//! step is checked against the window invariants.

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::config::WindowConfig;
use crate::console::console;
use crate::engine::{EngineError, PushOutcome, ScrollToOutcome, TimelineEngine};
use crate::message::ChatMessage;
use crate::orchestrator::LoadTicket;
use crate::source::{IdGenerator, MockMessageSource, MockSourceConfig, PageSource};
use crate::tui::message_renderer::message_render_fn;
use crate::viewport::LineViewport;
use crate::window::{Edge, ItemKey, SortOrder, TimelineItem};

type SimEngine = TimelineEngine<ChatMessage, LineViewport<ChatMessage>>;

const MAX_SETTLE_TICKS: usize = 1000;

#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub seed: u64,
    pub steps: usize,
    pub width: u16,
    pub height: u16,
    pub window: WindowConfig,
    pub mock: MockSourceConfig,
}

impl SimulationOptions {
    pub fn new(window: WindowConfig, mock: MockSourceConfig) -> Self {
        Self {
            seed: 7,
            steps: 2000,
            width: 72,
            height: 24,
            window,
            mock,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub steps: usize,
    pub order: String,
    pub loads_started: usize,
    pub loads_merged: usize,
    pub items_added: usize,
    pub fetch_failures: usize,
    pub stale_dropped: usize,
    pub trims: usize,
    pub items_trimmed: usize,
    pub jumps: usize,
    pub pushes_inserted: usize,
    pub pushes_replaced: usize,
    pub pushes_dropped: usize,
    pub pushes_held: usize,
    pub max_window_len: usize,
    pub final_window_len: usize,
    pub settled_limit: usize,
    pub settled_within_limit: bool,
    pub violations: Vec<String>,
}

impl SimulationReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

struct InFlight {
    ticket: LoadTicket<ItemKey>,
    due: usize,
}

struct Simulation {
    engine: SimEngine,
    source: MockMessageSource,
    rng: StdRng,
    in_flight: Vec<InFlight>,
    report: SimulationReport,
    now: Instant,
}

impl Simulation {
    fn dispatch(&mut self, tickets: Vec<LoadTicket<ItemKey>>, step: usize) {
        for ticket in tickets {
            self.report.loads_started += 1;
            let due = step.saturating_add(self.rng.gen_range(0..4));
            self.in_flight.push(InFlight { ticket, due });
        }
    }

    /// Runs the fetch for every load due by `step` and applies the results
    /// in issue order.
    async fn deliver(&mut self, step: usize) {
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.in_flight)
            .into_iter()
            .partition(|load| load.due <= step);
        self.in_flight = waiting;

        for load in due {
            let result = self.source.fetch_page(&load.ticket.request).await;
            match self.engine.complete_load(load.ticket, result, self.now) {
                Ok(page) => {
                    self.report.loads_merged += 1;
                    self.report.items_added += page.added;
                    let tickets = self.engine.poll_edges(self.now);
                    self.dispatch(tickets, step);
                }
                Err(EngineError::Fetch(_)) => self.report.fetch_failures += 1,
                Err(EngineError::Stale | EngineError::EdgeBusy(_)) => {
                    self.report.stale_dropped += 1
                }
            }
        }
    }

    fn record_push(&mut self, outcome: PushOutcome) {
        match outcome {
            PushOutcome::Inserted => self.report.pushes_inserted += 1,
            PushOutcome::Replaced => self.report.pushes_replaced += 1,
            PushOutcome::Dropped => self.report.pushes_dropped += 1,
            PushOutcome::Held => self.report.pushes_held += 1,
        }
    }

    fn tick(&mut self, step: usize) {
        let before = self.engine.window().len();
        let tickets = self.engine.tick(self.now);
        let after = self.engine.window().len();
        if after < before {
            self.report.trims += 1;
            self.report.items_trimmed += before - after;
        }
        self.dispatch(tickets, step);
    }

    fn check(&mut self, step: usize) {
        let len = self.engine.window().len();
        self.report.max_window_len = self.report.max_window_len.max(len);
        if let Some(problem) = window_problem(self.engine.window().items(), self.engine.window().order())
        {
            self.report.violations.push(format!("step {}: {}", step, problem));
        }
    }
}

/// Ids in the mock history are consecutive, so a healthy window is a run of
/// consecutive ids in display order. Anything else is a duplicate, an
/// ordering error or a gap.
fn window_problem(items: &[ChatMessage], order: SortOrder) -> Option<String> {
    let mut seen = HashSet::with_capacity(items.len());
    for message in items {
        if !seen.insert(message.key()) {
            return Some(format!("duplicate key #{}", message.id));
        }
    }

    let step = match order {
        SortOrder::Ascending => 1,
        SortOrder::Descending => -1,
    };
    items.windows(2).find_map(|pair| {
        let (a, b) = (pair[0].id, pair[1].id);
        if (b - a).signum() != step {
            Some(format!("#{} rendered before #{}", a, b))
        } else if b - a != step {
            Some(format!("gap between #{} and #{}", a, b))
        } else {
            None
        }
    })
}

pub async fn run_simulation(options: SimulationOptions) -> Result<SimulationReport> {
    options.window.validate()?;

    let mock = MockSourceConfig {
        latency_ms: 0,
        seed: Some(options.seed),
        ..options.mock.clone()
    };
    let source = MockMessageSource::with_order(mock, IdGenerator::default(), options.window.order);
    let viewport = LineViewport::new(options.width, options.height, message_render_fn());

    let mut sim = Simulation {
        engine: TimelineEngine::new(options.window.clone(), viewport),
        source,
        rng: StdRng::seed_from_u64(options.seed),
        in_flight: Vec::new(),
        report: SimulationReport {
            seed: options.seed,
            steps: options.steps,
            order: options.window.order.to_string(),
            ..Default::default()
        },
        now: Instant::now(),
    };

    let initial = sim.engine.begin_initial_load(None, sim.now).into_iter().collect();
    sim.dispatch(initial, 0);

    // Start heading away from the live edge.
    let live_edge = options.window.live_edge();
    let mut heading_down = live_edge == Edge::Top;

    for step in 0..options.steps {
        sim.now += Duration::from_millis(sim.rng.gen_range(16..120));
        sim.deliver(step).await;

        match sim.rng.gen_range(0..100) {
            0..=69 => {
                if sim.rng.gen_bool(0.04) {
                    heading_down = !heading_down;
                }
                let lines = sim.rng.gen_range(1..=6) as f64;
                let delta = if heading_down { lines } else { -lines };
                let tickets = sim.engine.scroll_by(delta, sim.now);
                sim.dispatch(tickets, step);
            }
            70..=71 => {
                if let Some(id) = sim.source.random_id() {
                    sim.report.jumps += 1;
                    if let ScrollToOutcome::Loading(ticket) =
                        sim.engine.scroll_to_key(ItemKey::Number(id), sim.now)
                    {
                        sim.dispatch(vec![ticket], step);
                    }
                }
            }
            72..=77 => {
                let message = sim.source.append_live();
                let outcome = sim.engine.push_live(message);
                sim.record_push(outcome);
            }
            78..=80 => {
                if let Some(id) = sim.source.random_id()
                    && let Some(edited) = sim.source.edit(id, "edited during the simulation")
                {
                    let outcome = sim.engine.push_live(edited);
                    sim.record_push(outcome);
                }
            }
            81 => sim.source.fail_next(1),
            _ => {}
        }

        sim.tick(step);
        sim.check(step);
    }

    // Let every load land and every pending trim fire.
    let config = &options.window;
    let settle = config.debounce(Edge::Top).max(config.debounce(Edge::Bottom))
        + config.trim_throttle()
        + Duration::from_secs(1);
    let settle_until = sim.now + settle;
    let mut step = options.steps;
    let last_step = options.steps + MAX_SETTLE_TICKS;
    while (sim.now < settle_until || !sim.in_flight.is_empty()) && step < last_step {
        sim.now += Duration::from_millis(100);
        sim.deliver(usize::MAX).await;
        sim.tick(step);
        sim.check(step);
        step += 1;
    }

    let limit = config.trim_limit(Edge::Top).max(config.trim_limit(Edge::Bottom))
        + config.guard_band_size
        + config.page_size;
    sim.report.final_window_len = sim.engine.window().len();
    sim.report.settled_limit = limit;
    sim.report.settled_within_limit = sim.report.final_window_len <= limit;

    console().verbose(&format!(
        "simulation settled after {} extra ticks",
        step - options.steps
    ));
    Ok(sim.report)
}

pub async fn handle_simulate(options: SimulationOptions, json: bool) -> Result<()> {
    let report = run_simulation(options).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.passed() {
        anyhow::bail!("{} invariant violations", report.violations.len());
    }
    Ok(())
}

fn print_report(report: &SimulationReport) {
    let c = console();
    c.plain(&format!(
        "Simulated {} steps (seed {}, {} order)",
        report.steps, report.seed, report.order
    ));
    c.plain(&format!(
        "  loads: {} started, {} merged ({} items), {} failed, {} stale",
        report.loads_started,
        report.loads_merged,
        report.items_added,
        report.fetch_failures,
        report.stale_dropped
    ));
    c.plain(&format!(
        "  trims: {} ({} items)   jumps: {}",
        report.trims, report.items_trimmed, report.jumps
    ));
    c.plain(&format!(
        "  pushes: {} inserted, {} replaced, {} dropped, {} held",
        report.pushes_inserted,
        report.pushes_replaced,
        report.pushes_dropped,
        report.pushes_held
    ));
    c.plain(&format!(
        "  window: max {}, settled at {} (limit {})",
        report.max_window_len, report.final_window_len, report.settled_limit
    ));

    if !report.settled_within_limit {
        c.warning("window did not settle within its trim limit");
    }
    if report.passed() {
        c.success("No invariant violations");
    } else {
        for violation in report.violations.iter().take(20) {
            c.error(violation);
        }
    }
}
