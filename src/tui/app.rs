use anyhow::Result;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use super::colors::palette;
use super::message_renderer::message_render_fn;
use super::scroll_handler::DemoAction;
use crate::config::AppConfig;
use crate::engine::{PushOutcome, ScrollToOutcome};
use crate::message::ChatMessage;
use crate::orchestrator::EdgeStatus;
use crate::push_bus::{PushBus, StreamId};
use crate::session::{SessionEvent, TimelineSession};
use crate::source::{IdGenerator, MockMessageSource, MockSourceConfig, PageSource};
use crate::viewport::{LineViewport, ViewportAdapter};
use crate::window::{Edge, ItemKey, SortOrder};

/// Rows below the message area: status and key help.
pub const FOOTER_HEIGHT: u16 = 2;

const STREAM_NAMES: [&str; 2] = ["general", "random"];

#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    pub seed: Option<u64>,
    pub descending: bool,
    pub latency_ms: Option<u64>,
}

struct DemoStream {
    id: StreamId,
    name: &'static str,
    source: Arc<MockMessageSource>,
}

pub struct DemoApp {
    session: TimelineSession<ChatMessage, LineViewport<ChatMessage>>,
    streams: Vec<DemoStream>,
    active: usize,
    bus: PushBus<ChatMessage>,
    live_interval: Option<Duration>,
    live_tasks: Vec<JoinHandle<()>>,
    notice: Option<String>,
    pushes: usize,
    stale: usize,
    pub should_quit: bool,
}

impl DemoApp {
    pub fn new(config: &AppConfig, options: &DemoOptions) -> Result<Self> {
        let mut window = config.window.clone();
        if options.descending {
            window.order = SortOrder::Descending;
        }
        window.validate()?;

        let mut mock = config.mock.clone();
        if let Some(latency_ms) = options.latency_ms {
            mock.latency_ms = latency_ms;
        }
        if options.seed.is_some() {
            mock.seed = options.seed;
        }

        let streams: Vec<DemoStream> = STREAM_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let stream_mock = MockSourceConfig {
                    seed: mock.seed.map(|seed| seed.wrapping_add(i as u64)),
                    ..mock.clone()
                };
                DemoStream {
                    id: StreamId(i as u64 + 1),
                    name: *name,
                    source: Arc::new(MockMessageSource::with_order(
                        stream_mock,
                        IdGenerator::default(),
                        window.order,
                    )),
                }
            })
            .collect();

        let bus = PushBus::new();
        let viewport = LineViewport::new(80, 24, message_render_fn());
        let first = &streams[0];
        let session = TimelineSession::new(
            window,
            viewport,
            Arc::clone(&first.source) as Arc<dyn PageSource<ChatMessage>>,
            bus.clone(),
            first.id,
        );

        let live_interval =
            (mock.live_interval_ms > 0).then(|| Duration::from_millis(mock.live_interval_ms));

        Ok(Self {
            session,
            streams,
            active: 0,
            bus,
            live_interval,
            live_tasks: Vec::new(),
            notice: None,
            pushes: 0,
            stale: 0,
            should_quit: false,
        })
    }

    pub fn session(&self) -> &TimelineSession<ChatMessage, LineViewport<ChatMessage>> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut TimelineSession<ChatMessage, LineViewport<ChatMessage>> {
        &mut self.session
    }

    fn active_stream(&self) -> &DemoStream {
        &self.streams[self.active % self.streams.len()]
    }

    /// Loads the first page and starts the live-message producers.
    pub fn start(&mut self) {
        self.session.start(Instant::now());

        let Some(every) = self.live_interval else {
            return;
        };
        for stream in &self.streams {
            let source = Arc::clone(&stream.source);
            let bus = self.bus.clone();
            let id = stream.id;

            self.live_tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(every);
                ticker.tick().await;
                let mut sent: u64 = 0;
                loop {
                    ticker.tick().await;
                    sent += 1;
                    // Every fifth push edits an older message instead.
                    let message = if sent % 5 == 0 {
                        source
                            .random_id()
                            .and_then(|id| source.edit(id, "edited: never mind, it works"))
                    } else {
                        Some(source.append_live())
                    };
                    if let Some(message) = message {
                        bus.publish(id, message);
                    }
                }
            }));
        }
    }

    pub fn shutdown(&mut self) {
        for task in self.live_tasks.drain(..) {
            task.abort();
        }
    }

    /// Matches the viewport to the terminal, minus the footer and the
    /// scrollbar column.
    pub fn resize(&mut self, width: u16, height: u16) {
        let width = width.saturating_sub(1).max(1);
        let height = height.saturating_sub(FOOTER_HEIGHT).max(1);
        let engine = self.session.engine_mut();
        if engine.viewport_mut().resize(width, height) {
            engine.relayout();
        }
    }

    pub fn tick(&mut self) {
        self.session.tick(Instant::now());
    }

    pub fn handle_action(&mut self, action: DemoAction) {
        let now = Instant::now();
        match action {
            DemoAction::ScrollLines(lines) => self.session.scroll_by(lines as f64, now),
            DemoAction::ScrollPages(pages) => {
                let page = (self.session.engine().viewport().viewport_height() - 1.0).max(1.0);
                self.session.scroll_by(pages as f64 * page, now);
            }
            DemoAction::ScrollToTop => {
                let distance = self.session.engine().viewport().content_height();
                self.session.scroll_by(-distance, now);
            }
            DemoAction::ScrollToBottom => {
                let distance = self.session.engine().viewport().content_height();
                self.session.scroll_by(distance, now);
            }
            DemoAction::JumpToRandom => self.jump_to_random(now),
            DemoAction::SwitchStream => {
                self.active = (self.active + 1) % self.streams.len();
                let stream = self.active_stream();
                let (id, name) = (stream.id, stream.name);
                let source = Arc::clone(&stream.source) as Arc<dyn PageSource<ChatMessage>>;
                self.session.switch_stream(id, source, now);
                self.notice = Some(format!("switched to {} {}", name, id));
            }
            DemoAction::InjectFailure => {
                self.active_stream().source.fail_next(1);
                self.notice = Some("next fetch will fail".to_string());
            }
            DemoAction::Resize { width, height } => self.resize(width, height),
            DemoAction::Quit => self.should_quit = true,
        }
    }

    fn jump_to_random(&mut self, now: Instant) {
        let Some(id) = self.active_stream().source.random_id() else {
            return;
        };
        let outcome = self.session.scroll_to_key(ItemKey::Number(id), now);
        self.notice = Some(match outcome {
            ScrollToOutcome::Scrolled => format!("jumped to #{}", id),
            ScrollToOutcome::Loading(_) => format!("loading around #{}", id),
            ScrollToOutcome::Busy => format!("still loading #{}", id),
        });
    }

    pub fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Pushed(PushOutcome::Inserted | PushOutcome::Replaced) => {
                self.pushes += 1
            }
            SessionEvent::StaleDropped { .. } => self.stale += 1,
            SessionEvent::Loaded {
                target_missing: true,
                ..
            } => self.notice = Some("jump target not found".to_string()),
            SessionEvent::Loaded { .. }
            | SessionEvent::LoadFailed { .. }
            | SessionEvent::Pushed(PushOutcome::Dropped | PushOutcome::Held) => {}
        }
    }

    pub fn status_line(&self) -> Line<'static> {
        let engine = self.session.engine();
        let window = engine.window();
        let stream = self.active_stream();
        let separator = || Span::styled(" │ ", Style::default().fg(palette::DIMMED_TEXT));

        let mut spans = vec![
            Span::styled(
                format!(" {} {}", stream.name, stream.id),
                Style::default()
                    .fg(palette::INFO)
                    .add_modifier(Modifier::BOLD),
            ),
            separator(),
            Span::raw(format!("{} items, rev {}", window.len(), window.revision())),
            separator(),
            edge_span(Edge::Top, engine.edge_status(Edge::Top)),
            Span::raw(" "),
            edge_span(Edge::Bottom, engine.edge_status(Edge::Bottom)),
            separator(),
        ];

        spans.push(if engine.is_detached() {
            Span::styled("detached", Style::default().fg(palette::WARNING))
        } else {
            Span::styled("live", Style::default().fg(palette::SUCCESS))
        });

        if let Some(edge) = engine.pending_trim() {
            spans.push(separator());
            spans.push(Span::styled(
                format!("trim {} pending", edge),
                Style::default().fg(palette::WARNING),
            ));
        }

        spans.push(separator());
        spans.push(Span::styled(
            format!("{} pushes, {} stale", self.pushes, self.stale),
            Style::default().fg(palette::DIMMED_TEXT),
        ));

        if let Some(error) = self.session.last_error() {
            spans.push(separator());
            spans.push(Span::styled(
                error.user_message(),
                Style::default().fg(palette::DESTRUCTIVE),
            ));
        } else if let Some(notice) = &self.notice {
            spans.push(separator());
            spans.push(Span::raw(notice.clone()));
        }

        Line::from(spans)
    }
}

fn edge_span(edge: Edge, status: EdgeStatus) -> Span<'static> {
    let color = match status {
        EdgeStatus::Idle => palette::DIMMED_TEXT,
        EdgeStatus::Loading => palette::INFO,
        EdgeStatus::CoolingDown => palette::WARNING,
    };
    Span::styled(format!("{}: {}", edge, status), Style::default().fg(color))
}

pub fn help_line() -> Line<'static> {
    let key = |text: &'static str| Span::styled(text, Style::default().fg(palette::INFO));
    let label = |text: &'static str| Span::styled(text, Style::default().fg(palette::DIMMED_TEXT));
    Line::from(vec![
        key(" ↑↓/wheel"),
        label(" scroll  "),
        key("PgUp/PgDn"),
        label(" page  "),
        key("Home/End"),
        label(" ends  "),
        key("g"),
        label(" jump  "),
        key("s"),
        label(" stream  "),
        key("e"),
        label(" fail next fetch  "),
        key("q"),
        label(" quit"),
    ])
}

impl Drop for DemoApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}
