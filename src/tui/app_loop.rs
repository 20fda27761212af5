use anyhow::Result;
use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Paragraph, Scrollbar, ScrollbarOrientation, StatefulWidget, Widget, Wrap};
use std::time::Duration;
use tokio::time::interval;

use super::app::{DemoApp, FOOTER_HEIGHT, help_line};
use super::colors::palette;
use super::scroll_handler::map_event;
use super::terminal::DemoTerminal;

pub async fn run_event_loop(mut terminal: DemoTerminal, app: &mut DemoApp) -> Result<DemoTerminal> {
    let mut event_stream = EventStream::new();
    let mut render_interval = interval(Duration::from_millis(50));
    let mut tick_interval = interval(Duration::from_millis(100));

    loop {
        tokio::select! {
            _ = render_interval.tick() => {
                render_frame(app, &mut terminal)?;
            }
            _ = tick_interval.tick() => {
                app.tick();
            }
            Some(event) = app.session_mut().next_event() => {
                app.on_session_event(event);
            }
            Some(Ok(event)) = event_stream.next() => {
                if let Some(action) = map_event(&event) {
                    app.handle_action(action);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(terminal)
}

fn render_frame(app: &mut DemoApp, terminal: &mut DemoTerminal) -> Result<()> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    terminal.draw(|frame| {
        let [messages, status, help] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(FOOTER_HEIGHT - 1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        let buf = frame.buffer_mut();
        render_messages(app, messages, buf);
        Paragraph::new(app.status_line())
            .style(Style::default().bg(palette::STATUS_BG))
            .render(status, buf);
        Paragraph::new(help_line()).render(help, buf);
    })?;

    Ok(())
}

fn render_messages(app: &DemoApp, area: Rect, buf: &mut Buffer) {
    let engine = app.session().engine();
    let viewport = engine.viewport();

    if engine.window().is_empty() {
        Paragraph::new(Line::styled(
            "loading…",
            Style::default().fg(palette::DIMMED_TEXT),
        ))
        .render(area, buf);
        return;
    }

    let content_area = Rect {
        width: area.width.saturating_sub(1),
        ..area
    };
    let highlight = Style::default().bg(palette::HIGHLIGHT_BG);
    let (lines, skip) = viewport.visible_lines(engine.highlighted(), highlight);

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((skip, 0))
        .render(content_area, buf);

    if viewport.needs_scrollbar() {
        let mut state = viewport.scrollbar_state();
        Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .render(area, buf, &mut state);
    }
}
