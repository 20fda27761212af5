use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use std::sync::Arc;

use super::colors::{author_color, palette};
use crate::message::ChatMessage;
use crate::viewport::RenderFn;

/// Lines for one message: a header, the body (wrapped by the viewport) and
/// a blank spacer.
pub fn render_message(message: &ChatMessage) -> Vec<Line<'static>> {
    let mut header = vec![
        Span::styled(
            message.author.clone(),
            Style::default()
                .fg(author_color(&message.author))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" · ", Style::default().fg(palette::DIMMED_TEXT)),
        Span::styled(
            message.sent_at.format("%H:%M").to_string(),
            Style::default().fg(palette::DIMMED_TEXT),
        ),
        Span::styled(
            format!("  #{}", message.id),
            Style::default().fg(palette::SUBDUED_TEXT),
        ),
    ];
    if message.edited {
        header.push(Span::styled(
            " (edited)",
            Style::default()
                .fg(palette::DIMMED_TEXT)
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let mut lines = vec![Line::from(header)];
    lines.extend(message.body.lines().map(|line| {
        Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(palette::PRIMARY_TEXT),
        ))
    }));
    lines.push(Line::default());
    lines
}

pub fn message_render_fn() -> RenderFn<ChatMessage> {
    Arc::new(render_message)
}
