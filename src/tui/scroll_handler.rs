use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

const WHEEL_LINES: i64 = 3;

/// What a terminal event asks the demo to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoAction {
    ScrollLines(i64),
    /// Whole viewports, negative is up.
    ScrollPages(i64),
    ScrollToTop,
    ScrollToBottom,
    JumpToRandom,
    SwitchStream,
    InjectFailure,
    Resize { width: u16, height: u16 },
    Quit,
}

pub fn map_event(event: &Event) -> Option<DemoAction> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => map_key(key),
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            ..
        }) => Some(DemoAction::ScrollLines(-WHEEL_LINES)),
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::ScrollDown,
            ..
        }) => Some(DemoAction::ScrollLines(WHEEL_LINES)),
        Event::Resize(width, height) => Some(DemoAction::Resize {
            width: *width,
            height: *height,
        }),
        _ => None,
    }
}

fn map_key(key: &KeyEvent) -> Option<DemoAction> {
    let action = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => DemoAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => DemoAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => DemoAction::ScrollLines(-1),
        KeyCode::Down | KeyCode::Char('j') => DemoAction::ScrollLines(1),
        KeyCode::PageUp => DemoAction::ScrollPages(-1),
        KeyCode::PageDown => DemoAction::ScrollPages(1),
        KeyCode::Home => DemoAction::ScrollToTop,
        KeyCode::End => DemoAction::ScrollToBottom,
        KeyCode::Char('g') => DemoAction::JumpToRandom,
        KeyCode::Char('s') => DemoAction::SwitchStream,
        KeyCode::Char('e') => DemoAction::InjectFailure,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    fn wheel(kind: MouseEventKind) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_navigation_keys() {
        assert_eq!(map_event(&key(KeyCode::Up)), Some(DemoAction::ScrollLines(-1)));
        assert_eq!(map_event(&key(KeyCode::PageDown)), Some(DemoAction::ScrollPages(1)));
        assert_eq!(map_event(&key(KeyCode::Home)), Some(DemoAction::ScrollToTop));
        assert_eq!(map_event(&key(KeyCode::Char('g'))), Some(DemoAction::JumpToRandom));
        assert_eq!(map_event(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_mouse_wheel_scrolls_three_lines() {
        assert_eq!(
            map_event(&wheel(MouseEventKind::ScrollUp)),
            Some(DemoAction::ScrollLines(-3))
        );
        assert_eq!(
            map_event(&wheel(MouseEventKind::ScrollDown)),
            Some(DemoAction::ScrollLines(3))
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let event = Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        });
        assert_eq!(map_event(&event), Some(DemoAction::Quit));
    }
}
