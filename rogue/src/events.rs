//! Translation from terminal events to game keys.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use rogue_core::{EventResult, Key};

use crate::app::App;

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        _ => app.session.handle_key(None),
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    if key.kind != KeyEventKind::Press {
        return app.session.handle_key(None);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return EventResult::Quit;
    }
    app.session.handle_key(map_key(key.code))
}

/// Map a crossterm key code onto a game key. Keys the game ignores map
/// to `None`.
pub fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Escape),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Char(c) => Some(Key::Char(c)),
        _ => None,
    }
}
