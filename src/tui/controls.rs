//! Keyboard input handling for the TUI.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::runtime::{App, Series};

/// Maps a key event to an application action.
///
/// Guards on [`KeyEventKind::Press`] to avoid double-fire on some terminals.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit = true,
        KeyCode::Char(' ') => app.toggle_pause(),
        KeyCode::Char('+' | '=') | KeyCode::Right => app.speed_up(),
        KeyCode::Char('-') | KeyCode::Left => app.speed_down(),
        KeyCode::Char('m') => app.toggle_mode(),
        KeyCode::Char('s') => app.toggle_schedule(),
        KeyCode::Up => app.nudge_target(1.0),
        KeyCode::Down => app.nudge_target(-1.0),
        KeyCode::Char('i') => app.toggle_manual_inlet(),
        KeyCode::Char(']') => app.nudge_inlet(1.0),
        KeyCode::Char('[') => app.nudge_inlet(-1.0),
        KeyCode::Char('F') => app.nudge_friction(1.0),
        KeyCode::Char('f') => app.nudge_friction(-1.0),
        KeyCode::Char('1') => app.toggle_series(Series::Inlet),
        KeyCode::Char('2') => app.toggle_series(Series::Outlet),
        KeyCode::Char('3') => app.toggle_series(Series::CriticalPoint),
        KeyCode::Char('4') => app.toggle_series(Series::Flow),
        KeyCode::Char('d') => app.request_diagnostic(),
        KeyCode::Char('r') => app.restart(),
        _ => {}
    }
}
