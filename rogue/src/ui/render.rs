//! Render orchestration for the dungeon TUI

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::widgets::{LogWidget, MapWidget};

/// Rows of log shown under the map when the terminal allows it.
const LOG_ROWS: u16 = 8;

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let session = &app.session;

    let map_rows = u16::try_from(session.grid().height())
        .unwrap_or(u16::MAX)
        .saturating_add(2);
    let input_rows = if session.input_prompt().is_some() { 3 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Max(map_rows),
            Constraint::Length(1),
            Constraint::Min(LOG_ROWS + 2),
            Constraint::Length(input_rows),
        ])
        .split(area);

    frame.render_widget(MapWidget::new(session, &app.theme), chunks[0]);
    render_status_bar(frame, app, chunks[1]);
    render_log(frame, app, chunks[2]);
    if input_rows > 0 {
        render_input(frame, app, chunks[3]);
    }
}

/// HP on the left, the current status message in the middle, dungeon
/// level on the right.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let player = app.session.player();
    let ratio = player.hp.max(0) as f32 / player.max_hp.max(1) as f32;

    let hp = format!("HP: {}/{}", player.hp, player.max_hp);
    let level = format!("Dungeon Level: {}", app.session.display_level());
    let status = app.status().unwrap_or_default();

    let used = hp.len() + level.len() + status.len();
    let gap = usize::from(area.width).saturating_sub(used) / 2;

    let line = Line::from(vec![
        Span::styled(
            hp,
            Style::default()
                .fg(app.theme.hp_color(ratio))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(gap)),
        Span::styled(status.to_string(), app.theme.system_style()),
        Span::raw(" ".repeat(gap)),
        Span::styled(level, app.theme.text_style()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_log(frame: &mut Frame, app: &App, area: Rect) {
    let rows = usize::from(area.height.saturating_sub(2));
    let widget = LogWidget::new(app.session.log_window(rows), &app.theme)
        .history(app.session.is_viewing_history());
    frame.render_widget(widget, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let Some((partner, buffer)) = app.session.input_prompt() else {
        return;
    };

    let block = Block::default()
        .title(format!(" Talking to {partner} [Enter send, Esc leave] "))
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let line = Line::from(vec![
        Span::styled("> ", app.theme.player_style()),
        Span::styled(buffer, app.theme.text_style()),
        Span::styled("_", app.theme.system_style()),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
