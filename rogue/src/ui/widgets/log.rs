//! Message log widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::Line,
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::GameTheme;

/// Widget for the most recent log lines, or a page of history.
pub struct LogWidget<'a> {
    lines: Vec<&'a str>,
    theme: &'a GameTheme,
    history: bool,
}

impl<'a> LogWidget<'a> {
    pub fn new(lines: Vec<&'a str>, theme: &'a GameTheme) -> Self {
        Self {
            lines,
            theme,
            history: false,
        }
    }

    pub fn history(mut self, history: bool) -> Self {
        self.history = history;
        self
    }

    fn style_for_line(&self, line: &str) -> Style {
        if line.starts_with("---") || line.starts_with('(') {
            self.theme.system_style()
        } else if line.starts_with("You: ") {
            self.theme.player_style()
        } else if line.starts_with("  ") || line.ends_with(':') {
            self.theme.speech_style()
        } else if line.contains("attack") || line.contains("defeated") {
            self.theme.combat_style()
        } else {
            self.theme.text_style()
        }
    }
}

impl Widget for LogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.history {
            " History [Up/Down scroll, Esc exit] "
        } else {
            " Log "
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.history));

        let lines: Vec<Line> = self
            .lines
            .iter()
            .map(|line| Line::styled(*line, self.style_for_line(line)))
            .collect();

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
