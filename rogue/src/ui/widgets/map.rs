//! Dungeon map widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::{Block, Borders, Widget},
};

use rogue_core::{GameSession, Position};

use crate::ui::theme::GameTheme;

/// Draws the level, scrolled so the player stays in view when the
/// panel is smaller than the map.
pub struct MapWidget<'a> {
    session: &'a GameSession,
    theme: &'a GameTheme,
}

impl<'a> MapWidget<'a> {
    pub fn new(session: &'a GameSession, theme: &'a GameTheme) -> Self {
        Self { session, theme }
    }
}

/// First map column (or row) to draw so that `focus` is visible in a
/// viewport of `view` cells over a map of `extent` cells.
fn camera_origin(focus: i32, extent: i32, view: i32) -> i32 {
    if view >= extent {
        return 0;
    }
    (focus - view / 2).clamp(0, extent - view)
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" Dungeon Level {} ", self.session.display_level()))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));
        let inner = block.inner(area);
        block.render(area, buf);

        let grid = self.session.grid();
        let player = self.session.player().position;
        let view_w = i32::from(inner.width).min(grid.width());
        let view_h = i32::from(inner.height).min(grid.height());
        let origin_x = camera_origin(player.x, grid.width(), view_w);
        let origin_y = camera_origin(player.y, grid.height(), view_h);

        for dy in 0..view_h {
            for dx in 0..view_w {
                let glyph = self
                    .session
                    .glyph_at(Position::new(origin_x + dx, origin_y + dy));
                let cell = (inner.x + dx as u16, inner.y + dy as u16);
                if let Some(cell) = buf.cell_mut(cell) {
                    cell.set_char(glyph.symbol())
                        .set_style(self.theme.glyph_style(glyph));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_fits_whole_map() {
        assert_eq!(camera_origin(70, 80, 80), 0);
        assert_eq!(camera_origin(3, 80, 100), 0);
    }

    #[test]
    fn test_camera_follows_and_clamps() {
        assert_eq!(camera_origin(40, 80, 20), 30);
        assert_eq!(camera_origin(2, 80, 20), 0);
        assert_eq!(camera_origin(79, 80, 20), 60);
    }
}
