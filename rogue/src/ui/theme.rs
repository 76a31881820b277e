//! Color theme and styling for the dungeon TUI

use ratatui::style::{Color, Modifier, Style};

use rogue_core::Glyph;

/// Game UI color theme
#[derive(Debug, Clone)]
pub struct GameTheme {
    pub border: Color,
    pub border_focused: Color,

    // Map colors
    pub wall: Color,
    pub floor: Color,
    pub exit: Color,
    pub player: Color,
    pub npc: Color,
    pub enemy: Color,

    // HP colors
    pub hp_healthy: Color,
    pub hp_wounded: Color,
    pub hp_critical: Color,

    // Log colors
    pub text: Color,
    pub player_text: Color,
    pub speech_text: Color,
    pub combat_text: Color,
    pub system_text: Color,
}

impl Default for GameTheme {
    fn default() -> Self {
        Self {
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            wall: Color::Gray,
            floor: Color::DarkGray,
            exit: Color::Yellow,
            player: Color::Green,
            npc: Color::Blue,
            enemy: Color::Red,

            hp_healthy: Color::Green,
            hp_wounded: Color::Yellow,
            hp_critical: Color::Red,

            text: Color::White,
            player_text: Color::Cyan,
            speech_text: Color::LightBlue,
            combat_text: Color::LightRed,
            system_text: Color::DarkGray,
        }
    }
}

impl GameTheme {
    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }

    /// Style for a map cell.
    pub fn glyph_style(&self, glyph: Glyph) -> Style {
        let style = Style::default();
        match glyph {
            Glyph::Wall => style.fg(self.wall),
            Glyph::Floor => style.fg(self.floor),
            Glyph::Exit => style.fg(self.exit).add_modifier(Modifier::BOLD),
            Glyph::Player => style.fg(self.player).add_modifier(Modifier::BOLD),
            Glyph::Npc => style.fg(self.npc).add_modifier(Modifier::BOLD),
            Glyph::Enemy => style.fg(self.enemy).add_modifier(Modifier::BOLD),
            Glyph::Void => style,
        }
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    pub fn player_style(&self) -> Style {
        Style::default()
            .fg(self.player_text)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn speech_style(&self) -> Style {
        Style::default().fg(self.speech_text)
    }

    pub fn combat_style(&self) -> Style {
        Style::default().fg(self.combat_text)
    }

    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    /// Get HP color based on ratio
    pub fn hp_color(&self, ratio: f32) -> Color {
        if ratio > 0.5 {
            self.hp_healthy
        } else if ratio > 0.25 {
            self.hp_wounded
        } else {
            self.hp_critical
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hp_color_thresholds() {
        let theme = GameTheme::default();
        assert_eq!(theme.hp_color(1.0), theme.hp_healthy);
        assert_eq!(theme.hp_color(0.4), theme.hp_wounded);
        assert_eq!(theme.hp_color(0.1), theme.hp_critical);
    }

    #[test]
    fn test_actor_colors() {
        let theme = GameTheme::default();
        assert_eq!(theme.glyph_style(Glyph::Player).fg, Some(Color::Green));
        assert_eq!(theme.glyph_style(Glyph::Enemy).fg, Some(Color::Red));
        assert_eq!(theme.glyph_style(Glyph::Npc).fg, Some(Color::Blue));
        assert_eq!(theme.glyph_style(Glyph::Exit).fg, Some(Color::Yellow));
    }
}
