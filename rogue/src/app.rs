//! Front-end state wrapped around a [`GameSession`].

use rogue_core::GameSession;

use crate::ui::theme::GameTheme;

/// Everything the renderer needs besides the session itself.
pub struct App {
    pub session: GameSession,
    pub theme: GameTheme,
    status: Option<String>,
}

impl App {
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            theme: GameTheme::default(),
            status: None,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}
