//! Custom widgets for the dungeon TUI

mod log;
mod map;

pub use log::LogWidget;
pub use map::MapWidget;
