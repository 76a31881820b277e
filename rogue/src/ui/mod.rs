//! Terminal UI for the dungeon

pub mod render;
pub mod theme;
pub mod widgets;
