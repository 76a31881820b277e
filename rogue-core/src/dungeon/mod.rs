//! Dungeon levels.
//!
//! Contains rooms, the map generator, reachability checks and the grid
//! that holds a level's tiles and entities.

mod connectivity;
mod generator;
mod grid;
mod room;

pub use connectivity::{force_path, is_reachable, is_tile_reachable};
pub use generator::MapGenerator;
pub use grid::{DungeonGrid, Glyph, Tile, Tunnel, TunnelKind, EXIT_CLEARANCE};
pub use room::{Position, Room};
