//! Room-and-corridor map generation.

use super::connectivity::{force_path, is_reachable};
use super::grid::{DungeonGrid, Tunnel, TunnelKind};
use super::room::Room;
use crate::config::GeneratorConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};

/// Builds dungeon levels.
///
/// Rooms are placed at random and rejected if they touch an earlier room.
/// Each room is joined to the one placed before it by an L-shaped tunnel,
/// some get an extra tunnel back to an older room, and the exit goes in
/// the center of the last room. If the exit still can't be reached from
/// the first room a corridor is forced through.
#[derive(Debug, Clone, Default)]
pub struct MapGenerator {
    config: GeneratorConfig,
}

impl MapGenerator {
    /// Out-of-range settings are normalized first; see
    /// [`GeneratorConfig::normalized`].
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a level. With no rooms placed the grid is solid wall and
    /// has no exit.
    pub fn generate<R: Rng + ?Sized>(&self, level: u32, rng: &mut R) -> DungeonGrid {
        let rooms = self.place_rooms(rng);
        debug!(level, rooms = rooms.len(), "Placed rooms");
        if rooms.is_empty() {
            warn!(level, "No rooms fit, the level has no exit");
        }
        self.layout_from_rooms(rooms, rng)
    }

    fn place_rooms<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Room> {
        let c = &self.config;
        let mut rooms: Vec<Room> = Vec::new();

        for _ in 0..c.max_rooms {
            let w = rng.gen_range(c.min_room_size..=c.max_room_size);
            let h = rng.gen_range(c.min_room_size..=c.max_room_size);

            let max_x = c.width - w - 1;
            let max_y = c.height - h - 1;
            if max_x < 1 || max_y < 1 {
                continue;
            }
            let room = Room::new(rng.gen_range(1..=max_x), rng.gen_range(1..=max_y), w, h);

            if rooms.iter().any(|other| room.intersects(other)) {
                continue;
            }
            rooms.push(room);
        }
        rooms
    }

    /// Carve a grid from an ordered room list: rooms, connecting tunnels,
    /// the exit, and a repair corridor if one is needed.
    pub fn layout_from_rooms<R: Rng + ?Sized>(&self, rooms: Vec<Room>, rng: &mut R) -> DungeonGrid {
        let mut grid = DungeonGrid::new(self.config.width, self.config.height);

        for (i, room) in rooms.iter().enumerate() {
            grid.carve_room(room);
            if i == 0 {
                continue;
            }

            let center = room.center();
            let previous = rooms[i - 1].center();
            grid.carve_corridor(previous, center, rng.gen_bool(0.5));
            grid.record_tunnel(Tunnel {
                from: previous,
                to: center,
                kind: TunnelKind::Sequential,
            });

            // Any earlier room may be the loop target, the previous one included.
            if i >= 2 && rng.gen_bool(self.config.redundant_tunnel_chance) {
                if let Some(target) = rooms[..i].choose(rng) {
                    let target = target.center();
                    grid.carve_corridor(center, target, rng.gen_bool(0.5));
                    grid.record_tunnel(Tunnel {
                        from: center,
                        to: target,
                        kind: TunnelKind::Redundant,
                    });
                }
            }
        }

        if let Some(last) = rooms.last() {
            grid.set_exit(last.center());
        }
        grid.set_rooms(rooms);

        if let (Some(entry), Some(exit)) = (grid.entry(), grid.exit()) {
            if !is_reachable(&grid, entry, exit) {
                warn!(%entry, %exit, "Exit unreachable after generation, forcing a path");
                force_path(&mut grid, entry, exit);
            }
        }

        grid
    }
}
