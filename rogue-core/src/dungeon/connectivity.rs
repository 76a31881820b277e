//! Reachability checks and corridor repair.

use super::grid::{DungeonGrid, Tunnel, TunnelKind};
use super::room::Position;
use std::collections::{HashSet, VecDeque};

/// Breadth-first search over 4-connected walkable cells.
///
/// Entities block the search, so this answers "can someone walk there
/// right now". During generation there are no entities and only tiles
/// matter.
pub fn is_reachable(grid: &DungeonGrid, start: Position, end: Position) -> bool {
    search(start, end, |pos| grid.is_walkable(pos))
}

/// Like [`is_reachable`] but only looks at tiles.
pub fn is_tile_reachable(grid: &DungeonGrid, start: Position, end: Position) -> bool {
    search(start, end, |pos| grid.tile(pos).is_some_and(|t| t.is_passable()))
}

fn search(start: Position, end: Position, passable: impl Fn(Position) -> bool) -> bool {
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        if current == end {
            return true;
        }
        for next in current.neighbors4() {
            if passable(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    false
}

/// Carve an L-shaped corridor from `start` to `end`: along `start`'s row,
/// then along `end`'s column. Only walls are changed.
pub fn force_path(grid: &mut DungeonGrid, start: Position, end: Position) {
    grid.carve_corridor(start, end, true);
    grid.record_tunnel(Tunnel {
        from: start,
        to: end,
        kind: TunnelKind::Repair,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dungeon::Tile;
    use crate::entity::Entity;
    use crate::npc::{Character, CharacterDescriptor, CharacterKind};
    use crate::testing::grid_from_ascii;

    #[test]
    fn test_reachable_through_winding_corridor() {
        let grid = grid_from_ascii(&[
            "#######",
            "#.#...#",
            "#.#.#.#",
            "#...#>#",
            "#######",
        ]);
        assert!(is_reachable(&grid, Position::new(1, 1), Position::new(5, 3)));
    }

    #[test]
    fn test_no_diagonal_moves() {
        let grid = grid_from_ascii(&["####", "#.##", "##.#", "####"]);
        assert!(!is_reachable(&grid, Position::new(1, 1), Position::new(2, 2)));
    }

    #[test]
    fn test_start_equals_end() {
        let grid = DungeonGrid::new(3, 3);
        assert!(is_reachable(&grid, Position::new(1, 1), Position::new(1, 1)));
    }

    #[test]
    fn test_entities_block_walkers_not_tiles() {
        let mut grid = grid_from_ascii(&["#####", "#...#", "#####"]);
        let npc = Character::from_descriptor(CharacterKind::Npc, &CharacterDescriptor::default(), 0, 10);
        grid.add_entity(Entity::new(Position::new(2, 1), npc));

        assert!(!is_reachable(&grid, Position::new(1, 1), Position::new(3, 1)));
        assert!(is_tile_reachable(&grid, Position::new(1, 1), Position::new(3, 1)));
    }

    #[test]
    fn test_force_path_shape() {
        let mut grid = DungeonGrid::new(10, 8);
        grid.set_exit(Position::new(7, 6));
        force_path(&mut grid, Position::new(2, 1), Position::new(7, 6));

        for x in 2..=7 {
            assert_eq!(grid.tile(Position::new(x, 1)), Some(Tile::Floor));
        }
        for y in 2..6 {
            assert_eq!(grid.tile(Position::new(7, y)), Some(Tile::Floor));
        }
        assert!(grid.is_exit(Position::new(7, 6)));
        assert_eq!(grid.tile(Position::new(2, 2)), Some(Tile::Wall));
        assert!(is_reachable(&grid, Position::new(2, 1), Position::new(7, 6)));
        assert_eq!(grid.tunnels()[0].kind, TunnelKind::Repair);
    }
}
