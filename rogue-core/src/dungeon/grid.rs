//! The tile grid and the entities living on it.

use super::connectivity::{force_path, is_tile_reachable};
use super::room::{Position, Room};
use crate::entity::{Entity, EntityId, EntityKind};
use crate::npc::{CharacterCache, CharacterKind};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Samples spent looking for a spawn tile away from the exit before any
/// free tile is accepted.
const SPAWN_SAMPLES: usize = 64;

/// Minimum Chebyshev distance between a spawned entity and the exit.
pub const EXIT_CLEARANCE: i32 = 2;

/// One cell of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tile {
    #[default]
    Wall,
    Floor,
    Exit,
}

impl Tile {
    /// Floor and exit tiles can be stood on.
    pub fn is_passable(self) -> bool {
        matches!(self, Tile::Floor | Tile::Exit)
    }
}

/// How a corridor came to be carved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TunnelKind {
    /// Joins a room to the room placed just before it.
    Sequential,
    /// An extra loop back to an earlier room.
    Redundant,
    /// Carved after the fact to make the exit reachable.
    Repair,
}

/// An L-shaped corridor between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tunnel {
    pub from: Position,
    pub to: Position,
    pub kind: TunnelKind,
}

/// What a renderer should draw for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    Wall,
    Floor,
    Exit,
    Player,
    Npc,
    Enemy,
    /// Outside the map.
    Void,
}

impl Glyph {
    pub fn symbol(self) -> char {
        match self {
            Glyph::Wall => '#',
            Glyph::Floor => '.',
            Glyph::Exit => '>',
            Glyph::Player => '@',
            Glyph::Npc => 'N',
            Glyph::Enemy => 'E',
            Glyph::Void => ' ',
        }
    }
}

/// A dungeon level: tiles stored column-major (`[x][y]`), the rooms and
/// tunnels that carved them, and the entities on the level.
#[derive(Debug, Clone)]
pub struct DungeonGrid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    rooms: Vec<Room>,
    tunnels: Vec<Tunnel>,
    exit: Option<Position>,
    entities: Vec<Entity>,
}

impl DungeonGrid {
    /// A solid block of wall.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            tiles: vec![Tile::Wall; (width * height) as usize],
            rooms: Vec::new(),
            tunnels: Vec::new(),
            exit: None,
            entities: Vec::new(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.x * self.height + pos.y) as usize)
    }

    /// The tile at a position, or `None` outside the map.
    pub fn tile(&self, pos: Position) -> Option<Tile> {
        self.index(pos).map(|i| self.tiles[i])
    }

    /// Overwrite a tile. Out-of-bounds writes are ignored.
    pub fn set_tile(&mut self, pos: Position, tile: Tile) {
        if let Some(i) = self.index(pos) {
            self.tiles[i] = tile;
            if tile != Tile::Exit && self.exit == Some(pos) {
                self.exit = None;
            }
        }
    }

    /// Make `pos` the level's only exit.
    pub fn set_exit(&mut self, pos: Position) {
        if !self.in_bounds(pos) {
            return;
        }
        if let Some(old) = self.exit.take() {
            self.set_tile(old, Tile::Floor);
        }
        self.set_tile(pos, Tile::Exit);
        self.exit = Some(pos);
    }

    /// Turn a wall into floor. Floor and exit tiles are left alone.
    pub fn carve(&mut self, pos: Position) {
        if self.tile(pos) == Some(Tile::Wall) {
            self.set_tile(pos, Tile::Floor);
        }
    }

    /// Carve the interior of a room.
    pub fn carve_room(&mut self, room: &Room) {
        for pos in room.interior() {
            self.carve(pos);
        }
    }

    /// Carve an L-shaped corridor. With `horizontal_first` the horizontal
    /// run follows `from`'s row and the vertical run `to`'s column;
    /// otherwise the vertical run follows `from`'s column and the
    /// horizontal run `to`'s row.
    pub fn carve_corridor(&mut self, from: Position, to: Position, horizontal_first: bool) {
        if horizontal_first {
            self.carve_horizontal(from.x, to.x, from.y);
            self.carve_vertical(from.y, to.y, to.x);
        } else {
            self.carve_vertical(from.y, to.y, from.x);
            self.carve_horizontal(from.x, to.x, to.y);
        }
    }

    fn carve_horizontal(&mut self, x1: i32, x2: i32, y: i32) {
        for x in x1.min(x2)..=x1.max(x2) {
            self.carve(Position::new(x, y));
        }
    }

    fn carve_vertical(&mut self, y1: i32, y2: i32, x: i32) {
        for y in y1.min(y2)..=y1.max(y2) {
            self.carve(Position::new(x, y));
        }
    }

    pub(crate) fn set_rooms(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
    }

    pub(crate) fn record_tunnel(&mut self, tunnel: Tunnel) {
        self.tunnels.push(tunnel);
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn tunnels(&self) -> &[Tunnel] {
        &self.tunnels
    }

    pub fn exit(&self) -> Option<Position> {
        self.exit
    }

    /// Center of the first room.
    pub fn entry(&self) -> Option<Position> {
        self.rooms.first().map(Room::center)
    }

    /// In bounds, a floor or exit tile, and not occupied by an entity.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile(pos).is_some_and(Tile::is_passable) && self.entity_at(pos).is_none()
    }

    pub fn is_exit(&self, pos: Position) -> bool {
        self.tile(pos) == Some(Tile::Exit)
    }

    // ========================================================================
    // Entities
    // ========================================================================

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn npcs(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.kind() == EntityKind::Npc)
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.kind() == EntityKind::Enemy)
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn entity_at(&self, pos: Position) -> Option<&Entity> {
        self.entities.iter().find(|e| e.position == pos)
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        self.entities.push(entity);
        id
    }

    /// Remove an entity. Returns `None` if it wasn't on this level.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let index = self.entities.iter().position(|e| e.id == id)?;
        Some(self.entities.remove(index))
    }

    pub fn clear_entities(&mut self) {
        self.entities.clear();
    }

    /// The first NPC in the 8-neighbourhood of `pos`.
    pub fn adjacent_npc(&self, pos: Position) -> Option<&Entity> {
        self.npcs().find(|e| e.position.chebyshev(pos) <= 1)
    }

    /// The first enemy in the 8-neighbourhood of `pos`.
    pub fn adjacent_enemy(&self, pos: Position) -> Option<&Entity> {
        self.enemies().find(|e| e.position.chebyshev(pos) <= 1)
    }

    // ========================================================================
    // Placement
    // ========================================================================

    /// A uniformly chosen walkable cell, excluding the outer border.
    /// Returns `None` when the level has no such cell.
    pub fn random_floor_tile<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Position> {
        self.free_tiles(|_| true).choose(rng).copied()
    }

    fn free_tiles(&self, accept: impl Fn(Position) -> bool) -> Vec<Position> {
        (1..self.width - 1)
            .flat_map(|x| (1..self.height - 1).map(move |y| Position::new(x, y)))
            .filter(|&pos| self.is_walkable(pos) && accept(pos))
            .collect()
    }

    /// Pick a spawn tile: free, not `avoid`, and away from the exit when
    /// such a tile turns up within a bounded number of samples.
    fn spawn_tile<R: Rng + ?Sized>(&self, avoid: Option<Position>, rng: &mut R) -> Option<Position> {
        let candidates = self.free_tiles(|pos| Some(pos) != avoid);
        let away_from_exit =
            |pos: Position| self.exit.map_or(true, |exit| pos.chebyshev(exit) > EXIT_CLEARANCE);

        for _ in 0..SPAWN_SAMPLES {
            let pos = *candidates.choose(rng)?;
            if away_from_exit(pos) {
                return Some(pos);
            }
        }
        candidates.choose(rng).copied()
    }

    /// Replace the level's entities with freshly generated ones: one or
    /// two NPCs and `3 + level / 2` enemies.
    pub async fn populate<R: Rng + ?Sized>(
        &mut self,
        cache: &mut CharacterCache,
        level: u32,
        avoid: Option<Position>,
        rng: &mut R,
    ) {
        self.clear_entities();

        let npc_count = rng.gen_range(1..=2);
        let enemy_count = 3 + level / 2;
        let roster = std::iter::repeat(CharacterKind::Npc)
            .take(npc_count)
            .chain(std::iter::repeat(CharacterKind::Enemy).take(enemy_count as usize));

        for kind in roster {
            let Some(pos) = self.spawn_tile(avoid, rng) else {
                warn!("No free tile left for a {kind} on level {level}");
                break;
            };
            let character = cache.spawn_character(kind, level).await;
            debug!(name = %character.name, %pos, "Placed {kind}");
            self.add_entity(Entity::new(pos, character));
        }

        info!(
            level,
            npcs = self.npcs().count(),
            enemies = self.enemies().count(),
            "Populated level"
        );
    }

    /// Advance NPC and enemy behaviour by one tick. Entities never step
    /// onto the player.
    pub fn update_entities<R: Rng + ?Sized>(&mut self, player: Position, rng: &mut R) {
        for i in 0..self.entities.len() {
            if !self.entities[i].tick_cooldown() {
                continue;
            }
            let steps = self.entities[i].plan_step(player, rng);
            if let Some(step) = steps
                .into_iter()
                .find(|&step| step != player && self.is_walkable(step))
            {
                self.entities[i].position = step;
            }
        }
    }

    /// Make sure the exit can be reached from `from`, ignoring entities,
    /// carving a corridor if it can't. Returns true if a repair was
    /// needed.
    pub fn ensure_reachable(&mut self, from: Position) -> bool {
        let Some(exit) = self.exit else {
            return false;
        };
        if is_tile_reachable(self, from, exit) {
            return false;
        }
        warn!(%from, %exit, "Exit unreachable, carving a repair corridor");
        force_path(self, from, exit);
        true
    }

    /// What to draw at a cell, ignoring the player.
    pub fn glyph_at(&self, pos: Position) -> Glyph {
        if let Some(entity) = self.entity_at(pos) {
            return match entity.kind() {
                EntityKind::Enemy => Glyph::Enemy,
                EntityKind::Npc => Glyph::Npc,
                EntityKind::Player => Glyph::Player,
            };
        }
        match self.tile(pos) {
            Some(Tile::Wall) => Glyph::Wall,
            Some(Tile::Floor) => Glyph::Floor,
            Some(Tile::Exit) => Glyph::Exit,
            None => Glyph::Void,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::npc::{Character, CharacterDescriptor};
    use crate::testing::grid_from_ascii;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn character(kind: CharacterKind) -> Character {
        Character::from_descriptor(kind, &CharacterDescriptor::default(), 1, 10)
    }

    fn open_room() -> DungeonGrid {
        grid_from_ascii(&[
            "##########",
            "#........#",
            "#........#",
            "#........#",
            "#.......>#",
            "##########",
        ])
    }

    #[test]
    fn test_walkability() {
        let mut grid = open_room();
        assert!(grid.is_walkable(Position::new(1, 1)));
        assert!(grid.is_walkable(Position::new(8, 4)));
        assert!(!grid.is_walkable(Position::new(0, 0)));
        assert!(!grid.is_walkable(Position::new(-1, 2)));
        assert!(!grid.is_walkable(Position::new(10, 2)));

        grid.add_entity(Entity::new(Position::new(2, 2), character(CharacterKind::Npc)));
        assert!(!grid.is_walkable(Position::new(2, 2)));
    }

    #[test]
    fn test_single_exit() {
        let mut grid = open_room();
        grid.set_exit(Position::new(1, 1));
        assert_eq!(grid.exit(), Some(Position::new(1, 1)));
        assert_eq!(grid.tile(Position::new(8, 4)), Some(Tile::Floor));

        grid.set_tile(Position::new(1, 1), Tile::Wall);
        assert_eq!(grid.exit(), None);
    }

    #[test]
    fn test_carve_never_touches_exit() {
        let mut grid = open_room();
        grid.carve_corridor(Position::new(1, 4), Position::new(8, 4), true);
        assert!(grid.is_exit(Position::new(8, 4)));
    }

    #[test]
    fn test_adjacency_and_removal() {
        let mut grid = open_room();
        let npc = grid.add_entity(Entity::new(Position::new(3, 3), character(CharacterKind::Npc)));
        let enemy = grid.add_entity(Entity::new(Position::new(5, 3), character(CharacterKind::Enemy)));

        assert_eq!(grid.adjacent_npc(Position::new(4, 4)).map(|e| e.id), Some(npc));
        assert_eq!(grid.adjacent_enemy(Position::new(4, 4)).map(|e| e.id), Some(enemy));
        assert!(grid.adjacent_enemy(Position::new(1, 1)).is_none());

        assert!(grid.remove(enemy).is_some());
        assert!(grid.remove(enemy).is_none());
        assert_eq!(grid.entities().len(), 1);
        assert_eq!(grid.enemies().count(), 0);
        assert_eq!(grid.npcs().count(), 1);
    }

    #[test]
    fn test_random_floor_tile() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = open_room();
        for _ in 0..50 {
            let pos = grid.random_floor_tile(&mut rng).unwrap();
            assert!(grid.is_walkable(pos));
        }

        let solid = DungeonGrid::new(10, 10);
        assert_eq!(solid.random_floor_tile(&mut rng), None);
    }

    #[test]
    fn test_entities_never_enter_player_tile() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut grid = grid_from_ascii(&["#####", "#...#", "#####"]);
        let player = Position::new(1, 1);
        grid.add_entity(Entity::new(Position::new(2, 1), character(CharacterKind::Enemy)));

        for _ in 0..30 {
            grid.update_entities(player, &mut rng);
            assert_ne!(grid.entities()[0].position, player);
        }
    }

    #[test]
    fn test_enemy_closes_in() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut grid = open_room();
        let player = Position::new(1, 1);
        let id = grid.add_entity(Entity::new(Position::new(6, 4), character(CharacterKind::Enemy)));

        // first tick acts, then every third
        grid.update_entities(player, &mut rng);
        assert_eq!(grid.entity(id).unwrap().position, Position::new(5, 3));
        grid.update_entities(player, &mut rng);
        grid.update_entities(player, &mut rng);
        assert_eq!(grid.entity(id).unwrap().position, Position::new(5, 3));
        grid.update_entities(player, &mut rng);
        assert_eq!(grid.entity(id).unwrap().position, Position::new(4, 2));
    }

    #[test]
    fn test_ensure_reachable_repairs() {
        let mut grid = grid_from_ascii(&[
            "##########",
            "#..####..#",
            "#..####.>#",
            "##########",
        ]);
        assert!(grid.ensure_reachable(Position::new(1, 1)));
        assert!(!grid.ensure_reachable(Position::new(1, 1)));
        assert!(grid.is_exit(Position::new(8, 2)));
    }

    #[test]
    fn test_glyphs() {
        let mut grid = open_room();
        grid.add_entity(Entity::new(Position::new(2, 2), character(CharacterKind::Enemy)));
        assert_eq!(grid.glyph_at(Position::new(0, 0)), Glyph::Wall);
        assert_eq!(grid.glyph_at(Position::new(1, 1)), Glyph::Floor);
        assert_eq!(grid.glyph_at(Position::new(8, 4)), Glyph::Exit);
        assert_eq!(grid.glyph_at(Position::new(2, 2)), Glyph::Enemy);
        assert_eq!(grid.glyph_at(Position::new(40, 2)), Glyph::Void);
        assert_eq!(Glyph::Player.symbol(), '@');
    }
}
