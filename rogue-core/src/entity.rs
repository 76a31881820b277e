//! Things that occupy dungeon tiles: the player and generated characters.

use crate::dungeon::Position;
use crate::npc::{Character, CharacterKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for entities placed in a dungeon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an entity is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Npc,
    Enemy,
}

impl From<CharacterKind> for EntityKind {
    fn from(kind: CharacterKind) -> Self {
        match kind {
            CharacterKind::Npc => EntityKind::Npc,
            CharacterKind::Enemy => EntityKind::Enemy,
        }
    }
}

// ============================================================================
// Player
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub position: Position,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: Position::default(),
            hp: 100,
            max_hp: 100,
            attack: 10,
        }
    }

    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp;
        self.max_hp = hp;
        self
    }

    pub fn with_attack(mut self, attack: i32) -> Self {
        self.attack = attack;
        self
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp -= amount;
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new("Adventurer")
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Ticks between NPC moves.
pub const NPC_MOVE_INTERVAL: u32 = 5;

/// Ticks between enemy moves.
pub const ENEMY_MOVE_INTERVAL: u32 = 3;

/// A generated character standing on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub position: Position,
    pub character: Character,
    move_cooldown: u32,
}

impl Entity {
    pub fn new(position: Position, character: Character) -> Self {
        Self {
            id: EntityId::new(),
            position,
            character,
            move_cooldown: 0,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.character.kind().into()
    }

    pub fn name(&self) -> &str {
        &self.character.name
    }

    pub fn is_npc(&self) -> bool {
        self.kind() == EntityKind::Npc
    }

    pub fn is_enemy(&self) -> bool {
        self.kind() == EntityKind::Enemy
    }

    fn move_interval(&self) -> u32 {
        match self.character.kind() {
            CharacterKind::Npc => NPC_MOVE_INTERVAL,
            CharacterKind::Enemy => ENEMY_MOVE_INTERVAL,
        }
    }

    /// Count down the move cooldown. Returns true on ticks where the
    /// entity gets to act; the first tick always acts.
    pub(crate) fn tick_cooldown(&mut self) -> bool {
        self.move_cooldown = self.move_cooldown.saturating_sub(1);
        if self.move_cooldown == 0 {
            self.move_cooldown = self.move_interval();
            true
        } else {
            false
        }
    }

    /// The cells this entity would like to step into this turn, best
    /// first. The caller takes the first one that is free.
    pub(crate) fn plan_step<R: Rng + ?Sized>(&self, player: Position, rng: &mut R) -> Vec<Position> {
        if let Some(stats) = self.character.stats() {
            if self.position.euclidean(player) < f64::from(stats.detection_range) {
                return greedy_steps(self.position, player);
            }
        }
        vec![random_step(self.position, rng)]
    }
}

/// Candidate steps towards a target: diagonal, then horizontal, then
/// vertical.
pub fn greedy_steps(from: Position, to: Position) -> Vec<Position> {
    let dx = (to.x - from.x).signum();
    let dy = (to.y - from.y).signum();

    let mut steps = Vec::with_capacity(3);
    if dx != 0 && dy != 0 {
        steps.push(from.offset(dx, dy));
    }
    if dx != 0 {
        steps.push(from.offset(dx, 0));
    }
    if dy != 0 {
        steps.push(from.offset(0, dy));
    }
    steps
}

/// One step in a random direction, possibly standing still.
pub fn random_step<R: Rng + ?Sized>(from: Position, rng: &mut R) -> Position {
    from.offset(rng.gen_range(-1..=1), rng.gen_range(-1..=1))
}
