//! Melee between the player and adjacent enemies.

use crate::dungeon::DungeonGrid;
use crate::entity::Player;
use tracing::debug;

/// What happened when the player swung.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackOutcome {
    /// No enemy in reach.
    NoTarget,
    /// The enemy survived and struck back.
    Hit {
        name: String,
        damage: i32,
        remaining: i32,
        counter_damage: i32,
        player_defeated: bool,
    },
    /// The enemy died and was removed from the level.
    Defeated { name: String, damage: i32 },
}

impl AttackOutcome {
    pub fn player_defeated(&self) -> bool {
        matches!(self, AttackOutcome::Hit { player_defeated: true, .. })
    }

    /// Log lines describing the exchange.
    pub fn messages(&self) -> Vec<String> {
        match self {
            AttackOutcome::NoTarget => vec!["There's no enemy to attack here.".to_string()],
            AttackOutcome::Hit {
                name,
                damage,
                counter_damage,
                ..
            } => vec![
                format!("You attack {name} for {damage} damage!"),
                format!("{name} attacks you for {counter_damage} damage!"),
            ],
            AttackOutcome::Defeated { name, damage } => vec![
                format!("You attack {name} for {damage} damage!"),
                format!("You defeated {name}!"),
            ],
        }
    }
}

/// Attack the first enemy next to the player. A surviving enemy hits
/// back; a dead one is removed from the grid.
pub fn player_attack(player: &mut Player, grid: &mut DungeonGrid) -> AttackOutcome {
    let Some(id) = grid.adjacent_enemy(player.position).map(|e| e.id) else {
        return AttackOutcome::NoTarget;
    };
    let Some(enemy) = grid.entity_mut(id) else {
        return AttackOutcome::NoTarget;
    };
    let name = enemy.character.name.clone();
    let Some(stats) = enemy.character.stats_mut() else {
        return AttackOutcome::NoTarget;
    };

    let damage = player.attack;
    stats.hp -= damage;
    debug!(enemy = %name, damage, remaining = stats.hp, "Player attacks");

    if stats.is_dead() {
        grid.remove(id);
        return AttackOutcome::Defeated { name, damage };
    }

    let remaining = stats.hp;
    let counter_damage = stats.attack;
    player.take_damage(counter_damage);

    AttackOutcome::Hit {
        name,
        damage,
        remaining,
        counter_damage,
        player_defeated: player.is_dead(),
    }
}
