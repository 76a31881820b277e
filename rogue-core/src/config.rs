//! Game and map generation settings.

use crate::npc::{CacheConfig, DEFAULT_MAX_HISTORY};
use std::path::PathBuf;
use std::time::Duration;

/// Parameters for [`crate::dungeon::MapGenerator`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Map width in cells.
    pub width: i32,

    /// Map height in cells.
    pub height: i32,

    /// Number of room placements attempted.
    pub max_rooms: usize,

    /// Smallest room side, inclusive.
    pub min_room_size: i32,

    /// Largest room side, inclusive.
    pub max_room_size: i32,

    /// Chance that a room after the second gets an extra loop tunnel.
    pub redundant_tunnel_chance: f64,
}

impl GeneratorConfig {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_max_rooms(mut self, max_rooms: usize) -> Self {
        self.max_rooms = max_rooms;
        self
    }

    /// Set the inclusive range of room side lengths.
    pub fn with_room_size(mut self, min: i32, max: i32) -> Self {
        self.min_room_size = min.min(max);
        self.max_room_size = min.max(max);
        self
    }

    pub fn with_redundant_tunnel_chance(mut self, chance: f64) -> Self {
        self.redundant_tunnel_chance = clamp_chance(chance);
        self
    }

    /// The same settings with every field brought into a usable range:
    /// non-negative dimensions, room sides of at least 1 with
    /// `min <= max`, and a loop chance in `[0, 1]`.
    pub fn normalized(self) -> Self {
        let min = self.min_room_size.max(1);
        let max = self.max_room_size.max(1);
        Self {
            width: self.width.max(0),
            height: self.height.max(0),
            min_room_size: min.min(max),
            max_room_size: min.max(max),
            redundant_tunnel_chance: clamp_chance(self.redundant_tunnel_chance),
            ..self
        }
    }
}

fn clamp_chance(chance: f64) -> f64 {
    if chance.is_nan() {
        0.0
    } else {
        chance.clamp(0.0, 1.0)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
            max_rooms: 10,
            min_room_size: 5,
            max_room_size: 10,
            redundant_tunnel_chance: 0.2,
        }
    }
}

/// Configuration for a [`crate::GameSession`].
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Map generation parameters.
    pub generator: GeneratorConfig,

    /// Player character name.
    pub player_name: String,

    /// Exchanges each character remembers.
    pub max_history: usize,

    /// Lines kept in the game log.
    pub max_log_lines: usize,

    /// Column at which long log lines wrap.
    pub log_wrap_width: usize,

    /// How long the front end waits for a key each cycle.
    pub poll_timeout: Duration,

    /// Pause after each update cycle.
    pub tick_delay: Duration,

    /// Where generated characters are stored.
    pub data_dir: PathBuf,

    /// Sample stored characters instead of generating new ones.
    pub use_pregenerated: bool,

    /// Persist generated characters.
    pub save_characters: bool,

    /// Use the STEM/metaphysics generation prompts.
    pub philosophical: bool,

    /// Fixed RNG seed; entropy when unset.
    pub seed: Option<u64>,
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generator = generator;
        self
    }

    pub fn with_player_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    pub fn with_max_log_lines(mut self, lines: usize) -> Self {
        self.max_log_lines = lines;
        self
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    pub fn with_tick_delay(mut self, delay: Duration) -> Self {
        self.tick_delay = delay;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_pregenerated(mut self, enabled: bool) -> Self {
        self.use_pregenerated = enabled;
        self
    }

    pub fn with_save_characters(mut self, enabled: bool) -> Self {
        self.save_characters = enabled;
        self
    }

    pub fn with_philosophical(mut self, enabled: bool) -> Self {
        self.philosophical = enabled;
        self
    }

    /// Make every random decision reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The character cache settings implied by this config.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            use_pregenerated: self.use_pregenerated,
            save_generated: self.save_characters,
            philosophical: self.philosophical,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            player_name: "Adventurer".to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            max_log_lines: 200,
            log_wrap_width: 70,
            poll_timeout: Duration::from_millis(100),
            tick_delay: Duration::from_millis(50),
            data_dir: PathBuf::from("data"),
            use_pregenerated: false,
            save_characters: true,
            philosophical: false,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_repairs_direct_field_writes() {
        let mut config = GeneratorConfig::default();
        config.width = -5;
        config.min_room_size = 9;
        config.max_room_size = 0;
        config.redundant_tunnel_chance = 3.0;

        let config = config.normalized();
        assert_eq!(config.width, 0);
        assert_eq!((config.min_room_size, config.max_room_size), (1, 9));
        assert_eq!(config.redundant_tunnel_chance, 1.0);
        assert_eq!(GeneratorConfig::default().normalized(), GeneratorConfig::default());
    }

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.generator.width, 80);
        assert_eq!(config.generator.height, 20);
        assert_eq!(config.generator.max_rooms, 10);
        assert_eq!(config.max_history, 10);
        assert!(config.save_characters);
        assert!(!config.use_pregenerated);
    }

    #[test]
    fn test_builder() {
        let config = GameConfig::new()
            .with_pregenerated(true)
            .with_save_characters(false)
            .with_philosophical(true)
            .with_seed(42)
            .with_generator(GeneratorConfig::new(40, 15).with_room_size(8, 4));

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.generator.min_room_size, 4);
        assert_eq!(config.generator.max_room_size, 8);
        assert_eq!(
            config.cache_config(),
            CacheConfig {
                use_pregenerated: true,
                save_generated: false,
                philosophical: true,
            }
        );
    }
}
