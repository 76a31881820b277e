//! Roguelike dungeon engine with LLM-generated characters.
//!
//! This crate provides:
//! - Room-and-corridor map generation with a guaranteed path to the exit
//! - NPCs and enemies generated by Claude, with bounded, summarizing
//!   conversation memory
//! - An on-disk character cache with pre-generated and regenerate modes
//! - A key-driven game session for terminal front ends
//!
//! # Quick Start
//!
//! ```ignore
//! use rogue_core::{GameConfig, GameSession, Key, OfflineCompletion};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GameConfig::new().with_seed(7);
//!     let mut session = GameSession::new(config, Arc::new(OfflineCompletion)).await?;
//!
//!     session.handle_key(Some(Key::Right));
//!     session.tick();
//!     println!("HP {}", session.player().hp);
//!     Ok(())
//! }
//! ```

pub mod combat;
pub mod completion;
pub mod config;
pub mod dungeon;
pub mod entity;
pub mod log;
pub mod npc;
pub mod persist;
pub mod session;
pub mod testing;

// Primary public API
pub use combat::{player_attack, AttackOutcome};
pub use completion::{ClaudeCompletion, CompletionError, OfflineCompletion, TextCompletion};
pub use config::{GameConfig, GeneratorConfig};
pub use dungeon::{DungeonGrid, Glyph, MapGenerator, Position, Room, Tile};
pub use entity::{Entity, EntityId, EntityKind, Player};
pub use log::GameLog;
pub use npc::{CacheConfig, Character, CharacterCache, CharacterDescriptor, CharacterKind};
pub use persist::{CharacterStore, PersistError};
pub use session::{ConversationState, EventResult, GameSession, Key, Outcome, SessionError};
pub use testing::MockCompletion;
