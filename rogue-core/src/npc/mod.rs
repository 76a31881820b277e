//! Generated characters.
//!
//! Contains descriptors and their lenient parsing, live characters with
//! bounded conversation memory, the prompt templates, and the character
//! cache that generates and stores descriptors.

mod cache;
mod character;
mod descriptor;
pub mod memory;
pub mod prompts;

pub use cache::{level_prefix, CacheConfig, CharacterCache};
pub use character::{Character, CombatStats, Role, DEFAULT_DETECTION_RANGE, ENEMY_GROWL};
pub use descriptor::{extract_json_object, CharacterDescriptor, CharacterKind};
pub use memory::{ConversationMemory, Exchange, DEFAULT_MAX_HISTORY};
