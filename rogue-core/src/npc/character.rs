//! Live characters built from descriptors.

use super::descriptor::{CharacterDescriptor, CharacterKind};
use super::memory::ConversationMemory;
use super::prompts::conversation_prompt;
use crate::completion::TextCompletion;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Line an enemy gives when approached without words.
pub const ENEMY_GROWL: &str = "*growls menacingly*";

/// Default distance at which an enemy notices the player.
pub const DEFAULT_DETECTION_RANGE: i32 = 8;

/// Combat numbers for an enemy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub detection_range: i32,
    pub behavior: String,
}

impl CombatStats {
    pub fn new(hp: i32, attack: i32) -> Self {
        Self {
            hp,
            max_hp: hp,
            attack,
            detection_range: DEFAULT_DETECTION_RANGE,
            behavior: "aggressive".to_string(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

/// Kind-specific state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Role {
    Npc {
        dialogue: Vec<String>,
        next_line: usize,
    },
    Enemy(CombatStats),
}

/// A generated NPC or enemy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub personality: String,
    pub description: String,
    pub role: Role,
    memory: ConversationMemory,
}

impl Character {
    /// Build a live character, filling any missing descriptor field with
    /// a level-based default.
    pub fn from_descriptor(
        kind: CharacterKind,
        descriptor: &CharacterDescriptor,
        level: u32,
        max_history: usize,
    ) -> Self {
        let d = descriptor;
        let (name, personality, description, role) = match kind {
            CharacterKind::Npc => (
                d.name.clone().unwrap_or_else(|| format!("NPC Level {level}")),
                d.personality.clone().unwrap_or_else(|| "Mysterious".to_string()),
                d.description.clone().unwrap_or_else(|| "A mysterious figure.".to_string()),
                Role::Npc {
                    dialogue: d
                        .dialogue
                        .clone()
                        .unwrap_or_else(|| vec!["Hello, adventurer.".to_string()]),
                    next_line: 0,
                },
            ),
            CharacterKind::Enemy => {
                let level = level as i32;
                let mut stats = CombatStats::new(
                    d.hp.unwrap_or(10 + level * 5),
                    d.attack.unwrap_or(5 + level),
                );
                if let Some(behavior) = &d.behavior {
                    stats.behavior = behavior.clone();
                }
                (
                    d.name.clone().unwrap_or_else(|| format!("Enemy Level {level}")),
                    d.personality.clone().unwrap_or_else(|| "Hostile".to_string()),
                    d.description.clone().unwrap_or_else(|| "A menacing creature.".to_string()),
                    Role::Enemy(stats),
                )
            }
        };

        Self {
            name,
            personality,
            description,
            role,
            memory: ConversationMemory::new(max_history),
        }
    }

    pub fn kind(&self) -> CharacterKind {
        match self.role {
            Role::Npc { .. } => CharacterKind::Npc,
            Role::Enemy(_) => CharacterKind::Enemy,
        }
    }

    pub fn stats(&self) -> Option<&CombatStats> {
        match &self.role {
            Role::Enemy(stats) => Some(stats),
            Role::Npc { .. } => None,
        }
    }

    pub fn stats_mut(&mut self) -> Option<&mut CombatStats> {
        match &mut self.role {
            Role::Enemy(stats) => Some(stats),
            Role::Npc { .. } => None,
        }
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Speak to the character.
    ///
    /// Without a query the character gives a canned line: NPCs cycle
    /// through their dialogue, enemies growl. With a query the model
    /// answers in character and the exchange is remembered. If the model
    /// can't be reached the character "seems distracted" and nothing is
    /// recorded.
    pub async fn talk(&mut self, query: Option<&str>, completion: &dyn TextCompletion) -> String {
        let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) else {
            return self.greet();
        };

        let prompt = conversation_prompt(self, query);
        match completion.complete(&prompt).await {
            Ok(text) => {
                let response = clean_response(&text);
                self.memory
                    .record_exchange(query, response.clone(), completion)
                    .await;
                response
            }
            Err(e) => {
                warn!(character = %self.name, "Conversation turn failed: {e}");
                format!("*{} seems distracted and doesn't respond.*", self.name)
            }
        }
    }

    /// The canned line for a wordless greeting: NPCs cycle through their
    /// dialogue, enemies growl.
    pub fn greet(&mut self) -> String {
        match &mut self.role {
            Role::Npc { dialogue, next_line } => {
                if dialogue.is_empty() {
                    return "...".to_string();
                }
                let line = dialogue[*next_line % dialogue.len()].clone();
                *next_line = (*next_line + 1) % dialogue.len();
                line
            }
            Role::Enemy(_) => ENEMY_GROWL.to_string(),
        }
    }
}

/// Trim whitespace and a pair of wrapping quotes the model sometimes adds.
fn clean_response(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|inner| !inner.contains('"'))
        .unwrap_or(text)
        .trim()
        .to_string()
}
