//! Plain, serializable character descriptors.
//!
//! A descriptor is what the model generates and what the character store
//! persists. Every field is optional; defaults are applied when a live
//! character is built from it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Which kind of character a descriptor describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterKind {
    Npc,
    Enemy,
}

impl CharacterKind {
    /// Prefix used in cache keys.
    pub fn key_prefix(self) -> &'static str {
        match self {
            CharacterKind::Npc => "npc",
            CharacterKind::Enemy => "enemy",
        }
    }
}

impl fmt::Display for CharacterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

/// Generated traits of a character, independent of any live instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,

    /// Canned lines an NPC cycles through when greeted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<i32>,

    /// Enemy behavior pattern ("aggressive", "territorial", ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
}

impl CharacterDescriptor {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The fixed NPC used when generation fails.
    pub fn default_npc(level: u32) -> Self {
        Self {
            name: Some(format!("Dungeon Dweller {level}")),
            personality: Some("Mysterious".to_string()),
            dialogue: Some(vec![
                "Welcome, traveler.".to_string(),
                "These dungeons hold many secrets.".to_string(),
                "Be careful as you venture deeper.".to_string(),
            ]),
            description: Some("A cloaked figure with glowing eyes, watching you carefully.".to_string()),
            ..Self::default()
        }
    }

    /// The fixed enemy used when generation fails.
    pub fn default_enemy(level: u32) -> Self {
        let level = level as i32;
        Self {
            name: Some(format!("Dungeon Monster {level}")),
            personality: Some("Hostile".to_string()),
            description: Some("A terrifying creature with sharp claws and glowing red eyes.".to_string()),
            hp: Some(10 + level * 5),
            attack: Some(5 + level),
            behavior: Some("aggressive".to_string()),
            ..Self::default()
        }
    }

    /// The fallback descriptor for a kind.
    pub fn default_for(kind: CharacterKind, level: u32) -> Self {
        match kind {
            CharacterKind::Npc => Self::default_npc(level),
            CharacterKind::Enemy => Self::default_enemy(level),
        }
    }

    /// Parse model output leniently.
    ///
    /// The first balanced `{...}` in the text is parsed as JSON; anything
    /// that can't be read yields an empty descriptor.
    pub fn parse_lenient(text: &str) -> Self {
        extract_json_object(text)
            .and_then(|json| serde_json::from_str::<Value>(json).ok())
            .map(|value| Self::from_value(&value))
            .unwrap_or_default()
    }

    /// Pick known fields out of a JSON value, tolerating loose types.
    ///
    /// Numbers may be given as strings, dialogue as a single string, and
    /// unknown fields are ignored.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let number = |key: &str| match object.get(key)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.round() as i64))
                .and_then(|n| i32::try_from(n).ok()),
            Value::String(s) => s.trim().parse::<i32>().ok(),
            _ => None,
        };

        let dialogue = match object.get("dialogue") {
            Some(Value::Array(lines)) => {
                let lines: Vec<String> = lines
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
                (!lines.is_empty()).then_some(lines)
            }
            Some(Value::String(line)) if !line.trim().is_empty() => Some(vec![line.trim().to_string()]),
            _ => None,
        };

        Self {
            name: text("name"),
            personality: text("personality"),
            dialogue,
            description: text("description"),
            hp: number("hp"),
            attack: number("attack"),
            behavior: text("behavior"),
        }
    }
}

/// Find the first balanced `{...}` substring.
///
/// Braces inside JSON string literals (including escaped quotes) don't
/// count towards the balance.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
