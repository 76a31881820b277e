//! Prompt templates for character generation and conversation.

use super::character::{Character, Role};
use super::descriptor::CharacterKind;

const NPC_TEMPLATE: &str = r#"Create a non-player character for a roguelike fantasy dungeon.
The character needs:
- an inventive name
- a distinctive personality (3-5 sentences), strange or even alien if it fits
- 3-5 short lines of dialogue that sound like them
- a physical description (2-3 sentences); unusual appearances are welcome

The character lives on dungeon level {level}; deeper levels call for stranger inhabitants.
Consider where they came from, what they want, how they speak, and how they feel about
the other creatures of the dungeon.

Answer with a single JSON object of this shape:
{
  "name": "...",
  "personality": "...",
  "dialogue": ["...", "...", "..."],
  "description": "..."
}

Avoid stock fantasy clichés."#;

const ENEMY_TEMPLATE: &str = r#"Create an enemy for a roguelike fantasy dungeon.
The enemy needs:
- an inventive name
- a personality and behavior pattern, strange or even alien if it fits
- combat strength suited to dungeon level {level} (deeper means stronger)
- a short physical description; unusual appearances are welcome

Answer with a single JSON object of this shape:
{
  "name": "...",
  "personality": "...",
  "hp": <number from 10 to 50, scaled by level>,
  "attack": <number from 5 to 15, scaled by level>,
  "description": "...",
  "behavior": one of "aggressive", "territorial", "ambusher", "cowardly", "pack"
}

Avoid stock fantasy clichés."#;

const PHILOSOPHICAL_NPC_TEMPLATE: &str = r#"Create a non-player character for a roguelike fantasy dungeon
who is a deeply intellectual thinker, consumed by mathematics, physics, the nature of mind,
and metaphysics.
The character needs:
- a name that hints at a brilliant mind
- a personality of someone who ponders the cosmos, computation, consciousness, and reality
- 3-5 lines of dialogue using real ideas: famous open problems (Riemann hypothesis, P vs NP),
  quantum mechanics, relativity, cosmology, theories of consciousness
- a physical description (2-3 sentences); scholarly or otherworldly

The character lives on dungeon level {level}; deeper levels call for stranger inhabitants.
They should be genuinely curious and knowledgeable, never merely pretentious.

Answer with a single JSON object of this shape:
{
  "name": "...",
  "personality": "...",
  "dialogue": ["...", "...", "..."],
  "description": "..."
}"#;

const PHILOSOPHICAL_ENEMY_TEMPLATE: &str = r#"Create an enemy for a roguelike fantasy dungeon who is
intellectually formidable and hostile: a being with real command of mathematics, physics and
philosophy who turns that knowledge to malicious ends.
The enemy needs:
- a name that hints at both brilliance and threat
- a personality and fighting style drawing on logical constructs, quantum theory,
  paradoxes, or theories of consciousness
- combat strength suited to dungeon level {level} (deeper means stronger)
- a short physical description; scholarly but dangerous

Answer with a single JSON object of this shape:
{
  "name": "...",
  "personality": "...",
  "hp": <number from 10 to 50, scaled by level>,
  "attack": <number from 5 to 15, scaled by level>,
  "description": "...",
  "behavior": one of "aggressive", "territorial", "ambusher", "cowardly", "pack"
}"#;

/// Exchanges quoted verbatim in a conversation prompt.
pub const RECENT_EXCHANGES_IN_PROMPT: usize = 5;

/// The generation prompt for a character kind.
pub fn generation_prompt(kind: CharacterKind, level: u32, philosophical: bool) -> String {
    let template = match (kind, philosophical) {
        (CharacterKind::Npc, false) => NPC_TEMPLATE,
        (CharacterKind::Npc, true) => PHILOSOPHICAL_NPC_TEMPLATE,
        (CharacterKind::Enemy, false) => ENEMY_TEMPLATE,
        (CharacterKind::Enemy, true) => PHILOSOPHICAL_ENEMY_TEMPLATE,
    };
    template.replace("{level}", &level.to_string())
}

/// The prompt for one conversational turn with a character.
pub fn conversation_prompt(character: &Character, query: &str) -> String {
    let mut prompt = String::new();

    match &character.role {
        Role::Npc { .. } => {
            prompt.push_str(&format!(
                "You are {}, a character in a roguelike fantasy dungeon.\n",
                character.name
            ));
        }
        Role::Enemy(_) => {
            prompt.push_str(&format!(
                "You are {}, a hostile creature in a roguelike fantasy dungeon.\n",
                character.name
            ));
        }
    }

    prompt.push_str(&format!("Personality: {}\n", character.personality));
    prompt.push_str(&format!("Appearance: {}\n", character.description));

    if let Role::Enemy(stats) = &character.role {
        prompt.push_str(&format!(
            "Health: {}/{}. Attack strength: {}. Behavior: {}.\n",
            stats.hp, stats.max_hp, stats.attack, stats.behavior
        ));
    }

    prompt.push_str(&format!(
        "\nThis is your {} with the adventurer.\n",
        character.memory().context_label()
    ));

    let recent = character.memory().recent(RECENT_EXCHANGES_IN_PROMPT);
    if !recent.is_empty() {
        prompt.push_str("\nRecent conversation:\n");
        for exchange in recent {
            prompt.push_str(&format!("Adventurer: {}\n", exchange.query));
            prompt.push_str(&format!("{}: {}\n", character.name, exchange.response));
        }
    }

    prompt.push_str(&format!("\nThe adventurer says: \"{query}\"\n\n"));
    prompt.push_str(
        "Reply in character, in at most three sentences. Reply with your spoken words and \
         brief actions only, without narration or quotation marks around the whole reply.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_prompt_substitutes_level() {
        for kind in [CharacterKind::Npc, CharacterKind::Enemy] {
            for philosophical in [false, true] {
                let prompt = generation_prompt(kind, 7, philosophical);
                assert!(prompt.contains("dungeon level 7"));
                assert!(!prompt.contains("{level}"));
                assert!(prompt.contains("\"name\""));
            }
        }
    }

    #[test]
    fn test_enemy_prompt_asks_for_stats() {
        let prompt = generation_prompt(CharacterKind::Enemy, 1, false);
        assert!(prompt.contains("\"hp\""));
        assert!(prompt.contains("\"behavior\""));

        let prompt = generation_prompt(CharacterKind::Npc, 1, false);
        assert!(prompt.contains("\"dialogue\""));
        assert!(!prompt.contains("\"hp\""));
    }

    #[test]
    fn test_philosophical_variant_differs() {
        let plain = generation_prompt(CharacterKind::Npc, 1, false);
        let deep = generation_prompt(CharacterKind::Npc, 1, true);
        assert_ne!(plain, deep);
        assert!(deep.contains("Riemann"));
    }
}
