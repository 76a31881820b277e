//! GameSession - the game engine driven by the front end.
//!
//! The front end feeds one key per cycle into [`GameSession::handle_key`].
//! Work that needs the network or the disk, such as a level descent or a
//! conversation turn, is queued and reported as
//! [`EventResult::NeedsAsync`]; the front end then redraws and awaits
//! [`GameSession::process_pending`].

use crate::combat::player_attack;
use crate::completion::TextCompletion;
use crate::config::GameConfig;
use crate::dungeon::{DungeonGrid, Glyph, MapGenerator, Position};
use crate::entity::{EntityId, Player};
use crate::log::GameLog;
use crate::npc::CharacterCache;
use crate::persist::CharacterStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Attempts at generating a level with at least one floor tile.
const GENERATION_ATTEMPTS: usize = 16;

/// Log lines visible in the history view at once.
const HISTORY_PAGE: usize = 10;

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Could not generate a playable level after {0} attempts")]
    NoPlayableLevel(usize),
}

/// A logical key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Char(char),
    Enter,
    Escape,
    Backspace,
}

/// What the front end should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    /// Call [`GameSession::process_pending`] before the next key.
    NeedsAsync,
}

/// How the run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Running,
    Quit,
    Defeated,
}

/// Where a conversation with a character stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    /// The player is typing a line to `partner`.
    AwaitingInput { partner: EntityId, buffer: String },
    /// Waiting on the model's reply to `query`.
    Processing { partner: EntityId, query: String },
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingAction {
    Descend,
    Save,
    Quit,
}

/// A running game.
pub struct GameSession {
    config: GameConfig,
    generator: MapGenerator,
    grid: DungeonGrid,
    player: Player,
    level: u32,
    log: GameLog,
    cache: CharacterCache,
    conversation: ConversationState,
    history_offset: Option<usize>,
    pending: Option<PendingAction>,
    outcome: Outcome,
    rng: StdRng,
}

impl GameSession {
    /// Start a game on level one.
    pub async fn new(
        config: GameConfig,
        completion: Arc<dyn TextCompletion>,
    ) -> Result<Self, SessionError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let cache_rng = StdRng::seed_from_u64(rng.gen());
        let cache = CharacterCache::open(
            config.cache_config(),
            CharacterStore::new(&config.data_dir),
            completion,
            cache_rng,
        )
        .await
        .with_max_history(config.max_history);

        let generator = MapGenerator::new(config.generator.clone());
        let player = Player::new(config.player_name.clone());
        let log = GameLog::new(config.max_log_lines, config.log_wrap_width);

        let mut session = Self {
            grid: DungeonGrid::new(config.generator.width, config.generator.height),
            config,
            generator,
            player,
            level: 0,
            log,
            cache,
            conversation: ConversationState::Idle,
            history_offset: None,
            pending: None,
            outcome: Outcome::Running,
            rng,
        };

        session.generate_level().await?;
        session.log_welcome();
        Ok(session)
    }

    fn log_welcome(&mut self) {
        self.log.push("Welcome to the dungeon!");
        if self.config.use_pregenerated {
            self.log.push("Using pre-generated characters.");
        } else {
            self.log.push("Generating new characters with Claude.");
            if self.config.save_characters {
                self.log.push("Characters will be saved for future use.");
            }
        }
        self.log.push(
            "Use arrow keys to move, 't' to talk, 'f' to fight, 'h' for history, 's' to save, 'q' to quit.",
        );
    }

    /// Build the current level and put the player on it.
    async fn generate_level(&mut self) -> Result<(), SessionError> {
        let (grid, start) = self.playable_grid()?;
        self.grid = grid;
        self.player.position = start;
        self.grid.ensure_reachable(start);
        self.grid
            .populate(&mut self.cache, self.level, Some(start), &mut self.rng)
            .await;
        info!(level = self.level, %start, "Entered level");
        Ok(())
    }

    fn playable_grid(&mut self) -> Result<(DungeonGrid, Position), SessionError> {
        for _ in 0..GENERATION_ATTEMPTS {
            let grid = self.generator.generate(self.level, &mut self.rng);
            if let Some(start) = grid.random_floor_tile(&mut self.rng) {
                return Ok((grid, start));
            }
            warn!(level = self.level, "Generated a level with no floor, retrying");
        }
        Err(SessionError::NoPlayableLevel(GENERATION_ATTEMPTS))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn grid(&self) -> &DungeonGrid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut DungeonGrid {
        &mut self.grid
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Zero-based level index.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Level number as shown to the player.
    pub fn display_level(&self) -> u32 {
        self.level + 1
    }

    pub fn log(&self) -> &GameLog {
        &self.log
    }

    pub fn cache(&self) -> &CharacterCache {
        &self.cache
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_running(&self) -> bool {
        self.outcome == Outcome::Running
    }

    pub fn is_viewing_history(&self) -> bool {
        self.history_offset.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some() || matches!(self.conversation, ConversationState::Processing { .. })
    }

    /// Log lines to show in a panel of `rows` lines, honouring the history
    /// scroll offset.
    pub fn log_window(&self, rows: usize) -> Vec<&str> {
        self.log.window(rows, self.history_offset.unwrap_or(0))
    }

    /// The conversation partner's name and the line typed so far.
    pub fn input_prompt(&self) -> Option<(&str, &str)> {
        match &self.conversation {
            ConversationState::AwaitingInput { partner, buffer } => self
                .grid
                .entity(*partner)
                .map(|e| (e.name(), buffer.as_str())),
            _ => None,
        }
    }

    /// What to draw at a cell, player included.
    pub fn glyph_at(&self, pos: Position) -> Glyph {
        if pos == self.player.position {
            Glyph::Player
        } else {
            self.grid.glyph_at(pos)
        }
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Apply one key. `None` means no key arrived this cycle.
    pub fn handle_key(&mut self, key: Option<Key>) -> EventResult {
        if !self.is_running() {
            return EventResult::Quit;
        }
        let Some(key) = key else {
            return EventResult::Continue;
        };

        if self.history_offset.is_some() {
            self.handle_history_key(key);
            return EventResult::Continue;
        }

        match &self.conversation {
            ConversationState::Idle => self.handle_explore_key(key),
            ConversationState::AwaitingInput { .. } => self.handle_conversation_key(key),
            ConversationState::Processing { .. } => EventResult::NeedsAsync,
        }
    }

    fn handle_history_key(&mut self, key: Key) {
        let Some(offset) = self.history_offset.as_mut() else {
            return;
        };
        match key {
            Key::Up if *offset + HISTORY_PAGE < self.log.len() => *offset += 1,
            Key::Down if *offset > 0 => *offset -= 1,
            Key::Escape => {
                self.history_offset = None;
                self.log.push("--- EXITED DIALOGUE HISTORY ---");
            }
            _ => {}
        }
    }

    fn handle_explore_key(&mut self, key: Key) -> EventResult {
        match key {
            Key::Up => self.try_move(0, -1),
            Key::Down => self.try_move(0, 1),
            Key::Left => self.try_move(-1, 0),
            Key::Right => self.try_move(1, 0),
            Key::Char('t') => self.start_conversation(),
            Key::Char('f') => self.attack(),
            Key::Char('s') => {
                if self.config.save_characters {
                    self.pending = Some(PendingAction::Save);
                    EventResult::NeedsAsync
                } else {
                    self.log.push("Character saving is not enabled.");
                    EventResult::Continue
                }
            }
            Key::Char('h') => {
                self.history_offset = Some(0);
                self.log
                    .push("--- DIALOGUE HISTORY (use UP/DOWN to scroll, ESC to exit) ---");
                EventResult::Continue
            }
            Key::Char('q') => {
                if self.config.save_characters {
                    self.pending = Some(PendingAction::Quit);
                    EventResult::NeedsAsync
                } else {
                    self.outcome = Outcome::Quit;
                    EventResult::Quit
                }
            }
            _ => EventResult::Continue,
        }
    }

    fn try_move(&mut self, dx: i32, dy: i32) -> EventResult {
        let target = self.player.position.offset(dx, dy);
        if !self.grid.is_walkable(target) {
            match self.grid.entity_at(target) {
                Some(entity) => {
                    let line = format!("{} blocks your way.", entity.name());
                    self.log.push(line);
                }
                None => self.log.push("You can't go that way."),
            }
            return EventResult::Continue;
        }

        self.player.position = target;
        if self.grid.is_exit(target) {
            self.pending = Some(PendingAction::Descend);
            return EventResult::NeedsAsync;
        }
        EventResult::Continue
    }

    fn start_conversation(&mut self) -> EventResult {
        let pos = self.player.position;
        let partner = self
            .grid
            .adjacent_npc(pos)
            .or_else(|| self.grid.adjacent_enemy(pos))
            .map(|e| e.id);
        let Some(partner) = partner else {
            self.log.push("There's no one to talk to here.");
            return EventResult::Continue;
        };
        let Some(entity) = self.grid.entity_mut(partner) else {
            return EventResult::Continue;
        };

        let greeting = entity.character.greet();
        let name = entity.character.name.clone();
        self.log.push_speech(&name, &greeting);
        self.log
            .push(format!("(Talking to {name}. Type and press Enter; Esc to leave.)"));
        self.conversation = ConversationState::AwaitingInput {
            partner,
            buffer: String::new(),
        };
        EventResult::Continue
    }

    fn handle_conversation_key(&mut self, key: Key) -> EventResult {
        let ConversationState::AwaitingInput { partner, buffer } = &mut self.conversation else {
            return EventResult::Continue;
        };
        let partner = *partner;

        match key {
            Key::Char(c) => buffer.push(c),
            Key::Backspace => {
                buffer.pop();
            }
            Key::Escape => self.end_conversation(partner),
            Key::Enter => {
                let query = buffer.trim().to_string();
                if query.is_empty() {
                    self.end_conversation(partner);
                } else {
                    self.log.push(format!("You: {query}"));
                    self.conversation = ConversationState::Processing { partner, query };
                    return EventResult::NeedsAsync;
                }
            }
            _ => {}
        }
        EventResult::Continue
    }

    fn end_conversation(&mut self, partner: EntityId) {
        if let Some(entity) = self.grid.entity(partner) {
            let line = format!("You step away from {}.", entity.name());
            self.log.push(line);
        }
        self.conversation = ConversationState::Idle;
    }

    fn attack(&mut self) -> EventResult {
        let outcome = player_attack(&mut self.player, &mut self.grid);
        for line in outcome.messages() {
            self.log.push(line);
        }
        if outcome.player_defeated() {
            self.defeat();
            return EventResult::Quit;
        }
        EventResult::Continue
    }

    fn defeat(&mut self) {
        info!(level = self.level, "Player defeated");
        self.log.push("You have been defeated!");
        self.outcome = Outcome::Defeated;
    }

    // ========================================================================
    // Async work and time
    // ========================================================================

    /// Run whatever the last key queued.
    pub async fn process_pending(&mut self) -> Result<(), SessionError> {
        if let ConversationState::Processing { partner, query } = &self.conversation {
            let (partner, query) = (*partner, query.clone());
            self.conversation_turn(partner, &query).await;
        }

        match self.pending.take() {
            Some(PendingAction::Descend) => {
                self.level += 1;
                self.log
                    .push(format!("Descending to dungeon level {}...", self.level + 1));
                self.generate_level().await?;
            }
            Some(PendingAction::Save) => match self.cache.save().await {
                Ok(()) => self.log.push("Characters saved to files."),
                Err(e) => {
                    warn!("Manual save failed: {e}");
                    self.log.push(format!("Could not save characters: {e}"));
                }
            },
            Some(PendingAction::Quit) => {
                if let Err(e) = self.cache.save().await {
                    warn!("Save on quit failed: {e}");
                }
                self.outcome = Outcome::Quit;
            }
            None => {}
        }
        Ok(())
    }

    async fn conversation_turn(&mut self, partner: EntityId, query: &str) {
        let completion = self.cache.completion();
        let Some(entity) = self.grid.entity_mut(partner) else {
            self.conversation = ConversationState::Idle;
            return;
        };

        let reply = entity.character.talk(Some(query), completion.as_ref()).await;
        let name = entity.character.name.clone();
        self.log.push_speech(&name, &reply);
        self.conversation = ConversationState::AwaitingInput {
            partner,
            buffer: String::new(),
        };
    }

    /// Advance the world one cycle. Entities hold still while the player
    /// is in a conversation.
    pub fn tick(&mut self) {
        if !self.is_running() || !self.conversation.is_idle() {
            return;
        }
        self.grid.update_entities(self.player.position, &mut self.rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::npc::{Character, CharacterDescriptor, CharacterKind};
    use crate::testing::{grid_from_ascii, MockCompletion};
    use tempfile::TempDir;

    async fn session(dir: &TempDir, completion: MockCompletion) -> GameSession {
        let config = GameConfig::new().with_data_dir(dir.path()).with_seed(42);
        GameSession::new(config, Arc::new(completion)).await.unwrap()
    }

    /// Replace the level with a small room holding one character next to
    /// the player.
    fn stage(session: &mut GameSession, kind: CharacterKind, descriptor: CharacterDescriptor) -> EntityId {
        let mut grid = grid_from_ascii(&["#######", "#.....#", "#....>#", "#######"]);
        let character = Character::from_descriptor(kind, &descriptor, 0, 10);
        let id = grid.add_entity(Entity::new(Position::new(2, 1), character));
        *session.grid_mut() = grid;
        session.player_mut().position = Position::new(1, 1);
        id
    }

    fn named(name: &str) -> CharacterDescriptor {
        CharacterDescriptor {
            name: Some(name.to_string()),
            dialogue: Some(vec!["Well met.".to_string()]),
            ..CharacterDescriptor::default()
        }
    }

    fn type_line(session: &mut GameSession, text: &str) {
        for c in text.chars() {
            session.handle_key(Some(Key::Char(c)));
        }
    }

    #[tokio::test]
    async fn test_startup() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, MockCompletion::failing()).await;

        assert_eq!(session.display_level(), 1);
        assert!(session.is_running());
        assert!(session.grid().npcs().count() >= 1);
        assert_eq!(session.grid().enemies().count(), 3);
        assert!(session.grid().entity_at(session.player().position).is_none());
        assert!(session.log().lines().any(|l| l.contains("Characters will be saved")));
        assert_eq!(session.glyph_at(session.player().position), Glyph::Player);
    }

    #[tokio::test]
    async fn test_pregenerated_startup_message() {
        let dir = TempDir::new().unwrap();
        let config = GameConfig::new()
            .with_data_dir(dir.path())
            .with_seed(1)
            .with_pregenerated(true);
        let session = GameSession::new(config, Arc::new(MockCompletion::failing()))
            .await
            .unwrap();
        assert!(session.log().lines().any(|l| l == "Using pre-generated characters."));
    }

    #[tokio::test]
    async fn test_conversation_flow() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        let completion = MockCompletion::new(vec!["The moss remembers.".to_string()]);
        session.cache = CharacterCache::new(
            session.config.cache_config(),
            CharacterStore::new(dir.path()),
            Arc::new(completion),
            StdRng::seed_from_u64(0),
        );
        let id = stage(&mut session, CharacterKind::Npc, named("Mossback"));

        assert_eq!(session.handle_key(Some(Key::Char('t'))), EventResult::Continue);
        assert!(session.log().lines().any(|l| l == "  Well met."));
        assert_eq!(session.input_prompt(), Some(("Mossback", "")));

        type_line(&mut session, "hellp");
        session.handle_key(Some(Key::Backspace));
        type_line(&mut session, "o");
        assert_eq!(session.input_prompt(), Some(("Mossback", "hello")));

        assert_eq!(session.handle_key(Some(Key::Enter)), EventResult::NeedsAsync);
        assert!(session.has_pending());
        session.process_pending().await.unwrap();

        assert_eq!(session.log().last(), Some("  The moss remembers."));
        assert_eq!(session.grid().entity(id).unwrap().character.memory().len(), 1);
        assert_eq!(session.input_prompt(), Some(("Mossback", "")));

        session.handle_key(Some(Key::Escape));
        assert!(session.conversation().is_idle());
    }

    #[tokio::test]
    async fn test_failed_turn_stays_in_conversation() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        stage(&mut session, CharacterKind::Npc, named("Mossback"));

        session.handle_key(Some(Key::Char('t')));
        type_line(&mut session, "anyone?");
        session.handle_key(Some(Key::Enter));
        session.process_pending().await.unwrap();

        assert_eq!(
            session.log().last(),
            Some("  *Mossback seems distracted and doesn't respond.*")
        );
        assert!(matches!(
            session.conversation(),
            ConversationState::AwaitingInput { .. }
        ));
    }

    #[tokio::test]
    async fn test_talk_falls_back_to_enemy() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        stage(&mut session, CharacterKind::Enemy, named("Ashmaw"));

        session.handle_key(Some(Key::Char('t')));
        assert!(session.log().lines().any(|l| l == "  *growls menacingly*"));
    }

    #[tokio::test]
    async fn test_nobody_to_talk_to() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        stage(&mut session, CharacterKind::Npc, named("Far"));
        session.player_mut().position = Position::new(5, 2);
        session.handle_key(Some(Key::Char('t')));
        assert_eq!(session.log().last(), Some("There's no one to talk to here."));
    }

    #[tokio::test]
    async fn test_fight_and_defeat() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        let descriptor = CharacterDescriptor {
            hp: Some(500),
            attack: Some(60),
            ..named("Ashmaw")
        };
        stage(&mut session, CharacterKind::Enemy, descriptor);

        assert_eq!(session.handle_key(Some(Key::Char('f'))), EventResult::Continue);
        assert_eq!(session.player().hp, 40);
        assert_eq!(session.handle_key(Some(Key::Char('f'))), EventResult::Quit);
        assert_eq!(session.outcome(), Outcome::Defeated);
        assert_eq!(session.log().last(), Some("You have been defeated!"));
        assert_eq!(session.handle_key(Some(Key::Up)), EventResult::Quit);
    }

    #[tokio::test]
    async fn test_descend() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        stage(&mut session, CharacterKind::Npc, named("Mossback"));
        session.player_mut().position = Position::new(4, 2);

        assert_eq!(session.handle_key(Some(Key::Right)), EventResult::NeedsAsync);
        session.process_pending().await.unwrap();

        assert_eq!(session.level(), 1);
        assert!(session
            .log()
            .lines()
            .any(|l| l == "Descending to dungeon level 2..."));
        assert_eq!(session.grid().width(), 80);
        assert!(session.grid().entity_at(session.player().position).is_none());
        assert_eq!(session.grid().enemies().count(), 3);
    }

    #[tokio::test]
    async fn test_blocked_moves_are_reported() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        stage(&mut session, CharacterKind::Npc, named("Mossback"));

        session.handle_key(Some(Key::Up));
        assert_eq!(session.log().last(), Some("You can't go that way."));
        session.handle_key(Some(Key::Right));
        assert_eq!(session.log().last(), Some("Mossback blocks your way."));
        assert_eq!(session.player().position, Position::new(1, 1));
    }

    #[tokio::test]
    async fn test_history_view() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        stage(&mut session, CharacterKind::Npc, named("Mossback"));
        for _ in 0..15 {
            session.handle_key(Some(Key::Up));
        }

        session.handle_key(Some(Key::Char('h')));
        assert!(session.is_viewing_history());
        let newest: Vec<String> = session.log_window(5).into_iter().map(String::from).collect();

        session.handle_key(Some(Key::Up));
        session.handle_key(Some(Key::Up));
        assert_ne!(session.log_window(5), newest);

        // movement keys don't move the player while scrolling
        session.handle_key(Some(Key::Down));
        assert_eq!(session.player().position, Position::new(1, 1));

        session.handle_key(Some(Key::Escape));
        assert!(!session.is_viewing_history());
        assert_eq!(session.log().last(), Some("--- EXITED DIALOGUE HISTORY ---"));
    }

    #[tokio::test]
    async fn test_save_and_quit() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;

        assert_eq!(session.handle_key(Some(Key::Char('s'))), EventResult::NeedsAsync);
        session.process_pending().await.unwrap();
        assert_eq!(session.log().last(), Some("Characters saved to files."));

        assert_eq!(session.handle_key(Some(Key::Char('q'))), EventResult::NeedsAsync);
        session.process_pending().await.unwrap();
        assert_eq!(session.outcome(), Outcome::Quit);
        assert!(!session.is_running());
    }

    #[tokio::test]
    async fn test_saving_disabled() {
        let dir = TempDir::new().unwrap();
        let config = GameConfig::new()
            .with_data_dir(dir.path())
            .with_seed(3)
            .with_save_characters(false);
        let mut session = GameSession::new(config, Arc::new(MockCompletion::failing()))
            .await
            .unwrap();

        session.handle_key(Some(Key::Char('s')));
        assert_eq!(session.log().last(), Some("Character saving is not enabled."));
        assert_eq!(session.handle_key(Some(Key::Char('q'))), EventResult::Quit);
    }

    #[tokio::test]
    async fn test_entities_wait_during_conversation() {
        let dir = TempDir::new().unwrap();
        let mut session = session(&dir, MockCompletion::failing()).await;
        let id = stage(&mut session, CharacterKind::Npc, named("Mossback"));

        session.handle_key(Some(Key::Char('t')));
        for _ in 0..20 {
            session.tick();
        }
        assert_eq!(session.grid().entity(id).unwrap().position, Position::new(2, 1));
    }
}
