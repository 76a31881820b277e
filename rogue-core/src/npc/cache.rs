//! Character generation with an on-disk cache.
//!
//! In regenerate mode every request asks the model for a new descriptor,
//! remembers it under a fresh key, and optionally writes the cache to
//! disk right away. In pre-generated mode descriptors saved by earlier
//! runs are sampled instead, and the model is only called when the store
//! has nothing for the requested level.

use super::character::Character;
use super::descriptor::{CharacterDescriptor, CharacterKind};
use super::memory::DEFAULT_MAX_HISTORY;
use super::prompts::generation_prompt;
use crate::completion::TextCompletion;
use crate::persist::{CharacterStore, PersistError, StoredCharacters};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upper bound of the random disambiguator in cache keys.
const KEY_SPACE: u32 = 10_000;

/// How the cache sources and keeps characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheConfig {
    /// Sample from the store instead of generating when possible.
    pub use_pregenerated: bool,
    /// Write generated descriptors to the store.
    pub save_generated: bool,
    /// Use the STEM/metaphysics prompt variants.
    pub philosophical: bool,
}

/// Generates character descriptors and keeps the ones it made.
pub struct CharacterCache {
    config: CacheConfig,
    store: CharacterStore,
    completion: Arc<dyn TextCompletion>,
    pregenerated: StoredCharacters,
    generated: StoredCharacters,
    rng: StdRng,
    max_history: usize,
}

impl CharacterCache {
    /// Create a cache. Nothing is read from disk until [`Self::load`].
    pub fn new(
        config: CacheConfig,
        store: CharacterStore,
        completion: Arc<dyn TextCompletion>,
        rng: StdRng,
    ) -> Self {
        Self {
            config,
            store,
            completion,
            pregenerated: StoredCharacters::default(),
            generated: StoredCharacters::default(),
            rng,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }

    /// Conversation history length for characters built by
    /// [`Self::spawn_character`].
    pub fn with_max_history(mut self, max_history: usize) -> Self {
        self.max_history = max_history;
        self
    }

    /// Create a cache and, in pre-generated mode, load the store.
    pub async fn open(
        config: CacheConfig,
        store: CharacterStore,
        completion: Arc<dyn TextCompletion>,
        rng: StdRng,
    ) -> Self {
        let mut cache = Self::new(config, store, completion, rng);
        if config.use_pregenerated {
            cache.load().await;
        }
        cache
    }

    /// Read pre-generated descriptors from the store. Unreadable files
    /// leave the pool empty.
    pub async fn load(&mut self) {
        self.pregenerated = self.store.load().await;
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    pub fn completion(&self) -> Arc<dyn TextCompletion> {
        Arc::clone(&self.completion)
    }

    pub fn pregenerated(&self) -> &StoredCharacters {
        &self.pregenerated
    }

    /// Descriptors generated during this session.
    pub fn generated(&self) -> &StoredCharacters {
        &self.generated
    }

    /// Produce a descriptor for `kind` at `level`.
    ///
    /// Never fails: a failed model call yields the fixed default
    /// descriptor, and an unparsable reply yields an empty descriptor whose
    /// fields take their defaults when the character is built.
    pub async fn generate_character(&mut self, kind: CharacterKind, level: u32) -> CharacterDescriptor {
        if self.config.use_pregenerated {
            if let Some(descriptor) = self.sample_pregenerated(kind, level) {
                return descriptor;
            }
            debug!("No pre-generated {kind} for level {level}, generating");
        }

        let prompt = generation_prompt(kind, level, self.config.philosophical);
        let text = match self.completion.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Error generating {kind}, using default: {e}");
                return CharacterDescriptor::default_for(kind, level);
            }
        };

        let descriptor = CharacterDescriptor::parse_lenient(&text);
        if descriptor.is_empty() {
            warn!("Could not parse generated {kind}, falling back to field defaults");
            return descriptor;
        }

        let key = self.fresh_key(kind, level);
        info!(%key, name = ?descriptor.name, "Generated {kind}");
        self.generated
            .collection_mut(kind)
            .insert(key, descriptor.clone());

        if self.config.save_generated {
            if let Err(e) = self.save().await {
                warn!("Error saving characters: {e}");
            }
        }

        descriptor
    }

    /// Generate a descriptor and build a live character from it.
    pub async fn spawn_character(&mut self, kind: CharacterKind, level: u32) -> Character {
        let descriptor = self.generate_character(kind, level).await;
        Character::from_descriptor(kind, &descriptor, level, self.max_history)
    }

    /// Write this session's generated descriptors to the store, replacing
    /// what was there.
    pub async fn save(&self) -> Result<(), PersistError> {
        self.store.save(&self.generated).await
    }

    fn sample_pregenerated(&mut self, kind: CharacterKind, level: u32) -> Option<CharacterDescriptor> {
        let prefix = level_prefix(kind, level);
        let collection = self.pregenerated.collection(kind);
        let keys: Vec<&String> = collection.keys().filter(|k| k.starts_with(&prefix)).collect();
        let key = keys.choose(&mut self.rng)?;
        debug!(%key, "Using pre-generated {kind}");
        collection.get(*key).cloned()
    }

    /// A `"{kind}_level_{n}_{m}"` key not yet used by this session or the
    /// loaded store. Once random draws keep colliding, `m` becomes a uuid.
    fn fresh_key(&mut self, kind: CharacterKind, level: u32) -> String {
        let prefix = level_prefix(kind, level);
        for _ in 0..KEY_SPACE {
            let key = format!("{prefix}{}", self.rng.gen_range(1..=KEY_SPACE));
            if !self.is_taken(&key) {
                return key;
            }
        }
        warn!(%prefix, "Numeric character keys exhausted, using a uuid");
        format!("{prefix}{}", Uuid::new_v4().simple())
    }

    fn is_taken(&self, key: &str) -> bool {
        self.generated.contains_key(key) || self.pregenerated.contains_key(key)
    }
}

/// Key prefix for a kind and level. The trailing underscore keeps level 1
/// from matching level 10.
pub fn level_prefix(kind: CharacterKind, level: u32) -> String {
    format!("{}_level_{level}_", kind.key_prefix())
}
