//! Character persistence.
//!
//! Generated descriptors are stored as two pretty-printed JSON files, one
//! for NPCs and one for enemies, each a flat `key -> descriptor` map. Files
//! are read wholesale at startup and overwritten wholesale on save; there
//! is no locking, so the last process to save wins.

use crate::npc::{CharacterDescriptor, CharacterKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File holding NPC descriptors.
pub const NPC_FILE: &str = "npcs.json";

/// File holding enemy descriptors.
pub const ENEMY_FILE: &str = "enemies.json";

/// A flat key -> descriptor collection.
pub type DescriptorMap = BTreeMap<String, CharacterDescriptor>;

/// Both persisted collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCharacters {
    pub npcs: DescriptorMap,
    pub enemies: DescriptorMap,
}

impl StoredCharacters {
    pub fn collection(&self, kind: CharacterKind) -> &DescriptorMap {
        match kind {
            CharacterKind::Npc => &self.npcs,
            CharacterKind::Enemy => &self.enemies,
        }
    }

    pub fn collection_mut(&mut self, kind: CharacterKind) -> &mut DescriptorMap {
        match kind {
            CharacterKind::Npc => &mut self.npcs,
            CharacterKind::Enemy => &mut self.enemies,
        }
    }

    pub fn len(&self) -> usize {
        self.npcs.len() + self.enemies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty() && self.enemies.is_empty()
    }

    /// Whether any collection already uses `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.npcs.contains_key(key) || self.enemies.contains_key(key)
    }
}

/// Directory-backed descriptor store.
#[derive(Debug, Clone)]
pub struct CharacterStore {
    dir: PathBuf,
}

impl CharacterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, kind: CharacterKind) -> PathBuf {
        match kind {
            CharacterKind::Npc => self.dir.join(NPC_FILE),
            CharacterKind::Enemy => self.dir.join(ENEMY_FILE),
        }
    }

    /// Load both collections. A missing file is an empty collection.
    pub async fn try_load(&self) -> Result<StoredCharacters, PersistError> {
        Ok(StoredCharacters {
            npcs: load_collection(&self.path_for(CharacterKind::Npc)).await?,
            enemies: load_collection(&self.path_for(CharacterKind::Enemy)).await?,
        })
    }

    /// Load both collections, replacing any unreadable one with an empty
    /// collection.
    pub async fn load(&self) -> StoredCharacters {
        let mut stored = StoredCharacters::default();
        for kind in [CharacterKind::Npc, CharacterKind::Enemy] {
            let path = self.path_for(kind);
            match load_collection(&path).await {
                Ok(collection) => {
                    info!(count = collection.len(), path = %path.display(), "Loaded pre-generated {kind}s");
                    *stored.collection_mut(kind) = collection;
                }
                Err(e) => {
                    warn!(path = %path.display(), "Could not load pre-generated {kind}s: {e}");
                }
            }
        }
        stored
    }

    /// Overwrite the store with `characters`.
    ///
    /// Empty collections are skipped so that a session which generated no
    /// NPCs doesn't wipe the NPCs saved by an earlier one.
    pub async fn save(&self, characters: &StoredCharacters) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir).await?;
        for kind in [CharacterKind::Npc, CharacterKind::Enemy] {
            let collection = characters.collection(kind);
            if collection.is_empty() {
                continue;
            }
            let path = self.path_for(kind);
            let content = serde_json::to_string_pretty(collection)?;
            fs::write(&path, content).await?;
            info!(count = collection.len(), path = %path.display(), "Saved {kind}s");
        }
        Ok(())
    }
}

async fn load_collection(path: &Path) -> Result<DescriptorMap, PersistError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DescriptorMap::new()),
        Err(e) => Err(e.into()),
    }
}
