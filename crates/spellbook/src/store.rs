//! Spell Store
//!
//! Thread-safe in-memory store keyed by case-folded spell name. Created once
//! at server start, seeded with the default spells, discarded on shutdown.
//! The write lock covers one upsert at a time; no lock is ever held across
//! an await point.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::model::Spell;

/// Store error types
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// A required attribute was blank after trimming
    #[error("spell {field} is required")]
    Validation { field: &'static str },
}

/// Concurrent spell store
///
/// Keys are case-folded for comparison; the stored spell keeps the caller's
/// spelling.
pub struct SpellStore {
    spells: RwLock<HashMap<String, Spell>>,
}

impl Default for SpellStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpellStore {
    /// Create a store seeded with the default spells
    pub fn new() -> Self {
        let store = Self::empty();
        store.seed_defaults();
        store
    }

    /// Create an unseeded store (tests and the empty-list path)
    pub fn empty() -> Self {
        Self {
            spells: RwLock::new(HashMap::new()),
        }
    }

    fn key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Save or update a spell by case-insensitive name
    ///
    /// Trims every attribute; rejects the first blank one. The upsert is
    /// idempotent: saving the same name twice overwrites, never duplicates.
    pub fn save(&self, spell: Spell) -> Result<(), StoreError> {
        let spell = Spell::new(
            spell.name.trim(),
            spell.incantation.trim(),
            spell.effect.trim(),
        );

        if spell.name.is_empty() {
            return Err(StoreError::Validation { field: "name" });
        }
        if spell.incantation.is_empty() {
            return Err(StoreError::Validation {
                field: "incantation",
            });
        }
        if spell.effect.is_empty() {
            return Err(StoreError::Validation { field: "effect" });
        }

        let key = Self::key(&spell.name);
        let mut spells = self.spells.write().expect("spell store lock poisoned");
        spells.insert(key, spell);
        Ok(())
    }

    /// Get a spell by case-insensitive exact name match
    pub fn get(&self, name: &str) -> Option<Spell> {
        if name.trim().is_empty() {
            return None;
        }
        let spells = self.spells.read().expect("spell store lock poisoned");
        spells.get(&Self::key(name)).cloned()
    }

    /// Snapshot of all spells, sorted by key for stable output
    pub fn list(&self) -> Vec<Spell> {
        let spells = self.spells.read().expect("spell store lock poisoned");
        let mut all: Vec<_> = spells.values().cloned().collect();
        all.sort_by_key(|s| s.name.to_lowercase());
        all
    }

    /// Number of stored spells
    pub fn len(&self) -> usize {
        self.spells.read().expect("spell store lock poisoned").len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn seed_defaults(&self) {
        let defaults = [
            Spell::new("fireball", "Ignis globus", "Hurls a flaming sphere at a target"),
            Spell::new("lumos", "Lumos", "Emits light to illuminate dark places"),
            Spell::new("protego", "Protego", "Conjures a protective barrier"),
            Spell::new("accio", "Accio", "Summons an object to the caster"),
            Spell::new("expelliarmus", "Expelliarmus", "Disarms an opponent"),
        ];
        for spell in defaults {
            // Seed data is well-formed by construction.
            let _ = self.save(spell);
        }
    }
}
