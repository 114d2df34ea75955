//! # spellbook
//!
//! Domain crate for SpellChat: the concurrent in-memory spell store and the
//! three tool handlers (`save_spell`, `get_spell`, `list_spells`) that back
//! it. The store is constructed once at server start, seeded with the
//! default spells, and passed by handle into every tool.

pub mod model;
pub mod store;
pub mod tools;

pub use model::Spell;
pub use store::{SpellStore, StoreError};
pub use tools::{GetSpellTool, ListSpellsTool, SaveSpellTool};

use std::sync::Arc;

use spellchat_core::{Result, ToolRegistry};

/// Register the full spell tool set against one store handle
pub fn register_spell_tools(registry: &mut ToolRegistry, store: Arc<SpellStore>) -> Result<()> {
    registry.register(SaveSpellTool::new(store.clone()))?;
    registry.register(GetSpellTool::new(store.clone()))?;
    registry.register(ListSpellsTool::new(store))?;
    Ok(())
}
