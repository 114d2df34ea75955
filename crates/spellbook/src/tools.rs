//! Spell Tools
//!
//! The three tool handlers exposed over the invocation protocol. Each holds
//! a handle to the shared store and is a total function from (possibly
//! malformed) input to a payload: validation failures and lookup misses are
//! `{message}` outcomes, never errors crossing the protocol boundary.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use spellchat_core::{
    ParameterSpec, Result, Tool, ToolCallRequest, ToolDescriptor, ToolPayload,
};

use crate::model::Spell;
use crate::store::SpellStore;

fn argument<'a>(call: &'a ToolCallRequest, name: &str) -> &'a str {
    call.arguments.get(name).map_or("", |v| v.trim())
}

/// Saves or updates a spell in the store
pub struct SaveSpellTool {
    store: Arc<SpellStore>,
}

impl SaveSpellTool {
    pub fn new(store: Arc<SpellStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveSpellTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "save_spell".into(),
            description: "Save a spell with a name, incantation, and effect.".into(),
            parameters: vec![
                ParameterSpec::required_string("name", "Spell name"),
                ParameterSpec::required_string("incantation", "Spell incantation"),
                ParameterSpec::required_string("effect", "Spell effect"),
            ],
        }
    }

    async fn invoke(&self, call: &ToolCallRequest) -> Result<ToolPayload> {
        let name = argument(call, "name");
        let incantation = argument(call, "incantation");
        let effect = argument(call, "effect");

        let mut missing = Vec::new();
        if name.is_empty() {
            missing.push("name");
        }
        if incantation.is_empty() {
            missing.push("incantation");
        }
        if effect.is_empty() {
            missing.push("effect");
        }
        if !missing.is_empty() {
            return Ok(ToolPayload::message(format!(
                "Please provide {}.",
                missing.join(", ")
            )));
        }

        tracing::info!(spell = %name, "saving spell");

        match self.store.save(Spell::new(name, incantation, effect)) {
            Ok(()) => Ok(ToolPayload::message(format!("Saved spell '{name}'."))),
            Err(e) => Ok(ToolPayload::message(e.to_string())),
        }
    }
}

/// Retrieves a spell by name
pub struct GetSpellTool {
    store: Arc<SpellStore>,
}

impl GetSpellTool {
    pub fn new(store: Arc<SpellStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for GetSpellTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "get_spell".into(),
            description: "Retrieve a spell by name.".into(),
            parameters: vec![ParameterSpec::required_string("name", "Spell name")],
        }
    }

    async fn invoke(&self, call: &ToolCallRequest) -> Result<ToolPayload> {
        let name = argument(call, "name");
        if name.is_empty() {
            return Ok(ToolPayload::message("Please provide name."));
        }

        tracing::info!(spell = %name, "getting spell");

        match self.store.get(name) {
            Some(spell) => {
                let fields = json!({
                    "name": spell.name,
                    "incantation": spell.incantation,
                    "effect": spell.effect,
                });
                match fields {
                    serde_json::Value::Object(map) => Ok(ToolPayload::fields(map)),
                    _ => unreachable!("spell fields serialize to an object"),
                }
            }
            None => Ok(ToolPayload::message(format!("Spell '{name}' not found."))),
        }
    }
}

/// Lists all spells in the store
pub struct ListSpellsTool {
    store: Arc<SpellStore>,
}

impl ListSpellsTool {
    pub fn new(store: Arc<SpellStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ListSpellsTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: "list_spells".into(),
            description: "List all available spells.".into(),
            parameters: vec![],
        }
    }

    async fn invoke(&self, _call: &ToolCallRequest) -> Result<ToolPayload> {
        tracing::info!("listing all spells");

        let spells = self.store.list();
        if spells.is_empty() {
            // Zero items is a success outcome, not an error.
            return Ok(ToolPayload::items_with_message(
                Vec::new(),
                "No spells are currently available.",
            ));
        }

        let items = spells
            .iter()
            .map(|s| json!({ "name": s.name, "incantation": s.incantation, "effect": s.effect }))
            .collect();
        Ok(ToolPayload::items(items))
    }
}
