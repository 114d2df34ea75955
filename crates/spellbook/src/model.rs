//! Spell Record

use serde::{Deserialize, Serialize};

/// A named spell with its required attributes
///
/// All three fields are non-blank for every stored spell; the store rejects
/// anything partially filled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    /// Unique name, compared case-insensitively
    pub name: String,

    /// Words spoken to cast the spell
    pub incantation: String,

    /// What the spell does
    pub effect: String,
}

impl Spell {
    pub fn new(
        name: impl Into<String>,
        incantation: impl Into<String>,
        effect: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            incantation: incantation.into(),
            effect: effect.into(),
        }
    }
}
