//! Card identity and per-table transient state.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable card identity, e.g. `character-7` or `event-tormenta`.
///
/// Two cards are the same entity iff their ids match.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Character,
    Event,
    Talent,
    Initiative,
}

impl CardKind {
    pub const ALL: [Self; 4] = [Self::Character, Self::Event, Self::Talent, Self::Initiative];

    /// Slug used as the id prefix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Event => "event",
            Self::Talent => "talent",
            Self::Initiative => "initiative",
        }
    }

    /// Whether cards of this kind are shuffled into the encounter deck.
    #[must_use]
    pub const fn is_deck_kind(self) -> bool {
        matches!(self, Self::Character | Self::Event)
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(Self::Character),
            "event" => Ok(Self::Event),
            "talent" => Ok(Self::Talent),
            "initiative" => Ok(Self::Initiative),
            _ => Err(()),
        }
    }
}

/// Immutable card definition as held by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub kind: CardKind,
    pub name: String,
    /// Threat ("riesgo") added to the horde counter; characters and events only.
    #[serde(default)]
    pub threat_value: i32,
    /// Target number for conflict rolls; characters only.
    #[serde(default)]
    pub conflict_value: i32,
    /// Opaque artwork handle, never interpreted by the engine.
    #[serde(default)]
    pub artwork_ref: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl Card {
    #[must_use]
    pub fn is_character(&self) -> bool {
        self.kind == CardKind::Character
    }
}

/// Transient flags a card carries while it sits on the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableFlags {
    /// Unallied character; does not contribute to the Risk step.
    pub is_errant: bool,
    pub awaiting_decision: bool,
    pub in_conflict: bool,
    pub decided_this_day: bool,
    pub acted_this_round: bool,
}

impl TableFlags {
    #[must_use]
    pub const fn errant(is_errant: bool) -> Self {
        Self {
            is_errant,
            awaiting_decision: false,
            in_conflict: false,
            decided_this_day: false,
            acted_this_round: false,
        }
    }

    /// Pending work that keeps the Decision step open.
    #[must_use]
    pub const fn blocks_decision(&self) -> bool {
        !self.decided_this_day || self.awaiting_decision || self.in_conflict
    }
}

/// A card on the table together with its current flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub card: CardId,
    #[serde(default)]
    pub flags: TableFlags,
}

impl TableEntry {
    #[must_use]
    pub const fn new(card: CardId, flags: TableFlags) -> Self {
        Self { card, flags }
    }

    /// Returns a copy carrying `flags`; table entries are replaced, never aliased.
    #[must_use]
    pub fn with_flags(&self, flags: TableFlags) -> Self {
        Self {
            card: self.card.clone(),
            flags,
        }
    }
}
