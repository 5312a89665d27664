//! Card catalog: immutable definitions loaded once per session.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::card::{Card, CardId, CardKind};

const DEFAULT_CATALOG_DATA: &str = include_str!("../assets/catalog.json");

/// Raw record for one card as authored in the data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CardRecord {
    /// Numeric source id; preferred over the name when building the card id.
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default, alias = "Amenaza", alias = "amenaza")]
    pub threat: i32,
    #[serde(default, alias = "Conflicto", alias = "conflicto")]
    pub conflict: i32,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub artwork: Option<String>,
}

/// One card group: `(name, record)` pairs in the order the document lists them.
pub type CardGroup = Vec<(String, CardRecord)>;

/// The four card groups keyed by card name, in the shape the data files use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CatalogData {
    #[serde(
        default,
        rename = "Personajes",
        alias = "characters",
        with = "ordered_group"
    )]
    pub characters: CardGroup,
    #[serde(default, rename = "Eventos", alias = "events", with = "ordered_group")]
    pub events: CardGroup,
    #[serde(default, rename = "Talentos", alias = "talents", with = "ordered_group")]
    pub talents: CardGroup,
    #[serde(
        default,
        rename = "Iniciativa",
        alias = "Iniciativas",
        alias = "initiatives",
        with = "ordered_group"
    )]
    pub initiatives: CardGroup,
}

impl CatalogData {
    /// Parse catalog data from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the catalog shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn group(&self, kind: CardKind) -> &CardGroup {
        match kind {
            CardKind::Character => &self.characters,
            CardKind::Event => &self.events,
            CardKind::Talent => &self.talents,
            CardKind::Initiative => &self.initiatives,
        }
    }
}

/// Card groups as JSON objects, keeping member order. A repeated name keeps
/// its first position and its last record.
mod ordered_group {
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    use super::{CardGroup, CardRecord};

    pub fn serialize<S>(group: &CardGroup, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(group.len()))?;
        for (name, record) in group {
            map.serialize_entry(name, record)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<CardGroup, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(GroupVisitor)
    }

    struct GroupVisitor;

    impl<'de> Visitor<'de> for GroupVisitor {
        type Value = CardGroup;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an object mapping card names to card records")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut group = CardGroup::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, record)) = access.next_entry::<String, CardRecord>()? {
                match group.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = record,
                    None => group.push((name, record)),
                }
            }
            Ok(group)
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate card id {0}")]
    DuplicateId(CardId),
}

/// Indexed, read-only set of card definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardCatalog {
    cards: Vec<Card>,
    index: HashMap<CardId, usize>,
}

impl CardCatalog {
    /// Build the catalog, assigning ids as `{kind}-{sourceId|normalizedName}`.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] when two records map to the same id.
    pub fn build(data: &CatalogData) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();
        for kind in CardKind::ALL {
            for (name, record) in data.group(kind) {
                catalog.insert(card_from_record(kind, name, record))?;
            }
        }
        Ok(catalog)
    }

    /// Parse and build in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or ids collide.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data = CatalogData::from_json(json)?;
        Self::build(&data)
    }

    /// Bundled default card set.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CATALOG_DATA).unwrap_or_else(|err| {
            log::error!("bundled catalog failed to load: {err}");
            Self::default()
        })
    }

    fn insert(&mut self, card: Card) -> Result<(), CatalogError> {
        if self.index.contains_key(&card.id) {
            return Err(CatalogError::DuplicateId(card.id));
        }
        self.index.insert(card.id.clone(), self.cards.len());
        self.cards.push(card);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.index.get(id).and_then(|idx| self.cards.get(*idx))
    }

    #[must_use]
    pub fn contains(&self, id: &CardId) -> bool {
        self.index.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn of_kind(&self, kind: CardKind) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(move |card| card.kind == kind)
    }

    /// Ids of every card that belongs in the encounter deck, in catalog order.
    #[must_use]
    pub fn deck_ids(&self) -> Vec<CardId> {
        self.cards
            .iter()
            .filter(|card| card.kind.is_deck_kind())
            .map(|card| card.id.clone())
            .collect()
    }

    /// Initiative cards, all of which stay visible as swap candidates.
    #[must_use]
    pub fn initiative_ids(&self) -> Vec<CardId> {
        self.of_kind(CardKind::Initiative)
            .map(|card| card.id.clone())
            .collect()
    }

    #[must_use]
    pub fn talent_ids(&self) -> Vec<CardId> {
        self.of_kind(CardKind::Talent)
            .map(|card| card.id.clone())
            .collect()
    }
}

fn card_from_record(kind: CardKind, name: &str, record: &CardRecord) -> Card {
    let suffix = record
        .id
        .map_or_else(|| normalize_name(name), |id| id.to_string());
    let threat_value = if kind.is_deck_kind() { record.threat } else { 0 };
    let conflict_value = if kind == CardKind::Character {
        record.conflict
    } else {
        0
    };
    Card {
        id: CardId::new(format!("{}-{suffix}", kind.as_str())),
        kind,
        name: name.to_string(),
        threat_value,
        conflict_value,
        artwork_ref: record.artwork.clone(),
        keywords: record.keywords.clone(),
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' | 'å' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Lowercase, fold accents, collapse whitespace runs into `_`, and drop
/// anything outside `[a-z0-9_-]`.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        let folded = fold_diacritic(c);
        if folded.is_ascii_lowercase() || folded.is_ascii_digit() || matches!(folded, '_' | '-') {
            out.push(folded);
        }
    }
    out
}
