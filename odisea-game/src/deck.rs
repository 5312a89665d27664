//! Card zones: draw pile, hand, table, discard pile, and the player's slots.
//!
//! Every card the session knows about lives in exactly one zone. The zone of
//! any card is tracked in an index so lookups never scan the piles, and every
//! move checks its source before touching anything.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use crate::card::{CardId, TableEntry, TableFlags};
use crate::day::DayStep;
use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    DrawPile,
    Hand,
    Table,
    DiscardPile,
    /// Drawn during an encounter and waiting for its resolution.
    Revealed,
    ActiveEvent,
    ActiveTalent,
    ActiveInitiative,
}

impl Zone {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DrawPile => "draw pile",
            Self::Hand => "hand",
            Self::Table => "table",
            Self::DiscardPile => "discard pile",
            Self::Revealed => "revealed",
            Self::ActiveEvent => "active event",
            Self::ActiveTalent => "active talent",
            Self::ActiveInitiative => "active initiative",
        }
    }

    const fn is_slot(self) -> bool {
        matches!(
            self,
            Self::Revealed | Self::ActiveEvent | Self::ActiveTalent | Self::ActiveInitiative
        )
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Return a shuffled copy of `cards`; the input slice is left untouched.
pub fn shuffled<R: Rng + ?Sized>(cards: &[CardId], rng: &mut R) -> Vec<CardId> {
    let mut out = cards.to_vec();
    out.shuffle(rng);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DeckState {
    /// Top of the pile is the front.
    draw_pile: VecDeque<CardId>,
    hand: Vec<CardId>,
    table: Vec<TableEntry>,
    /// Most recent discard first.
    discard_pile: VecDeque<CardId>,
    revealed: Option<CardId>,
    active_event: Option<CardId>,
    active_talent: Option<CardId>,
    active_initiative: Option<CardId>,
    #[serde(skip)]
    index: HashMap<CardId, Zone>,
}

impl DeckState {
    /// Start with `draw_pile` (top first) and every other zone empty.
    #[must_use]
    pub fn new(draw_pile: Vec<CardId>) -> Self {
        let mut deck = Self::default();
        for card in draw_pile {
            if deck.index.contains_key(&card) {
                log::warn!("ignoring duplicate deck card {card}");
                continue;
            }
            deck.index.insert(card.clone(), Zone::DrawPile);
            deck.draw_pile.push_back(card);
        }
        deck
    }

    /// Put a card that no zone holds yet straight into `zone`. Returns
    /// `false` and changes nothing if the card is already tracked.
    pub fn grant(&mut self, card: &CardId, zone: Zone) -> bool {
        if self.index.contains_key(card) || (zone == Zone::Revealed && self.revealed.is_some()) {
            return false;
        }
        self.attach(card.clone(), zone, TableFlags::default());
        true
    }

    #[must_use]
    pub fn zone_of(&self, card: &CardId) -> Option<Zone> {
        self.index.get(card).copied()
    }

    /// Move the top card of the draw pile into the revealed slot.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptyDeck`] if nothing is left to draw, or
    /// [`EngineError::ResolutionInProgress`] if a revealed card is still pending.
    pub fn draw_top(&mut self) -> EngineResult<CardId> {
        if self.revealed.is_some() {
            return Err(EngineError::ResolutionInProgress);
        }
        let Some(card) = self.draw_pile.pop_front() else {
            return Err(EngineError::EmptyDeck);
        };
        self.index.insert(card.clone(), Zone::Revealed);
        self.revealed = Some(card.clone());
        log::debug!("drew {card}");
        Ok(card)
    }

    /// Move `card` from `from` into `to`. Cards entering the draw pile go on
    /// top, cards entering a full slot push the previous occupant to the
    /// discard pile.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInZone`] if `card` is not currently in `from`.
    pub fn move_card(&mut self, card: &CardId, from: Zone, to: Zone) -> EngineResult<()> {
        self.move_card_with(card, from, to, TableFlags::default())
    }

    /// Move a card onto the table with the given flags.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInZone`] if `card` is not currently in `from`.
    pub fn place_on_table(
        &mut self,
        card: &CardId,
        from: Zone,
        flags: TableFlags,
    ) -> EngineResult<()> {
        self.move_card_with(card, from, Zone::Table, flags)
    }

    /// Make `card` the active event; the previous event is discarded.
    /// Returns the displaced event, if any.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInZone`] if `card` is not currently in `from`.
    pub fn place_active_event(&mut self, card: &CardId, from: Zone) -> EngineResult<Option<CardId>> {
        let previous = self.active_event.clone();
        self.move_card(card, from, Zone::ActiveEvent)?;
        Ok(previous)
    }

    /// Make `card` the active talent; the previous talent is discarded.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInZone`] if `card` is not currently in `from`.
    pub fn place_active_talent(&mut self, card: &CardId, from: Zone) -> EngineResult<Option<CardId>> {
        let previous = self.active_talent.clone();
        self.move_card(card, from, Zone::ActiveTalent)?;
        Ok(previous)
    }

    /// Replace the active initiative with `card`, pulling it out of whatever
    /// zone holds it. Only legal during preparation.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidStepForSwap`] outside [`DayStep::Preparation`].
    pub fn swap_initiative(&mut self, card: &CardId, step: DayStep) -> EngineResult<Option<CardId>> {
        if step != DayStep::Preparation {
            return Err(EngineError::InvalidStepForSwap { current: step });
        }
        let previous = self.active_initiative.clone();
        if previous.as_ref() == Some(card) {
            return Ok(None);
        }
        if let Some(zone) = self.zone_of(card) {
            if zone == Zone::Revealed {
                return Err(EngineError::ResolutionInProgress);
            }
            self.detach(card, zone);
        }
        self.attach(card.clone(), Zone::ActiveInitiative, TableFlags::default());
        Ok(previous)
    }

    /// Put `card` on top of the discard pile unless it is already there.
    /// A card held elsewhere is pulled out of its zone first. Returns whether
    /// the discard pile changed.
    ///
    /// # Errors
    ///
    /// [`EngineError::ResolutionInProgress`] if the card is the pending reveal.
    pub fn add_to_discard(&mut self, card: &CardId) -> EngineResult<bool> {
        match self.zone_of(card) {
            Some(Zone::DiscardPile) => Ok(false),
            Some(Zone::Revealed) => Err(EngineError::ResolutionInProgress),
            Some(zone) => {
                self.detach(card, zone);
                self.attach(card.clone(), Zone::DiscardPile, TableFlags::default());
                Ok(true)
            }
            None => {
                self.attach(card.clone(), Zone::DiscardPile, TableFlags::default());
                Ok(true)
            }
        }
    }

    /// Replace the flags of a table card.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInZone`] if `card` is not on the table.
    pub fn update_flags(
        &mut self,
        card: &CardId,
        update: impl FnOnce(TableFlags) -> TableFlags,
    ) -> EngineResult<TableFlags> {
        let entry = self
            .table
            .iter_mut()
            .find(|entry| &entry.card == card)
            .ok_or_else(|| EngineError::NotInZone {
                card: card.clone(),
                zone: Zone::Table,
            })?;
        let next = entry.with_flags(update(entry.flags));
        let flags = next.flags;
        *entry = next;
        Ok(flags)
    }

    /// Apply `update` to the flags of every table card accepted by `filter`.
    pub fn update_table_flags(
        &mut self,
        mut filter: impl FnMut(&TableEntry) -> bool,
        mut update: impl FnMut(TableFlags) -> TableFlags,
    ) {
        for entry in &mut self.table {
            if filter(entry) {
                *entry = entry.with_flags(update(entry.flags));
            }
        }
    }

    fn move_card_with(
        &mut self,
        card: &CardId,
        from: Zone,
        to: Zone,
        flags: TableFlags,
    ) -> EngineResult<()> {
        if self.zone_of(card) != Some(from) {
            return Err(EngineError::NotInZone {
                card: card.clone(),
                zone: from,
            });
        }
        if to == Zone::Revealed && self.revealed.is_some() && from != Zone::Revealed {
            return Err(EngineError::ResolutionInProgress);
        }
        self.detach(card, from);
        self.attach(card.clone(), to, flags);
        log::debug!("moved {card}: {from} -> {to}");
        Ok(())
    }

    fn detach(&mut self, card: &CardId, zone: Zone) {
        match zone {
            Zone::DrawPile => self.draw_pile.retain(|c| c != card),
            Zone::Hand => self.hand.retain(|c| c != card),
            Zone::Table => self.table.retain(|entry| &entry.card != card),
            Zone::DiscardPile => self.discard_pile.retain(|c| c != card),
            Zone::Revealed | Zone::ActiveEvent | Zone::ActiveTalent | Zone::ActiveInitiative => {
                let slot = self.slot_mut(zone);
                if slot.as_ref() == Some(card) {
                    *slot = None;
                }
            }
        }
        self.index.remove(card);
    }

    fn attach(&mut self, card: CardId, zone: Zone, flags: TableFlags) {
        if zone.is_slot() {
            let displaced = self.slot_mut(zone).replace(card.clone());
            if let Some(previous) = displaced.filter(|previous| previous != &card) {
                self.index.remove(&previous);
                self.index.insert(previous.clone(), Zone::DiscardPile);
                self.discard_pile.push_front(previous);
            }
        } else {
            match zone {
                Zone::DrawPile => self.draw_pile.push_front(card.clone()),
                Zone::Hand => self.hand.push(card.clone()),
                Zone::Table => self.table.push(TableEntry::new(card.clone(), flags)),
                _ => self.discard_pile.push_front(card.clone()),
            }
        }
        self.index.insert(card, zone);
    }

    fn slot_mut(&mut self, zone: Zone) -> &mut Option<CardId> {
        match zone {
            Zone::ActiveEvent => &mut self.active_event,
            Zone::ActiveTalent => &mut self.active_talent,
            Zone::ActiveInitiative => &mut self.active_initiative,
            _ => &mut self.revealed,
        }
    }

    #[must_use]
    pub fn draw_pile(&self) -> &VecDeque<CardId> {
        &self.draw_pile
    }

    #[must_use]
    pub fn hand(&self) -> &[CardId] {
        &self.hand
    }

    #[must_use]
    pub fn table(&self) -> &[TableEntry] {
        &self.table
    }

    #[must_use]
    pub fn table_entry(&self, card: &CardId) -> Option<&TableEntry> {
        self.table.iter().find(|entry| &entry.card == card)
    }

    #[must_use]
    pub fn discard_pile(&self) -> &VecDeque<CardId> {
        &self.discard_pile
    }

    #[must_use]
    pub const fn revealed(&self) -> Option<&CardId> {
        self.revealed.as_ref()
    }

    #[must_use]
    pub const fn active_event(&self) -> Option<&CardId> {
        self.active_event.as_ref()
    }

    #[must_use]
    pub const fn active_talent(&self) -> Option<&CardId> {
        self.active_talent.as_ref()
    }

    #[must_use]
    pub const fn active_initiative(&self) -> Option<&CardId> {
        self.active_initiative.as_ref()
    }

    /// Number of cards currently held in any zone.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        let slots = [
            &self.revealed,
            &self.active_event,
            &self.active_talent,
            &self.active_initiative,
        ]
        .iter()
        .filter(|slot| slot.is_some())
        .count();
        self.draw_pile.len() + self.hand.len() + self.table.len() + self.discard_pile.len() + slots
    }

    /// Every indexed card is held by exactly the zone the index claims.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.total_cards()
            && self.index.iter().all(|(card, zone)| match zone {
                Zone::DrawPile => self.draw_pile.contains(card),
                Zone::Hand => self.hand.contains(card),
                Zone::Table => self.table_entry(card).is_some(),
                Zone::DiscardPile => self.discard_pile.contains(card),
                Zone::Revealed => self.revealed.as_ref() == Some(card),
                Zone::ActiveEvent => self.active_event.as_ref() == Some(card),
                Zone::ActiveTalent => self.active_talent.as_ref() == Some(card),
                Zone::ActiveInitiative => self.active_initiative.as_ref() == Some(card),
            })
    }
}
