use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

use crate::card::{CardId, TableEntry};
use crate::catalog::CardCatalog;
use crate::constants::{LOG_DEFEAT_FATIGUE, LOG_VICTORY};
use crate::day::DayStep;
use crate::deck::DeckState;

/// What a pending reveal is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingKind {
    /// A character waiting for its recruitment roll.
    Recruit,
    /// An event waiting to be acknowledged.
    Event,
}

impl PendingKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recruit => "recruitment",
            Self::Event => "event acknowledgment",
        }
    }
}

impl fmt::Display for PendingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token for the single outstanding resolution the Encounter step awaits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingResolution {
    pub kind: PendingKind,
    pub card: CardId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    #[default]
    InProgress,
    Victory,
    Defeat,
}

impl GameOutcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Victory => "victory",
            Self::Defeat => "defeat",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every counter and zone of one player's game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub step: DayStep,
    pub day: u32,
    pub travel_count: u32,
    pub fatigue_count: u32,
    pub threat_count: u32,
    pub encounter_actions_today: u32,
    pub encounters_per_turn: u32,
    /// Reveals the current Encounter entry still has to perform.
    pub reveals_owed: u32,
    pub deck: DeckState,
    /// Characters still owed a resolution in the current decision round.
    pub decision_round_participants: SmallVec<[CardId; 8]>,
    pub selected_candidate: Option<CardId>,
    pub pending: Option<PendingResolution>,
    /// Set by the fatigue loss condition; sticky.
    pub game_over: bool,
    /// Set once travel reaches the victory distance; sticky.
    pub victory: bool,
    pub logs: Vec<String>,
}

impl GameState {
    #[must_use]
    pub fn new(deck: DeckState, encounters_per_turn: u32) -> Self {
        Self {
            step: DayStep::None,
            day: 0,
            travel_count: 0,
            fatigue_count: 0,
            threat_count: 0,
            encounter_actions_today: 0,
            encounters_per_turn: encounters_per_turn.max(1),
            reveals_owed: 0,
            deck,
            decision_round_participants: SmallVec::new(),
            selected_candidate: None,
            pending: None,
            game_over: false,
            victory: false,
            logs: Vec::new(),
        }
    }

    pub(crate) fn push_log(&mut self, key: &str) {
        self.logs.push(key.to_string());
    }

    /// Apply a signed threat change; the counter never drops below zero.
    pub(crate) fn add_threat(&mut self, delta: i32) {
        self.threat_count = self.threat_count.saturating_add_signed(delta);
    }

    /// Add fatigue and trip the loss condition. Returns `true` only on the
    /// call that ended the game.
    pub(crate) fn add_fatigue(&mut self, amount: u32, loss_threshold: u32) -> bool {
        self.fatigue_count = self.fatigue_count.saturating_add(amount);
        if self.fatigue_count >= loss_threshold && !self.game_over {
            self.game_over = true;
            self.push_log(LOG_DEFEAT_FATIGUE);
            log::info!("defeat: fatigue reached {}", self.fatigue_count);
            return true;
        }
        false
    }

    pub(crate) fn relieve_fatigue(&mut self, amount: u32) {
        self.fatigue_count = self.fatigue_count.saturating_sub(amount);
    }

    /// Add one travel and record victory the first time the goal is met.
    pub(crate) fn record_travel(&mut self, victory_travel: u32) {
        self.travel_count = self.travel_count.saturating_add(1);
        if self.travel_count >= victory_travel && !self.victory {
            self.victory = true;
            self.push_log(LOG_VICTORY);
            log::info!("victory after {} travels", self.travel_count);
        }
    }

    /// Victory takes precedence: once reached the host is expected to stop.
    #[must_use]
    pub const fn outcome(&self) -> GameOutcome {
        if self.victory {
            GameOutcome::Victory
        } else if self.game_over {
            GameOutcome::Defeat
        } else {
            GameOutcome::InProgress
        }
    }

    #[must_use]
    pub fn is_participant(&self, card: &CardId) -> bool {
        self.decision_round_participants.contains(card)
    }

    pub(crate) fn drop_participant(&mut self, card: &CardId) {
        self.decision_round_participants.retain(|c| c != card);
    }

    /// Table entries holding character cards.
    pub fn table_characters<'a>(
        &'a self,
        catalog: &'a CardCatalog,
    ) -> impl Iterator<Item = &'a TableEntry> + 'a {
        self.deck.table().iter().filter(move |entry| {
            catalog
                .get(&entry.card)
                .is_some_and(crate::card::Card::is_character)
        })
    }

    /// Number of characters keeping the Decision step open.
    #[must_use]
    pub fn pending_decisions(&self, catalog: &CardCatalog) -> usize {
        let blocked_on_table = self
            .table_characters(catalog)
            .filter(|entry| entry.flags.blocks_decision() && !self.is_participant(&entry.card))
            .count();
        self.decision_round_participants.len() + blocked_on_table
    }

    /// Most recent `limit` journal entries, oldest first.
    #[must_use]
    pub fn recent_logs(&self, limit: usize) -> &[String] {
        let start = self.logs.len().saturating_sub(limit);
        &self.logs[start..]
    }

    /// Read-only view for hosts. `available_initiatives` are the swap
    /// candidates the player can see.
    #[must_use]
    pub fn snapshot(&self, available_initiatives: &[CardId], log_history: usize) -> GameSnapshot {
        GameSnapshot {
            step: self.step,
            day: self.day,
            travel_count: self.travel_count,
            fatigue_count: self.fatigue_count,
            threat_count: self.threat_count,
            encounter_actions_today: self.encounter_actions_today,
            encounters_per_turn: self.encounters_per_turn,
            draw_pile: self.deck.draw_pile().iter().cloned().collect(),
            hand: self.deck.hand().to_vec(),
            table: self.deck.table().to_vec(),
            discard_pile: self.deck.discard_pile().iter().cloned().collect(),
            revealed: self.deck.revealed().cloned(),
            active_event: self.deck.active_event().cloned(),
            active_talent: self.deck.active_talent().cloned(),
            active_initiative: self.deck.active_initiative().cloned(),
            available_initiatives: available_initiatives.to_vec(),
            decision_round_participants: self.decision_round_participants.to_vec(),
            selected_candidate: self.selected_candidate.clone(),
            pending: self.pending.clone(),
            outcome: self.outcome(),
            recent_logs: self.recent_logs(log_history).to_vec(),
        }
    }
}

/// Serializable copy of everything a host needs to draw the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub step: DayStep,
    pub day: u32,
    pub travel_count: u32,
    pub fatigue_count: u32,
    pub threat_count: u32,
    pub encounter_actions_today: u32,
    pub encounters_per_turn: u32,
    pub draw_pile: Vec<CardId>,
    pub hand: Vec<CardId>,
    pub table: Vec<TableEntry>,
    pub discard_pile: Vec<CardId>,
    pub revealed: Option<CardId>,
    pub active_event: Option<CardId>,
    pub active_talent: Option<CardId>,
    pub active_initiative: Option<CardId>,
    pub available_initiatives: Vec<CardId>,
    pub decision_round_participants: Vec<CardId>,
    pub selected_candidate: Option<CardId>,
    pub pending: Option<PendingResolution>,
    pub outcome: GameOutcome,
    pub recent_logs: Vec<String>,
}
