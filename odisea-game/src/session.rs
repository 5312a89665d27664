use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::card::{CardId, CardKind, TableFlags};
use crate::catalog::CardCatalog;
use crate::config::RulesConfig;
use crate::constants::{
    LOG_ABILITY_USED, LOG_ENCOUNTER_CAP, LOG_INITIATIVE_SWAPPED, LOG_PLAYED_CHARACTER,
    LOG_PLAYED_EVENT, LOG_PLAYED_TALENT, LOG_SESSION_DEALT,
};
use crate::day::{self, DayStep};
use crate::deck::{DeckState, Zone, shuffled};
use crate::dice::{DieSource, SeededDice, deck_rng};
use crate::error::{EngineError, EngineResult};
use crate::resolution::{
    self, ConflictReport, EventAcknowledgment, RecruitOutcome, RevealOutcome,
};
use crate::state::{GameOutcome, GameSnapshot, GameState, PendingKind};

/// What playing a card from the hand did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum PlayOutcome {
    Character { errant: bool, enlisted: bool },
    Event { displaced: Option<CardId> },
    Talent { displaced: Option<CardId> },
    Initiative { previous: Option<CardId> },
}

/// One player's game: catalog, rules, state, and the RNG streams that drive it.
///
/// Every command either succeeds or returns an [`EngineError`] without
/// touching the state.
#[derive(Debug, Clone)]
pub struct GameSession<D: DieSource = SeededDice> {
    catalog: Arc<CardCatalog>,
    config: RulesConfig,
    state: GameState,
    rng: ChaCha20Rng,
    dice: D,
    seed: u64,
}

impl GameSession<SeededDice> {
    /// Deal a fresh session whose dice come from the same seed.
    #[must_use]
    pub fn new(catalog: Arc<CardCatalog>, config: RulesConfig, seed: u64) -> Self {
        Self::with_dice(catalog, config, seed, SeededDice::from_seed(seed))
    }
}

impl<D: DieSource> GameSession<D> {
    /// Deal a fresh session that rolls with `dice`.
    #[must_use]
    pub fn with_dice(catalog: Arc<CardCatalog>, config: RulesConfig, seed: u64, dice: D) -> Self {
        let mut rng = deck_rng(seed);
        let state = deal(&catalog, &config, &mut rng);
        log::info!(
            "dealt session {seed}: {} cards in the draw pile",
            state.deck.draw_pile().len()
        );
        Self {
            catalog,
            config,
            state,
            rng,
            dice,
            seed,
        }
    }

    /// Discard the current game and deal a new one. Allowed after game over.
    pub fn reset(&mut self, seed: u64) {
        self.rng = deck_rng(seed);
        self.dice.reseed(seed);
        self.state = deal(&self.catalog, &self.config, &mut self.rng);
        self.seed = seed;
        log::info!("session reset with seed {seed}");
    }

    /// Enter the first Preparation step.
    ///
    /// # Errors
    ///
    /// [`EngineError::AlreadyStarted`] once the first day is under way, or
    /// [`EngineError::GameAlreadyOver`].
    pub fn start_day(&mut self) -> EngineResult<DayStep> {
        day::start_day(&mut self.state, &self.catalog, &self.config, &mut self.dice)
    }

    /// Move to the next step of the day and run its entry action. Before the
    /// first day this behaves like [`GameSession::start_day`].
    ///
    /// # Errors
    ///
    /// [`EngineError::GameAlreadyOver`], [`EngineError::ResolutionInProgress`],
    /// or [`EngineError::PendingDecisions`] when leaving an unfinished Decision.
    pub fn advance_step(&mut self) -> EngineResult<DayStep> {
        day::advance(&mut self.state, &self.catalog, &self.config, &mut self.dice)
    }

    /// Perform one extra reveal during the Encounter step.
    ///
    /// # Errors
    ///
    /// [`EngineError::WrongStep`] outside Encounter, [`EngineError::EmptyDeck`],
    /// [`EngineError::ResolutionInProgress`], or [`EngineError::GameAlreadyOver`].
    pub fn reveal_encounter_card(&mut self) -> EngineResult<RevealOutcome> {
        self.ensure_running()?;
        self.ensure_step(DayStep::Encounter)?;
        let outcome = resolution::reveal_one(&mut self.state, &self.catalog, &self.config)?;
        if outcome == RevealOutcome::CapReached {
            self.state.push_log(LOG_ENCOUNTER_CAP);
            log::warn!(
                "encounter cap of {} already reached today",
                self.config.encounter_action_cap
            );
        }
        Ok(outcome)
    }

    /// Roll for the pending character, then continue any owed reveals.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoPendingResolution`] or [`EngineError::WrongResolution`]
    /// when no character is waiting, or [`EngineError::GameAlreadyOver`].
    pub fn resolve_recruit(&mut self) -> EngineResult<RecruitOutcome> {
        self.ensure_running()?;
        let outcome = resolution::resolve_recruit(&mut self.state, &self.catalog, &mut self.dice)?;
        resolution::continue_reveals(&mut self.state, &self.catalog, &self.config)?;
        Ok(outcome)
    }

    /// Apply the pending event, then continue any owed reveals.
    ///
    /// # Errors
    ///
    /// [`EngineError::NoPendingResolution`] or [`EngineError::WrongResolution`]
    /// when no event is waiting, or [`EngineError::GameAlreadyOver`].
    pub fn acknowledge_event(&mut self) -> EngineResult<EventAcknowledgment> {
        self.ensure_running()?;
        let ack = resolution::acknowledge_event(&mut self.state)?;
        resolution::continue_reveals(&mut self.state, &self.catalog, &self.config)?;
        Ok(ack)
    }

    /// Close the reveal without an explicit choice. Events are acknowledged;
    /// a recruitment roll can not be skipped.
    ///
    /// # Errors
    ///
    /// [`EngineError::RecruitCannotBeDismissed`] while a character waits, or
    /// [`EngineError::NoPendingResolution`].
    pub fn dismiss_reveal(&mut self) -> EngineResult<EventAcknowledgment> {
        self.ensure_running()?;
        match self.state.pending.as_ref().map(|pending| pending.kind) {
            None => Err(EngineError::NoPendingResolution),
            Some(PendingKind::Recruit) => Err(EngineError::RecruitCannotBeDismissed),
            Some(PendingKind::Event) => self.acknowledge_event(),
        }
    }

    /// Mark an awaiting character as the one the player is about to resolve.
    ///
    /// # Errors
    ///
    /// [`EngineError::WrongStep`] outside Decision or
    /// [`EngineError::NotAwaitingDecision`].
    pub fn select_conflict_candidate(&mut self, card: &CardId) -> EngineResult<()> {
        self.ensure_running()?;
        resolution::conflict_target(&self.state, &self.catalog, card)?;
        self.state.selected_candidate = Some(card.clone());
        Ok(())
    }

    /// # Errors
    ///
    /// [`EngineError::GameAlreadyOver`].
    pub fn clear_conflict_selection(&mut self) -> EngineResult<()> {
        self.ensure_running()?;
        self.state.selected_candidate = None;
        Ok(())
    }

    /// Resolve one awaiting character with a single fatigue-adjusted roll.
    ///
    /// # Errors
    ///
    /// [`EngineError::WrongStep`] outside Decision,
    /// [`EngineError::NotAwaitingDecision`], [`EngineError::UnknownCard`], or
    /// [`EngineError::GameAlreadyOver`].
    pub fn resolve_conflict(&mut self, card: &CardId) -> EngineResult<ConflictReport> {
        self.ensure_running()?;
        resolution::resolve_decision_roll(
            &mut self.state,
            &self.catalog,
            &self.config,
            &mut self.dice,
            card,
        )
    }

    /// Resolve one awaiting character by rolling until the die meets its
    /// conflict value.
    ///
    /// # Errors
    ///
    /// Same as [`GameSession::resolve_conflict`].
    pub fn resolve_quick_conflict(&mut self, card: &CardId) -> EngineResult<ConflictReport> {
        self.ensure_running()?;
        resolution::resolve_quick_conflict(
            &mut self.state,
            &self.catalog,
            &self.config,
            &mut self.dice,
            card,
        )
    }

    /// Make `card` the active initiative. Returns the initiative it replaced.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidStepForSwap`] outside Preparation,
    /// [`EngineError::NotAnInitiative`], or [`EngineError::UnknownCard`].
    pub fn swap_initiative(&mut self, card: &CardId) -> EngineResult<Option<CardId>> {
        self.ensure_running()?;
        if self.state.step != DayStep::Preparation {
            return Err(EngineError::InvalidStepForSwap {
                current: self.state.step,
            });
        }
        self.ensure_kind(card, CardKind::Initiative)?;
        if self.state.deck.active_initiative() == Some(card) {
            return Ok(None);
        }
        let previous = self.state.deck.swap_initiative(card, self.state.step)?;
        self.state.push_log(LOG_INITIATIVE_SWAPPED);
        log::info!("initiative is now {card}");
        Ok(previous)
    }

    /// Play a card from the hand according to its kind.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInZone`] if the card is not in the hand,
    /// [`EngineError::ResolutionInProgress`] while a reveal is pending, and the
    /// swap errors for initiatives.
    pub fn play_from_hand(&mut self, card: &CardId) -> EngineResult<PlayOutcome> {
        self.ensure_running()?;
        if self.state.pending.is_some() {
            return Err(EngineError::ResolutionInProgress);
        }
        let kind = self
            .catalog
            .get(card)
            .map(|def| def.kind)
            .ok_or_else(|| EngineError::UnknownCard(card.clone()))?;
        self.ensure_in_hand(card)?;

        match kind {
            CardKind::Character => {
                let chance = self.config.played_character_errant_chance;
                let chance = if chance.is_finite() {
                    chance.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let errant = self.rng.gen_bool(chance);
                let enlisted = self.state.step == DayStep::Decision;
                let flags = TableFlags {
                    awaiting_decision: enlisted,
                    ..TableFlags::errant(errant)
                };
                self.state.deck.place_on_table(card, Zone::Hand, flags)?;
                if enlisted {
                    self.state.decision_round_participants.push(card.clone());
                }
                self.state.push_log(LOG_PLAYED_CHARACTER);
                Ok(PlayOutcome::Character { errant, enlisted })
            }
            CardKind::Event => {
                let displaced = self.state.deck.place_active_event(card, Zone::Hand)?;
                self.state.push_log(LOG_PLAYED_EVENT);
                Ok(PlayOutcome::Event { displaced })
            }
            CardKind::Talent => {
                let displaced = self.state.deck.place_active_talent(card, Zone::Hand)?;
                self.state.push_log(LOG_PLAYED_TALENT);
                Ok(PlayOutcome::Talent { displaced })
            }
            CardKind::Initiative => {
                let previous = self.swap_initiative(card)?;
                Ok(PlayOutcome::Initiative { previous })
            }
        }
    }

    /// Use a hand card's ability: cards with negative threat drive the horde
    /// back by that amount. Returns how much threat was removed.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotInZone`] if the card is not in the hand, or
    /// [`EngineError::GameAlreadyOver`].
    pub fn use_card_ability(&mut self, card: &CardId) -> EngineResult<u32> {
        self.ensure_running()?;
        let threat = self
            .catalog
            .get(card)
            .map(|def| def.threat_value)
            .ok_or_else(|| EngineError::UnknownCard(card.clone()))?;
        self.ensure_in_hand(card)?;
        let before = self.state.threat_count;
        if threat < 0 {
            self.state.add_threat(threat);
        }
        self.state.push_log(LOG_ABILITY_USED);
        Ok(before.saturating_sub(self.state.threat_count))
    }

    /// # Errors
    ///
    /// [`EngineError::GameAlreadyOver`].
    pub fn set_encounters_per_turn(&mut self, count: u32) -> EngineResult<u32> {
        self.ensure_running()?;
        self.state.encounters_per_turn = count.max(1);
        Ok(self.state.encounters_per_turn)
    }

    #[must_use]
    pub const fn outcome(&self) -> GameOutcome {
        self.state.outcome()
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Serializable view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        let available: Vec<CardId> = self
            .catalog
            .initiative_ids()
            .into_iter()
            .filter(|card| self.state.deck.active_initiative() != Some(card))
            .collect();
        self.state.snapshot(&available, self.config.log_history)
    }

    /// Apply a closure to the mutable game state, skipping every command
    /// check. Test-only: it exists to stage positions and is compiled only
    /// for this crate's tests or with the `testing` feature.
    #[cfg(any(test, feature = "testing"))]
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut self.state)
    }

    #[must_use]
    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn config(&self) -> &RulesConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn dice(&self) -> &D {
        &self.dice
    }

    /// Consume the session, returning the underlying game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }

    const fn ensure_running(&self) -> EngineResult<()> {
        if self.state.game_over {
            return Err(EngineError::GameAlreadyOver);
        }
        Ok(())
    }

    fn ensure_step(&self, expected: DayStep) -> EngineResult<()> {
        if self.state.step != expected {
            return Err(EngineError::WrongStep {
                expected,
                current: self.state.step,
            });
        }
        Ok(())
    }

    fn ensure_kind(&self, card: &CardId, kind: CardKind) -> EngineResult<()> {
        let def = self
            .catalog
            .get(card)
            .ok_or_else(|| EngineError::UnknownCard(card.clone()))?;
        if def.kind != kind {
            return Err(EngineError::NotAnInitiative(card.clone()));
        }
        Ok(())
    }

    fn ensure_in_hand(&self, card: &CardId) -> EngineResult<()> {
        if self.state.deck.zone_of(card) != Some(Zone::Hand) {
            return Err(EngineError::NotInZone {
                card: card.clone(),
                zone: Zone::Hand,
            });
        }
        Ok(())
    }
}

/// Shuffle the deck and grant one random talent and initiative.
fn deal(catalog: &CardCatalog, config: &RulesConfig, rng: &mut ChaCha20Rng) -> GameState {
    let order = shuffled(&catalog.deck_ids(), rng);
    let mut deck = DeckState::new(order);
    if let Some(talent) = catalog.talent_ids().choose(rng) {
        deck.grant(talent, Zone::ActiveTalent);
    }
    if let Some(initiative) = catalog.initiative_ids().choose(rng) {
        deck.grant(initiative, Zone::ActiveInitiative);
    }
    let mut state = GameState::new(deck, config.encounters_per_turn);
    state.push_log(LOG_SESSION_DEALT);
    state
}
