//! Dice-driven resolution: reveals, recruitment, conflicts, risk and defense.
//!
//! Every function validates its inputs before the first mutation so a
//! rejected call leaves the state untouched.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::card::{CardId, CardKind, TableFlags};
use crate::catalog::CardCatalog;
use crate::config::RulesConfig;
use crate::constants::{
    LOG_CONFLICT_EXHAUSTED, LOG_CONFLICT_HELD, LOG_CONFLICT_RETURNED, LOG_CONFLICT_ROLL,
    LOG_DECISION_CONFLICT, LOG_DECISION_DISCARDED, LOG_DECISION_HELD, LOG_DECK_EMPTY,
    LOG_ENCOUNTER_CAP, LOG_EVENT_APPLIED, LOG_RECRUIT_ALLIED, LOG_RECRUIT_ERRANT,
    LOG_RECRUIT_HAND, LOG_RECRUIT_RETURNED, LOG_REVEAL_CHARACTER, LOG_REVEAL_EVENT,
    LOG_REVEAL_PLACED, LOG_ROUND_COMPLETE, LOG_ROUND_RESTART, LOG_STEP_DEFENSE, LOG_STEP_RISK,
    RECRUIT_ERRANT_FACE, RECRUIT_HAND_FACE, RECRUIT_RETURN_FACE,
};
use crate::day::DayStep;
use crate::deck::Zone;
use crate::dice::DieSource;
use crate::error::{EngineError, EngineResult};
use crate::state::{GameState, PendingKind, PendingResolution};

/// Result of one reveal action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "card")]
pub enum RevealOutcome {
    /// Drawn and placed on the table with nothing to await.
    Placed(CardId),
    /// A character is waiting for [`crate::GameSession::resolve_recruit`].
    AwaitingRecruit(CardId),
    /// An event is waiting for [`crate::GameSession::acknowledge_event`].
    AwaitingAcknowledgment(CardId),
    /// The day's encounter actions are used up; nothing was drawn.
    CapReached,
}

impl RevealOutcome {
    /// Pending-resolution token implied by this reveal.
    #[must_use]
    pub fn pending(&self) -> Option<PendingResolution> {
        match self {
            Self::AwaitingRecruit(card) => Some(PendingResolution {
                kind: PendingKind::Recruit,
                card: card.clone(),
            }),
            Self::AwaitingAcknowledgment(card) => Some(PendingResolution {
                kind: PendingKind::Event,
                card: card.clone(),
            }),
            Self::Placed(_) | Self::CapReached => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecruitPlacement {
    Hand,
    ReturnedToDeck,
    Errant,
    Allied,
}

impl RecruitPlacement {
    #[must_use]
    pub const fn from_face(face: u8) -> Self {
        match face {
            RECRUIT_HAND_FACE => Self::Hand,
            RECRUIT_RETURN_FACE => Self::ReturnedToDeck,
            RECRUIT_ERRANT_FACE => Self::Errant,
            _ => Self::Allied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecruitOutcome {
    pub card: CardId,
    pub die: u8,
    pub placement: RecruitPlacement,
    /// Signed threat applied by the roll (zero for hand and allied).
    pub threat_delta: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAcknowledgment {
    pub card: CardId,
    /// Previously active event, now on the discard pile.
    pub displaced: Option<CardId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictOutcome {
    /// Beat the conflict value in a quick conflict: back on top of the draw pile.
    Returned,
    /// Beat the conflict value on a decision roll: discarded from the table.
    Discarded,
    /// Matched the conflict value: stays on the table, decided for the day.
    Held,
    /// Stays on the table in conflict and will be revisited next round.
    InConflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Other participants still owe a resolution.
    Ongoing,
    /// Everyone acted and some characters remain in conflict; a new round began.
    Restarted,
    /// No conflicts remain; the Decision step may be left.
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub card: CardId,
    pub rolls: SmallVec<[u8; 4]>,
    /// Roll after the fatigue penalty; decision rolls only.
    pub adjusted: Option<u8>,
    pub outcome: ConflictOutcome,
    pub threat_added: u32,
    pub round: RoundStatus,
}

/// Draw one card and dispatch it. A cap hit is reported, not an error.
///
/// # Errors
///
/// [`EngineError::ResolutionInProgress`] while a reveal is pending, or
/// [`EngineError::EmptyDeck`] when nothing is left to draw. Both leave the
/// state untouched.
pub(crate) fn reveal_one(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
) -> EngineResult<RevealOutcome> {
    if state.pending.is_some() {
        return Err(EngineError::ResolutionInProgress);
    }
    if state.encounter_actions_today >= config.encounter_action_cap {
        return Ok(RevealOutcome::CapReached);
    }
    let card = state.deck.draw_top()?;
    state.encounter_actions_today += 1;
    dispatch_reveal(state, catalog, card)
}

fn dispatch_reveal(
    state: &mut GameState,
    catalog: &CardCatalog,
    card: CardId,
) -> EngineResult<RevealOutcome> {
    match catalog.get(&card).map(|def| def.kind) {
        Some(CardKind::Event) => {
            state.pending = Some(PendingResolution {
                kind: PendingKind::Event,
                card: card.clone(),
            });
            state.push_log(LOG_REVEAL_EVENT);
            log::info!("revealed event {card}");
            Ok(RevealOutcome::AwaitingAcknowledgment(card))
        }
        Some(CardKind::Character) => {
            state.pending = Some(PendingResolution {
                kind: PendingKind::Recruit,
                card: card.clone(),
            });
            state.push_log(LOG_REVEAL_CHARACTER);
            log::info!("revealed character {card}");
            Ok(RevealOutcome::AwaitingRecruit(card))
        }
        _ => {
            state
                .deck
                .place_on_table(&card, Zone::Revealed, TableFlags::default())?;
            state.push_log(LOG_REVEAL_PLACED);
            Ok(RevealOutcome::Placed(card))
        }
    }
}

/// Perform the reveals the current Encounter entry still owes, stopping at
/// the first one that needs a resolution. A cap hit or an empty draw pile
/// forfeits the remaining reveals.
pub(crate) fn continue_reveals(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
) -> EngineResult<()> {
    while state.reveals_owed > 0 && state.pending.is_none() {
        match reveal_one(state, catalog, config) {
            Ok(RevealOutcome::CapReached) => {
                state.push_log(LOG_ENCOUNTER_CAP);
                log::warn!(
                    "encounter cap of {} reached; skipping {} reveal(s)",
                    config.encounter_action_cap,
                    state.reveals_owed
                );
                state.reveals_owed = 0;
            }
            Err(EngineError::EmptyDeck) => {
                state.push_log(LOG_DECK_EMPTY);
                log::warn!("draw pile empty; skipping {} reveal(s)", state.reveals_owed);
                state.reveals_owed = 0;
            }
            Err(err) => return Err(err),
            Ok(_) => state.reveals_owed -= 1,
        }
    }
    Ok(())
}

fn take_pending(state: &GameState, requested: PendingKind) -> EngineResult<CardId> {
    let pending = state
        .pending
        .as_ref()
        .ok_or(EngineError::NoPendingResolution)?;
    if pending.kind != requested {
        return Err(EngineError::WrongResolution {
            pending: pending.kind.as_str(),
            requested: requested.as_str(),
        });
    }
    Ok(pending.card.clone())
}

/// Single recruitment roll for the pending character.
///
/// # Errors
///
/// [`EngineError::NoPendingResolution`] or [`EngineError::WrongResolution`]
/// when no character is waiting.
pub(crate) fn resolve_recruit(
    state: &mut GameState,
    catalog: &CardCatalog,
    dice: &mut impl DieSource,
) -> EngineResult<RecruitOutcome> {
    let card = take_pending(state, PendingKind::Recruit)?;
    let threat = catalog.get(&card).map_or(0, |def| def.threat_value);
    let die = dice.roll_d6();
    let placement = RecruitPlacement::from_face(die);
    log::debug!("recruit roll for {card}: {die}");

    let threat_delta = match placement {
        RecruitPlacement::Hand => {
            state.deck.move_card(&card, Zone::Revealed, Zone::Hand)?;
            state.push_log(LOG_RECRUIT_HAND);
            0
        }
        RecruitPlacement::ReturnedToDeck => {
            state.deck.move_card(&card, Zone::Revealed, Zone::DrawPile)?;
            state.push_log(LOG_RECRUIT_RETURNED);
            threat
        }
        RecruitPlacement::Errant => {
            state
                .deck
                .place_on_table(&card, Zone::Revealed, TableFlags::errant(true))?;
            state.push_log(LOG_RECRUIT_ERRANT);
            threat
        }
        RecruitPlacement::Allied => {
            state
                .deck
                .place_on_table(&card, Zone::Revealed, TableFlags::errant(false))?;
            state.push_log(LOG_RECRUIT_ALLIED);
            0
        }
    };
    state.add_threat(threat_delta);
    state.pending = None;
    Ok(RecruitOutcome {
        card,
        die,
        placement,
        threat_delta,
    })
}

/// Put the pending event into the active slot, discarding the previous one.
///
/// # Errors
///
/// [`EngineError::NoPendingResolution`] or [`EngineError::WrongResolution`]
/// when no event is waiting.
pub(crate) fn acknowledge_event(state: &mut GameState) -> EngineResult<EventAcknowledgment> {
    let card = take_pending(state, PendingKind::Event)?;
    let displaced = state.deck.place_active_event(&card, Zone::Revealed)?;
    state.pending = None;
    state.push_log(LOG_EVENT_APPLIED);
    log::info!("event {card} is now active");
    Ok(EventAcknowledgment { card, displaced })
}

/// Confirm `card` may be resolved now and return its (conflict, threat) values.
pub(crate) fn conflict_target(
    state: &GameState,
    catalog: &CardCatalog,
    card: &CardId,
) -> EngineResult<(i32, i32)> {
    if state.step != DayStep::Decision {
        return Err(EngineError::WrongStep {
            expected: DayStep::Decision,
            current: state.step,
        });
    }
    if state.pending.is_some() {
        return Err(EngineError::ResolutionInProgress);
    }
    let def = catalog
        .get(card)
        .ok_or_else(|| EngineError::UnknownCard(card.clone()))?;
    let awaiting = state
        .deck
        .table_entry(card)
        .is_some_and(|entry| entry.flags.awaiting_decision);
    if !awaiting || !state.is_participant(card) {
        return Err(EngineError::NotAwaitingDecision(card.clone()));
    }
    Ok((def.conflict_value, def.threat_value))
}

/// Decision roll: one die, reduced by current fatigue, against the conflict value.
pub(crate) fn resolve_decision_roll(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
    dice: &mut impl DieSource,
    card: &CardId,
) -> EngineResult<ConflictReport> {
    let (conflict, threat) = conflict_target(state, catalog, card)?;
    let roll = dice.roll_d6();
    let penalty = i32::try_from(state.fatigue_count).unwrap_or(i32::MAX);
    let adjusted = i32::from(roll).saturating_sub(penalty).max(0);
    log::debug!("decision roll for {card}: {roll} (adjusted {adjusted} vs {conflict})");

    let before = state.threat_count;
    let outcome = if adjusted > conflict {
        state.deck.move_card(card, Zone::Table, Zone::DiscardPile)?;
        state.push_log(LOG_DECISION_DISCARDED);
        ConflictOutcome::Discarded
    } else if adjusted == conflict {
        state.deck.update_flags(card, mark_decided)?;
        state.add_threat(threat);
        state.push_log(LOG_DECISION_HELD);
        ConflictOutcome::Held
    } else {
        state.deck.update_flags(card, mark_in_conflict)?;
        state.add_threat(threat);
        state.push_log(LOG_DECISION_CONFLICT);
        ConflictOutcome::InConflict
    };
    let threat_added = state.threat_count.saturating_sub(before);
    Ok(finish_conflict(
        state,
        catalog,
        config,
        card,
        SmallVec::from_slice(&[roll]),
        u8::try_from(adjusted).ok(),
        outcome,
        threat_added,
    ))
}

/// Quick conflict: roll until the die meets or beats the conflict value,
/// adding every lower roll to the threat. Bounded by `conflict_attempt_limit`.
pub(crate) fn resolve_quick_conflict(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
    dice: &mut impl DieSource,
    card: &CardId,
) -> EngineResult<ConflictReport> {
    let (conflict, _) = conflict_target(state, catalog, card)?;
    let mut rolls: SmallVec<[u8; 4]> = SmallVec::new();
    let mut threat_added = 0u32;
    let mut outcome = None;
    for _ in 0..config.conflict_attempt_limit {
        let roll = dice.roll_d6();
        rolls.push(roll);
        let value = i32::from(roll);
        if value > conflict {
            outcome = Some(ConflictOutcome::Returned);
            break;
        }
        if value == conflict {
            outcome = Some(ConflictOutcome::Held);
            break;
        }
        state.add_threat(value);
        threat_added += u32::from(roll);
        state.push_log(LOG_CONFLICT_ROLL);
    }
    log::debug!("quick conflict for {card}: rolls {rolls:?} vs {conflict}");

    let outcome = match outcome {
        Some(ConflictOutcome::Returned) => {
            state.deck.move_card(card, Zone::Table, Zone::DrawPile)?;
            state.push_log(LOG_CONFLICT_RETURNED);
            ConflictOutcome::Returned
        }
        Some(_) => {
            state.deck.update_flags(card, mark_decided)?;
            state.push_log(LOG_CONFLICT_HELD);
            ConflictOutcome::Held
        }
        None => {
            state.deck.update_flags(card, mark_in_conflict)?;
            state.push_log(LOG_CONFLICT_EXHAUSTED);
            log::warn!(
                "conflict for {card} unresolved after {} attempts",
                config.conflict_attempt_limit
            );
            ConflictOutcome::InConflict
        }
    };
    Ok(finish_conflict(
        state,
        catalog,
        config,
        card,
        rolls,
        None,
        outcome,
        threat_added,
    ))
}

#[allow(clippy::too_many_arguments)]
fn finish_conflict(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
    card: &CardId,
    rolls: SmallVec<[u8; 4]>,
    adjusted: Option<u8>,
    outcome: ConflictOutcome,
    threat_added: u32,
) -> ConflictReport {
    state.drop_participant(card);
    if state.selected_candidate.as_ref() == Some(card) {
        state.selected_candidate = None;
    }
    let round = close_round_if_complete(state, catalog, config);
    ConflictReport {
        card: card.clone(),
        rolls,
        adjusted,
        outcome,
        threat_added,
        round,
    }
}

const fn mark_decided(flags: TableFlags) -> TableFlags {
    TableFlags {
        awaiting_decision: false,
        in_conflict: false,
        decided_this_day: true,
        acted_this_round: true,
        ..flags
    }
}

const fn mark_in_conflict(flags: TableFlags) -> TableFlags {
    TableFlags {
        awaiting_decision: false,
        in_conflict: true,
        decided_this_day: false,
        acted_this_round: true,
        ..flags
    }
}

/// Close the decision round once every participant has acted. Characters
/// still in conflict start a new round at the cost of one fatigue.
pub(crate) fn close_round_if_complete(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
) -> RoundStatus {
    state.decision_round_participants.retain(|card| {
        state
            .deck
            .table_entry(card)
            .is_some_and(|entry| entry.flags.awaiting_decision && !entry.flags.acted_this_round)
    });
    if !state.decision_round_participants.is_empty() {
        return RoundStatus::Ongoing;
    }

    let in_conflict: SmallVec<[CardId; 8]> = state
        .table_characters(catalog)
        .filter(|entry| entry.flags.in_conflict)
        .map(|entry| entry.card.clone())
        .collect();
    if in_conflict.is_empty() {
        state.deck.update_table_flags(
            |_| true,
            |flags| TableFlags {
                awaiting_decision: false,
                in_conflict: false,
                acted_this_round: false,
                ..flags
            },
        );
        state.selected_candidate = None;
        state.push_log(LOG_ROUND_COMPLETE);
        log::info!("decision round complete");
        return RoundStatus::Complete;
    }

    state.add_fatigue(1, config.fatigue_loss_threshold);
    state.deck.update_table_flags(
        |entry| in_conflict.contains(&entry.card),
        |flags| TableFlags {
            awaiting_decision: true,
            acted_this_round: false,
            ..flags
        },
    );
    log::info!(
        "new decision round for {} character(s) in conflict",
        in_conflict.len()
    );
    state.decision_round_participants = in_conflict;
    state.push_log(LOG_ROUND_RESTART);
    RoundStatus::Restarted
}

/// Risk step: one die plus the threat of every allied table character.
pub(crate) fn apply_risk(
    state: &mut GameState,
    catalog: &CardCatalog,
    dice: &mut impl DieSource,
) -> u8 {
    let die = dice.roll_d6();
    let allied: i32 = state
        .table_characters(catalog)
        .filter(|entry| !entry.flags.is_errant)
        .filter_map(|entry| catalog.get(&entry.card))
        .map(|def| def.threat_value)
        .sum();
    state.add_threat(i32::from(die) + allied);
    state.push_log(LOG_STEP_RISK);
    log::info!("risk: die {die} + allied {allied}; threat now {}", state.threat_count);
    die
}

/// Defense step: one die off the threat, then one fatigue for the day.
pub(crate) fn apply_defense(
    state: &mut GameState,
    config: &RulesConfig,
    dice: &mut impl DieSource,
) -> u8 {
    let die = dice.roll_d6();
    state.threat_count = state.threat_count.saturating_sub(u32::from(die));
    state.push_log(LOG_STEP_DEFENSE);
    log::info!(
        "defense: die {die}; threat now {}, fatigue {}",
        state.threat_count,
        state.fatigue_count + 1
    );
    state.add_fatigue(1, config.fatigue_loss_threshold);
    die
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::DeckState;
    use crate::dice::ScriptedDice;

    const CATALOG: &str = r#"{
        "Personajes": {
            "Ana": { "id": 1, "Amenaza": 2, "Conflicto": 3 },
            "Beto": { "id": 2, "Amenaza": 1, "Conflicto": 4 },
            "Vigia": { "id": 3, "Amenaza": -1, "Conflicto": 2 }
        },
        "Eventos": { "Niebla": {}, "Tormenta": {} }
    }"#;

    fn catalog() -> CardCatalog {
        CardCatalog::from_json(CATALOG).unwrap()
    }

    fn id(raw: &str) -> CardId {
        CardId::from(raw)
    }

    fn state_with(draw: &[&str]) -> GameState {
        let mut state = GameState::new(DeckState::new(draw.iter().map(|s| id(s)).collect()), 1);
        state.step = DayStep::Encounter;
        state
    }

    fn recruit_with(face: u8) -> (GameState, RecruitOutcome) {
        let catalog = catalog();
        let mut state = state_with(&["character-1", "event-niebla"]);
        let reveal = reveal_one(&mut state, &catalog, &RulesConfig::default()).unwrap();
        assert_eq!(reveal, RevealOutcome::AwaitingRecruit(id("character-1")));
        let outcome = resolve_recruit(&mut state, &catalog, &mut ScriptedDice::new([face])).unwrap();
        (state, outcome)
    }

    #[test]
    fn recruit_one_goes_to_hand() {
        let (state, outcome) = recruit_with(1);
        assert_eq!(outcome.placement, RecruitPlacement::Hand);
        assert_eq!(state.deck.zone_of(&id("character-1")), Some(Zone::Hand));
        assert_eq!(state.threat_count, 0);
        assert!(state.pending.is_none());
    }

    #[test]
    fn recruit_three_returns_to_top_and_adds_threat() {
        let (state, outcome) = recruit_with(3);
        assert_eq!(outcome.placement, RecruitPlacement::ReturnedToDeck);
        assert_eq!(state.deck.draw_pile().front(), Some(&id("character-1")));
        assert_eq!(state.threat_count, 2);
    }

    #[test]
    fn recruit_four_is_errant_with_threat() {
        let (state, _) = recruit_with(4);
        let entry = state.deck.table_entry(&id("character-1")).unwrap();
        assert!(entry.flags.is_errant);
        assert_eq!(state.threat_count, 2);
    }

    #[test]
    fn other_faces_ally_without_threat() {
        for face in [2, 5, 6] {
            let (state, outcome) = recruit_with(face);
            assert_eq!(outcome.placement, RecruitPlacement::Allied);
            let entry = state.deck.table_entry(&id("character-1")).unwrap();
            assert!(!entry.flags.is_errant);
            assert_eq!(state.threat_count, 0);
        }
    }

    #[test]
    fn acknowledging_the_wrong_kind_is_rejected() {
        let catalog = catalog();
        let mut state = state_with(&["character-1"]);
        reveal_one(&mut state, &catalog, &RulesConfig::default()).unwrap();
        let before = state.clone();
        let err = acknowledge_event(&mut state).unwrap_err();
        assert!(matches!(err, EngineError::WrongResolution { .. }));
        assert_eq!(state, before);
    }

    #[test]
    fn events_wait_for_acknowledgment_then_replace() {
        let catalog = catalog();
        let config = RulesConfig::default();
        let mut state = state_with(&["event-niebla", "event-tormenta"]);
        reveal_one(&mut state, &catalog, &config).unwrap();
        assert_eq!(
            reveal_one(&mut state, &catalog, &config),
            Err(EngineError::ResolutionInProgress)
        );
        assert_eq!(acknowledge_event(&mut state).unwrap().displaced, None);
        reveal_one(&mut state, &catalog, &config).unwrap();
        let ack = acknowledge_event(&mut state).unwrap();
        assert_eq!(ack.displaced, Some(id("event-niebla")));
        assert_eq!(state.deck.discard_pile().front(), Some(&id("event-niebla")));
    }

    #[test]
    fn owed_reveals_stop_at_the_cap() {
        let catalog = catalog();
        let config = RulesConfig {
            encounter_action_cap: 1,
            ..RulesConfig::default()
        };
        let mut state = state_with(&["event-niebla", "event-tormenta"]);
        state.reveals_owed = 2;
        continue_reveals(&mut state, &catalog, &config).unwrap();
        assert_eq!(state.reveals_owed, 1);
        acknowledge_event(&mut state).unwrap();
        continue_reveals(&mut state, &catalog, &config).unwrap();
        assert_eq!(state.reveals_owed, 0);
        assert_eq!(state.deck.draw_pile().len(), 1);
        assert!(state.logs.iter().any(|key| key == LOG_ENCOUNTER_CAP));
    }

    fn decision_state(catalog: &CardCatalog, cards: &[&str]) -> GameState {
        let mut state = GameState::new(DeckState::default(), 1);
        for card in cards {
            state.deck.grant(&id(card), Zone::Table);
            state
                .deck
                .update_flags(&id(card), |flags| TableFlags {
                    awaiting_decision: true,
                    ..flags
                })
                .unwrap();
            state.decision_round_participants.push(id(card));
        }
        state.step = DayStep::Decision;
        assert_eq!(state.pending_decisions(catalog), cards.len());
        state
    }

    #[test]
    fn quick_conflict_adds_low_rolls_until_it_beats_the_value() {
        let catalog = catalog();
        let mut state = decision_state(&catalog, &["character-1"]);
        let mut dice = ScriptedDice::new([1, 2, 5]);
        let report = resolve_quick_conflict(
            &mut state,
            &catalog,
            &RulesConfig::default(),
            &mut dice,
            &id("character-1"),
        )
        .unwrap();
        assert_eq!(report.outcome, ConflictOutcome::Returned);
        assert_eq!(report.rolls.as_slice(), &[1, 2, 5]);
        assert_eq!(state.threat_count, 3);
        assert_eq!(state.deck.draw_pile().front(), Some(&id("character-1")));
        assert_eq!(report.round, RoundStatus::Complete);
    }

    #[test]
    fn quick_conflict_roll_equal_to_the_value_holds() {
        let catalog = catalog();
        let mut state = decision_state(&catalog, &["character-1"]);
        state.threat_count = 4;
        let report = resolve_quick_conflict(
            &mut state,
            &catalog,
            &RulesConfig::default(),
            &mut ScriptedDice::new([3]),
            &id("character-1"),
        )
        .unwrap();
        assert_eq!(report.outcome, ConflictOutcome::Held);
        assert_eq!(report.rolls.as_slice(), &[3]);
        assert_eq!(state.threat_count, 4);
        let entry = state.deck.table_entry(&id("character-1")).unwrap();
        assert!(entry.flags.decided_this_day);
        assert!(!entry.flags.in_conflict);
        assert_eq!(report.round, RoundStatus::Complete);
    }

    #[test]
    fn quick_conflict_is_bounded() {
        let catalog = catalog();
        let config = RulesConfig {
            conflict_attempt_limit: 4,
            ..RulesConfig::default()
        };
        let mut state = decision_state(&catalog, &["character-2"]);
        let report = resolve_quick_conflict(
            &mut state,
            &catalog,
            &config,
            &mut ScriptedDice::new([1]),
            &id("character-2"),
        )
        .unwrap();
        assert_eq!(report.outcome, ConflictOutcome::InConflict);
        assert_eq!(report.rolls.len(), 4);
        assert_eq!(state.threat_count, 4);
        assert_eq!(report.round, RoundStatus::Restarted);
        assert_eq!(state.fatigue_count, 1);
        assert!(state.is_participant(&id("character-2")));
    }

    #[test]
    fn decision_roll_subtracts_fatigue() {
        let catalog = catalog();
        let config = RulesConfig::default();
        let mut state = decision_state(&catalog, &["character-1", "character-2"]);
        state.fatigue_count = 2;

        // 5 - 2 = 3 matches Ana's conflict value.
        let held = resolve_decision_roll(
            &mut state,
            &catalog,
            &config,
            &mut ScriptedDice::new([5]),
            &id("character-1"),
        )
        .unwrap();
        assert_eq!(held.adjusted, Some(3));
        assert_eq!(held.outcome, ConflictOutcome::Held);
        assert_eq!(held.round, RoundStatus::Ongoing);
        assert_eq!(state.threat_count, 2);

        // 1 - 2 floors at 0, below Beto's 4.
        let stuck = resolve_decision_roll(
            &mut state,
            &catalog,
            &config,
            &mut ScriptedDice::new([1]),
            &id("character-2"),
        )
        .unwrap();
        assert_eq!(stuck.adjusted, Some(0));
        assert_eq!(stuck.outcome, ConflictOutcome::InConflict);
        assert_eq!(stuck.round, RoundStatus::Restarted);
        assert_eq!(state.threat_count, 3);
        assert_eq!(state.fatigue_count, 3);
        assert_eq!(state.decision_round_participants.as_slice(), &[id("character-2")]);

        let done = resolve_decision_roll(
            &mut state,
            &catalog,
            &config,
            &mut ScriptedDice::new([6]),
            &id("character-2"),
        )
        .unwrap();
        // 6 - 3 = 3 is below 4 again; fatigue keeps climbing toward the loss.
        assert_eq!(done.outcome, ConflictOutcome::InConflict);
        assert_eq!(state.fatigue_count, 4);
    }

    #[test]
    fn decision_roll_above_the_value_discards() {
        let catalog = catalog();
        let mut state = decision_state(&catalog, &["character-3"]);
        let report = resolve_decision_roll(
            &mut state,
            &catalog,
            &RulesConfig::default(),
            &mut ScriptedDice::new([6]),
            &id("character-3"),
        )
        .unwrap();
        assert_eq!(report.outcome, ConflictOutcome::Discarded);
        assert_eq!(state.deck.zone_of(&id("character-3")), Some(Zone::DiscardPile));
        assert_eq!(report.round, RoundStatus::Complete);
        assert_eq!(state.pending_decisions(&catalog), 0);
    }

    #[test]
    fn conflicts_require_an_awaiting_participant() {
        let catalog = catalog();
        let mut state = decision_state(&catalog, &["character-1"]);
        let before = state.clone();
        let err = resolve_decision_roll(
            &mut state,
            &catalog,
            &RulesConfig::default(),
            &mut ScriptedDice::new([3]),
            &id("character-2"),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::NotAwaitingDecision(id("character-2")));
        assert_eq!(state, before);

        state.step = DayStep::Risk;
        let err = resolve_quick_conflict(
            &mut state,
            &catalog,
            &RulesConfig::default(),
            &mut ScriptedDice::new([3]),
            &id("character-1"),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::WrongStep { .. }));
    }

    #[test]
    fn risk_sums_allied_threat_only() {
        let catalog = catalog();
        let mut state = GameState::new(DeckState::default(), 1);
        state.deck.grant(&id("character-1"), Zone::Table);
        state.deck.grant(&id("character-2"), Zone::Table);
        state
            .deck
            .update_flags(&id("character-2"), |_| TableFlags::errant(true))
            .unwrap();
        let die = apply_risk(&mut state, &catalog, &mut ScriptedDice::new([4]));
        assert_eq!(die, 4);
        assert_eq!(state.threat_count, 6);
    }

    #[test]
    fn risk_with_negative_allies_lowers_threat() {
        let catalog = CardCatalog::from_json(
            r#"{
                "Personajes": {
                    "Guia": {"id": 1, "Amenaza": -1, "Conflicto": 2},
                    "Medica": {"id": 2, "Amenaza": -2, "Conflicto": 3}
                }
            }"#,
        )
        .unwrap();
        let mut state = GameState::new(DeckState::default(), 1);
        state.threat_count = 5;
        state.deck.grant(&id("character-1"), Zone::Table);
        state.deck.grant(&id("character-2"), Zone::Table);
        apply_risk(&mut state, &catalog, &mut ScriptedDice::new([1]));
        assert_eq!(state.threat_count, 3);

        state.threat_count = 1;
        apply_risk(&mut state, &catalog, &mut ScriptedDice::new([1]));
        assert_eq!(state.threat_count, 0);
    }

    #[test]
    fn defense_floors_threat_and_costs_fatigue() {
        let mut state = GameState::new(DeckState::default(), 1);
        state.threat_count = 2;
        state.fatigue_count = 5;
        apply_defense(&mut state, &RulesConfig::default(), &mut ScriptedDice::new([6]));
        assert_eq!(state.threat_count, 0);
        assert_eq!(state.fatigue_count, 6);
        assert!(state.game_over);
    }
}
