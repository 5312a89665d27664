//! Centralized rule constants for the Odisea Zombie engine.
//!
//! Tunables a host may want to adjust live in [`crate::config::RulesConfig`];
//! the values here are fixed by the tabletop rules and only change through
//! code review.

// Dice ---------------------------------------------------------------------
pub const DIE_FACES: u8 = 6;
/// Recruit roll that sends the character into the hand.
pub const RECRUIT_HAND_FACE: u8 = 1;
/// Recruit roll that shuffles the character back on top of the draw pile.
pub const RECRUIT_RETURN_FACE: u8 = 3;
/// Recruit roll that leaves the character errant on the table.
pub const RECRUIT_ERRANT_FACE: u8 = 4;

// Rule defaults ------------------------------------------------------------
pub(crate) const DEFAULT_VICTORY_TRAVEL: u32 = 20;
pub(crate) const DEFAULT_FATIGUE_LOSS_THRESHOLD: u32 = 6;
pub(crate) const DEFAULT_ENCOUNTER_ACTION_CAP: u32 = 3;
pub(crate) const DEFAULT_ENCOUNTERS_PER_TURN: u32 = 1;
pub(crate) const DEFAULT_CONFLICT_ATTEMPT_LIMIT: u32 = 12;
pub(crate) const DEFAULT_PREPARATION_FATIGUE_RELIEF: u32 = 2;
pub(crate) const DEFAULT_PLAYED_ERRANT_CHANCE: f64 = 0.35;
pub(crate) const DEFAULT_LOG_HISTORY: usize = 8;

// RNG stream domains -------------------------------------------------------
pub(crate) const DECK_STREAM_TAG: &[u8] = b"odisea-deck";
pub(crate) const DICE_STREAM_TAG: &[u8] = b"odisea-dice";
pub(crate) const SHARE_STREAM_TAG: &[u8] = b"odisea-share";

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_SESSION_DEALT: &str = "log.session.dealt";
pub(crate) const LOG_STEP_PREPARATION: &str = "log.step.preparation";
pub(crate) const LOG_STEP_ENCOUNTER: &str = "log.step.encounter";
pub(crate) const LOG_STEP_DECISION: &str = "log.step.decision";
pub(crate) const LOG_STEP_DECISION_EMPTY: &str = "log.step.decision.empty";
pub(crate) const LOG_STEP_RISK: &str = "log.step.risk";
pub(crate) const LOG_STEP_DEFENSE: &str = "log.step.defense";
pub(crate) const LOG_STEP_TRAVEL: &str = "log.step.travel";
pub(crate) const LOG_VICTORY: &str = "log.victory";
pub(crate) const LOG_DEFEAT_FATIGUE: &str = "log.defeat.fatigue";
pub(crate) const LOG_ENCOUNTER_CAP: &str = "log.encounter.cap-reached";
pub(crate) const LOG_DECK_EMPTY: &str = "log.deck.empty";
pub(crate) const LOG_REVEAL_PLACED: &str = "log.reveal.placed";
pub(crate) const LOG_REVEAL_EVENT: &str = "log.reveal.event";
pub(crate) const LOG_REVEAL_CHARACTER: &str = "log.reveal.character";
pub(crate) const LOG_EVENT_APPLIED: &str = "log.event.applied";
pub(crate) const LOG_RECRUIT_HAND: &str = "log.recruit.hand";
pub(crate) const LOG_RECRUIT_RETURNED: &str = "log.recruit.returned";
pub(crate) const LOG_RECRUIT_ERRANT: &str = "log.recruit.errant";
pub(crate) const LOG_RECRUIT_ALLIED: &str = "log.recruit.allied";
pub(crate) const LOG_CONFLICT_ROLL: &str = "log.conflict.roll";
pub(crate) const LOG_CONFLICT_RETURNED: &str = "log.conflict.returned";
pub(crate) const LOG_CONFLICT_HELD: &str = "log.conflict.held";
pub(crate) const LOG_CONFLICT_EXHAUSTED: &str = "log.conflict.exhausted";
pub(crate) const LOG_DECISION_DISCARDED: &str = "log.decision.discarded";
pub(crate) const LOG_DECISION_HELD: &str = "log.decision.held";
pub(crate) const LOG_DECISION_CONFLICT: &str = "log.decision.conflict";
pub(crate) const LOG_ROUND_RESTART: &str = "log.round.restart";
pub(crate) const LOG_ROUND_COMPLETE: &str = "log.round.complete";
pub(crate) const LOG_INITIATIVE_SWAPPED: &str = "log.initiative.swapped";
pub(crate) const LOG_PLAYED_CHARACTER: &str = "log.play.character";
pub(crate) const LOG_PLAYED_EVENT: &str = "log.play.event";
pub(crate) const LOG_PLAYED_TALENT: &str = "log.play.talent";
pub(crate) const LOG_ABILITY_USED: &str = "log.ability.used";
