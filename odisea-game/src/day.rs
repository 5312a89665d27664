//! The six-step day cycle, its transition guards, and step entry actions.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

use crate::card::{CardId, TableFlags};
use crate::catalog::CardCatalog;
use crate::config::RulesConfig;
use crate::constants::{
    LOG_STEP_DECISION, LOG_STEP_DECISION_EMPTY, LOG_STEP_ENCOUNTER, LOG_STEP_PREPARATION,
    LOG_STEP_TRAVEL,
};
use crate::dice::DieSource;
use crate::error::{EngineError, EngineResult};
use crate::resolution::{apply_defense, apply_risk, continue_reveals};
use crate::state::GameState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DayStep {
    /// Before the first day starts.
    #[default]
    None,
    Preparation,
    Encounter,
    Decision,
    Risk,
    Defense,
    Travel,
}

impl DayStep {
    /// Steps of one day in order.
    pub const CYCLE: [Self; 6] = [
        Self::Preparation,
        Self::Encounter,
        Self::Decision,
        Self::Risk,
        Self::Defense,
        Self::Travel,
    ];

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::None | Self::Travel => Self::Preparation,
            Self::Preparation => Self::Encounter,
            Self::Encounter => Self::Decision,
            Self::Decision => Self::Risk,
            Self::Risk => Self::Defense,
            Self::Defense => Self::Travel,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Preparation => "preparation",
            Self::Encounter => "encounter",
            Self::Decision => "decision",
            Self::Risk => "risk",
            Self::Defense => "defense",
            Self::Travel => "travel",
        }
    }
}

impl fmt::Display for DayStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayStep {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "preparation" => Ok(Self::Preparation),
            "encounter" => Ok(Self::Encounter),
            "decision" => Ok(Self::Decision),
            "risk" => Ok(Self::Risk),
            "defense" => Ok(Self::Defense),
            "travel" => Ok(Self::Travel),
            _ => Err(()),
        }
    }
}

/// Leave the pre-game state by entering the first Preparation.
pub(crate) fn start_day(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
    dice: &mut impl DieSource,
) -> EngineResult<DayStep> {
    if state.game_over {
        return Err(EngineError::GameAlreadyOver);
    }
    if state.step != DayStep::None {
        return Err(EngineError::AlreadyStarted);
    }
    enter(state, DayStep::Preparation, catalog, config, dice)?;
    Ok(DayStep::Preparation)
}

/// Move to the next step after checking the transition guards.
pub(crate) fn advance(
    state: &mut GameState,
    catalog: &CardCatalog,
    config: &RulesConfig,
    dice: &mut impl DieSource,
) -> EngineResult<DayStep> {
    if state.game_over {
        return Err(EngineError::GameAlreadyOver);
    }
    if state.pending.is_some() {
        return Err(EngineError::ResolutionInProgress);
    }
    if state.step == DayStep::Decision {
        let pending = state.pending_decisions(catalog);
        if pending > 0 {
            return Err(EngineError::PendingDecisions { pending });
        }
    }
    let next = state.step.next();
    enter(state, next, catalog, config, dice)?;
    Ok(next)
}

fn enter(
    state: &mut GameState,
    step: DayStep,
    catalog: &CardCatalog,
    config: &RulesConfig,
    dice: &mut impl DieSource,
) -> EngineResult<()> {
    log::info!("day {}: entering {step}", state.day);
    state.step = step;
    state.selected_candidate = None;
    match step {
        DayStep::None => {}
        DayStep::Preparation => enter_preparation(state, config),
        DayStep::Encounter => {
            state.push_log(LOG_STEP_ENCOUNTER);
            state.reveals_owed = state.encounters_per_turn.max(1);
            continue_reveals(state, catalog, config)?;
        }
        DayStep::Decision => enter_decision(state, catalog),
        DayStep::Risk => {
            apply_risk(state, catalog, dice);
        }
        DayStep::Defense => {
            apply_defense(state, config, dice);
        }
        DayStep::Travel => {
            state.push_log(LOG_STEP_TRAVEL);
            state.record_travel(config.victory_travel);
            state.day = state.day.saturating_add(1);
            state.encounter_actions_today = 0;
        }
    }
    Ok(())
}

fn enter_preparation(state: &mut GameState, config: &RulesConfig) {
    state.relieve_fatigue(config.preparation_fatigue_relief);
    state.deck.update_table_flags(
        |_| true,
        |flags| TableFlags {
            decided_this_day: false,
            awaiting_decision: false,
            ..flags
        },
    );
    state.push_log(LOG_STEP_PREPARATION);
}

fn enter_decision(state: &mut GameState, catalog: &CardCatalog) {
    let participants: SmallVec<[CardId; 8]> = state
        .table_characters(catalog)
        .filter(|entry| !entry.flags.decided_this_day)
        .map(|entry| entry.card.clone())
        .collect();
    if participants.is_empty() {
        state.decision_round_participants.clear();
        state.push_log(LOG_STEP_DECISION_EMPTY);
        return;
    }
    state.deck.update_table_flags(
        |entry| participants.contains(&entry.card),
        |flags| TableFlags {
            awaiting_decision: true,
            acted_this_round: false,
            ..flags
        },
    );
    log::info!("{} character(s) await a decision", participants.len());
    state.decision_round_participants = participants;
    state.push_log(LOG_STEP_DECISION);
}
