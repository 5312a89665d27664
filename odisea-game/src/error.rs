//! Command errors returned by the engine.
use thiserror::Error;

use crate::card::CardId;
use crate::day::DayStep;
use crate::deck::Zone;

/// Every error the command surface can return. Apart from [`EngineError::NotInZone`]
/// all of them are recoverable refusals that leave the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("the draw pile is empty")]
    EmptyDeck,
    #[error("initiatives can only be swapped during preparation (current step: {current})")]
    InvalidStepForSwap { current: DayStep },
    #[error("{pending} character(s) still need a decision before leaving the decision step")]
    PendingDecisions { pending: usize },
    #[error("a revealed card is still waiting for its resolution")]
    ResolutionInProgress,
    #[error("the game is over")]
    GameAlreadyOver,
    #[error("card {card} is not in the {zone} zone")]
    NotInZone { card: CardId, zone: Zone },
    #[error("unknown card {0}")]
    UnknownCard(CardId),
    #[error("command requires the {expected} step (current step: {current})")]
    WrongStep { expected: DayStep, current: DayStep },
    #[error("the first day has already started")]
    AlreadyStarted,
    #[error("there is no pending resolution")]
    NoPendingResolution,
    #[error("the pending resolution is a {pending}, not a {requested}")]
    WrongResolution {
        pending: &'static str,
        requested: &'static str,
    },
    #[error("a recruitment roll cannot be dismissed")]
    RecruitCannotBeDismissed,
    #[error("card {0} is not awaiting a decision")]
    NotAwaitingDecision(CardId),
    #[error("card {0} is not an initiative")]
    NotAnInitiative(CardId),
}

impl EngineError {
    /// Internal invariant violations; every other kind is a normal refusal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::NotInZone { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
