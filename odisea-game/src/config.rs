//! Rule tunables for a session.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DEFAULT_CONFLICT_ATTEMPT_LIMIT, DEFAULT_ENCOUNTER_ACTION_CAP, DEFAULT_ENCOUNTERS_PER_TURN,
    DEFAULT_FATIGUE_LOSS_THRESHOLD, DEFAULT_LOG_HISTORY, DEFAULT_PLAYED_ERRANT_CHANCE,
    DEFAULT_PREPARATION_FATIGUE_RELIEF, DEFAULT_VICTORY_TRAVEL,
};

/// Numbers the day cycle and resolution code read instead of hardcoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesConfig {
    /// Travel count that wins the game.
    #[serde(default = "RulesConfig::default_victory_travel")]
    pub victory_travel: u32,
    /// Fatigue at or above this value loses the game.
    #[serde(default = "RulesConfig::default_fatigue_loss_threshold")]
    pub fatigue_loss_threshold: u32,
    /// Reveals allowed per day across all Encounter entries.
    #[serde(default = "RulesConfig::default_encounter_action_cap")]
    pub encounter_action_cap: u32,
    #[serde(default = "RulesConfig::default_encounters_per_turn")]
    pub encounters_per_turn: u32,
    /// Upper bound on rolls in one quick conflict.
    #[serde(default = "RulesConfig::default_conflict_attempt_limit")]
    pub conflict_attempt_limit: u32,
    /// Fatigue removed on entering Preparation (base relief plus the initiative bonus).
    #[serde(default = "RulesConfig::default_preparation_fatigue_relief")]
    pub preparation_fatigue_relief: u32,
    #[serde(default = "RulesConfig::default_played_character_errant_chance")]
    pub played_character_errant_chance: f64,
    /// Journal entries exposed in snapshots.
    #[serde(default = "RulesConfig::default_log_history")]
    pub log_history: usize,
}

impl RulesConfig {
    #[must_use]
    pub const fn default_victory_travel() -> u32 {
        DEFAULT_VICTORY_TRAVEL
    }

    #[must_use]
    pub const fn default_fatigue_loss_threshold() -> u32 {
        DEFAULT_FATIGUE_LOSS_THRESHOLD
    }

    #[must_use]
    pub const fn default_encounter_action_cap() -> u32 {
        DEFAULT_ENCOUNTER_ACTION_CAP
    }

    #[must_use]
    pub const fn default_encounters_per_turn() -> u32 {
        DEFAULT_ENCOUNTERS_PER_TURN
    }

    #[must_use]
    pub const fn default_conflict_attempt_limit() -> u32 {
        DEFAULT_CONFLICT_ATTEMPT_LIMIT
    }

    #[must_use]
    pub const fn default_preparation_fatigue_relief() -> u32 {
        DEFAULT_PREPARATION_FATIGUE_RELIEF
    }

    #[must_use]
    pub const fn default_played_character_errant_chance() -> f64 {
        DEFAULT_PLAYED_ERRANT_CHANCE
    }

    #[must_use]
    pub const fn default_log_history() -> usize {
        DEFAULT_LOG_HISTORY
    }

    /// Parse a configuration document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RulesConfigError::Parse`] for malformed JSON, or the first
    /// invariant violation reported by [`RulesConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, RulesConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `RulesConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), RulesConfigError> {
        for (field, value) in [
            ("victory_travel", self.victory_travel),
            ("fatigue_loss_threshold", self.fatigue_loss_threshold),
            ("encounter_action_cap", self.encounter_action_cap),
            ("encounters_per_turn", self.encounters_per_turn),
            ("conflict_attempt_limit", self.conflict_attempt_limit),
        ] {
            if value == 0 {
                return Err(RulesConfigError::Zero { field });
            }
        }
        if self.log_history == 0 {
            return Err(RulesConfigError::Zero {
                field: "log_history",
            });
        }
        if !(0.0..=1.0).contains(&self.played_character_errant_chance) {
            return Err(RulesConfigError::ProbabilityRange {
                field: "played_character_errant_chance",
                value: self.played_character_errant_chance,
            });
        }
        Ok(())
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            victory_travel: Self::default_victory_travel(),
            fatigue_loss_threshold: Self::default_fatigue_loss_threshold(),
            encounter_action_cap: Self::default_encounter_action_cap(),
            encounters_per_turn: Self::default_encounters_per_turn(),
            conflict_attempt_limit: Self::default_conflict_attempt_limit(),
            preparation_fatigue_relief: Self::default_preparation_fatigue_relief(),
            played_character_errant_chance: Self::default_played_character_errant_chance(),
            log_history: Self::default_log_history(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RulesConfigError {
    #[error("rules config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("{field} must be at least 1")]
    Zero { field: &'static str },
    #[error("{field} must be between 0 and 1 (got {value:.2})")]
    ProbabilityRange { field: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_tabletop_rules() {
        let cfg = RulesConfig::default();
        assert_eq!(cfg.victory_travel, 20);
        assert_eq!(cfg.fatigue_loss_threshold, 6);
        assert_eq!(cfg.encounter_action_cap, 3);
        assert_eq!(cfg.encounters_per_turn, 1);
        assert_eq!(cfg.conflict_attempt_limit, 12);
        assert_eq!(cfg.preparation_fatigue_relief, 2);
        assert_eq!(cfg.log_history, 8);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_documents_fill_defaults() {
        let cfg = RulesConfig::from_json(r#"{ "victory_travel": 5 }"#).unwrap();
        assert_eq!(cfg.victory_travel, 5);
        assert_eq!(cfg.fatigue_loss_threshold, 6);
    }

    #[test]
    fn zero_caps_are_rejected() {
        let err = RulesConfig::from_json(r#"{ "encounter_action_cap": 0 }"#).unwrap_err();
        assert!(matches!(
            err,
            RulesConfigError::Zero {
                field: "encounter_action_cap"
            }
        ));
    }

    #[test]
    fn probabilities_must_stay_in_unit_range() {
        let cfg = RulesConfig {
            played_character_errant_chance: 1.5,
            ..RulesConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("played_character_errant_chance"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            RulesConfig::from_json("{ nope"),
            Err(RulesConfigError::Parse(_))
        ));
    }
}
