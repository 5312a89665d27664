//! Scripted player that drives a [`GameSession`] through whole days and
//! audits the rules invariants after every command.

use odisea_game::{
    CardKind, DayStep, EngineError, EngineResult, GameOutcome, GameSession, GameSnapshot,
    PendingKind, RulesConfig, SeededDice,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::common::TesterAssets;

const SWAP_INITIATIVE: &str = "swap initiative";

/// How the autopilot settles characters during the Decision step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictRule {
    /// One decision roll per participant.
    Decision,
    /// Roll until the conflict settles or the attempt limit runs out.
    Quick,
}

impl ConflictRule {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Quick => "quick",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Stop once this many days have been travelled.
    Days(u32),
    /// Play until victory or defeat.
    Terminal,
}

#[derive(Debug, Clone)]
pub struct AutopilotPlan {
    pub rule: ConflictRule,
    pub encounters_per_turn: u32,
    pub stop: StopCondition,
    /// Play a hand card and rotate the initiative on each Preparation step.
    pub use_hand: bool,
    pub command_budget: usize,
}

impl Default for AutopilotPlan {
    fn default() -> Self {
        Self {
            rule: ConflictRule::Decision,
            encounters_per_turn: 1,
            stop: StopCondition::Terminal,
            use_hand: true,
            command_budget: 10_000,
        }
    }
}

/// What one autopilot run did and how it ended.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub seed: u64,
    pub rule: ConflictRule,
    pub commands: usize,
    pub rejections: usize,
    pub days: u32,
    pub peak_encounter_actions: u32,
    pub outcome: GameOutcome,
    pub budget_exhausted: bool,
    pub violations: Vec<String>,
    pub snapshot: GameSnapshot,
}

impl RunSummary {
    /// xxHash64 of the final snapshot, keyed by the run seed.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let bytes = serde_json::to_vec(&self.snapshot).unwrap_or_default();
        twox_hash::XxHash64::oneshot(self.seed, &bytes)
    }
}

/// Tracks the counters that must only move in one direction.
struct InvariantMonitor {
    tracked_cards: usize,
    travel: u32,
    game_over: bool,
    threshold: u32,
    action_cap: u32,
    violations: Vec<String>,
}

impl InvariantMonitor {
    fn new(session: &GameSession<SeededDice>) -> Self {
        Self {
            tracked_cards: session.state().deck.total_cards(),
            travel: session.state().travel_count,
            game_over: session.state().game_over,
            threshold: session.config().fatigue_loss_threshold,
            action_cap: session.config().encounter_action_cap,
            violations: Vec::new(),
        }
    }

    fn observe(&mut self, session: &GameSession<SeededDice>, after: &str) {
        let state = session.state();
        if !state.deck.is_consistent() {
            self.flag(after, "zone index disagrees with the zones");
        }
        // Initiatives enter play from the side pool, so only a swap may grow
        // the count. Nothing may ever shrink it.
        let cards = state.deck.total_cards();
        let grew_legally = after == SWAP_INITIATIVE && cards == self.tracked_cards + 1;
        if cards != self.tracked_cards && !grew_legally {
            self.flag(
                after,
                &format!("card count moved from {} to {cards}", self.tracked_cards),
            );
        }
        self.tracked_cards = cards;
        if state.travel_count < self.travel || state.travel_count > self.travel + 1 {
            self.flag(
                after,
                &format!("travel jumped from {} to {}", self.travel, state.travel_count),
            );
        }
        self.travel = state.travel_count;
        if self.game_over && !state.game_over {
            self.flag(after, "game over was cleared");
        }
        self.game_over = state.game_over;
        if !state.game_over && state.fatigue_count >= self.threshold {
            self.flag(
                after,
                &format!("fatigue {} reached the limit without a defeat", state.fatigue_count),
            );
        }
        if state.encounter_actions_today > self.action_cap {
            self.flag(
                after,
                &format!("{} encounter actions today", state.encounter_actions_today),
            );
        }
        if state.step != DayStep::Decision && !state.decision_round_participants.is_empty() {
            self.flag(after, "decision participants outside the Decision step");
        }
    }

    fn flag(&mut self, after: &str, message: &str) {
        log::warn!("invariant broken after {after}: {message}");
        self.violations.push(format!("after {after}: {message}"));
    }
}

pub struct Autopilot {
    assets: Arc<TesterAssets>,
    verbose: bool,
}

impl Autopilot {
    pub const fn new(assets: Arc<TesterAssets>, verbose: bool) -> Self {
        Self { assets, verbose }
    }

    /// Play one seeded session under `plan`.
    pub fn run(&self, plan: &AutopilotPlan, seed: u64) -> RunSummary {
        let mut session =
            GameSession::new(Arc::clone(&self.assets.catalog), RulesConfig::default(), seed);
        let mut driver = Driver {
            monitor: InvariantMonitor::new(&session),
            commands: 0,
            rejections: 0,
            peak_encounter_actions: 0,
            halted: false,
        };

        if plan.encounters_per_turn != session.state().encounters_per_turn {
            driver.command(&mut session, "set encounters per turn", |s| {
                s.set_encounters_per_turn(plan.encounters_per_turn)
            });
        }
        driver.command(&mut session, "start day", |s| s.start_day());

        let mut prepared_day = None;
        let mut budget_exhausted = true;
        for _ in 0..plan.command_budget {
            if driver.halted || session.outcome().is_terminal() || plan_finished(plan, &session) {
                budget_exhausted = false;
                break;
            }
            let state = session.state();
            if let Some(pending) = state.pending.clone() {
                driver.expect_rejected(&mut session, "advance while pending", |s| {
                    s.advance_step()
                });
                match pending.kind {
                    PendingKind::Recruit => {
                        driver.command(&mut session, "resolve recruit", |s| s.resolve_recruit());
                    }
                    PendingKind::Event => {
                        driver.command(&mut session, "acknowledge event", |s| {
                            s.acknowledge_event()
                        });
                    }
                }
            } else if let Some(card) = state.decision_round_participants.first().cloned() {
                driver.expect_rejected(&mut session, "advance with open decisions", |s| {
                    s.advance_step()
                });
                match plan.rule {
                    ConflictRule::Decision => {
                        driver.command(&mut session, "select candidate", |s| {
                            s.select_conflict_candidate(&card)
                        });
                        driver.command(&mut session, "resolve conflict", |s| {
                            s.resolve_conflict(&card)
                        });
                    }
                    ConflictRule::Quick => {
                        driver.command(&mut session, "resolve quick conflict", |s| {
                            s.resolve_quick_conflict(&card)
                        });
                    }
                }
            } else if plan.use_hand
                && state.step == DayStep::Preparation
                && prepared_day != Some(state.day)
            {
                prepared_day = Some(state.day);
                self.prepare(&mut driver, &mut session);
            } else {
                driver.command(&mut session, "advance", |s| s.advance_step());
            }

            driver.peak_encounter_actions = driver
                .peak_encounter_actions
                .max(session.state().encounter_actions_today);
        }

        // Victory leaves the session playable; only a defeat locks it.
        if session.outcome() == GameOutcome::Defeat {
            driver.expect_rejected(&mut session, "advance after defeat", |s| {
                s.advance_step()
            });
        }

        let summary = RunSummary {
            seed,
            rule: plan.rule,
            commands: driver.commands,
            rejections: driver.rejections,
            days: session.state().day,
            peak_encounter_actions: driver.peak_encounter_actions,
            outcome: session.outcome(),
            budget_exhausted,
            violations: driver.monitor.violations,
            snapshot: session.snapshot(),
        };
        if self.verbose {
            log::info!(
                "seed {seed}: {} after {} days and {} commands",
                summary.outcome.as_str(),
                summary.days,
                summary.commands
            );
        }
        summary
    }

    /// Rotate the initiative on odd days and put one hand card to work.
    fn prepare(&self, driver: &mut Driver, session: &mut GameSession<SeededDice>) {
        driver.expect_rejected(session, "reveal during preparation", |s| {
            s.reveal_encounter_card()
        });

        if session.state().day % 2 == 1
            && let Some(next) = session.snapshot().available_initiatives.first().cloned()
        {
            driver.command(session, SWAP_INITIATIVE, |s| s.swap_initiative(&next));
        }

        let Some(card) = session.state().deck.hand().first().cloned() else {
            return;
        };
        let soothes = self
            .assets
            .catalog
            .get(&card)
            .is_some_and(|def| def.kind == CardKind::Character && def.threat_value < 0);
        if soothes && session.state().threat_count > 0 {
            driver.command(session, "use card ability", |s| s.use_card_ability(&card));
        }
        driver.command(session, "play from hand", |s| s.play_from_hand(&card));
    }
}

fn plan_finished(plan: &AutopilotPlan, session: &GameSession<SeededDice>) -> bool {
    match plan.stop {
        StopCondition::Days(days) => session.state().day >= days,
        StopCondition::Terminal => false,
    }
}

struct Driver {
    monitor: InvariantMonitor,
    commands: usize,
    rejections: usize,
    peak_encounter_actions: u32,
    halted: bool,
}

impl Driver {
    /// Issue a command the autopilot expects to succeed. A rejection halts
    /// the run, since the autopilot would otherwise repeat it forever.
    fn command<T>(
        &mut self,
        session: &mut GameSession<SeededDice>,
        label: &str,
        run: impl FnOnce(&mut GameSession<SeededDice>) -> EngineResult<T>,
    ) -> Option<T> {
        if self.halted {
            return None;
        }
        self.commands += 1;
        let before = session.snapshot();
        match run(session) {
            Ok(value) => {
                self.monitor.observe(session, label);
                Some(value)
            }
            Err(err) => {
                self.reject_cleanly(session, label, &before, &err);
                self.monitor
                    .flag(label, &format!("command was rejected: {err}"));
                self.halted = true;
                None
            }
        }
    }

    /// Issue a command that must be rejected without touching the state.
    fn expect_rejected<T>(
        &mut self,
        session: &mut GameSession<SeededDice>,
        label: &str,
        run: impl FnOnce(&mut GameSession<SeededDice>) -> EngineResult<T>,
    ) {
        self.rejections += 1;
        let before = session.snapshot();
        match run(session) {
            Ok(_) => {
                self.monitor.flag(label, "command was accepted");
                self.monitor.observe(session, label);
            }
            Err(err) => self.reject_cleanly(session, label, &before, &err),
        }
    }

    fn reject_cleanly(
        &mut self,
        session: &GameSession<SeededDice>,
        label: &str,
        before: &GameSnapshot,
        err: &EngineError,
    ) {
        log::debug!("{label} rejected: {err}");
        if session.snapshot() != *before {
            self.monitor
                .flag(label, &format!("rejection ({err}) changed the state"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn autopilot() -> Autopilot {
        Autopilot::new(Arc::new(TesterAssets::load(None).unwrap()), false)
    }

    #[test]
    fn full_games_finish_without_violations() {
        let pilot = autopilot();
        for seed in [1, 2, 1337] {
            let summary = pilot.run(&AutopilotPlan::default(), seed);
            assert!(summary.violations.is_empty(), "{:?}", summary.violations);
            assert!(summary.outcome.is_terminal());
            assert!(!summary.budget_exhausted);
            assert!(summary.rejections > 0);
        }
    }

    #[test]
    fn day_limited_runs_stop_early() {
        let plan = AutopilotPlan {
            stop: StopCondition::Days(2),
            ..AutopilotPlan::default()
        };
        let summary = autopilot().run(&plan, 99);
        assert!(summary.violations.is_empty(), "{:?}", summary.violations);
        assert!(summary.days <= 2);
    }

    #[test]
    fn fingerprints_are_stable_per_seed() {
        let pilot = autopilot();
        let plan = AutopilotPlan {
            rule: ConflictRule::Quick,
            ..AutopilotPlan::default()
        };
        let first = pilot.run(&plan, 4242);
        let second = pilot.run(&plan, 4242);
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.commands, second.commands);
    }
}
