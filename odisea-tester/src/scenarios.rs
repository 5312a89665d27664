use anyhow::Result;

use crate::logic::{AutopilotPlan, ConflictRule, RunSummary, StopCondition};

pub type Expectation = fn(&RunSummary) -> Result<()>;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: String,
    pub plan: AutopilotPlan,
    pub expectations: Vec<Expectation>,
    /// Run each seed twice and require identical snapshot fingerprints.
    pub replay: bool,
}

impl TestScenario {
    fn new(key: &'static str, name: impl Into<String>, plan: AutopilotPlan) -> Self {
        Self {
            key,
            name: name.into(),
            plan,
            expectations: vec![clean_run_expectation],
            replay: false,
        }
    }

    #[must_use]
    fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    #[must_use]
    fn with_replay(mut self) -> Self {
        self.replay = true;
        self
    }
}

const SCENARIOS: &[(&str, &str)] = &[
    ("smoke", "Five autopilot days with invariant checks"),
    ("full-game", "Autopilot to victory or defeat"),
    ("quick-conflict", "Full game settling conflicts with repeated rolls"),
    ("encounter-surge", "Three reveals per Encounter step"),
    (
        "deterministic-replay",
        "Same seed twice, final snapshots must hash equal",
    ),
];

#[must_use]
pub fn list_scenarios() -> &'static [(&'static str, &'static str)] {
    SCENARIOS
}

/// Expand `all` into every known scenario key.
#[must_use]
pub fn expand_scenarios(requested: &[String]) -> Vec<String> {
    let mut scenarios: Vec<String> = requested.iter().filter(|s| *s != "all").cloned().collect();
    if requested.iter().any(|s| s == "all") {
        for (key, _) in SCENARIOS {
            if !scenarios.iter().any(|s| s == key) {
                scenarios.push((*key).to_string());
            }
        }
    }
    scenarios
}

#[must_use]
pub fn get_scenario(key: &str) -> Option<TestScenario> {
    let scenario = match key {
        "smoke" => TestScenario::new(
            "smoke",
            "Smoke",
            AutopilotPlan {
                stop: StopCondition::Days(5),
                ..AutopilotPlan::default()
            },
        ),
        "full-game" => {
            TestScenario::new("full-game", "Full Game", AutopilotPlan::default())
                .with_expectation(terminal_expectation)
        }
        "quick-conflict" => TestScenario::new(
            "quick-conflict",
            "Quick Conflict",
            AutopilotPlan {
                rule: ConflictRule::Quick,
                ..AutopilotPlan::default()
            },
        )
        .with_expectation(terminal_expectation),
        "encounter-surge" => TestScenario::new(
            "encounter-surge",
            "Encounter Surge",
            AutopilotPlan {
                encounters_per_turn: 3,
                ..AutopilotPlan::default()
            },
        )
        .with_expectation(terminal_expectation)
        .with_expectation(surge_expectation),
        "deterministic-replay" => TestScenario::new(
            "deterministic-replay",
            "Deterministic Replay",
            AutopilotPlan {
                stop: StopCondition::Days(8),
                ..AutopilotPlan::default()
            },
        )
        .with_replay(),
        _ => return None,
    };
    Some(scenario)
}

fn clean_run_expectation(summary: &RunSummary) -> Result<()> {
    if let Some(first) = summary.violations.first() {
        anyhow::bail!(
            "{} invariant violations, first: {first}",
            summary.violations.len()
        );
    }
    anyhow::ensure!(
        !summary.budget_exhausted,
        "command budget ran out after {} commands",
        summary.commands
    );
    Ok(())
}

fn terminal_expectation(summary: &RunSummary) -> Result<()> {
    anyhow::ensure!(
        summary.outcome.is_terminal(),
        "game should end, still {} on day {}",
        summary.outcome.as_str(),
        summary.days
    );
    Ok(())
}

fn surge_expectation(summary: &RunSummary) -> Result<()> {
    anyhow::ensure!(
        summary.peak_encounter_actions > 1,
        "a surge should reveal more than one card in a day, peak was {}",
        summary.peak_encounter_actions
    );
    Ok(())
}
