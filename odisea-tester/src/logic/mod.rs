pub mod autopilot;
pub mod reports;
pub mod seeds;
pub mod tester;

pub use autopilot::{Autopilot, AutopilotPlan, ConflictRule, RunSummary, StopCondition};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
