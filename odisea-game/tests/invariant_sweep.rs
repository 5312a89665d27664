use std::sync::Arc;

use odisea_game::{
    CardCatalog, CardId, DayStep, EngineError, GameOutcome, GameSession, PendingKind,
    RulesConfig, SeededDice,
};

const SEEDS: std::ops::Range<u64> = 0..48;
const COMMAND_BUDGET: usize = 10_000;

#[derive(Clone, Copy)]
enum ConflictRule {
    Decision,
    Quick,
}

struct Tracker {
    tracked_cards: usize,
    travel: u32,
    game_over: bool,
}

impl Tracker {
    fn new(session: &GameSession<SeededDice>) -> Self {
        Self {
            tracked_cards: session.state().deck.total_cards(),
            travel: 0,
            game_over: false,
        }
    }

    fn check(&mut self, session: &GameSession<SeededDice>, seed: u64) {
        let state = session.state();
        let threshold = session.config().fatigue_loss_threshold;
        assert!(state.deck.is_consistent(), "seed {seed}: zone index drifted");
        assert_eq!(
            state.deck.total_cards(),
            self.tracked_cards,
            "seed {seed}: cards were created or lost"
        );
        assert!(
            state.deck.total_cards() <= session.catalog().len(),
            "seed {seed}: more cards in play than in the catalog"
        );
        assert!(
            state.travel_count >= self.travel,
            "seed {seed}: travel went backwards"
        );
        assert!(state.travel_count <= self.travel + 1);
        self.travel = state.travel_count;
        if self.game_over {
            assert!(state.game_over, "seed {seed}: game over was cleared");
        }
        self.game_over = state.game_over;
        if !state.game_over {
            assert!(state.fatigue_count < threshold, "seed {seed}: missed defeat");
        }
        assert!(state.encounter_actions_today <= session.config().encounter_action_cap);
        if state.step != DayStep::Decision {
            assert!(state.decision_round_participants.is_empty());
        }
    }
}

fn first_participant(session: &GameSession<SeededDice>) -> Option<CardId> {
    session.state().decision_round_participants.first().cloned()
}

fn play_out(seed: u64, rule: ConflictRule) -> GameOutcome {
    let catalog = Arc::new(CardCatalog::load_from_static());
    let mut session = GameSession::new(catalog, RulesConfig::default(), seed);
    let mut tracker = Tracker::new(&session);
    session.start_day().unwrap();
    tracker.check(&session, seed);

    for _ in 0..COMMAND_BUDGET {
        if session.outcome().is_terminal() {
            break;
        }
        let pending = session.state().pending.clone();
        if let Some(pending) = pending {
            let before = session.snapshot();
            assert_eq!(
                session.advance_step(),
                Err(EngineError::ResolutionInProgress)
            );
            assert_eq!(session.snapshot(), before, "seed {seed}: rejected advance mutated");
            match pending.kind {
                PendingKind::Recruit => {
                    session.resolve_recruit().unwrap();
                }
                PendingKind::Event => {
                    session.acknowledge_event().unwrap();
                }
            }
        } else if let Some(card) = first_participant(&session) {
            let before = session.snapshot();
            assert!(matches!(
                session.advance_step(),
                Err(EngineError::PendingDecisions { .. })
            ));
            assert_eq!(session.snapshot(), before);
            match rule {
                ConflictRule::Decision => session.resolve_conflict(&card).unwrap(),
                ConflictRule::Quick => session.resolve_quick_conflict(&card).unwrap(),
            };
        } else {
            session.advance_step().unwrap();
        }
        tracker.check(&session, seed);
    }
    let outcome = session.outcome();
    assert!(outcome.is_terminal(), "seed {seed}: game did not finish");
    outcome
}

#[test]
fn decision_rule_games_always_terminate_cleanly() {
    for seed in SEEDS {
        play_out(seed, ConflictRule::Decision);
    }
}

#[test]
fn quick_rule_games_always_terminate_cleanly() {
    for seed in SEEDS {
        play_out(seed, ConflictRule::Quick);
    }
}

#[test]
fn identical_seeds_replay_identically() {
    for seed in [3, 17, 4242] {
        let run = |seed| {
            let catalog = Arc::new(CardCatalog::load_from_static());
            let mut session = GameSession::new(catalog, RulesConfig::default(), seed);
            session.start_day().unwrap();
            for _ in 0..60 {
                if session.outcome().is_terminal() {
                    break;
                }
                if session.resolve_recruit().is_ok() || session.acknowledge_event().is_ok() {
                    continue;
                }
                if let Some(card) = first_participant(&session) {
                    session.resolve_conflict(&card).unwrap();
                    continue;
                }
                if session.advance_step().is_err() {
                    break;
                }
            }
            serde_json::to_string(&session.snapshot()).unwrap()
        };
        assert_eq!(run(seed), run(seed));
    }
}
