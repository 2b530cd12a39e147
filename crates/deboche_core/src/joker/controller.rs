//! Turn controller for a single player's Joker game.
//!
//! ```text
//! start ─▶ AwaitingAnswer ──answer/timeout──▶ RoundResolved ──advance──▶ AwaitingAnswer
//!              │   ▲                                │
//!              └───┘ use_joker                      └──last round──▶ GameOver
//! ```
//!
//! Every player action names the round it was rendered for. An action for any
//! other round is rejected as stale, which is how double clicks and late timer
//! firings are discarded.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::QuestionProvider;
use super::question::{OPTION_COUNT, Question};
use super::state::{GameState, ROUNDS};
use crate::id::UserId;
use crate::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Correct,
    Incorrect,
    TimedOut,
}

impl RoundOutcome {
    pub fn is_correct(self) -> bool {
        matches!(self, Self::Correct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    AwaitingAnswer,
    RoundResolved(RoundOutcome),
    GameOver { prize: u64 },
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AwaitingAnswer => "awaiting an answer",
            Self::RoundResolved(_) => "between rounds",
            Self::GameOver { .. } => "over",
        }
    }
}

/// What happened in a resolved round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round: usize,
    pub outcome: RoundOutcome,
    pub chosen: Option<usize>,
    pub correct_index: usize,
    pub jokers: u32,
    pub prize_level: i32,
}

/// First half of an advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePlan {
    /// The last round was played; the game is now over
    Finished { prize: u64 },
    /// A question must be fetched and committed for `next_round`
    NeedsQuestion { next_round: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnController {
    state: GameState,
    phase: Phase,
}

impl TurnController {
    /// A fresh game with its first question already fetched
    pub fn start(player_id: UserId, first: Question) -> Self {
        let mut state = GameState::new(player_id);
        state.active_question = Some(first);
        Self {
            state,
            phase: Phase::AwaitingAnswer,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn round(&self) -> usize {
        self.state.current_index
    }

    pub fn player_id(&self) -> UserId {
        self.state.player_id
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, Phase::GameOver { .. })
    }

    fn check_round(&self, round: usize) -> Result<()> {
        if round != self.state.current_index {
            return Err(CoreError::StaleAction {
                player_id: self.state.player_id,
                action_round: round,
                current_round: self.state.current_index,
            });
        }
        Ok(())
    }

    fn require_awaiting(&self, action: &str) -> Result<&Question> {
        if self.phase != Phase::AwaitingAnswer {
            return Err(CoreError::wrong_phase(action, self.phase.name()));
        }
        self.state
            .active_question
            .as_ref()
            .ok_or_else(|| CoreError::wrong_phase(action, "without a question"))
    }

    fn resolve(
        &mut self,
        outcome: RoundOutcome,
        chosen: Option<usize>,
        correct_index: usize,
    ) -> RoundResult {
        self.state.apply_answer(outcome.is_correct());
        self.phase = Phase::RoundResolved(outcome);
        debug!(
            player_id = %self.state.player_id,
            round = self.state.current_index,
            ?outcome,
            jokers = self.state.jokers,
            prize_level = self.state.prize_level,
            "round resolved"
        );
        RoundResult {
            round: self.state.current_index,
            outcome,
            chosen,
            correct_index,
            jokers: self.state.jokers,
            prize_level: self.state.prize_level,
        }
    }

    /// Answer the active question
    pub fn submit_answer(&mut self, round: usize, choice: usize) -> Result<RoundResult> {
        self.check_round(round)?;
        let question = self.require_awaiting("answer")?;
        if choice >= OPTION_COUNT || self.state.hidden_options.contains(&choice) {
            return Err(CoreError::InvalidChoice { choice });
        }

        let correct_index = question.correct;
        let outcome = if choice == correct_index {
            RoundOutcome::Correct
        } else {
            RoundOutcome::Incorrect
        };
        Ok(self.resolve(outcome, Some(choice), correct_index))
    }

    /// Spend a joker to hide one wrong option. Returns the hidden index.
    ///
    /// Fails without touching the state when no jokers remain or when every
    /// wrong option is already hidden.
    pub fn use_joker(&mut self, round: usize, rng: &mut impl Rng) -> Result<usize> {
        self.check_round(round)?;
        let question = self.require_awaiting("use a joker")?;
        if self.state.jokers == 0 {
            return Err(CoreError::NoJokersLeft {
                player_id: self.state.player_id,
            });
        }

        let candidates: Vec<usize> = (0..OPTION_COUNT)
            .filter(|i| *i != question.correct && !self.state.hidden_options.contains(i))
            .collect();
        let hidden = *candidates.choose(rng).ok_or(CoreError::NothingToHide {
            player_id: self.state.player_id,
        })?;

        self.state.jokers -= 1;
        self.state.hidden_options.insert(hidden);
        Ok(hidden)
    }

    /// The answer window closed with no answer; counts as a wrong answer
    pub fn expire_round(&mut self, round: usize) -> Result<RoundResult> {
        self.check_round(round)?;
        let correct_index = self.require_awaiting("time out")?.correct;
        Ok(self.resolve(RoundOutcome::TimedOut, None, correct_index))
    }

    /// Decide what advancing past `round` needs.
    ///
    /// Finishing the last round moves straight to `GameOver`. Otherwise
    /// nothing changes until [`commit_advance`](Self::commit_advance) is given
    /// the next question.
    pub fn begin_advance(&mut self, round: usize) -> Result<AdvancePlan> {
        self.check_round(round)?;
        if !matches!(self.phase, Phase::RoundResolved(_)) {
            return Err(CoreError::wrong_phase("advance", self.phase.name()));
        }

        let next_round = self.state.current_index + 1;
        if next_round >= ROUNDS {
            self.state.current_index = next_round;
            self.state.active_question = None;
            self.state.hidden_options.clear();
            let prize = self.state.current_prize();
            self.phase = Phase::GameOver { prize };
            return Ok(AdvancePlan::Finished { prize });
        }

        Ok(AdvancePlan::NeedsQuestion { next_round })
    }

    /// Install the question fetched for the round after `round`
    pub fn commit_advance(&mut self, round: usize, question: Question) -> Result<()> {
        self.check_round(round)?;
        if !matches!(self.phase, Phase::RoundResolved(_)) {
            return Err(CoreError::wrong_phase("advance", self.phase.name()));
        }

        self.state.current_index += 1;
        self.state.active_question = Some(question);
        self.state.hidden_options.clear();
        self.phase = Phase::AwaitingAnswer;
        Ok(())
    }

    /// Advance with a provider in one step. A failed fetch leaves the state untouched.
    pub async fn advance(
        &mut self,
        round: usize,
        provider: &dyn QuestionProvider,
    ) -> Result<AdvancePlan> {
        let plan = self.begin_advance(round)?;
        if let AdvancePlan::NeedsQuestion { .. } = plan {
            let question = provider.fetch_question().await?;
            self.commit_advance(round, question)?;
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joker::provider::MockQuestionProvider;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn question(correct: usize) -> Question {
        Question::new(
            "Qual é a capital de Portugal?",
            vec![
                "Lisboa".to_string(),
                "Porto".to_string(),
                "Faro".to_string(),
                "Braga".to_string(),
            ],
            correct,
        )
        .unwrap()
    }

    fn next(controller: &mut TurnController, correct: usize) {
        let round = controller.round();
        match controller.begin_advance(round).unwrap() {
            AdvancePlan::NeedsQuestion { .. } => {
                controller.commit_advance(round, question(correct)).unwrap()
            }
            AdvancePlan::Finished { .. } => {}
        }
    }

    #[test]
    fn test_scenario_from_fresh_game() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut c = TurnController::start(UserId(1), question(0));
        assert_eq!(c.state().jokers, 7);
        assert_eq!(c.state().current_index, 0);
        assert_eq!(c.state().prize_level, -1);

        for _ in 0..3 {
            let result = c.submit_answer(c.round(), 0).unwrap();
            assert_eq!(result.outcome, RoundOutcome::Correct);
            next(&mut c, 0);
        }
        assert_eq!(c.state().current_index, 3);
        assert_eq!(c.state().prize_level, 2);
        assert_eq!(c.state().jokers, 7);

        let hidden = c.use_joker(3, &mut rng).unwrap();
        assert_ne!(hidden, 0);
        assert_eq!(c.state().jokers, 6);
        assert_eq!(c.state().hidden_options.len(), 1);

        let wrong = (1..4).find(|i| *i != hidden).unwrap();
        let result = c.submit_answer(3, wrong).unwrap();
        assert_eq!(result.outcome, RoundOutcome::Incorrect);
        assert_eq!(c.state().jokers, 3);
        assert_eq!(c.state().prize_level, 2);

        next(&mut c, 0);
        assert_eq!(c.state().current_index, 4);
        assert!(c.state().hidden_options.is_empty());
    }

    #[test]
    fn test_joker_never_hides_correct_or_twice() {
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut c = TurnController::start(UserId(1), question(2));
            let mut seen = Vec::new();
            for _ in 0..3 {
                let hidden = c.use_joker(0, &mut rng).unwrap();
                assert_ne!(hidden, 2);
                assert!(!seen.contains(&hidden));
                seen.push(hidden);
            }
            assert_eq!(c.state().jokers, 4);

            let before = c.clone();
            let err = c.use_joker(0, &mut rng).unwrap_err();
            assert!(matches!(err, CoreError::NothingToHide { .. }));
            assert_eq!(c, before);
        }
    }

    #[test]
    fn test_joker_without_jokers_leaves_state() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut c = TurnController::start(UserId(1), question(1));
        c.state.jokers = 0;
        let before = c.clone();

        let err = c.use_joker(0, &mut rng).unwrap_err();
        assert!(matches!(err, CoreError::NoJokersLeft { .. }));
        assert_eq!(c, before);
    }

    #[test]
    fn test_hidden_option_cannot_be_chosen() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut c = TurnController::start(UserId(1), question(0));
        let hidden = c.use_joker(0, &mut rng).unwrap();
        assert!(matches!(
            c.submit_answer(0, hidden),
            Err(CoreError::InvalidChoice { .. })
        ));
        assert!(matches!(
            c.submit_answer(0, 4),
            Err(CoreError::InvalidChoice { choice: 4 })
        ));
        assert_eq!(c.phase(), &Phase::AwaitingAnswer);
    }

    #[test]
    fn test_double_submit_is_rejected() {
        let mut c = TurnController::start(UserId(1), question(0));
        c.submit_answer(0, 0).unwrap();
        let err = c.submit_answer(0, 1).unwrap_err();
        assert!(matches!(err, CoreError::WrongPhase { .. }));
        assert_eq!(c.state().prize_level, 0);

        next(&mut c, 0);
        let err = c.submit_answer(0, 0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::StaleAction {
                action_round: 0,
                current_round: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_timeout_counts_as_wrong() {
        let mut c = TurnController::start(UserId(1), question(0));
        let result = c.expire_round(0).unwrap();
        assert_eq!(result.outcome, RoundOutcome::TimedOut);
        assert_eq!(result.chosen, None);
        assert_eq!(c.state().jokers, 4);
        assert_eq!(c.state().prize_level, -1);
    }

    #[test]
    fn test_late_timeout_is_stale() {
        let mut c = TurnController::start(UserId(1), question(0));
        c.submit_answer(0, 0).unwrap();
        next(&mut c, 0);
        assert!(matches!(c.expire_round(0), Err(CoreError::StaleAction { .. })));
    }

    #[test]
    fn test_all_correct_reaches_top_prize() {
        let mut c = TurnController::start(UserId(1), question(3));
        for round in 0..ROUNDS {
            c.submit_answer(round, 3).unwrap();
            assert_eq!(c.state().prize_level, round as i32);
            next(&mut c, 3);
        }
        assert_eq!(c.state().current_index, 9);
        assert_eq!(c.phase(), &Phase::GameOver { prize: 75_000 });
    }

    #[test]
    fn test_all_wrong_ends_with_nothing() {
        let mut c = TurnController::start(UserId(1), question(3));
        for round in 0..ROUNDS {
            c.submit_answer(round, 0).unwrap();
            next(&mut c, 3);
        }
        assert_eq!(c.phase(), &Phase::GameOver { prize: 0 });
        assert_eq!(c.state().prize_level, -1);
        assert_eq!(c.state().jokers, 0);
    }

    #[test]
    fn test_advance_requires_resolved_round() {
        let mut c = TurnController::start(UserId(1), question(0));
        assert!(matches!(c.begin_advance(0), Err(CoreError::WrongPhase { .. })));
        assert!(matches!(c.commit_advance(0, question(1)), Err(CoreError::WrongPhase { .. })));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_state_unchanged() {
        let mut provider = MockQuestionProvider::new();
        provider
            .expect_fetch_question()
            .times(1)
            .returning(|| Err(CoreError::provider_unavailable("mock", "offline")));

        let mut c = TurnController::start(UserId(1), question(0));
        c.submit_answer(0, 0).unwrap();
        let before = c.clone();

        let err = c.advance(0, &provider).await.unwrap_err();
        assert!(matches!(err, CoreError::ProviderUnavailable { .. }));
        assert_eq!(c, before);
        assert_eq!(c.round(), 0);
    }

    #[tokio::test]
    async fn test_advance_with_provider() {
        let mut provider = MockQuestionProvider::new();
        provider
            .expect_fetch_question()
            .times(1)
            .returning(|| Ok(question(2)));

        let mut c = TurnController::start(UserId(1), question(0));
        c.submit_answer(0, 1).unwrap();
        let plan = c.advance(0, &provider).await.unwrap();

        assert_eq!(plan, AdvancePlan::NeedsQuestion { next_round: 1 });
        assert_eq!(c.round(), 1);
        assert_eq!(c.phase(), &Phase::AwaitingAnswer);
        assert_eq!(c.state().active_question.as_ref().map(|q| q.correct), Some(2));
    }
}
