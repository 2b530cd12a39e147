//! Live games keyed by player.
//!
//! Entries are only locked for the synchronous part of an operation. The
//! question fetch between rounds happens with no lock held; its result is
//! committed afterwards only if the game is still at the round it was fetched
//! for.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, info};

use super::controller::{AdvancePlan, RoundResult, TurnController};
use super::provider::QuestionSource;
use super::state::round_timeout;
use crate::id::UserId;
use crate::{CoreError, Result};

/// Where the current prompt was posted, so it can be edited later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLocation {
    pub channel_id: u64,
    pub message_id: u64,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub controller: TurnController,
    pub translate: bool,
    pub last_activity: Instant,
    pub prompt: Option<PromptLocation>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The next question is live
    NextQuestion(TurnController),
    /// The game ended and was removed from the store
    Finished { prize: u64, last: TurnController },
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<UserId, Session>>,
    questions: QuestionSource,
    idle_grace: Duration,
}

impl SessionStore {
    pub fn new(questions: QuestionSource, idle_grace: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            questions,
            idle_grace,
        }
    }

    /// Start (or restart) a game. Nothing is stored if the first fetch fails.
    pub async fn start(&self, player: UserId, translate: bool) -> Result<TurnController> {
        let first = self.questions.provider(translate).fetch_question().await?;
        let controller = TurnController::start(player, first);

        let previous = self.sessions.insert(
            player,
            Session {
                controller: controller.clone(),
                translate,
                last_activity: Instant::now(),
                prompt: None,
            },
        );
        if let Some(previous) = previous {
            info!(
                player_id = %player,
                abandoned_round = previous.controller.round(),
                "restarted game, previous session replaced"
            );
        } else {
            info!(player_id = %player, translate, "game started");
        }

        Ok(controller)
    }

    fn with_session<T>(
        &self,
        player: UserId,
        f: impl FnOnce(&mut Session) -> Result<T>,
    ) -> Result<T> {
        let mut session = self
            .sessions
            .get_mut(&player)
            .ok_or(CoreError::InvalidSession { player_id: player })?;
        session.last_activity = Instant::now();
        f(session.value_mut())
    }

    pub fn snapshot(&self, player: UserId) -> Result<TurnController> {
        self.sessions
            .get(&player)
            .map(|s| s.controller.clone())
            .ok_or(CoreError::InvalidSession { player_id: player })
    }

    pub fn submit_answer(
        &self,
        player: UserId,
        round: usize,
        choice: usize,
    ) -> Result<(RoundResult, TurnController)> {
        self.with_session(player, |s| {
            let result = s.controller.submit_answer(round, choice)?;
            Ok((result, s.controller.clone()))
        })
    }

    /// Returns the hidden option and the updated game
    pub fn use_joker(&self, player: UserId, round: usize) -> Result<(usize, TurnController)> {
        self.with_session(player, |s| {
            let hidden = s.controller.use_joker(round, &mut rand::rng())?;
            Ok((hidden, s.controller.clone()))
        })
    }

    /// Resolve an unanswered round as wrong. Stale once the player has answered.
    pub fn expire_round(
        &self,
        player: UserId,
        round: usize,
    ) -> Result<(RoundResult, TurnController)> {
        self.with_session(player, |s| {
            let result = s.controller.expire_round(round)?;
            Ok((result, s.controller.clone()))
        })
    }

    /// Move past a resolved round.
    ///
    /// A failed fetch returns the error and leaves the game exactly as it was,
    /// ready for another attempt. A concurrent advance for the same round loses
    /// with `StaleAction`.
    pub async fn advance(&self, player: UserId, round: usize) -> Result<AdvanceOutcome> {
        let (plan, translate) = self.with_session(player, |s| {
            Ok((s.controller.begin_advance(round)?, s.translate))
        })?;

        match plan {
            AdvancePlan::Finished { prize } => {
                let last = self
                    .sessions
                    .remove_if(&player, |_, s| s.controller.is_over())
                    .map(|(_, s)| s.controller)
                    .ok_or(CoreError::InvalidSession { player_id: player })?;
                info!(player_id = %player, prize, "game finished");
                Ok(AdvanceOutcome::Finished { prize, last })
            }
            AdvancePlan::NeedsQuestion { next_round } => {
                debug!(player_id = %player, next_round, "fetching next question");
                let question = self.questions.provider(translate).fetch_question().await?;
                self.with_session(player, |s| {
                    s.controller.commit_advance(round, question)?;
                    s.prompt = None;
                    Ok(AdvanceOutcome::NextQuestion(s.controller.clone()))
                })
            }
        }
    }

    /// Remember where the prompt for `round` was posted
    pub fn set_prompt(&self, player: UserId, round: usize, location: PromptLocation) {
        if let Some(mut session) = self.sessions.get_mut(&player) {
            if session.controller.round() == round {
                session.prompt = Some(location);
            }
        }
    }

    pub fn prompt(&self, player: UserId) -> Option<PromptLocation> {
        self.sessions.get(&player).and_then(|s| s.prompt)
    }

    pub fn remove(&self, player: UserId) -> Option<Session> {
        self.sessions.remove(&player).map(|(_, s)| s)
    }

    pub fn contains(&self, player: UserId) -> bool {
        self.sessions.contains_key(&player)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn is_idle(&self, session: &Session, now: Instant) -> bool {
        let allowed = round_timeout(session.controller.round()) + self.idle_grace;
        now.saturating_duration_since(session.last_activity) > allowed
    }

    /// Drop games nobody has touched for longer than their round timeout plus the grace period
    pub fn evict_idle(&self, now: Instant) -> Vec<UserId> {
        let idle: Vec<UserId> = self
            .sessions
            .iter()
            .filter(|entry| self.is_idle(entry.value(), now))
            .map(|entry| *entry.key())
            .collect();

        let evicted: Vec<UserId> = idle
            .into_iter()
            .filter(|player| {
                self.sessions
                    .remove_if(player, |_, s| self.is_idle(s, now))
                    .is_some()
            })
            .collect();

        if !evicted.is_empty() {
            info!(count = evicted.len(), "evicted idle games");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joker::controller::{Phase, RoundOutcome};
    use crate::joker::provider::{MockQuestionProvider, QuestionProvider};
    use crate::joker::question::Question;
    use crate::joker::translate::NoopTranslator;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn question() -> Question {
        Question::new(
            "2 + 2?",
            vec!["3".into(), "4".into(), "5".into(), "22".into()],
            1,
        )
        .unwrap()
    }

    fn store_with(provider: MockQuestionProvider) -> SessionStore {
        let provider: Arc<dyn QuestionProvider> = Arc::new(provider);
        SessionStore::new(
            QuestionSource::new(provider, Arc::new(NoopTranslator)),
            Duration::from_secs(60),
        )
    }

    fn always_ok() -> MockQuestionProvider {
        let mut provider = MockQuestionProvider::new();
        provider.expect_fetch_question().returning(|| Ok(question()));
        provider.expect_name().return_const("mock");
        provider
    }

    #[tokio::test]
    async fn test_start_failure_stores_nothing() {
        let mut provider = MockQuestionProvider::new();
        provider
            .expect_fetch_question()
            .returning(|| Err(CoreError::provider_unavailable("mock", "offline")));
        let store = store_with(provider);

        assert!(store.start(UserId(1), false).await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_restart_replaces_game() {
        let store = store_with(always_ok());
        store.start(UserId(1), false).await.unwrap();
        store.submit_answer(UserId(1), 0, 1).unwrap();
        store.advance(UserId(1), 0).await.unwrap();
        assert_eq!(store.snapshot(UserId(1)).unwrap().round(), 1);

        store.start(UserId(1), false).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot(UserId(1)).unwrap().round(), 0);
    }

    #[tokio::test]
    async fn test_actions_without_game_are_invalid_session() {
        let store = store_with(always_ok());
        assert!(matches!(
            store.submit_answer(UserId(5), 0, 0),
            Err(CoreError::InvalidSession { .. })
        ));
        assert!(matches!(
            store.use_joker(UserId(5), 0),
            Err(CoreError::InvalidSession { .. })
        ));
        assert!(matches!(
            store.advance(UserId(5), 0).await,
            Err(CoreError::InvalidSession { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_advance_keeps_game_for_retry() {
        let fail = Arc::new(AtomicBool::new(false));
        let flag = fail.clone();
        let mut provider = MockQuestionProvider::new();
        provider.expect_fetch_question().returning(move || {
            if flag.load(Ordering::SeqCst) {
                Err(CoreError::provider_unavailable("mock", "offline"))
            } else {
                Ok(question())
            }
        });
        let store = store_with(provider);

        store.start(UserId(1), false).await.unwrap();
        store.submit_answer(UserId(1), 0, 1).unwrap();
        let before = store.snapshot(UserId(1)).unwrap();

        fail.store(true, Ordering::SeqCst);
        let err = store.advance(UserId(1), 0).await.unwrap_err();
        assert!(matches!(err, CoreError::ProviderUnavailable { .. }));
        assert_eq!(store.snapshot(UserId(1)).unwrap(), before);

        fail.store(false, Ordering::SeqCst);
        let outcome = store.advance(UserId(1), 0).await.unwrap();
        match outcome {
            AdvanceOutcome::NextQuestion(c) => assert_eq!(c.round(), 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_advance_for_same_round_is_stale() {
        let store = store_with(always_ok());
        store.start(UserId(1), false).await.unwrap();
        store.submit_answer(UserId(1), 0, 1).unwrap();

        store.advance(UserId(1), 0).await.unwrap();
        assert!(matches!(
            store.advance(UserId(1), 0).await,
            Err(CoreError::StaleAction { .. })
        ));
    }

    #[tokio::test]
    async fn test_finishing_removes_session() {
        let store = store_with(always_ok());
        store.start(UserId(1), false).await.unwrap();

        let mut last = None;
        for round in 0..9 {
            store.submit_answer(UserId(1), round, 1).unwrap();
            last = Some(store.advance(UserId(1), round).await.unwrap());
        }

        match last {
            Some(AdvanceOutcome::Finished { prize, last }) => {
                assert_eq!(prize, 75_000);
                assert_eq!(last.phase(), &Phase::GameOver { prize: 75_000 });
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!store.contains(UserId(1)));
    }

    #[tokio::test]
    async fn test_expired_round_then_answer_is_rejected() {
        let store = store_with(always_ok());
        store.start(UserId(1), false).await.unwrap();

        let (result, _) = store.expire_round(UserId(1), 0).unwrap();
        assert_eq!(result.outcome, RoundOutcome::TimedOut);
        assert!(store.submit_answer(UserId(1), 0, 1).is_err());
    }

    #[tokio::test]
    async fn test_players_are_independent() {
        let store = store_with(always_ok());
        store.start(UserId(1), false).await.unwrap();
        store.start(UserId(2), false).await.unwrap();

        store.submit_answer(UserId(1), 0, 0).unwrap();
        let other = store.snapshot(UserId(2)).unwrap();
        assert_eq!(other.phase(), &Phase::AwaitingAnswer);
        assert_eq!(other.state().jokers, 7);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let store = store_with(always_ok());
        store.start(UserId(1), false).await.unwrap();
        store.start(UserId(2), false).await.unwrap();

        let now = Instant::now();
        assert!(store.evict_idle(now).is_empty());

        // round 0 allows 30s plus 60s grace
        let later = now + Duration::from_secs(120);
        let mut evicted = store.evict_idle(later);
        evicted.sort();
        assert_eq!(evicted, vec![UserId(1), UserId(2)]);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_location_is_tied_to_round() {
        let store = store_with(always_ok());
        store.start(UserId(1), false).await.unwrap();
        let location = PromptLocation {
            channel_id: 10,
            message_id: 20,
        };

        store.set_prompt(UserId(1), 3, location);
        assert_eq!(store.prompt(UserId(1)), None);

        store.set_prompt(UserId(1), 0, location);
        assert_eq!(store.prompt(UserId(1)), Some(location));
    }
}
