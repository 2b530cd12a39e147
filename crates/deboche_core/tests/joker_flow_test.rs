//! Integration tests for a full Concurso JOKER game
//!
//! These drive the session store with the bundled question fixture and credit
//! the final prize to an in-memory database, the same way the bot does.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use deboche_core::{
    CoreError, Database, Result, UserId,
    config::DatabaseConfig,
    db::MEMORY_PATH,
    joker::{
        AdvanceOutcome, FixtureProvider, NoopTranslator, Phase, Question, QuestionProvider,
        QuestionSource, RoundOutcome, SessionStore, render::render_prompt,
    },
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("questions.json")
}

async fn fixture_store() -> SessionStore {
    let provider = FixtureProvider::load(&fixture_path()).await.unwrap();
    assert!(provider.len() >= 9);
    SessionStore::new(
        QuestionSource::new(Arc::new(provider), Arc::new(NoopTranslator)),
        Duration::from_secs(60),
    )
}

fn correct_choice(store: &SessionStore, player: UserId) -> usize {
    store
        .snapshot(player)
        .unwrap()
        .state()
        .active_question
        .as_ref()
        .unwrap()
        .correct
}

/// Fails every `n`th fetch
struct FlakyProvider {
    calls: AtomicUsize,
    every: usize,
}

#[async_trait]
impl QuestionProvider for FlakyProvider {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn fetch_question(&self) -> Result<Question> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % self.every == 0 {
            return Err(CoreError::provider_unavailable("flaky", "scheduled failure"));
        }
        Question::new(
            format!("Pergunta {}", call),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            call % 4,
        )
    }
}

#[tokio::test]
async fn perfect_game_wins_top_prize_and_credits_wallet() {
    let store = fixture_store().await;
    let db = Database::connect(&DatabaseConfig {
        path: MEMORY_PATH.into(),
        max_connections: 1,
    })
    .await
    .unwrap();
    let player = UserId(1001);

    store.start(player, false).await.unwrap();

    let mut finished = None;
    for round in 0..9 {
        let prompt = render_prompt(&store.snapshot(player).unwrap());
        assert_eq!(prompt.buttons().count(), 5);

        let choice = correct_choice(&store, player);
        let (result, _) = store.submit_answer(player, round, choice).unwrap();
        assert_eq!(result.outcome, RoundOutcome::Correct);

        match store.advance(player, round).await.unwrap() {
            AdvanceOutcome::NextQuestion(controller) => assert_eq!(controller.round(), round + 1),
            AdvanceOutcome::Finished { prize, last } => {
                assert_eq!(round, 8);
                assert_eq!(last.phase(), &Phase::GameOver { prize });
                finished = Some(prize);
            }
        }
    }

    let prize = finished.unwrap();
    assert_eq!(prize, 75_000);
    assert!(!store.contains(player));

    let balance = db.add_coins(player, prize as i64).await.unwrap();
    assert_eq!(balance, 75_000);
}

#[tokio::test]
async fn wrong_answers_spend_jokers_then_prize() {
    let store = fixture_store().await;
    let player = UserId(2002);
    store.start(player, false).await.unwrap();

    // two right answers: prize level 1 (250)
    for round in 0..2 {
        let choice = correct_choice(&store, player);
        store.submit_answer(player, round, choice).unwrap();
        store.advance(player, round).await.unwrap();
    }

    // three wrong answers: 7 -> 4 -> 1 -> 0 jokers, the last also costs two levels
    for round in 2..5 {
        let wrong = (correct_choice(&store, player) + 1) % 4;
        let (result, controller) = store.submit_answer(player, round, wrong).unwrap();
        assert_eq!(result.outcome, RoundOutcome::Incorrect);
        if round == 4 {
            assert_eq!(controller.state().jokers, 0);
            assert_eq!(controller.state().current_prize(), 0);
        }
        store.advance(player, round).await.unwrap();
    }

    let controller = store.snapshot(player).unwrap();
    assert_eq!(controller.round(), 5);
    assert_eq!(controller.state().prize_level, -1);
}

#[tokio::test]
async fn joker_then_timeout() {
    let store = fixture_store().await;
    let player = UserId(3003);
    store.start(player, false).await.unwrap();

    let (hidden, controller) = store.use_joker(player, 0).unwrap();
    assert_ne!(hidden, correct_choice(&store, player));
    assert_eq!(controller.state().jokers, 6);

    // the hidden option can no longer be picked
    assert!(matches!(
        store.submit_answer(player, 0, hidden),
        Err(CoreError::InvalidChoice { .. })
    ));

    let (result, controller) = store.expire_round(player, 0).unwrap();
    assert_eq!(result.outcome, RoundOutcome::TimedOut);
    assert_eq!(controller.state().jokers, 3);

    // a late timer for the same round is stale once the game moved on
    store.advance(player, 0).await.unwrap();
    assert!(matches!(
        store.expire_round(player, 0),
        Err(CoreError::StaleAction { .. })
    ));
}

#[tokio::test]
async fn provider_outage_mid_game_is_recoverable() {
    let provider = FlakyProvider {
        calls: AtomicUsize::new(0),
        every: 2,
    };
    let store = SessionStore::new(
        QuestionSource::new(Arc::new(provider), Arc::new(NoopTranslator)),
        Duration::from_secs(60),
    );
    let player = UserId(4004);

    store.start(player, false).await.unwrap();
    let choice = correct_choice(&store, player);
    store.submit_answer(player, 0, choice).unwrap();

    let before = store.snapshot(player).unwrap();
    assert!(matches!(
        store.advance(player, 0).await,
        Err(CoreError::ProviderUnavailable { .. })
    ));
    assert_eq!(store.snapshot(player).unwrap(), before);

    match store.advance(player, 0).await.unwrap() {
        AdvanceOutcome::NextQuestion(controller) => {
            assert_eq!(controller.round(), 1);
            assert_eq!(controller.state().current_prize(), 50);
        }
        other => panic!("unexpected {:?}", other),
    }
}
