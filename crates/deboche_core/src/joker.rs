//! Concurso JOKER: a nine-round multiple-choice quiz with a shrinking pool of
//! jokers and a fixed prize ladder.

pub mod action;
pub mod controller;
pub mod provider;
pub mod question;
pub mod render;
pub mod sessions;
pub mod state;
pub mod translate;

pub use action::{JokerAction, JokerComponent};
pub use controller::{AdvancePlan, Phase, RoundOutcome, RoundResult, TurnController};
pub use provider::{
    FixtureProvider, QuestionProvider, QuestionSource, TranslatingProvider, TriviaApiProvider,
};
pub use question::Question;
pub use sessions::{AdvanceOutcome, PromptLocation, Session, SessionStore};
pub use state::{GameState, INITIAL_JOKERS, PRIZE_TABLE, ROUNDS, round_timeout};
pub use translate::{MyMemoryTranslator, NoopTranslator, Translator};
