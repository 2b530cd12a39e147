//! The Joker quiz in a terminal, one line per move.

use std::path::Path;
use std::sync::Arc;

use deboche_core::joker::render::{render_game_over, render_prompt, render_round_result};
use deboche_core::joker::{
    AdvancePlan, FixtureProvider, MyMemoryTranslator, NoopTranslator, QuestionProvider,
    QuestionSource, RoundResult, TurnController, round_timeout,
};
use deboche_core::{ApiClient, CoreError, DebocheConfig, UserId};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{Instant, timeout_at};
use tracing::debug;

use crate::output::Output;

/// Terminal games are not tied to a Discord account
const LOCAL_PLAYER: UserId = UserId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Answer(usize),
    Joker,
    Quit,
}

/// `A`-`D` answers, `J` spends a joker, `Q` quits
pub fn parse_move(line: &str) -> Option<Move> {
    let mut chars = line.trim().chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    match first.to_ascii_uppercase() {
        letter @ 'A'..='D' => Some(Move::Answer(letter as usize - 'A' as usize)),
        'J' => Some(Move::Joker),
        'Q' => Some(Move::Quit),
        _ => None,
    }
}

type Input = Lines<BufReader<Stdin>>;

enum RoundEnd {
    Resolved(RoundResult),
    Quit,
}

async fn question_source(
    config: &DebocheConfig,
    fixture: Option<&Path>,
) -> deboche_core::Result<QuestionSource> {
    if let Some(path) = fixture {
        let questions = FixtureProvider::load(path).await?;
        return Ok(QuestionSource::new(Arc::new(questions), Arc::new(NoopTranslator)));
    }
    let api = ApiClient::from_config(&config.http)?;
    let translator = Arc::new(MyMemoryTranslator::new(
        api.http().clone(),
        config.joker.translate_url.clone(),
    ));
    QuestionSource::from_config(&config.joker, api.http().clone(), translator).await
}

pub async fn play(
    config: &DebocheConfig,
    fixture: Option<&Path>,
    em_portugues: bool,
) -> Result<()> {
    let output = Output::new();
    let source = question_source(config, fixture).await?;
    let provider = source.provider(em_portugues);

    output.section("Concurso JOKER");
    output.status("A-D para responder, J para usar um joker, Q para desistir");

    let first = provider.fetch_question().await?;
    let mut game = TurnController::start(LOCAL_PLAYER, first);
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let round = game.round();
        let result = match play_round(&output, &mut game, &mut input).await? {
            RoundEnd::Resolved(result) => result,
            RoundEnd::Quit => {
                output.warning(&format!(
                    "Desististe com {}€ garantidos.",
                    game.state().current_prize()
                ));
                return Ok(());
            }
        };
        output.reply(&render_round_result(&result));

        match advance(&output, &mut game, round, provider, &mut input).await? {
            Some(prize) => {
                if let Some(line) = render_game_over(prize).content {
                    output.markdown(&line);
                }
                return Ok(());
            }
            None => continue,
        }
    }
}

fn show_prompt(output: &Output, game: &TurnController) {
    if let Some(embed) = render_prompt(game).embed {
        output.embed(&embed);
    }
}

async fn play_round(
    output: &Output,
    game: &mut TurnController,
    input: &mut Input,
) -> Result<RoundEnd> {
    let round = game.round();
    // jokers do not buy extra time
    let deadline = Instant::now() + round_timeout(round);
    show_prompt(output, game);

    loop {
        let line = match timeout_at(deadline, input.next_line()).await {
            Err(_) => return Ok(RoundEnd::Resolved(game.expire_round(round)?)),
            Ok(line) => line.into_diagnostic()?,
        };
        let Some(line) = line else {
            return Ok(RoundEnd::Quit);
        };

        match parse_move(&line) {
            Some(Move::Answer(choice)) => match game.submit_answer(round, choice) {
                Ok(result) => return Ok(RoundEnd::Resolved(result)),
                Err(e) => output.warning(&e.user_message()),
            },
            Some(Move::Joker) => match game.use_joker(round, &mut rand::rng()) {
                Ok(hidden) => {
                    debug!(hidden, "joker used");
                    show_prompt(output, game);
                }
                Err(e) => output.warning(&e.user_message()),
            },
            Some(Move::Quit) => return Ok(RoundEnd::Quit),
            None => output.warning("Escreve A, B, C, D, J ou Q."),
        }
    }
}

/// Move past `round`. `Some(prize)` once the game is over.
async fn advance(
    output: &Output,
    game: &mut TurnController,
    round: usize,
    provider: &dyn QuestionProvider,
    input: &mut Input,
) -> Result<Option<u64>> {
    loop {
        match game.advance(round, provider).await {
            Ok(AdvancePlan::Finished { prize }) => return Ok(Some(prize)),
            Ok(AdvancePlan::NeedsQuestion { .. }) => return Ok(None),
            Err(e @ CoreError::ProviderUnavailable { .. }) => {
                output.error(&e.user_message());
                output.status(&format!(
                    "{} para tentar outra vez, Q para desistir",
                    "Enter".bright_white()
                ));
                let line = input.next_line().await.into_diagnostic()?;
                if line.as_deref().and_then(parse_move) == Some(Move::Quit) || line.is_none() {
                    return Ok(Some(game.state().current_prize()));
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}
