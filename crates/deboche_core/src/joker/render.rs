//! Pure formatting of game state into chat replies.

use super::action::{JokerAction, JokerComponent};
use super::controller::{RoundOutcome, RoundResult, TurnController};
use super::question::{OPTION_LETTERS, Question};
use super::state::{PRIZE_TABLE, round_timeout};
use crate::reply::{ButtonSpec, ButtonStyle, EmbedSpec, Reply, colours};

fn option_lines(question: &Question, controller: &TurnController, reveal: bool) -> String {
    let hidden = &controller.state().hidden_options;
    question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let letter = OPTION_LETTERS[i];
            if hidden.contains(&i) {
                format!("~~{}.~~ ❌", letter)
            } else if reveal && i == question.correct {
                format!("**{}. {}** ✅", letter, option)
            } else {
                format!("{}. {}", letter, option)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn question_embed(controller: &TurnController, question: &Question, reveal: bool) -> EmbedSpec {
    let state = controller.state();
    let round = state.current_index;
    let stake = PRIZE_TABLE.get(round).copied().unwrap_or(0);

    EmbedSpec::new(format!("Pergunta {}", round + 1))
        .description(format!(
            "{}\n\n{}",
            question.text,
            option_lines(question, controller, reveal)
        ))
        .colour(colours::BLUE)
        .field("🎭 Jokers", state.jokers.to_string(), true)
        .field("💰 Garantido", format!("{}€", state.current_prize()), true)
        .field(
            "⏱️ Tempo",
            format!("{}s", round_timeout(round).as_secs()),
            true,
        )
        .footer(format!("Esta pergunta vale {}€", stake))
}

/// The question prompt with answer and joker buttons
pub fn render_prompt(controller: &TurnController) -> Reply {
    let state = controller.state();
    let Some(question) = state.active_question.as_ref() else {
        return render_game_over(state.current_prize());
    };
    let player = controller.player_id();
    let round = controller.round();

    let answers = OPTION_LETTERS
        .iter()
        .enumerate()
        .map(|(i, letter)| {
            ButtonSpec::new(
                JokerComponent::new(player, round, JokerAction::Answer(i)).to_string(),
                letter.to_string(),
                ButtonStyle::Primary,
            )
            .disabled(state.hidden_options.contains(&i))
        })
        .collect();

    let joker = ButtonSpec::new(
        JokerComponent::new(player, round, JokerAction::UseJoker).to_string(),
        format!("🎭 Usar Joker ({})", state.jokers),
        ButtonStyle::Secondary,
    )
    .disabled(state.jokers == 0);

    Reply::embed(question_embed(controller, question, false))
        .with_content(player.mention())
        .with_row(answers)
        .with_row(vec![joker])
}

/// The prompt after the round is settled: no buttons, correct answer marked
pub fn render_resolved_prompt(controller: &TurnController, question: &Question) -> Reply {
    Reply::embed(question_embed(controller, question, true))
}

/// Short per-round verdict
pub fn render_round_result(result: &RoundResult) -> Reply {
    let correct = OPTION_LETTERS[result.correct_index];
    let message = match result.outcome {
        RoundOutcome::Correct => "✅ Correto!".to_string(),
        RoundOutcome::Incorrect => format!("❌ Errado! A resposta certa era **{}**.", correct),
        RoundOutcome::TimedOut => {
            format!("⏰ Tempo esgotado! A resposta certa era **{}**.", correct)
        }
    };
    Reply::text(message).ephemeral(true)
}

pub fn render_game_over(prize: u64) -> Reply {
    let (colour, line) = if prize > 0 {
        (colours::GOLD, "O prémio foi depositado na tua carteira.")
    } else {
        (colours::GREY, "Fica para a próxima!")
    };
    Reply::embed(EmbedSpec::new("Concurso JOKER").description(line).colour(colour))
        .with_content(format!("🎉 Fim! Ganhou **{}€**", prize))
}

/// Shown when the next question could not be fetched
pub fn render_retry(controller: &TurnController) -> Reply {
    let retry = ButtonSpec::new(
        JokerComponent::new(controller.player_id(), controller.round(), JokerAction::Retry)
            .to_string(),
        "🔄 Tentar outra vez",
        ButtonStyle::Success,
    );
    Reply::text("⚠️ Não consegui obter a próxima pergunta. O teu progresso está guardado.")
        .with_row(vec![retry])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::UserId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn controller() -> TurnController {
        let question = Question::new(
            "Quantas patas tem uma aranha?",
            vec![
                "Seis".to_string(),
                "Oito".to_string(),
                "Dez".to_string(),
                "Quatro".to_string(),
            ],
            1,
        )
        .unwrap();
        TurnController::start(UserId(77), question)
    }

    #[test]
    fn test_prompt_layout() {
        let reply = render_prompt(&controller());
        let embed = reply.embed.as_ref().unwrap();
        assert_eq!(embed.title.as_deref(), Some("Pergunta 1"));

        let description = embed.description.as_deref().unwrap();
        assert!(description.starts_with("Quantas patas tem uma aranha?\n\n"));
        assert!(description.contains("A. Seis\nB. Oito\nC. Dez\nD. Quatro"));

        let buttons: Vec<_> = reply.buttons().collect();
        assert_eq!(buttons.len(), 5);
        assert_eq!(buttons[0].custom_id, "joker:77:0:a0");
        assert_eq!(buttons[4].label, "🎭 Usar Joker (7)");
        assert!(buttons.iter().all(|b| !b.disabled));
    }

    #[test]
    fn test_hidden_options_are_struck_and_disabled() {
        let mut c = controller();
        let hidden = c.use_joker(0, &mut StdRng::seed_from_u64(2)).unwrap();
        let reply = render_prompt(&c);

        let description = reply.embed.unwrap().description.unwrap();
        let letter = OPTION_LETTERS[hidden];
        assert!(description.contains(&format!("~~{}.~~ ❌", letter)));

        let buttons: Vec<_> = reply.rows[0].iter().collect();
        assert!(buttons[hidden].disabled);
        assert!(!buttons[1].disabled);
        assert_eq!(reply.rows[1][0].label, "🎭 Usar Joker (6)");
    }

    #[test]
    fn test_joker_button_disabled_when_spent() {
        let mut c = controller();
        // three timeouts burn 7 -> 4 -> 1 -> 0 jokers
        for round in 0..3 {
            c.expire_round(round).unwrap();
            let next = Question::new(
                format!("Pergunta {}", round + 2),
                vec!["1".into(), "2".into(), "3".into(), "4".into()],
                0,
            )
            .unwrap();
            c.commit_advance(round, next).unwrap();
        }
        assert_eq!(c.state().jokers, 0);

        let reply = render_prompt(&c);
        assert!(reply.rows[1][0].disabled);
        assert_eq!(reply.embed.unwrap().title.as_deref(), Some("Pergunta 4"));
    }

    #[test]
    fn test_round_result_messages() {
        let mut c = controller();
        let result = c.submit_answer(0, 1).unwrap();
        assert_eq!(render_round_result(&result).content.as_deref(), Some("✅ Correto!"));

        let mut c = controller();
        let result = c.submit_answer(0, 0).unwrap();
        let reply = render_round_result(&result);
        assert!(reply.ephemeral);
        assert!(reply.content.unwrap().contains("**B**"));
    }

    #[test]
    fn test_resolved_prompt_marks_answer() {
        let mut c = controller();
        c.submit_answer(0, 0).unwrap();
        let question = c.state().active_question.clone().unwrap();
        let reply = render_resolved_prompt(&c, &question);
        assert!(reply.rows.is_empty());
        assert!(reply.embed.unwrap().description.unwrap().contains("**B. Oito** ✅"));
    }

    #[test]
    fn test_game_over_message() {
        let reply = render_game_over(2500);
        assert_eq!(reply.content.as_deref(), Some("🎉 Fim! Ganhou **2500€**"));
        assert!(reply.rows.is_empty());
        assert_eq!(reply.embed.unwrap().colour, Some(colours::GOLD));
    }
}
