//! `/joker`: the Concurso JOKER quiz, from the first prompt to the payout.
//!
//! The game itself lives in [`SessionStore`](deboche_core::SessionStore). This
//! module posts prompts, reacts to button presses and drives each round's timer.

use std::sync::Arc;

use async_trait::async_trait;
use deboche_core::joker::render::{
    render_game_over, render_prompt, render_resolved_prompt, render_retry, render_round_result,
};
use deboche_core::joker::{
    AdvanceOutcome, JokerAction, JokerComponent, TurnController, round_timeout,
};
use deboche_core::{CommandArgs, CommandDescriptor, CoreError, OptionSpec, Reply, UserId};
use tracing::{debug, error, info, warn};

use super::CommandHandler;
use crate::components::ButtonEffect;
use crate::context::{BotContext, Registry};
use crate::error::Result;
use crate::request::{ChannelPoster, PostedMessage, Request};

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        CommandDescriptor::new("joker", "Joga o Concurso JOKER")
            .category("Jogos")
            .option(OptionSpec::boolean(
                "em_portugues",
                "Traduzir as perguntas para português",
            )),
        Arc::new(JokerCommand),
    )?;
    Ok(())
}

pub struct JokerCommand;

#[async_trait]
impl CommandHandler for JokerCommand {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let player = req.user();
        let translate = args.boolean("em_portugues").unwrap_or(false);

        // fetching (and translating) the first question can be slow
        req.defer().await?;
        bot.timers.cancel(player);
        let controller = bot.sessions.start(player, translate).await?;
        info!(%player, translate, "joker game started");

        let posted = req.respond(render_prompt(&controller)).await?;
        arm_round(bot, req.poster(), &controller, posted);
        Ok(())
    }
}

/// Remember where the prompt went and start its countdown
pub fn arm_round(
    bot: &BotContext,
    poster: Arc<dyn ChannelPoster>,
    controller: &TurnController,
    posted: PostedMessage,
) {
    let player = controller.player_id();
    let round = controller.round();
    bot.sessions.set_prompt(player, round, posted.into());

    let task_bot = bot.clone();
    bot.timers.arm(player, round_timeout(round), async move {
        let channel_id = posted.channel_id;
        if let Err(e) = on_round_timeout(&task_bot, poster, player, round, channel_id).await {
            warn!(%player, round, "round timeout handling failed: {}", e);
        }
    });
}

/// The answer window for `round` closed. A no-op if the round was settled meanwhile.
pub async fn on_round_timeout(
    bot: &BotContext,
    poster: Arc<dyn ChannelPoster>,
    player: UserId,
    round: usize,
    channel_id: u64,
) -> Result<()> {
    let (result, controller) = match bot.sessions.expire_round(player, round) {
        Ok(expired) => expired,
        Err(e) => {
            debug!(%player, round, "timer no longer relevant: {}", e);
            return Ok(());
        }
    };
    info!(%player, round, "round timed out");

    if let (Some(location), Some(question)) = (
        bot.sessions.prompt(player),
        controller.state().active_question.as_ref(),
    ) {
        let resolved = render_resolved_prompt(&controller, question);
        if let Err(e) = poster.edit(location.into(), resolved).await {
            warn!(%player, "could not close the timed out prompt: {}", e);
        }
    }

    let verdict = render_round_result(&result).content.unwrap_or_default();
    poster
        .post(channel_id, Reply::text(format!("{} {}", player.mention(), verdict)))
        .await?;

    advance_and_post(bot, poster, player, round, channel_id).await
}

/// Move past a settled round: post the next prompt, the final result, or a
/// retry button when no question could be fetched.
pub async fn advance_and_post(
    bot: &BotContext,
    poster: Arc<dyn ChannelPoster>,
    player: UserId,
    round: usize,
    channel_id: u64,
) -> Result<()> {
    match bot.sessions.advance(player, round).await {
        Ok(AdvanceOutcome::NextQuestion(controller)) => {
            let posted = poster.post(channel_id, render_prompt(&controller)).await?;
            arm_round(bot, poster, &controller, posted);
        }
        Ok(AdvanceOutcome::Finished { prize, .. }) => {
            info!(%player, prize, "joker game finished");
            if prize > 0 {
                let amount = i64::try_from(prize).unwrap_or(i64::MAX);
                if let Err(e) = bot.db.add_coins(player, amount).await {
                    error!(%player, prize, "could not credit joker prize: {:?}", e);
                }
            }
            let mut reply = render_game_over(prize);
            reply.content = reply
                .content
                .map(|content| format!("{} {}", player.mention(), content));
            poster.post(channel_id, reply).await?;
        }
        Err(CoreError::ProviderUnavailable { provider, reason }) => {
            warn!(
                %player,
                round,
                provider = %provider,
                reason = %reason,
                "next question unavailable"
            );
            let controller = bot.sessions.snapshot(player)?;
            poster.post(channel_id, render_retry(&controller)).await?;
        }
        Err(
            e @ (CoreError::StaleAction { .. }
            | CoreError::WrongPhase { .. }
            | CoreError::InvalidSession { .. }),
        ) => {
            debug!(%player, round, "advance skipped: {}", e);
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// React to a quiz button. `message_id` is the message the button sits on.
pub fn press(
    bot: &BotContext,
    presser: UserId,
    message_id: u64,
    component: JokerComponent,
) -> ButtonEffect {
    match try_press(bot, presser, message_id, component) {
        Ok(effect) => effect,
        Err(e) => {
            debug!(%presser, %component, "button refused: {}", e);
            ButtonEffect::Notice(Reply::error(e.user_message()))
        }
    }
}

fn try_press(
    bot: &BotContext,
    presser: UserId,
    message_id: u64,
    component: JokerComponent,
) -> deboche_core::Result<ButtonEffect> {
    component.ensure_owner(presser)?;
    let player = component.player;
    let round = component.round;

    match component.action {
        JokerAction::Answer(choice) => {
            ensure_current_prompt(bot, player, round, message_id)?;
            let (result, controller) = bot.sessions.submit_answer(player, round, choice)?;
            bot.timers.cancel(player);
            let message = match controller.state().active_question.as_ref() {
                Some(question) => render_resolved_prompt(&controller, question),
                None => render_prompt(&controller),
            };
            Ok(ButtonEffect::Update {
                message,
                notice: Some(render_round_result(&result)),
                then_advance: Some((player, round)),
            })
        }
        JokerAction::UseJoker => {
            ensure_current_prompt(bot, player, round, message_id)?;
            let (hidden, controller) = bot.sessions.use_joker(player, round)?;
            debug!(%player, round, hidden, "joker used");
            Ok(ButtonEffect::Update {
                message: render_prompt(&controller),
                notice: None,
                then_advance: None,
            })
        }
        JokerAction::Retry => Ok(ButtonEffect::Update {
            message: Reply::text("⏳ A buscar a próxima pergunta..."),
            notice: None,
            then_advance: Some((player, round)),
        }),
    }
}

/// Buttons left on an older prompt of a restarted game must not act on the new one
fn ensure_current_prompt(
    bot: &BotContext,
    player: UserId,
    round: usize,
    message_id: u64,
) -> deboche_core::Result<()> {
    match bot.sessions.prompt(player) {
        Some(location) if location.message_id != message_id => Err(CoreError::StaleAction {
            player_id: player,
            action_round: round,
            current_round: bot.sessions.snapshot(player)?.round(),
        }),
        _ => Ok(()),
    }
}
