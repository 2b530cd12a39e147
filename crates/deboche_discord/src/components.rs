//! Button presses: quiz buttons and paginator arrows.

use std::sync::Arc;

use deboche_core::joker::JokerComponent;
use deboche_core::{PageComponent, Reply, UserId};
use serenity::all::{ComponentInteraction, CreateInteractionResponse, Http};
use tracing::{debug, warn};

use crate::commands::joker;
use crate::context::BotContext;
use crate::error::{DiscordError, Result};
use crate::render;
use crate::request::{ChannelPoster, HttpPoster};

/// What a custom id refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRoute {
    Joker(JokerComponent),
    Page(PageComponent),
    Unknown,
}

pub fn route(custom_id: &str) -> ComponentRoute {
    if let Ok(component) = custom_id.parse::<JokerComponent>() {
        return ComponentRoute::Joker(component);
    }
    match custom_id.parse::<PageComponent>() {
        Ok(component) => ComponentRoute::Page(component),
        Err(_) => ComponentRoute::Unknown,
    }
}

/// How to answer a button press
#[derive(Debug, Clone, PartialEq)]
pub enum ButtonEffect {
    /// Replace the pressed message, optionally tell the presser something
    /// privately, then optionally move the player's game past a round
    Update {
        message: Reply,
        notice: Option<Reply>,
        then_advance: Option<(UserId, usize)>,
    },
    /// Leave the message alone and answer the presser privately
    Notice(Reply),
}

pub fn turn_page(bot: &BotContext, component: PageComponent) -> ButtonEffect {
    match bot.paginators.turn(component) {
        Ok(message) => ButtonEffect::Update {
            message,
            notice: None,
            then_advance: None,
        },
        Err(e) => ButtonEffect::Notice(Reply::error(e.user_message())),
    }
}

pub async fn handle_component(
    bot: &BotContext,
    http: &Arc<Http>,
    component: &ComponentInteraction,
) -> Result<()> {
    let presser = UserId(component.user.id.get());
    let custom_id = component.data.custom_id.as_str();
    let effect = match route(custom_id) {
        ComponentRoute::Joker(pressed) => {
            joker::press(bot, presser, component.message.id.get(), pressed)
        }
        ComponentRoute::Page(pressed) => turn_page(bot, pressed),
        ComponentRoute::Unknown => {
            warn!("Unknown component: {}", custom_id);
            return Err(DiscordError::HandlerNotFound {
                handler_type: "component".to_string(),
                handler_name: custom_id.to_string(),
                available_handlers: vec!["joker".to_string(), "page".to_string()],
            });
        }
    };
    debug!(%presser, custom_id, "component handled");

    let failed = |cause, responded| {
        DiscordError::interaction_failed(
            "component",
            component.id.get(),
            presser.get(),
            cause,
            responded,
        )
    };

    match effect {
        ButtonEffect::Notice(reply) => {
            component
                .create_response(
                    http,
                    CreateInteractionResponse::Message(render::interaction_message(&reply)),
                )
                .await
                .map_err(|e| failed(e, false))?;
        }
        ButtonEffect::Update {
            message,
            notice,
            then_advance,
        } => {
            component
                .create_response(
                    http,
                    CreateInteractionResponse::UpdateMessage(render::update_message(&message)),
                )
                .await
                .map_err(|e| failed(e, false))?;

            let poster = Arc::new(HttpPoster::new(http.clone()));
            notify_then_advance(
                bot,
                poster,
                component.channel_id.get(),
                notice,
                then_advance,
                |notice| async move {
                    component
                        .create_followup(http, render::followup(&notice))
                        .await
                        .map(|_| ())
                        .map_err(|e| failed(e, true))
                },
            )
            .await?;
        }
    }
    Ok(())
}

/// Send the private notice, then move the game on. The round is already
/// settled, so a lost notice must not stop the advance.
pub async fn notify_then_advance<F, Fut>(
    bot: &BotContext,
    poster: Arc<dyn ChannelPoster>,
    channel_id: u64,
    notice: Option<Reply>,
    then_advance: Option<(UserId, usize)>,
    send_notice: F,
) -> Result<()>
where
    F: FnOnce(Reply) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if let Some(notice) = notice {
        if let Err(e) = send_notice(notice).await {
            warn!("could not send button notice: {}", e);
        }
    }

    if let Some((player, round)) = then_advance {
        joker::advance_and_post(bot, poster, player, round, channel_id).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::bot;
    use crate::request::{MockChannelPoster, PostedMessage};
    use deboche_core::joker::JokerAction;
    use deboche_core::paginator::PageDirection;
    use deboche_core::Paginator;
    use deboche_core::reply::colours;

    #[test]
    fn test_routes() {
        assert_eq!(
            route("joker:5:2:a3"),
            ComponentRoute::Joker(JokerComponent::new(UserId(5), 2, JokerAction::Answer(3)))
        );
        assert_eq!(
            route("page:9:next"),
            ComponentRoute::Page(PageComponent::new(9, PageDirection::Next))
        );
        assert_eq!(route("joker:x"), ComponentRoute::Unknown);
        assert_eq!(route("something"), ComponentRoute::Unknown);
    }

    #[tokio::test]
    async fn test_turn_page_updates_message() {
        let bot = bot().await;
        let text = "linha\n".repeat(1000);
        let (id, first) = bot
            .paginators
            .insert(Paginator::new(&text, "Ajuda", colours::BLUE));
        assert!(first.embed.as_ref().unwrap().title.as_deref().unwrap().contains("1/2"));

        match turn_page(&bot, PageComponent::new(id, PageDirection::Next)) {
            ButtonEffect::Update { message, .. } => {
                let title = message.embed.unwrap().title.unwrap();
                assert!(title.contains("2/2"), "{}", title);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expired_paginator_is_a_notice() {
        let bot = bot().await;
        let effect = turn_page(&bot, PageComponent::new(404, PageDirection::Previous));
        assert_eq!(
            effect,
            ButtonEffect::Notice(Reply::error("Não encontrei página '404'."))
        );
    }

    #[tokio::test]
    async fn test_lost_notice_still_advances() {
        let bot = bot().await;
        let player = UserId(30);
        bot.sessions.start(player, false).await.unwrap();
        bot.sessions.submit_answer(player, 0, 1).unwrap();

        let mut poster = MockChannelPoster::new();
        poster
            .expect_post()
            .withf(|channel_id, reply| *channel_id == 42 && !reply.rows.is_empty())
            .times(1)
            .returning(|channel_id, _| {
                Ok(PostedMessage {
                    channel_id,
                    message_id: 600,
                })
            });

        notify_then_advance(
            &bot,
            Arc::new(poster),
            42,
            Some(Reply::text("✅ Correto!")),
            Some((player, 0)),
            move |_| async move {
                Err(DiscordError::interaction_failed(
                    "component",
                    1,
                    player.get(),
                    serenity::Error::Other("unknown interaction"),
                    true,
                ))
            },
        )
        .await
        .unwrap();

        assert_eq!(bot.sessions.snapshot(player).unwrap().round(), 1);
        assert_eq!(bot.sessions.prompt(player).unwrap().message_id, 600);
        assert!(bot.timers.is_armed(player));
        bot.timers.cancel(player);
    }
}
