use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use deboche_core::{CommandArgs, DebocheConfig, Reply};
use serenity::all::{
    Command, CommandInteraction, Context, EventHandler, GatewayIntents, GuildId, Interaction,
    Message, Ready,
};
use serenity::Client;
use tracing::{debug, error, info, warn};

use crate::commands;
use crate::components::handle_component;
use crate::context::BotContext;
use crate::error::{DiscordError, Result};
use crate::render;
use crate::request::{Request, SlashRequest, TextRequest};

/// What the bot needs to hear about
pub fn default_intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::DIRECT_MESSAGES
}

/// Gateway event handler. One per client, shared across shards.
pub struct DebocheBot {
    bot: BotContext,
    bot_user: OnceLock<u64>,
    sweeper_started: AtomicBool,
}

/// Builder for the serenity client running [`DebocheBot`]
pub struct DebocheBotBuilder {
    bot: BotContext,
    intents: GatewayIntents,
}

impl DebocheBotBuilder {
    pub fn with_intents(mut self, intents: GatewayIntents) -> Self {
        self.intents = intents;
        self
    }

    pub async fn build(self) -> Result<Client> {
        let token = self.bot.config.require_token()?.to_string();
        let handler = DebocheBot::new(self.bot);
        Client::builder(&token, self.intents)
            .event_handler(handler)
            .await
            .map_err(|e| DiscordError::client_failed(e, &token))
    }
}

impl DebocheBot {
    pub fn new(bot: BotContext) -> Self {
        Self {
            bot,
            bot_user: OnceLock::new(),
            sweeper_started: AtomicBool::new(false),
        }
    }

    pub fn builder(bot: BotContext) -> DebocheBotBuilder {
        DebocheBotBuilder {
            bot,
            intents: default_intents(),
        }
    }

    pub fn context(&self) -> &BotContext {
        &self.bot
    }

    async fn register_commands(&self, ctx: &Context) -> Result<usize> {
        let commands = render::create_commands(self.bot.registry.descriptors());
        let count = commands.len();
        let guild_id = self.bot.config.bot.guild_id;
        let registered = match guild_id {
            Some(id) => GuildId::new(id).set_commands(&ctx.http, commands).await,
            None => Command::set_global_commands(&ctx.http, commands).await,
        };
        registered.map_err(|cause| DiscordError::CommandRegistrationFailed {
            command_names: self
                .bot
                .registry
                .names()
                .into_iter()
                .map(String::from)
                .collect(),
            guild_id,
            cause,
        })?;
        Ok(count)
    }

    fn start_sweeper(&self) {
        if self.sweeper_started.swap(true, Ordering::SeqCst) {
            return;
        }
        let bot = self.bot.clone();
        let period = Duration::from_secs(bot.config.joker.sweep_interval_secs.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let (games, pages) = bot.sweep_idle(Instant::now());
                if games > 0 {
                    info!(games, pages, "evicted idle games");
                }
            }
        });
        debug!(?period, "idle sweeper started");
    }

    async fn run_slash(&self, ctx: &Context, command: CommandInteraction) {
        let name = command.data.name.clone();
        let options = command.data.options.clone();
        let mut req = SlashRequest::new(ctx.http.clone(), command);
        // dispatch already told the user about any failure
        let _ = commands::dispatch(&self.bot, &name, &mut req, move |descriptor| {
            Ok(render::args_from_options(descriptor, &options))
        })
        .await;
    }

    async fn run_text(&self, ctx: &Context, message: Message) {
        let Some((name, rest)) =
            parse_invocation(&message.content, self.bot.prefix(), self.bot_user.get().copied())
        else {
            return;
        };
        let rest = rest.to_string();

        let text_enabled = match self.bot.registry.get(&name) {
            Some(command) => command.descriptor.text_enabled,
            None => {
                debug!(command = %name, "ignoring unknown text command");
                return;
            }
        };

        let mut req = TextRequest::new(ctx.http.clone(), message);
        if !text_enabled {
            let notice = Reply::error(format!("Este comando só funciona como `/{}`.", name));
            if let Err(e) = req.respond(notice).await {
                warn!("could not send slash-only notice: {}", e);
            }
            return;
        }

        let _ = commands::dispatch(&self.bot, &name, &mut req, |descriptor| {
            CommandArgs::parse_text(descriptor, &rest)
        })
        .await;
    }
}

#[async_trait]
impl EventHandler for DebocheBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "connected to Discord");
        let _ = self.bot_user.set(ready.user.id.get());

        match self.register_commands(&ctx).await {
            Ok(count) => info!(
                count,
                guild_id = ?self.bot.config.bot.guild_id,
                "slash commands registered"
            ),
            Err(e) => error!("{:?}", miette::Report::new(e)),
        }
        self.start_sweeper();
    }

    async fn message(&self, ctx: Context, message: Message) {
        if message.author.bot {
            return;
        }
        self.run_text(&ctx, message).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => self.run_slash(&ctx, command).await,
            Interaction::Component(component) => {
                if let Err(e) = handle_component(&self.bot, &ctx.http, &component).await {
                    warn!(custom_id = %component.data.custom_id, "component failed: {}", e);
                }
            }
            other => debug!(kind = ?other.kind(), "ignoring interaction"),
        }
    }
}

/// Split a text message into a lowercased command name and the rest, if it
/// starts with the prefix or mentions the bot first
pub fn parse_invocation<'a>(
    content: &'a str,
    prefix: &str,
    bot_user: Option<u64>,
) -> Option<(String, &'a str)> {
    let content = content.trim_start();
    let body = match content.strip_prefix(prefix).filter(|_| !prefix.is_empty()) {
        Some(body) => body,
        None => strip_mention(content, bot_user?)?,
    };

    let body = body.trim_start();
    let (name, rest) = match body.find(char::is_whitespace) {
        Some(at) => (&body[..at], body[at..].trim_start()),
        None => (body, ""),
    };
    if name.is_empty() {
        return None;
    }
    Some((name.to_lowercase(), rest))
}

fn strip_mention(content: &str, bot_user: u64) -> Option<&str> {
    let plain = format!("<@{}>", bot_user);
    let nick = format!("<@!{}>", bot_user);
    content
        .strip_prefix(plain.as_str())
        .or_else(|| content.strip_prefix(nick.as_str()))
}

/// Load everything, connect and block until the gateway closes
pub async fn run_bot(config: DebocheConfig) -> Result<()> {
    let bot = BotContext::from_config(config).await?;
    info!(
        commands = bot.registry.len(),
        prefix = bot.prefix(),
        "starting Deboche"
    );
    let token = bot.config.bot.token.clone();
    let mut client = DebocheBot::builder(bot).build().await?;
    client
        .start()
        .await
        .map_err(|e| DiscordError::client_failed(e, &token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prefix_invocation() {
        assert_eq!(
            parse_invocation("!Dar <@5> 10", "!", None),
            Some(("dar".to_string(), "<@5> 10"))
        );
        assert_eq!(
            parse_invocation("!carteira", "!", None),
            Some(("carteira".to_string(), ""))
        );
        assert_eq!(parse_invocation("olá !carteira", "!", None), None);
        assert_eq!(parse_invocation("!", "!", None), None);
    }

    #[test]
    fn test_mention_invocation() {
        assert_eq!(
            parse_invocation("<@42> clima  Porto", "!", Some(42)),
            Some(("clima".to_string(), "Porto"))
        );
        assert_eq!(
            parse_invocation("<@!42> xkcd", "!", Some(42)),
            Some(("xkcd".to_string(), ""))
        );
        assert_eq!(parse_invocation("<@43> xkcd", "!", Some(42)), None);
        assert_eq!(parse_invocation("<@42> xkcd", "!", None), None);
    }

    #[test]
    fn test_longer_prefix() {
        assert_eq!(
            parse_invocation("db!slot 5", "db!", None),
            Some(("slot".to_string(), "5"))
        );
    }

    #[test]
    fn test_intents_include_message_content() {
        assert!(default_intents().contains(GatewayIntents::MESSAGE_CONTENT));
        assert!(default_intents().contains(GatewayIntents::DIRECT_MESSAGES));
    }
}
