//! Coins: earning, spending and gambling them away.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deboche_core::queue::render_queue;
use deboche_core::reply::colours;
use deboche_core::{CommandArgs, CommandDescriptor, EmbedSpec, OptionSpec, Reply};

use super::CommandHandler;
use crate::context::{BotContext, Registry};
use crate::error::Result;
use crate::request::Request;

const CATEGORY: &str = "Economia";

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        CommandDescriptor::new("trabalhar", "Trabalha para ganhar moedas (uma vez por dia)")
            .category(CATEGORY),
        Arc::new(Work),
    )?;
    registry.register(
        CommandDescriptor::new("pedir", "Pede esmola a quem passa").category(CATEGORY),
        Arc::new(Beg),
    )?;
    registry.register(
        CommandDescriptor::new("carteira", "Mostra as moedas e o inventário")
            .category(CATEGORY)
            .option(OptionSpec::user("utilizador", "De quem é a carteira")),
        Arc::new(Wallet),
    )?;
    registry.register(
        CommandDescriptor::new("dar", "Dá moedas a outra pessoa")
            .category(CATEGORY)
            .option(OptionSpec::user("utilizador", "Quem recebe").required())
            .option(OptionSpec::integer("quantia", "Quantas moedas").required()),
        Arc::new(Give),
    )?;
    registry.register(
        CommandDescriptor::new("slot", "Aposta moedas na slot machine")
            .category(CATEGORY)
            .option(OptionSpec::integer("quantia", "Quanto apostar").required()),
        Arc::new(Slot),
    )?;
    registry.register(
        CommandDescriptor::new("cenas", "Vê a queue ou compra algo para entrar nela")
            .category(CATEGORY)
            .option(OptionSpec::string(
                "comprar",
                "Texto a associar ao teu nome na queue",
            )),
        Arc::new(Queue),
    )?;
    Ok(())
}

pub struct Work;

#[async_trait]
impl CommandHandler for Work {
    async fn run(
        &self,
        bot: &BotContext,
        req: &mut dyn Request,
        _args: &CommandArgs,
    ) -> Result<()> {
        let user = req.user();
        let period = Duration::from_secs(bot.config.economy.work_cooldown_secs);
        bot.cooldowns.check_and_touch(user, "trabalhar", period)?;

        let (earned, balance) = match bot.db.work(user).await {
            Ok(paid) => paid,
            Err(e) => {
                // nothing was paid, so the cooldown should not count
                bot.cooldowns.reset(user, "trabalhar");
                return Err(e.into());
            }
        };

        req.respond(Reply::embed(
            EmbedSpec::new("💼 Dia de trabalho")
                .description(format!(
                    "Trabalhaste e ganhaste **{}** 🪙\nSaldo: {} 🪙",
                    earned, balance
                ))
                .colour(colours::GREEN),
        ))
        .await?;
        Ok(())
    }
}

pub struct Beg;

#[async_trait]
impl CommandHandler for Beg {
    async fn run(
        &self,
        bot: &BotContext,
        req: &mut dyn Request,
        _args: &CommandArgs,
    ) -> Result<()> {
        let user = req.user();
        let period = Duration::from_secs(bot.config.economy.beg_cooldown_secs);
        bot.cooldowns.check_and_touch(user, "pedir", period)?;

        let (earned, balance) = match bot.db.beg(user).await {
            Ok(paid) => paid,
            Err(e) => {
                bot.cooldowns.reset(user, "pedir");
                return Err(e.into());
            }
        };

        let line = if earned == 0 {
            "Ninguém te deu nada... 😢".to_string()
        } else {
            format!("Alguém teve pena de ti e deu-te **{}** 🪙", earned)
        };
        req.respond(Reply::text(format!("{}\nSaldo: {} 🪙", line, balance)))
            .await?;
        Ok(())
    }
}

pub struct Wallet;

#[async_trait]
impl CommandHandler for Wallet {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let target = args.user("utilizador").unwrap_or_else(|| req.user());
        let name = req.display_name_of(target).await;
        let reply = bot.db.wallet(target, &name).await?;
        req.respond(reply).await?;
        Ok(())
    }
}

pub struct Give;

#[async_trait]
impl CommandHandler for Give {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let to = args.require_user("dar", "utilizador")?;
        let amount = args.require_integer("dar", "quantia")?;
        let remaining = bot.db.transfer_coins(req.user(), to, amount).await?;

        req.respond(Reply::text(format!(
            "Deste **{}** 🪙 a {}. Ficaste com {} 🪙.",
            amount,
            to.mention(),
            remaining
        )))
        .await?;
        Ok(())
    }
}

pub struct Slot;

#[async_trait]
impl CommandHandler for Slot {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let bet = args.require_integer("slot", "quantia")?;
        let (spin, balance) = bot.db.slot(req.user(), bet).await?;

        let (verdict, colour) = if spin.winnings > 0 {
            (format!("Ganhaste **{}** 🪙!", spin.winnings), colours::GOLD)
        } else {
            (format!("Perdeste **{}** 🪙.", spin.bet), colours::RED)
        };
        req.respond(Reply::embed(
            EmbedSpec::new("🎰 Slot machine")
                .description(format!("[ {} ]\n\n{}", spin.display(), verdict))
                .colour(colour)
                .footer(format!("Saldo: {} 🪙", balance)),
        ))
        .await?;
        Ok(())
    }
}

/// With `comprar`, joins the server's queue; without, lists it
pub struct Queue;

#[async_trait]
impl CommandHandler for Queue {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let scope = req.guild_id().unwrap_or_else(|| req.channel_id());
        let reply = match args.str("comprar") {
            Some(text) => {
                let user = req.user();
                bot.queues.push(scope, user, text)?;
                Reply::text(format!(
                    "✅ {} adicionou **{}** à queue!",
                    user.mention(),
                    text.trim()
                ))
            }
            None => render_queue(&bot.queues.entries(scope)),
        };
        req.respond(reply).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::bot;
    use crate::error::DiscordError;
    use crate::request::{MockRequest, PostedMessage};
    use deboche_core::{ArgValue, CoreError, UserId};

    fn posted() -> PostedMessage {
        PostedMessage {
            channel_id: 1,
            message_id: 1,
        }
    }

    fn request_from(user: u64) -> MockRequest {
        let mut req = MockRequest::new();
        req.expect_user().return_const(UserId(user));
        req
    }

    #[tokio::test]
    async fn test_work_pays_then_cools_down() {
        let bot = bot().await;
        let mut req = request_from(1);
        req.expect_respond()
            .withf(|reply| {
                reply
                    .embed
                    .as_ref()
                    .and_then(|e| e.description.as_deref())
                    .is_some_and(|d| d.starts_with("Trabalhaste"))
            })
            .times(1)
            .returning(|_| Ok(posted()));

        Work.run(&bot, &mut req, &CommandArgs::new()).await.unwrap();
        let balance = bot.db.balance(UserId(1)).await.unwrap();
        assert!((50..=200).contains(&balance));

        let again = Work.run(&bot, &mut req, &CommandArgs::new()).await;
        assert!(matches!(
            again,
            Err(DiscordError::Core(CoreError::OnCooldown { .. }))
        ));
        assert_eq!(bot.db.balance(UserId(1)).await.unwrap(), balance);
    }

    #[tokio::test]
    async fn test_give_moves_coins() {
        let bot = bot().await;
        bot.db.add_coins(UserId(1), 100).await.unwrap();

        let mut req = request_from(1);
        req.expect_respond()
            .withf(|reply| {
                reply.content.as_deref() == Some("Deste **40** 🪙 a <@2>. Ficaste com 60 🪙.")
            })
            .times(1)
            .returning(|_| Ok(posted()));

        let args = CommandArgs::new()
            .with("utilizador", ArgValue::User(UserId(2)))
            .with("quantia", ArgValue::Integer(40));
        Give.run(&bot, &mut req, &args).await.unwrap();

        assert_eq!(bot.db.balance(UserId(2)).await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_give_more_than_you_have() {
        let bot = bot().await;
        let mut req = request_from(3);
        let args = CommandArgs::new()
            .with("utilizador", ArgValue::User(UserId(4)))
            .with("quantia", ArgValue::Integer(10));

        let result = Give.run(&bot, &mut req, &args).await;
        assert!(matches!(
            result,
            Err(DiscordError::Core(CoreError::InsufficientFunds { .. }))
        ));
    }

    #[tokio::test]
    async fn test_slot_takes_the_bet() {
        let bot = bot().await;
        bot.db.add_coins(UserId(5), 10).await.unwrap();

        let mut req = request_from(5);
        req.expect_respond().times(1).returning(|_| Ok(posted()));
        let args = CommandArgs::new().with("quantia", ArgValue::Integer(10));
        Slot.run(&bot, &mut req, &args).await.unwrap();

        let balance = bot.db.balance(UserId(5)).await.unwrap();
        assert!([0, 20, 50].contains(&balance), "balance {}", balance);
    }

    #[tokio::test]
    async fn test_wallet_of_someone_else() {
        let bot = bot().await;
        bot.db.add_coins(UserId(7), 33).await.unwrap();

        let mut req = request_from(6);
        req.expect_display_name_of()
            .withf(|user| *user == UserId(7))
            .returning(|_| "Zé".to_string());
        req.expect_respond()
            .withf(|reply| {
                let embed = reply.embed.as_ref().unwrap();
                embed.title.as_deref() == Some("Inventário de Zé")
                    && embed.description.as_deref().unwrap().contains("33")
            })
            .times(1)
            .returning(|_| Ok(posted()));

        let args = CommandArgs::new().with("utilizador", ArgValue::User(UserId(7)));
        Wallet.run(&bot, &mut req, &args).await.unwrap();
    }

    #[tokio::test]
    async fn test_queue_join_then_list() {
        let bot = bot().await;

        let mut join = request_from(8);
        join.expect_guild_id().return_const(Some(77u64));
        join.expect_respond()
            .withf(|reply| {
                reply.content.as_deref() == Some("✅ <@8> adicionou **bifana** à queue!")
            })
            .times(1)
            .returning(|_| Ok(posted()));
        let args = CommandArgs::new().with("comprar", ArgValue::String("bifana".to_string()));
        Queue.run(&bot, &mut join, &args).await.unwrap();

        let mut list = request_from(9);
        list.expect_guild_id().return_const(Some(77u64));
        list.expect_respond()
            .withf(|reply| {
                reply
                    .embed
                    .as_ref()
                    .and_then(|e| e.description.as_deref())
                    == Some("1. <@8> - bifana")
            })
            .times(1)
            .returning(|_| Ok(posted()));
        Queue.run(&bot, &mut list, &CommandArgs::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_queue_outside_a_server_uses_the_channel() {
        let bot = bot().await;
        bot.queues.push(77, UserId(1), "bifana").unwrap();

        let mut req = MockRequest::new();
        req.expect_guild_id().return_const(None::<u64>);
        req.expect_channel_id().return_const(5u64);
        req.expect_respond()
            .withf(|reply| reply.content.as_deref() == Some("📭 A queue está vazia."))
            .times(1)
            .returning(|_| Ok(posted()));
        Queue.run(&bot, &mut req, &CommandArgs::new()).await.unwrap();
    }
}
