//! Profiles and usage statistics.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use deboche_core::db::ProfileField;
use deboche_core::reply::colours;
use deboche_core::{CommandArgs, CommandDescriptor, CoreError, OptionSpec, Paginator, Reply};

use super::CommandHandler;
use crate::context::{BotContext, Registry};
use crate::error::Result;
use crate::request::Request;

const CATEGORY: &str = "Perfil";

pub const DEFAULT_STATS_LIMIT: i64 = 10;
pub const MAX_STATS_LIMIT: i64 = 25;

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        CommandDescriptor::new("perfil", "Mostra o teu perfil ou o de outra pessoa")
            .category(CATEGORY)
            .option(OptionSpec::user("utilizador", "De quem é o perfil")),
        Arc::new(Profile),
    )?;
    registry.register(
        CommandDescriptor::new("editar_perfil", "Altera um campo do teu perfil")
            .category(CATEGORY)
            .option(
                OptionSpec::string("campo", "nome, bio, zona, sexo, posicao ou policia")
                    .required(),
            )
            .option(OptionSpec::string("valor", "O novo valor").required()),
        Arc::new(EditProfile),
    )?;
    registry.register(
        CommandDescriptor::new("comandos", "Os comandos mais usados")
            .category(CATEGORY)
            .option(OptionSpec::integer("limite", "Quantos mostrar (máximo 25)")),
        Arc::new(CommandStats),
    )?;
    Ok(())
}

pub struct Profile;

#[async_trait]
impl CommandHandler for Profile {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let target = args.user("utilizador").unwrap_or_else(|| req.user());
        let name = if target == req.user() {
            req.display_name()
        } else {
            req.display_name_of(target).await
        };
        let profile = bot.db.get_user(target).await?;
        req.respond(profile.render(&name)).await?;
        Ok(())
    }
}

pub struct EditProfile;

#[async_trait]
impl CommandHandler for EditProfile {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let field: ProfileField = args.require_str("editar_perfil", "campo")?.parse()?;
        let value = args.require_str("editar_perfil", "valor")?;
        bot.db.update_profile(req.user(), field, value).await?;

        req.respond(Reply::text(format!("✏️ Atualizei o teu campo **{}**.", field)).ephemeral(true))
            .await?;
        Ok(())
    }
}

pub struct CommandStats;

#[async_trait]
impl CommandHandler for CommandStats {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let limit = args.integer("limite").unwrap_or(DEFAULT_STATS_LIMIT);
        if !(1..=MAX_STATS_LIMIT).contains(&limit) {
            return Err(CoreError::invalid_argument(
                "comandos",
                "limite",
                format!("tem de estar entre 1 e {}", MAX_STATS_LIMIT),
            )
            .into());
        }

        let stats = bot.db.command_stats(limit as u32, false).await?;
        if stats.is_empty() {
            req.respond(Reply::text("Ainda ninguém usou comandos.")).await?;
            return Ok(());
        }

        let mut text = String::new();
        for (rank, usage) in stats.iter().enumerate() {
            let _ = writeln!(
                text,
                "**{}.** `{}{}` usado {} vezes",
                rank + 1,
                bot.prefix(),
                usage.command,
                usage.usage_count
            );
        }
        let (_, reply) = bot
            .paginators
            .insert(Paginator::new(&text, "📊 Comandos mais usados", colours::PURPLE));
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
    use deboche_core::{ArgValue, UserId};
    use pretty_assertions::assert_eq;

    fn posted() -> PostedMessage {
        PostedMessage {
            channel_id: 1,
            message_id: 2,
        }
    }

    #[tokio::test]
    async fn test_own_profile_uses_request_name() {
        let bot = bot().await;
        let mut req = MockRequest::new();
        req.expect_user().return_const(UserId(8));
        req.expect_display_name().return_const("Inês".to_string());
        req.expect_respond()
            .withf(|reply| {
                let author = reply.embed.as_ref().and_then(|e| e.author.as_deref());
                reply.ephemeral && author == Some("Perfil de Inês")
            })
            .times(1)
            .returning(|_| Ok(posted()));

        Profile.run(&bot, &mut req, &CommandArgs::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_edit_then_show() {
        let bot = bot().await;
        let mut req = MockRequest::new();
        req.expect_user().return_const(UserId(9));
        req.expect_respond()
            .withf(|reply| reply.content.as_deref() == Some("✏️ Atualizei o teu campo **zona**."))
            .times(1)
            .returning(|_| Ok(posted()));

        let args = CommandArgs::new()
            .with("campo", ArgValue::String("zona".into()))
            .with("valor", ArgValue::String("Alfama".into()));
        EditProfile.run(&bot, &mut req, &args).await.unwrap();

        let profile = bot.db.get_user(UserId(9)).await.unwrap();
        assert_eq!(profile.zone.as_deref(), Some("Alfama"));
    }

    #[tokio::test]
    async fn test_edit_rejects_unknown_field() {
        let bot = bot().await;
        let mut req = MockRequest::new();
        req.expect_user().return_const(UserId(9));

        let args = CommandArgs::new()
            .with("campo", ArgValue::String("coins".into()))
            .with("valor", ArgValue::String("1000000".into()));
        let result = EditProfile.run(&bot, &mut req, &args).await;
        assert!(matches!(
            result,
            Err(DiscordError::Core(CoreError::InvalidArgument { .. }))
        ));
        assert_eq!(bot.db.balance(UserId(9)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stats_are_ranked() {
        let bot = bot().await;
        for command in ["slot", "slot", "pedir"] {
            bot.db.record_command(UserId(1), command).await.unwrap();
        }

        let mut req = MockRequest::new();
        req.expect_user().return_const(UserId(1));
        req.expect_respond()
            .withf(|reply| {
                let description = reply
                    .embed
                    .as_ref()
                    .and_then(|e| e.description.as_deref())
                    .unwrap_or_default();
                description.starts_with("**1.** `!slot` usado 2 vezes")
                    && description.contains("**2.** `!pedir` usado 1 vezes")
            })
            .times(1)
            .returning(|_| Ok(posted()));

        CommandStats.run(&bot, &mut req, &CommandArgs::new()).await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_limit_bounds() {
        let bot = bot().await;
        let mut req = MockRequest::new();
        req.expect_user().return_const(UserId(1));

        let args = CommandArgs::new().with("limite", ArgValue::Integer(26));
        let result = CommandStats.run(&bot, &mut req, &args).await;
        assert!(result.is_err());
    }
}
