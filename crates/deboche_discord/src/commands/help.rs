use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use deboche_core::reply::colours;
use deboche_core::{CommandArgs, CommandDescriptor, Paginator};

use super::CommandHandler;
use crate::context::{BotContext, Registry};
use crate::error::Result;
use crate::request::Request;

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        CommandDescriptor::new("ajuda", "Lista todos os comandos").category("Geral"),
        Arc::new(Help),
    )?;
    Ok(())
}

/// Command list grouped by category, in registration order
pub fn help_text(registry: &Registry, prefix: &str) -> String {
    let mut categories: Vec<&'static str> = Vec::new();
    for descriptor in registry.descriptors() {
        if !categories.contains(&descriptor.category) {
            categories.push(descriptor.category);
        }
    }

    let mut text = String::new();
    for category in categories {
        let _ = writeln!(text, "**{}**", category);
        for descriptor in registry.descriptors().filter(|d| d.category == category) {
            let _ = writeln!(text, "{}", line(descriptor, prefix));
        }
        text.push('\n');
    }
    text.trim_end().to_string()
}

fn line(descriptor: &CommandDescriptor, prefix: &str) -> String {
    let shown = if descriptor.text_enabled { prefix } else { "/" };
    format!("`{}{}` {}", shown, descriptor.usage(), descriptor.description)
}

pub struct Help;

#[async_trait]
impl CommandHandler for Help {
    async fn run(
        &self,
        bot: &BotContext,
        req: &mut dyn Request,
        _args: &CommandArgs,
    ) -> Result<()> {
        let prefix = if req.is_slash() { "/" } else { bot.prefix() };
        let text = help_text(&bot.registry, prefix);
        let (_, reply) = bot
            .paginators
            .insert(Paginator::new(&text, "📖 Comandos do Deboche", colours::BLUE));
        req.respond(reply).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::bot;
    use crate::request::{MockRequest, PostedMessage};

    #[tokio::test]
    async fn test_help_groups_by_category() {
        let bot = bot().await;
        let text = help_text(&bot.registry, "!");

        let economy = text.find("**Economia**").unwrap();
        let fun = text.find("**Diversão**").unwrap();
        assert!(text.starts_with("**Jogos**"));
        assert!(economy < fun);
        assert!(text.contains("`!dar <utilizador> <quantia>` Dá moedas a outra pessoa"));
        assert!(text.contains("`!joker [em_portugues]`"));
    }

    #[tokio::test]
    async fn test_slash_help_uses_slash() {
        let bot = bot().await;
        let mut req = MockRequest::new();
        req.expect_is_slash().return_const(true);
        req.expect_respond()
            .withf(|reply| {
                let embed = reply.embed.as_ref().unwrap();
                embed.title.as_deref().unwrap().starts_with("📖 Comandos do Deboche")
                    && embed.description.as_deref().unwrap().contains("`/carteira [utilizador]`")
                    && reply.rows.len() == 1
            })
            .times(1)
            .returning(|_| {
                Ok(PostedMessage {
                    channel_id: 1,
                    message_id: 1,
                })
            });

        Help.run(&bot, &mut req, &CommandArgs::new()).await.unwrap();
        assert_eq!(bot.paginators.len(), 1);
    }
}
