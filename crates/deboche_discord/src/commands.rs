//! Command handlers and the dispatch path shared by slash and text commands.

use async_trait::async_trait;
use deboche_core::{CommandArgs, CommandDescriptor, Reply};
use tracing::{debug, error, warn};

use crate::context::{BotContext, Registry};
use crate::error::Result;
use crate::request::Request;

pub mod economy;
pub mod fun;
pub mod help;
pub mod joker;
pub mod profile;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()>;
}

/// Every command the bot knows, in the order `ajuda` lists them
pub fn build_registry() -> Result<Registry> {
    let mut registry = Registry::new();
    joker::register(&mut registry)?;
    economy::register(&mut registry)?;
    profile::register(&mut registry)?;
    fun::register(&mut registry)?;
    help::register(&mut registry)?;
    Ok(registry)
}

/// Look a command up, parse its arguments and run it.
///
/// Failures are reported back to the invoking user before being returned.
/// Usage is recorded only for commands that completed.
pub async fn dispatch<F>(
    bot: &BotContext,
    name: &str,
    req: &mut dyn Request,
    parse: F,
) -> Result<()>
where
    F: FnOnce(&CommandDescriptor) -> deboche_core::Result<CommandArgs> + Send,
{
    let outcome = run_command(bot, name, req, parse).await;
    match &outcome {
        Ok(()) => {
            if let Err(e) = bot.db.record_command(req.user(), name).await {
                warn!(command = name, "could not record command usage: {}", e);
            }
        }
        Err(e) => {
            if e.is_user_error() {
                debug!(command = name, user = %req.user(), "command refused: {}", e);
            } else {
                error!(command = name, user = %req.user(), "command failed: {:?}", e);
            }
            if let Err(send) = req.respond(Reply::error(e.user_message())).await {
                warn!(command = name, "could not report failure: {}", send);
            }
        }
    }
    outcome
}

async fn run_command<F>(bot: &BotContext, name: &str, req: &mut dyn Request, parse: F) -> Result<()>
where
    F: FnOnce(&CommandDescriptor) -> deboche_core::Result<CommandArgs> + Send,
{
    let command = bot.registry.resolve(name)?;
    let args = parse(&command.descriptor)?;
    debug!(command = name, user = %req.user(), "running command");
    command.handler.run(bot, req, &args).await
}
