//! Commands that fetch something from a public API and show it.

use std::sync::Arc;

use async_trait::async_trait;
use deboche_core::apis::{meme, pokedex, waifu, weather, xkcd};
use deboche_core::{CommandArgs, CommandDescriptor, OptionSpec};

use super::CommandHandler;
use crate::context::{BotContext, Registry};
use crate::error::Result;
use crate::request::Request;

const CATEGORY: &str = "Diversão";

pub fn register(registry: &mut Registry) -> Result<()> {
    registry.register(
        CommandDescriptor::new("clima", "Tempo atual e previsão")
            .category(CATEGORY)
            .option(OptionSpec::string("local", "Cidade ou local")),
        Arc::new(Weather),
    )?;
    registry.register(
        CommandDescriptor::new("pokedex", "Procura um Pokémon")
            .category(CATEGORY)
            .option(OptionSpec::string("pokemon", "Nome ou número").required()),
        Arc::new(Pokedex),
    )?;
    registry.register(
        CommandDescriptor::new("xkcd", "O xkcd mais recente").category(CATEGORY),
        Arc::new(Xkcd),
    )?;
    registry.register(
        CommandDescriptor::new("meme", "Um meme aleatório")
            .category(CATEGORY)
            .option(OptionSpec::string("subreddit", "De onde tirar o meme")),
        Arc::new(Meme),
    )?;
    registry.register(
        CommandDescriptor::new("waifu", "Uma imagem do waifu.im")
            .category(CATEGORY)
            .option(OptionSpec::string("tags", "Tags separadas por vírgulas")),
        Arc::new(Waifu),
    )?;
    Ok(())
}

pub struct Weather;

#[async_trait]
impl CommandHandler for Weather {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let place = args
            .str("local")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(weather::DEFAULT_PLACE);
        req.defer().await?;
        let report = bot.api.weather(place).await?;
        req.respond(weather::render(&report)).await?;
        Ok(())
    }
}

pub struct Pokedex;

#[async_trait]
impl CommandHandler for Pokedex {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let name = args.require_str("pokedex", "pokemon")?;
        req.defer().await?;
        let pokemon = bot.api.pokemon(name).await?;
        req.respond(pokedex::render(&pokemon)).await?;
        Ok(())
    }
}

pub struct Xkcd;

#[async_trait]
impl CommandHandler for Xkcd {
    async fn run(
        &self,
        bot: &BotContext,
        req: &mut dyn Request,
        _args: &CommandArgs,
    ) -> Result<()> {
        let comic = bot.api.latest_comic().await?;
        req.respond(xkcd::render(&comic, &bot.api.urls().xkcd_url))
            .await?;
        Ok(())
    }
}

pub struct Meme;

#[async_trait]
impl CommandHandler for Meme {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let subreddit = args
            .str("subreddit")
            .map(|s| s.trim().trim_start_matches("r/"))
            .filter(|s| !s.is_empty())
            .unwrap_or(meme::DEFAULT_SUBREDDIT);
        let found = bot.api.random_meme(subreddit).await?;
        req.respond(meme::render(&found)).await?;
        Ok(())
    }
}

pub struct Waifu;

#[async_trait]
impl CommandHandler for Waifu {
    async fn run(&self, bot: &BotContext, req: &mut dyn Request, args: &CommandArgs) -> Result<()> {
        let tags = waifu::parse_tags(args.str("tags").unwrap_or_default());
        req.defer().await?;
        let image = bot.api.waifu(&tags).await?;
        req.respond(waifu::render(&image)).await?;
        Ok(())
    }
}
