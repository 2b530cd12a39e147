use miette::Result;
use deboche_core::DebocheConfig;

use crate::output::Output;

/// Start the Discord bot and block until it disconnects
pub async fn run(config: DebocheConfig) -> Result<()> {
    let output = Output::new();

    config.require_token()?;
    output.section("Deboche");
    output.kv("Prefix", &config.bot.prefix);
    match config.bot.guild_id {
        Some(guild) => output.kv("Slash commands", &format!("guild {}", guild)),
        None => output.kv("Slash commands", "global"),
    }
    output.kv("Database", &config.database.path.display().to_string());
    println!();

    deboche_discord::run_bot(config).await?;
    Ok(())
}
