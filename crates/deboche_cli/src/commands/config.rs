use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use deboche_core::config::{self, DebocheConfig};
use std::path::Path;

use crate::output::Output;

/// Show current configuration. The token is never printed.
pub async fn show(config: &DebocheConfig) -> Result<()> {
    let output = Output::new();

    output.section("Current Configuration");
    println!();

    let toml_str = toml::to_string_pretty(config).into_diagnostic()?;
    println!("{}", toml_str);

    if config.bot.token.is_empty() {
        output.warning("No Discord token set (use DISCORD_TOKEN)");
    } else {
        output.kv("Token", &"set".bright_green().to_string());
    }

    Ok(())
}

/// Save current configuration to file
pub async fn save(config: &DebocheConfig, path: &Path) -> Result<()> {
    let output = Output::new();

    output.info(
        "💾",
        &format!("Saving configuration to: {}", path.display()),
    );

    config::save_config(config, path).await?;

    output.success("Configuration saved successfully!");
    output.status("The Discord token is not written; keep it in DISCORD_TOKEN or .env");
    println!();
    println!("To use this configuration, run:");
    println!(
        "  {} --config {}",
        "deboche".bright_green(),
        path.display()
    );

    Ok(())
}
