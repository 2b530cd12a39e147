use miette::Result;
use owo_colors::OwoColorize;
use deboche_core::{Database, DebocheConfig};

use crate::output::Output;

/// Show database statistics
pub async fn stats(config: &DebocheConfig, top: u32) -> Result<()> {
    let output = Output::new();
    let db = Database::connect(&config.database).await?;

    output.section("Database Statistics");
    output.kv("File", &config.database.path.display().to_string());
    println!();

    let totals = db.stats().await?;
    output.kv("Users", &totals.users.to_string().bright_white().to_string());
    output.kv(
        "Coins in circulation",
        &format!("{} 🪙", totals.total_coins).bright_yellow().to_string(),
    );
    output.kv(
        "Inventory items",
        &totals.inventory_items.to_string().bright_white().to_string(),
    );
    output.kv(
        "Commands run",
        &totals.commands_run.to_string().bright_white().to_string(),
    );

    let usage = db.command_stats(top, false).await?;
    if usage.is_empty() {
        output.status("No commands recorded yet");
    } else {
        output.section("Most Used Commands");
        let rows = usage
            .into_iter()
            .enumerate()
            .map(|(rank, u)| vec![(rank + 1).to_string(), u.command, u.usage_count.to_string()])
            .collect();
        output.table(&["#", "Command", "Uses"], rows);
    }

    db.close().await;
    Ok(())
}
