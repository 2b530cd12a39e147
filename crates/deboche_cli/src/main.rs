mod commands;
mod output;

use clap::{Parser, Subcommand};
use deboche_core::DebocheConfig;
use miette::Result;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "deboche")]
#[command(about = "Deboche Discord bot and Concurso JOKER quiz")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and serve commands
    Run,
    /// Play the Joker quiz in this terminal
    Play {
        /// Draw questions from a JSON file instead of the trivia API
        #[arg(long)]
        fixture: Option<PathBuf>,

        /// Translate remote questions to Portuguese
        #[arg(long)]
        em_portugues: bool,
    },
    /// Database inspection
    Db {
        #[command(subcommand)]
        cmd: DbCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Show database stats
    Stats {
        /// How many commands to list
        #[arg(long, default_value = "10")]
        top: u32,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Save current configuration to file
    Save {
        /// Path to save configuration
        #[arg(default_value = "deboche.toml")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .rgb_colors(miette::RgbColors::Preferred)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if cli.debug {
        EnvFilter::new("deboche_core=debug,deboche_discord=debug,deboche_cli=debug")
    } else {
        EnvFilter::new("deboche_core=info,deboche_discord=info,deboche_cli=info,warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or(filter);

    fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .compact()
        .init();

    match &cli.config {
        Some(path) => info!("Loading config from: {:?}", path),
        None => info!("Loading config from standard locations"),
    }
    let mut config = DebocheConfig::load(cli.config.as_deref()).await?;

    if let Some(db_path) = &cli.db_path {
        info!("Overriding database path with: {:?}", db_path);
        config.database.path = db_path.clone();
    }

    tracing::debug!("Using database config: {:?}", config.database);

    match cli.command {
        Commands::Run => commands::run::run(config).await?,
        Commands::Play {
            fixture,
            em_portugues,
        } => commands::play::play(&config, fixture.as_deref(), em_portugues).await?,
        Commands::Db { cmd } => match cmd {
            DbCommands::Stats { top } => commands::db::stats(&config, top).await?,
        },
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config::show(&config).await?,
            ConfigCommands::Save { path } => commands::config::save(&config, &path).await?,
        },
    }

    Ok(())
}
