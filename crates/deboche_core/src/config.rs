//! Configuration system for Deboche
//!
//! Settings live in a TOML file found in one of the standard locations and can
//! be overridden from the environment (`DISCORD_TOKEN`, `GUILD_ID`, `PREFIX`,
//! `DATABASE_PATH`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    CoreError, Result,
    error::ConfigError,
};

/// Resolve a path relative to a base directory
/// If the path is absolute, return it as-is
fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path == Path::new(crate::db::MEMORY_PATH) {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

/// Top-level configuration for the bot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebocheConfig {
    /// Discord connection settings
    pub bot: BotConfig,

    /// SQLite storage
    pub database: DatabaseConfig,

    /// Joker quiz settings
    pub joker: JokerConfig,

    /// Outbound HTTP settings shared by every API wrapper
    pub http: HttpConfig,

    /// Economy command tuning
    pub economy: EconomyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Never written back to disk
    #[serde(skip_serializing)]
    pub token: String,

    /// Prefix for text commands
    pub prefix: String,

    /// Register slash commands in this guild only (instant) instead of globally
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    pub path: PathBuf,

    pub max_connections: u32,
}

/// Where quiz questions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSourceKind {
    Remote,
    Fixture,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JokerConfig {
    pub source: QuestionSourceKind,
    pub trivia_url: String,

    /// JSON list of `{text, options, correct}`, used when `source = "fixture"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_path: Option<PathBuf>,

    pub translate_url: String,

    /// How often idle sessions are swept
    pub sweep_interval_secs: u64,

    /// Extra idle time allowed on top of the round timeout before a session is dropped
    pub idle_grace_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub weather_url: String,
    pub pokedex_url: String,
    pub xkcd_url: String,
    pub meme_url: String,
    pub waifu_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub work_cooldown_secs: u64,
    pub beg_cooldown_secs: u64,

    /// Longest a server's `/cenas` queue may grow
    pub queue_capacity: usize,

    /// Queues nobody has touched for this long are dropped
    pub queue_idle_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            prefix: "!".to_string(),
            guild_id: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("bot_data.sqlite"),
            max_connections: 5,
        }
    }
}

impl Default for JokerConfig {
    fn default() -> Self {
        Self {
            source: QuestionSourceKind::Remote,
            trivia_url: "https://the-trivia-api.com/v2/questions".to_string(),
            fixture_path: None,
            translate_url: "https://api.mymemory.translated.net/get".to_string(),
            sweep_interval_secs: 60,
            idle_grace_secs: 120,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "DebocheBot/1.0.0".to_string(),
            timeout_secs: 10,
            weather_url: "https://wttr.in".to_string(),
            pokedex_url: "https://pokeapi.co/api/v2".to_string(),
            xkcd_url: "https://xkcd.com".to_string(),
            meme_url: "https://meme-api.com/gimme".to_string(),
            waifu_url: "https://api.waifu.im".to_string(),
        }
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            work_cooldown_secs: 86_400,
            beg_cooldown_secs: 300,
            queue_capacity: 50,
            queue_idle_secs: 7 * 86_400,
        }
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<DebocheConfig> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: path.display().to_string(),
                field: "file".to_string(),
                expected: "readable TOML file".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;

    let mut config: DebocheConfig =
        toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "content".to_string(),
            expected: "valid TOML configuration".to_string(),
            cause: ConfigError::TomlParse(e.to_string()),
        })?;

    // Resolve paths relative to the config file's directory
    let base_dir = path.parent().unwrap_or(Path::new("."));
    config.database.path = resolve_path(base_dir, &config.database.path);
    if let Some(fixture) = config.joker.fixture_path.take() {
        config.joker.fixture_path = Some(resolve_path(base_dir, &fixture));
    }

    Ok(config)
}

/// Save configuration to a TOML file
pub async fn save_config(config: &DebocheConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: parent.display().to_string(),
                field: "directory".to_string(),
                expected: "writable directory".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })?;

    Ok(())
}

/// Standard config file locations
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("deboche.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("deboche").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".deboche").join("config.toml"));
    }

    paths
}

/// Load configuration from standard locations
pub async fn load_config_from_standard_locations() -> Result<DebocheConfig> {
    for path in config_paths() {
        if path.exists() {
            return load_config(&path).await;
        }
    }

    Ok(DebocheConfig::default())
}

impl DebocheConfig {
    /// Load from an explicit file or the standard locations, then apply the environment
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => load_config(path).await?,
            None => load_config_from_standard_locations().await?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub async fn save_to(&self, path: &Path) -> Result<()> {
        save_config(self, path).await
    }

    /// Environment values win over the file
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(token) = lookup("DISCORD_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.bot.token = token.trim().to_string();
        }

        if let Some(guild) = lookup("GUILD_ID").filter(|g| !g.trim().is_empty()) {
            let guild_id = guild
                .trim()
                .parse::<u64>()
                .map_err(|e| CoreError::ConfigurationError {
                    config_path: "environment".to_string(),
                    field: "GUILD_ID".to_string(),
                    expected: "numeric guild id".to_string(),
                    cause: ConfigError::InvalidValue(e.to_string()),
                })?;
            self.bot.guild_id = Some(guild_id);
        }

        if let Some(prefix) = lookup("PREFIX").filter(|p| !p.is_empty()) {
            self.bot.prefix = prefix;
        }

        if let Some(path) = lookup("DATABASE_PATH").filter(|p| !p.is_empty()) {
            self.database.path = PathBuf::from(path);
        }

        Ok(())
    }

    /// Fail early when the bot cannot possibly connect
    pub fn require_token(&self) -> Result<&str> {
        if self.bot.token.is_empty() {
            return Err(CoreError::ConfigurationError {
                config_path: "bot.token".to_string(),
                field: "token".to_string(),
                expected: "Discord bot token (set DISCORD_TOKEN)".to_string(),
                cause: ConfigError::MissingField("bot.token".to_string()),
            });
        }
        Ok(&self.bot.token)
    }
}
