//! SQLite storage for profiles, coins, inventory and command usage.

use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::{CoreError, Result};

pub mod economy;
pub mod profile;

pub use economy::InventoryItem;
pub use profile::{CommandUsage, Position, ProfileField, UserProfile, level_for};

/// Path value that selects a private in-memory database
pub const MEMORY_PATH: &str = ":memory:";

/// Database connection pool wrapper
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

/// Totals shown by `deboche db stats`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub users: i64,
    pub total_coins: i64,
    pub inventory_items: i64,
    pub commands_run: i64,
}

impl Database {
    /// Open (creating if needed) the database and apply the schema
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db = if config.path == Path::new(MEMORY_PATH) {
            Self::in_memory().await?
        } else {
            Self::open_file(&config.path, config.max_connections).await?
        };
        db.migrate(&config.path.display().to_string()).await?;
        Ok(db)
    }

    async fn open_file(path: &Path, max_connections: u32) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CoreError::database(
                    format!("create directory {}", parent.display()),
                    sqlx::Error::Io(e),
                )
            })?;
        }

        info!("Connecting to database at: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| CoreError::database("connect", e))?;

        debug!("Database connection established");
        Ok(Self { pool })
    }

    /// Every connection to `:memory:` is its own database, so keep exactly one alive
    async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CoreError::database("connect", e))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| CoreError::database("connect", e))?;

        debug!("In-memory database ready");
        Ok(Self { pool })
    }

    /// Schema creation is idempotent
    async fn migrate(&self, path: &str) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|cause| CoreError::MigrationFailed {
                path: path.to_string(),
                cause,
            })?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn stats(&self) -> Result<DatabaseStats> {
        let (users, total_coins): (i64, i64) =
            sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(coins), 0) FROM users")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| CoreError::database("stats", e))?;

        let inventory_items: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(qty), 0) FROM inventory")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CoreError::database("stats", e))?;

        let commands_run: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(usage_count), 0) FROM command_usage")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| CoreError::database("stats", e))?;

        Ok(DatabaseStats {
            users,
            total_coins,
            inventory_items,
            commands_run,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
