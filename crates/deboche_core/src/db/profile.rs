use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection};
use tracing::debug;

use super::Database;
use crate::id::UserId;
use crate::reply::{EmbedSpec, Reply, colours};
use crate::{CoreError, Result};

/// Row of the `users` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserProfile {
    pub id: i64,
    pub discord_id: i64,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub zone: Option<String>,
    pub position: Option<String>,
    pub is_police: bool,
    pub reputation: i64,
    pub gender: Option<String>,
    pub coins: i64,
    pub joined_at: DateTime<Utc>,
    pub commands_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CommandUsage {
    pub command: String,
    pub usage_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Consumidor,
    Vendedor,
    Fornecedor,
}

impl Position {
    pub const ALL: [Position; 3] = [Self::Consumidor, Self::Vendedor, Self::Fornecedor];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Consumidor => "Consumidor",
            Self::Vendedor => "Vendedor",
            Self::Fornecedor => "Fornecedor",
        }
    }

    pub fn colour(self) -> u32 {
        match self {
            Self::Consumidor => colours::BLUE,
            Self::Vendedor => colours::GREEN,
            Self::Fornecedor => colours::ORANGE,
        }
    }
}

impl FromStr for Position {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CoreError::invalid_argument(
                    "editar_perfil",
                    "valor",
                    "posição tem de ser Consumidor, Vendedor ou Fornecedor",
                )
            })
    }
}

/// The only profile columns a user may edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Bio,
    Zone,
    Gender,
    Position,
    IsPolice,
}

impl ProfileField {
    pub const ALL: [ProfileField; 6] = [
        Self::Name,
        Self::Bio,
        Self::Zone,
        Self::Gender,
        Self::Position,
        Self::IsPolice,
    ];

    fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Bio => "bio",
            Self::Zone => "zone",
            Self::Gender => "gender",
            Self::Position => "position",
            Self::IsPolice => "is_police",
        }
    }

    /// Portuguese name shown to players
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "nome",
            Self::Bio => "bio",
            Self::Zone => "zona",
            Self::Gender => "sexo",
            Self::Position => "posicao",
            Self::IsPolice => "policia",
        }
    }

    fn max_len(self) -> usize {
        match self {
            Self::Bio => 1000,
            _ => 64,
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ProfileField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" | "nome" => Ok(Self::Name),
            "bio" => Ok(Self::Bio),
            "zone" | "zona" => Ok(Self::Zone),
            "gender" | "sexo" | "genero" | "género" => Ok(Self::Gender),
            "position" | "posicao" | "posição" => Ok(Self::Position),
            "is_police" | "policia" | "polícia" => Ok(Self::IsPolice),
            _ => Err(CoreError::invalid_argument(
                "editar_perfil",
                "campo",
                format!(
                    "usa um de: {}",
                    Self::ALL.map(|f| f.label()).join(", ")
                ),
            )),
        }
    }
}

/// Level from experience, where experience is the number of commands run
pub fn level_for(xp: i64) -> u32 {
    if xp <= 0 {
        return 0;
    }
    (xp as f64 / 10.0).sqrt().floor() as u32
}

impl UserProfile {
    pub fn user_id(&self) -> UserId {
        UserId::from_db(self.discord_id)
    }

    pub fn level(&self) -> u32 {
        level_for(self.commands_count)
    }

    pub fn parsed_position(&self) -> Option<Position> {
        self.position.as_deref().and_then(|p| p.parse().ok())
    }

    pub fn render(&self, display_name: &str) -> Reply {
        let position = self.position.as_deref().unwrap_or("Desconhecida");
        let colour = self
            .parsed_position()
            .map(Position::colour)
            .unwrap_or(colours::GREY);

        let embed = EmbedSpec::new(format!(
            "{} — {}",
            self.name.as_deref().unwrap_or(display_name),
            self.zone.as_deref().unwrap_or("Desconhecida")
        ))
        .author(format!("Perfil de {}", display_name))
        .description(format!(
            "**Bio:** {}\n**Sexo:** {}",
            self.bio.as_deref().unwrap_or("Ainda não escreveste nada…"),
            self.gender.as_deref().unwrap_or("Não sei")
        ))
        .colour(colour)
        .field("Posição", position, true)
        .field("Reputação", self.reputation.to_string(), true)
        .field("Nível", self.level().to_string(), true)
        .field("Comandos usados", self.commands_count.to_string(), true)
        .field("🪙 Moedas", self.coins.to_string(), true)
        .field(
            "Polícia?",
            if self.is_police { "🚓 Sim" } else { "Não" },
            true,
        )
        .footer(format!(
            "Entrou em {}",
            self.joined_at.format("%d/%m/%Y %H:%M")
        ));

        Reply::embed(embed).ephemeral(true)
    }
}

pub(super) async fn ensure_user_on(conn: &mut SqliteConnection, user: UserId) -> Result<()> {
    sqlx::query::<Sqlite>("INSERT OR IGNORE INTO users (discord_id, joined_at) VALUES (?1, ?2)")
        .bind(user.as_db())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(|e| CoreError::database("ensure_user", e))?;
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "sim" | "s" | "true" | "1" | "yes" => Ok(true),
        "não" | "nao" | "n" | "false" | "0" | "no" => Ok(false),
        _ => Err(CoreError::invalid_argument(
            "editar_perfil",
            "valor",
            "usa sim ou não",
        )),
    }
}

impl Database {
    /// Create the user row on first contact
    pub async fn ensure_user(&self, user: UserId) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| CoreError::database("ensure_user", e))?;
        ensure_user_on(&mut conn, user).await
    }

    pub async fn find_user(&self, user: UserId) -> Result<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE discord_id = ?1")
            .bind(user.as_db())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| CoreError::database("get_user", e))
    }

    /// Fetch a profile, creating it if this is the first access
    pub async fn get_user(&self, user: UserId) -> Result<UserProfile> {
        self.ensure_user(user).await?;
        self.find_user(user)
            .await?
            .ok_or_else(|| CoreError::not_found("utilizador", user.to_string()))
    }

    /// Set one whitelisted field. An empty value clears text fields.
    pub async fn update_profile(
        &self,
        user: UserId,
        field: ProfileField,
        value: &str,
    ) -> Result<UserProfile> {
        let value = value.trim();
        if value.chars().count() > field.max_len() {
            return Err(CoreError::invalid_argument(
                "editar_perfil",
                field.label(),
                format!("máximo de {} caracteres", field.max_len()),
            ));
        }

        self.ensure_user(user).await?;
        let sql = format!(
            "UPDATE users SET {} = ?1 WHERE discord_id = ?2",
            field.column()
        );
        let query = sqlx::query::<Sqlite>(&sql);
        let query = match field {
            ProfileField::IsPolice => query.bind(parse_bool(value)?),
            ProfileField::Position => query.bind(value.parse::<Position>()?.as_str()),
            _ => query.bind((!value.is_empty()).then(|| value.to_string())),
        };
        query
            .bind(user.as_db())
            .execute(&self.pool)
            .await
            .map_err(|e| CoreError::database("update_profile", e))?;

        debug!(user_id = %user, field = %field, "profile updated");
        self.get_user(user).await
    }

    /// Count one successful command for the user and for the per-command stats
    pub async fn record_command(&self, user: UserId, command: &str) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CoreError::database("record_command", e))?;

        ensure_user_on(&mut tx, user).await?;

        sqlx::query("UPDATE users SET commands_count = commands_count + 1 WHERE discord_id = ?1")
            .bind(user.as_db())
            .execute(&mut *tx)
            .await
            .map_err(|e| CoreError::database("record_command", e))?;

        sqlx::query(
            "INSERT INTO command_usage (discord_id, command, usage_count) VALUES (?1, ?2, 1)
             ON CONFLICT(discord_id, command) DO UPDATE SET usage_count = usage_count + 1",
        )
        .bind(user.as_db())
        .bind(command)
        .execute(&mut *tx)
        .await
        .map_err(|e| CoreError::database("record_command", e))?;

        tx.commit()
            .await
            .map_err(|e| CoreError::database("record_command", e))?;
        Ok(())
    }

    /// Most (or least) used commands across every user
    pub async fn command_stats(&self, limit: u32, ascending: bool) -> Result<Vec<CommandUsage>> {
        let order = if ascending { "ASC" } else { "DESC" };
        let sql = format!(
            "SELECT command, SUM(usage_count) AS usage_count FROM command_usage
             GROUP BY command ORDER BY usage_count {order}, command ASC LIMIT ?1"
        );
        sqlx::query_as::<_, CommandUsage>(&sql)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoreError::database("command_stats", e))
    }

    pub async fn level(&self, user: UserId) -> Result<u32> {
        Ok(self.get_user(user).await?.level())
    }
}
