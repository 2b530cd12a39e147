use miette::Diagnostic;
use thiserror::Error;

use crate::id::UserId;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Question provider unavailable")]
    #[diagnostic(
        code(deboche_core::provider_unavailable),
        help("{provider} could not supply a question: {reason}")
    )]
    ProviderUnavailable { provider: String, reason: String },

    #[error("No jokers left")]
    #[diagnostic(
        code(deboche_core::no_jokers_left),
        help("Player {player_id} has spent every joker")
    )]
    NoJokersLeft { player_id: UserId },

    #[error("No option left to hide")]
    #[diagnostic(
        code(deboche_core::nothing_to_hide),
        help("Every wrong option is already hidden for player {player_id}")
    )]
    NothingToHide { player_id: UserId },

    #[error("No active game")]
    #[diagnostic(
        code(deboche_core::invalid_session),
        help("Player {player_id} has no game in progress. Start one with /joker")
    )]
    InvalidSession { player_id: UserId },

    #[error("Not your game")]
    #[diagnostic(
        code(deboche_core::not_your_game),
        help("User {presser} pressed a button belonging to {owner}'s game")
    )]
    NotYourGame { owner: UserId, presser: UserId },

    #[error("Stale game action")]
    #[diagnostic(
        code(deboche_core::stale_action),
        help("Action was for round {action_round} but the game is at round {current_round}")
    )]
    StaleAction {
        player_id: UserId,
        action_round: usize,
        current_round: usize,
    },

    #[error("Action not allowed right now")]
    #[diagnostic(
        code(deboche_core::wrong_phase),
        help("'{action}' is not valid while the game is {phase}")
    )]
    WrongPhase { action: String, phase: String },

    #[error("Invalid answer choice")]
    #[diagnostic(
        code(deboche_core::invalid_choice),
        help("Choice {choice} is out of range or has been hidden by a joker")
    )]
    InvalidChoice { choice: usize },

    #[error("Database operation failed")]
    #[diagnostic(
        code(deboche_core::database_error),
        help("Operation '{operation}' failed. Check the SQLite file is writable")
    )]
    DatabaseError {
        operation: String,
        #[source]
        cause: sqlx::Error,
    },

    #[error("Database migration failed")]
    #[diagnostic(
        code(deboche_core::migration_failed),
        help("The schema could not be applied to {path}")
    )]
    MigrationFailed {
        path: String,
        #[source]
        cause: sqlx::migrate::MigrateError,
    },

    #[error("Insufficient funds")]
    #[diagnostic(
        code(deboche_core::insufficient_funds),
        help("User {user_id} has {balance} coins but {required} are needed")
    )]
    InsufficientFunds {
        user_id: UserId,
        balance: i64,
        required: i64,
    },

    #[error("Invalid amount")]
    #[diagnostic(code(deboche_core::invalid_amount), help("{amount}: {reason}"))]
    InvalidAmount { amount: i64, reason: String },

    #[error("Command on cooldown")]
    #[diagnostic(
        code(deboche_core::on_cooldown),
        help("'{command}' can be used again in {remaining_secs} seconds")
    )]
    OnCooldown { command: String, remaining_secs: u64 },

    #[error("Configuration error")]
    #[diagnostic(
        code(deboche_core::configuration_error),
        help("Check configuration file at {config_path}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error("HTTP request failed")]
    #[diagnostic(
        code(deboche_core::http_request_failed),
        help("Request to {service} at {url} failed")
    )]
    HttpRequestFailed {
        service: String,
        url: String,
        #[source]
        cause: reqwest::Error,
    },

    #[error("Upstream service returned an error")]
    #[diagnostic(
        code(deboche_core::upstream_status),
        help("{service} answered with HTTP {status}")
    )]
    UpstreamStatus { service: String, status: u16 },

    #[error("Not found")]
    #[diagnostic(code(deboche_core::not_found), help("No {what} matching '{query}'"))]
    NotFound { what: String, query: String },

    #[error("Unknown command")]
    #[diagnostic(
        code(deboche_core::unknown_command),
        help("Available commands: {}", available.join(", "))
    )]
    UnknownCommand { name: String, available: Vec<String> },

    #[error("Duplicate command")]
    #[diagnostic(
        code(deboche_core::duplicate_command),
        help("A command named '{name}' is already registered")
    )]
    DuplicateCommand { name: String },

    #[error("Invalid argument")]
    #[diagnostic(
        code(deboche_core::invalid_argument),
        help("{command} {argument}: {reason}")
    )]
    InvalidArgument {
        command: String,
        argument: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("TOML parse error: {0}")]
    TomlParse(String),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

// Helper functions for creating common errors with context
impl CoreError {
    pub fn provider_unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn database(operation: impl Into<String>, cause: sqlx::Error) -> Self {
        Self::DatabaseError {
            operation: operation.into(),
            cause,
        }
    }

    pub fn http(service: impl Into<String>, url: impl Into<String>, cause: reqwest::Error) -> Self {
        Self::HttpRequestFailed {
            service: service.into(),
            url: url.into(),
            cause,
        }
    }

    pub fn not_found(what: impl Into<String>, query: impl Into<String>) -> Self {
        Self::NotFound {
            what: what.into(),
            query: query.into(),
        }
    }

    pub fn invalid_argument(
        command: impl Into<String>,
        argument: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            command: command.into(),
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_amount(amount: i64, reason: impl Into<String>) -> Self {
        Self::InvalidAmount {
            amount,
            reason: reason.into(),
        }
    }

    pub fn wrong_phase(action: impl Into<String>, phase: impl Into<String>) -> Self {
        Self::WrongPhase {
            action: action.into(),
            phase: phase.into(),
        }
    }

    /// True when the failure is the player's doing rather than ours
    pub fn is_user_error(&self) -> bool {
        !matches!(
            self,
            Self::ProviderUnavailable { .. }
                | Self::DatabaseError { .. }
                | Self::MigrationFailed { .. }
                | Self::ConfigurationError { .. }
                | Self::HttpRequestFailed { .. }
                | Self::UpstreamStatus { .. }
                | Self::DuplicateCommand { .. }
        )
    }

    /// Short message suitable for showing to the player in chat
    pub fn user_message(&self) -> String {
        match self {
            Self::ProviderUnavailable { .. } => {
                "Não consegui obter a próxima pergunta. Tenta outra vez!".to_string()
            }
            Self::NoJokersLeft { .. } => "Sem jokers!".to_string(),
            Self::NothingToHide { .. } => "Já não há opções para esconder!".to_string(),
            Self::InvalidSession { .. } => {
                "Não tens nenhum jogo a decorrer. Usa /joker para começar.".to_string()
            }
            Self::NotYourGame { .. } => "Este jogo não é teu! Usa /joker para jogar.".to_string(),
            Self::StaleAction { .. } => "Essa pergunta já foi respondida.".to_string(),
            Self::WrongPhase { .. } => "Agora não é possível fazer isso.".to_string(),
            Self::InvalidChoice { .. } => "Essa opção não está disponível.".to_string(),
            Self::InsufficientFunds { balance, .. } => {
                format!("Não tens moedas suficientes (saldo: {} 🪙).", balance)
            }
            Self::InvalidAmount { reason, .. } => format!("Quantia inválida: {}", reason),
            Self::OnCooldown { remaining_secs, .. } => {
                format!("Calma! Podes voltar a usar isto em {}.", format_wait(*remaining_secs))
            }
            Self::NotFound { what, query } => format!("Não encontrei {} '{}'.", what, query),
            Self::UnknownCommand { name, .. } => format!("Comando desconhecido: {}", name),
            Self::InvalidArgument {
                argument, reason, ..
            } => format!("Argumento inválido `{}`: {}", argument, reason),
            Self::HttpRequestFailed { service, .. } | Self::UpstreamStatus { service, .. } => {
                format!("O serviço {} não respondeu. Tenta mais tarde.", service)
            }
            Self::DatabaseError { .. }
            | Self::MigrationFailed { .. }
            | Self::ConfigurationError { .. }
            | Self::DuplicateCommand { .. } => "Ocorreu um erro interno.".to_string(),
        }
    }
}

fn format_wait(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn test_unknown_command_lists_available() {
        let error = CoreError::UnknownCommand {
            name: "jokr".to_string(),
            available: vec!["joker".to_string(), "perfil".to_string()],
        };
        let output = format!("{:?}", Report::new(error));
        assert!(output.contains("unknown_command"));
        assert!(output.contains("Available commands: joker, perfil"));
    }

    #[test]
    fn test_user_facing_messages() {
        let error = CoreError::NoJokersLeft {
            player_id: UserId(1),
        };
        assert_eq!(error.user_message(), "Sem jokers!");
        assert!(error.is_user_error());

        let error = CoreError::provider_unavailable("trivia", "timeout");
        assert!(!error.is_user_error());
        assert!(error.user_message().contains("Tenta outra vez"));
    }

    #[test]
    fn test_cooldown_wait_formatting() {
        assert_eq!(format_wait(45), "45s");
        assert_eq!(format_wait(125), "2m 5s");
        assert_eq!(format_wait(86_399), "23h 59m");
    }
}
