//! Deboche Core - game logic, storage and API wrappers
//!
//! This crate holds everything the Deboche bot does that does not depend on a
//! chat platform: the Concurso JOKER quiz, the command registry, the coin
//! economy backed by SQLite, and the small HTTP wrappers behind the fun
//! commands. Output is described with [`reply::Reply`] and turned into real
//! messages by an adapter crate.

pub mod apis;
pub mod casino;
pub mod config;
pub mod cooldown;
pub mod db;
pub mod error;
pub mod id;
pub mod joker;
pub mod paginator;
pub mod queue;
pub mod registry;
pub mod reply;

pub use apis::{ApiClient, build_http_client};
pub use config::DebocheConfig;
pub use cooldown::CooldownTracker;
pub use db::Database;
pub use error::{CoreError, Result};
pub use id::UserId;
pub use joker::{SessionStore, TurnController};
pub use paginator::{PageComponent, Paginator, PaginatorStore};
pub use queue::QueueStore;
pub use registry::{
    ArgValue, CommandArgs, CommandDescriptor, CommandRegistry, OptionKind, OptionSpec,
};
pub use reply::{ButtonSpec, ButtonStyle, EmbedSpec, Reply};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        ApiClient, ArgValue, ButtonSpec, ButtonStyle, CommandArgs, CommandDescriptor,
        CommandRegistry, CooldownTracker, CoreError, Database, DebocheConfig, EmbedSpec,
        OptionKind, OptionSpec, Paginator, PaginatorStore, QueueStore, Reply, Result,
        SessionStore, TurnController, UserId,
    };
}
