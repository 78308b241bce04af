pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::RaffleConfig;

pub use adapters::{FileStore, MemoryStore};
pub use crate::core::{
    pool::NumberPool,
    reveal::{RevealAnimator, RevealSettings},
    session::DrawSession,
    store::SessionStore,
};
pub use domain::model::{Phase, PersistedSession, RevealEvent, SessionState};
pub use domain::ports::KeyValueStore;
pub use utils::error::{RaffleError, Result};
