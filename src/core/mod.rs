pub mod pool;
pub mod reveal;
pub mod session;
pub mod store;

pub use crate::domain::model::{PersistedSession, RevealEvent, SessionState};
pub use crate::domain::ports::KeyValueStore;
pub use crate::utils::error::Result;
