use crate::core::{KeyValueStore, PersistedSession, Result};

pub const DEFAULT_SESSION_KEY: &str = "raffle-session";

/// Saves, loads and clears the single snapshot kept under `key`.
pub struct SessionStore<K: KeyValueStore> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> SessionStore<K> {
    pub fn new(backend: K) -> Self {
        Self::with_key(backend, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn save(&self, snapshot: &PersistedSession) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.backend.set(&self.key, &json)?;
        tracing::debug!(
            "Saved session snapshot ({} drawn, {} remaining)",
            snapshot.drawn.len(),
            snapshot.remaining.len()
        );
        Ok(())
    }

    /// A snapshot that does not parse or fails validation is an error, not
    /// `None`, so the caller can tell "nothing saved" from "unreadable".
    pub fn load(&self) -> Result<Option<PersistedSession>> {
        let Some(json) = self.backend.get(&self.key)? else {
            return Ok(None);
        };

        let snapshot: PersistedSession = serde_json::from_str(&json)?;
        snapshot.validate()?;
        Ok(Some(snapshot))
    }

    pub fn clear(&self) -> Result<()> {
        self.backend.remove(&self.key)?;
        tracing::debug!("Cleared session snapshot '{}'", self.key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::MemoryStore;
    use crate::core::pool::NumberPool;
    use crate::utils::error::RaffleError;

    #[test]
    fn test_save_load_clear() {
        let backend = MemoryStore::new();
        let store = SessionStore::new(backend.clone());
        assert!(store.load().unwrap().is_none());

        let pool = NumberPool::from_parts(4, vec![3, 4], vec![2, 1]).unwrap();
        let snapshot = PersistedSession::capture(&pool, Some(1));
        store.save(&snapshot).unwrap();
        assert!(backend.contains(DEFAULT_SESSION_KEY));
        assert_eq!(store.load().unwrap(), Some(snapshot));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_save_overwrites() {
        let store = SessionStore::with_key(MemoryStore::new(), "draw");
        let mut pool = NumberPool::from_parts(2, vec![1, 2], vec![]).unwrap();
        store.save(&PersistedSession::capture(&pool, None)).unwrap();

        pool.take_next().unwrap();
        store.save(&PersistedSession::capture(&pool, Some(1))).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.drawn, vec![1]);
        assert_eq!(loaded.current, Some(1));
    }

    #[test]
    fn test_load_reports_garbage() {
        let backend = MemoryStore::new();
        backend.set(DEFAULT_SESSION_KEY, "{not json").unwrap();
        let store = SessionStore::new(backend.clone());
        assert!(matches!(
            store.load(),
            Err(RaffleError::SerializationError(_))
        ));

        backend
            .set(
                DEFAULT_SESSION_KEY,
                r#"{"total":3,"remaining":[1,1],"drawn":[2],"current":null}"#,
            )
            .unwrap();
        assert!(matches!(
            store.load(),
            Err(RaffleError::CorruptSnapshot { .. })
        ));
    }
}
