use shared::{Error, Result};
use std::path::Path;
use vantage::ports::KeyValueStore;

/// Sled-backed store whose entries survive process restarts
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the store at `path`
    /// Creates the parent directory if it doesn't exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Internal(format!("Failed to create directory: {}", e)))?;
        }

        let db = sled::open(path)
            .map_err(|e| Error::Internal(format!("Failed to open Sled database: {}", e)))?;

        Ok(Self { db })
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Remove every entry, as when the user clears site data
    pub fn clear(&self) -> Result<()> {
        self.db
            .clear()
            .map_err(|e| Error::StoreWrite(format!("Failed to clear database: {}", e)))?;

        self.db
            .flush()
            .map_err(|e| Error::StoreWrite(format!("Failed to flush database: {}", e)))?;

        Ok(())
    }

    /// Insert then run `flush`; if the flush fails the previous value (or
    /// its absence) is restored so a failed write changes nothing
    fn insert_durably<F>(&self, key: &str, value: &str, flush: F) -> Result<()>
    where
        F: FnOnce(&sled::Db) -> sled::Result<usize>,
    {
        let previous = self
            .db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| Error::StoreWrite(format!("Failed to save entry: {}", e)))?;

        if let Err(e) = flush(&self.db) {
            let restored = match previous {
                Some(old) => self.db.insert(key.as_bytes(), old).map(|_| ()),
                None => self.db.remove(key.as_bytes()).map(|_| ()),
            };
            if let Err(rollback) = restored {
                tracing::warn!("Failed to roll back entry '{}': {}", key, rollback);
            }
            return Err(Error::StoreWrite(format!("Failed to flush database: {}", e)));
        }

        Ok(())
    }
}

impl KeyValueStore for SledStore {
    fn name(&self) -> &'static str {
        "sled"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| Error::StoreRead(format!("Failed to get entry: {}", e)))?;

        match value {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| Error::StoreRead(format!("Entry is not UTF-8: {}", e)))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.insert_durably(key, value, |db| db.flush())
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("entry_count", &self.db.len())
            .finish()
    }
}
