use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use shared::{Error, Result};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use vantage::ports::KeyValueStore;

/// DashMap-backed store living for the lifetime of the process.
/// With a quota it behaves like a browser's local storage: a write that
/// would push key + value bytes past the limit is refused.
pub struct MemoryStore {
    entries: DashMap<String, String>,
    used_bytes: AtomicUsize,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create an unbounded in-memory store
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            used_bytes: AtomicUsize::new(0),
            quota_bytes: None,
        }
    }

    /// Create an in-memory store that holds at most `quota_bytes` of keys and values
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(Ordering::Acquire)
    }

    pub fn quota_bytes(&self) -> Option<usize> {
        self.quota_bytes
    }

    /// Drop every entry, as when the user clears site data.
    /// Each removal is uncounted under its shard lock, so a `set` racing
    /// with `clear` keeps its bytes accounted for.
    pub fn clear(&self) {
        self.entries.retain(|key, value| {
            self.used_bytes.fetch_sub(key.len() + value.len(), Ordering::AcqRel);
            false
        });
    }

    /// Account for replacing `old` bytes with `new` bytes, or refuse
    fn reserve(&self, old: usize, new: usize) -> Result<()> {
        self.used_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                let next = used.saturating_sub(old) + new;
                match self.quota_bytes {
                    Some(quota) if next > quota => None,
                    _ => Some(next),
                }
            })
            .map(|_| ())
            .map_err(|used| {
                Error::StoreWrite(format!(
                    "quota exceeded: {} of {} bytes used, write needs {}",
                    used,
                    self.quota_bytes.unwrap_or_default(),
                    new
                ))
            })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|value| value.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let new = key.len() + value.len();

        // The entry guard holds the shard lock, so the size we replace is stable
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let old = key.len() + occupied.get().len();
                self.reserve(old, new)?;
                occupied.insert(value.to_string());
            }
            Entry::Vacant(vacant) => {
                self.reserve(0, new)?;
                vacant.insert(value.to_string());
            }
        }
        Ok(())
    }
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.entries.len())
            .field("used_bytes", &self.used_bytes())
            .field("quota_bytes", &self.quota_bytes)
            .finish()
    }
}
