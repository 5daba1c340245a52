use crate::domain::{CacheEntry, CacheRecord, Envelope, Lookup, Namespace, StorageKey, WriteOutcome};
use crate::ports::KeyValueStore;
use shared::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// JSON cache bound to one namespace of a shared key/value store.
///
/// `R` fixes the record shape (and so the payload type) for the namespace.
/// Neither `write` nor `read` ever fails outright: a write that cannot be
/// stored is dropped and a read that cannot be decoded is a miss. Both are
/// logged and reported through the returned outcome.
pub struct KeyedCache<R, S: ?Sized = dyn KeyValueStore> {
    namespace: Namespace,
    store: Arc<S>,
    _record: PhantomData<fn() -> R>,
}

/// The plain `{payload}` family
pub type PayloadCache<P, S = dyn KeyValueStore> = KeyedCache<Envelope<P>, S>;

impl<R, S> KeyedCache<R, S>
where
    R: CacheRecord,
    S: KeyValueStore + ?Sized,
{
    pub fn new(namespace: Namespace, store: Arc<S>) -> Self {
        Self {
            namespace,
            store,
            _record: PhantomData,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn storage_key(&self, key: &str) -> StorageKey {
        self.namespace.storage_key(key)
    }

    /// Wrap `payload` in a record and store it, replacing any previous entry
    pub fn write(&self, key: &str, payload: R::Payload) -> WriteOutcome {
        self.write_record(key, &R::from_payload(payload))
    }

    /// Store a fully built record, e.g. one carrying a derived value
    pub fn write_record(&self, key: &str, record: &R) -> WriteOutcome {
        match self.try_write(key, record) {
            Ok(storage_key) => {
                tracing::debug!(
                    "Stored '{}' in {} store",
                    storage_key,
                    self.store.name()
                );
                WriteOutcome::Stored
            }
            Err(e) => {
                tracing::warn!(
                    "Dropping cache write for '{}{}': {}",
                    self.namespace,
                    key,
                    e
                );
                WriteOutcome::Dropped(e)
            }
        }
    }

    fn try_write(&self, key: &str, record: &R) -> shared::Result<StorageKey> {
        check_key(key)?;
        let text = serde_json::to_string(record)
            .map_err(|e| Error::Serialization(format!("Failed to serialize entry: {}", e)))?;

        let storage_key = self.storage_key(key);
        self.store.set(storage_key.as_str(), &text)?;
        Ok(storage_key)
    }

    /// Look up and decode the entry for `key`
    pub fn read(&self, key: &str) -> Lookup<R> {
        match self.try_read(key) {
            Ok(Some(entry)) => {
                tracing::debug!("Cache hit for '{}'", entry.storage_key);
                Lookup::Hit(entry)
            }
            Ok(None) => {
                tracing::debug!("Cache miss for '{}{}'", self.namespace, key);
                Lookup::Miss
            }
            Err(e) => {
                tracing::warn!(
                    "Treating unreadable cache entry '{}{}' as a miss: {}",
                    self.namespace,
                    key,
                    e
                );
                Lookup::Unreadable(e)
            }
        }
    }

    fn try_read(&self, key: &str) -> shared::Result<Option<CacheEntry<R>>> {
        check_key(key)?;
        let storage_key = self.storage_key(key);

        let Some(text) = self.store.get(storage_key.as_str())? else {
            return Ok(None);
        };

        let record: R = serde_json::from_str(&text).map_err(|e| {
            Error::Deserialization(format!("Failed to deserialize entry: {}", e))
        })?;

        Ok(Some(CacheEntry {
            namespace: self.namespace.clone(),
            key: key.to_string(),
            storage_key,
            record,
        }))
    }

    /// Payload for `key`, or `None` on a miss of any kind
    pub fn get(&self, key: &str) -> Option<R::Payload> {
        self.read(key).into_entry().map(CacheEntry::into_payload)
    }
}

fn check_key(key: &str) -> shared::Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("cache key must not be empty".to_string()));
    }
    Ok(())
}

impl<R, S: ?Sized> Clone for KeyedCache<R, S> {
    fn clone(&self) -> Self {
        Self {
            namespace: self.namespace.clone(),
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<R, S: ?Sized> fmt::Debug for KeyedCache<R, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedCache")
            .field("namespace", &self.namespace)
            .field("store", &"<KeyValueStore>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DerivedEnvelope;
    use serde::{Deserialize, Serialize};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory stand-in for local storage, optionally refusing every write
    #[derive(Default)]
    struct FakeStore {
        entries: Mutex<HashMap<String, String>>,
        read_only: bool,
    }

    impl FakeStore {
        fn raw(&self, key: &str) -> Option<String> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn put_raw(&self, key: &str, value: &str) {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }

    impl KeyValueStore for FakeStore {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn get(&self, key: &str) -> shared::Result<Option<String>> {
            Ok(self.raw(key))
        }

        fn set(&self, key: &str, value: &str) -> shared::Result<()> {
            if self.read_only {
                return Err(Error::StoreWrite("quota exceeded".to_string()));
            }
            self.put_raw(key, value);
            Ok(())
        }
    }

    fn cache_on(store: &Arc<FakeStore>, namespace: Namespace) -> PayloadCache<Value, FakeStore> {
        KeyedCache::new(namespace, Arc::clone(store))
    }

    #[test]
    fn test_write_then_read_timeseries() {
        let store = Arc::new(FakeStore::default());
        let cache = cache_on(&store, Namespace::TIMESERIES);

        let outcome = cache.write("region-west", json!({"points": [1, 2, 3]}));
        assert!(outcome.is_stored());

        let entry = cache.read("region-west").into_entry().unwrap();
        assert_eq!(entry.payload(), &json!({"points": [1, 2, 3]}));
        assert_eq!(entry.key, "region-west");
        assert_eq!(entry.storage_key.as_str(), "ts_region-west");
        assert_eq!(entry.namespace, Namespace::TIMESERIES);

        assert_eq!(
            store.raw("ts_region-west").unwrap(),
            r#"{"payload":{"points":[1,2,3]}}"#
        );
    }

    #[test]
    fn test_read_never_set_is_miss() {
        let store = Arc::new(FakeStore::default());
        let cache = cache_on(&store, Namespace::TIMESERIES);

        assert!(matches!(cache.read("never-set"), Lookup::Miss));
        assert_eq!(cache.get("never-set"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let store = Arc::new(FakeStore::default());
        let cache = cache_on(&store, Namespace::RETENTION);

        cache.write("q1", json!({"total": 42}));
        cache.write("q1", json!({"total": 99}));

        assert_eq!(cache.get("q1"), Some(json!({"total": 99})));
        assert_eq!(store.entries.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = Arc::new(FakeStore::default());
        let timeseries = cache_on(&store, Namespace::TIMESERIES);
        let retention = cache_on(&store, Namespace::RETENTION);
        assert_eq!(timeseries.namespace(), &Namespace::TIMESERIES);
        assert_eq!(retention.namespace().as_str(), "ret_");

        timeseries.write("q1", json!([1, 2]));

        assert!(retention.read("q1").is_miss());
        assert_eq!(timeseries.get("q1"), Some(json!([1, 2])));

        retention.write("q1", json!({"total": 7}));
        assert_eq!(timeseries.get("q1"), Some(json!([1, 2])));
        assert_eq!(retention.get("q1"), Some(json!({"total": 7})));
    }

    #[test]
    fn test_truncated_text_reads_as_miss() {
        let store = Arc::new(FakeStore::default());
        let cache = cache_on(&store, Namespace::TIMESERIES);

        cache.write("region-east", json!({"points": [4, 5, 6]}));
        let text = store.raw("ts_region-east").unwrap();
        store.put_raw("ts_region-east", &text[..text.len() / 2]);

        let lookup = cache.read("region-east");
        assert!(matches!(lookup, Lookup::Unreadable(Error::Deserialization(_))));
        assert_eq!(cache.get("region-east"), None);
    }

    #[test]
    fn test_wrong_shape_reads_as_miss() {
        let store = Arc::new(FakeStore::default());
        let cache: PayloadCache<Vec<u32>, FakeStore> =
            KeyedCache::new(Namespace::TIMESERIES, Arc::clone(&store));

        store.put_raw("ts_north", r#"{"payload":"not a list"}"#);
        assert!(cache.read("north").is_miss());

        store.put_raw("ts_south", r#"[1,2,3]"#);
        assert!(cache.read("south").is_miss());
    }

    #[test]
    fn test_rejected_write_keeps_previous_value() {
        let store = Arc::new(FakeStore::default());
        store.put_raw("ret_q2", r#"{"payload":{"total":1}}"#);

        let full = Arc::new(FakeStore {
            entries: Mutex::new(store.entries.lock().unwrap().clone()),
            read_only: true,
        });
        let cache = cache_on(&full, Namespace::RETENTION);

        let outcome = cache.write("q2", json!({"total": 2}));
        assert!(matches!(outcome, WriteOutcome::Dropped(Error::StoreWrite(_))));
        assert_eq!(cache.get("q2"), Some(json!({"total": 1})));
    }

    #[test]
    fn test_unserializable_payload_is_dropped() {
        let store = Arc::new(FakeStore::default());
        let cache: PayloadCache<HashMap<(u8, u8), u8>, FakeStore> =
            KeyedCache::new(Namespace::RETENTION, Arc::clone(&store));

        let outcome = cache.write("grid", HashMap::from([((1, 2), 3)]));
        assert!(matches!(outcome, WriteOutcome::Dropped(Error::Serialization(_))));
        assert!(store.raw("ret_grid").is_none());
    }

    #[test]
    fn test_empty_key_is_rejected_without_panicking() {
        let store = Arc::new(FakeStore::default());
        let cache = cache_on(&store, Namespace::TIMESERIES);

        let outcome = cache.write("", json!(1));
        assert!(matches!(outcome, WriteOutcome::Dropped(Error::InvalidKey(_))));
        assert!(matches!(cache.read(""), Lookup::Unreadable(Error::InvalidKey(_))));
        assert!(store.entries.lock().unwrap().is_empty());
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Cohort {
        total: u32,
        retained: u32,
    }

    #[test]
    fn test_typed_payload_with_derived_field() {
        let store = Arc::new(FakeStore::default());
        let store_dyn: Arc<dyn KeyValueStore> = store.clone();
        let cache: KeyedCache<DerivedEnvelope<Cohort, f64>> =
            KeyedCache::new(Namespace::RETENTION, store_dyn);

        let cohort = Cohort {
            total: 200,
            retained: 50,
        };

        cache.write("2024-q1", cohort.clone());
        let entry = cache.read("2024-q1").into_entry().unwrap();
        assert_eq!(entry.record.derived, None);
        assert_eq!(entry.payload(), &cohort);

        let record = DerivedEnvelope::new(cohort.clone(), Some(0.25));
        assert!(cache.write_record("2024-q1", &record).is_stored());
        assert_eq!(cache.read("2024-q1").into_entry().unwrap().record, record);
        assert_eq!(
            store.raw("ret_2024-q1").unwrap(),
            r#"{"payload":{"total":200,"retained":50},"derived":0.25}"#
        );
    }
}
