//! Namespaced JSON cache over a local key/value store.
//!
//! The dashboard pages keep computed datasets in the browser's local storage
//! so a reload does not rebuild them. [`KeyedCache`] is that helper: it
//! writes `{"payload": ...}` records under `namespace + key` and reads them
//! back, treating anything it cannot decode as a miss.

pub mod cache;
pub mod domain;
pub mod ports;

pub use cache::{KeyedCache, PayloadCache};
pub use domain::{
    CacheEntry, CacheRecord, DerivedEnvelope, Envelope, Lookup, Namespace, StorageKey,
    WriteOutcome,
};
pub use ports::KeyValueStore;
