use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shared::{Error, Result};
use std::borrow::Cow;
use std::fmt;

/// Prefix that keeps one family of cached entries apart from another
/// inside a shared store
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace(Cow<'static, str>);

impl Namespace {
    /// Sales Analysis time series, keyed by region
    pub const TIMESERIES: Namespace = Namespace(Cow::Borrowed("ts_"));
    /// Retention cohorts, keyed by period token
    pub const RETENTION: Namespace = Namespace(Cow::Borrowed("ret_"));

    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(Error::InvalidKey("namespace must not be empty".to_string()));
        }
        Ok(Self(Cow::Owned(prefix)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derive the key used in the underlying store
    pub fn storage_key(&self, key: &str) -> StorageKey {
        StorageKey(format!("{}{}", self.0, key))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `namespace + key`, the identifier actually used in the store
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A record the cache writes to the store. The cache only wraps and unwraps
/// the payload, it never looks inside it.
pub trait CacheRecord: Serialize + DeserializeOwned {
    type Payload;

    fn from_payload(payload: Self::Payload) -> Self;
    fn payload(&self) -> &Self::Payload;
    fn into_payload(self) -> Self::Payload;
}

/// Stored as `{"payload": ...}`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub payload: P,
}

impl<P> CacheRecord for Envelope<P>
where
    P: Serialize + DeserializeOwned,
{
    type Payload = P;

    fn from_payload(payload: P) -> Self {
        Self { payload }
    }

    fn payload(&self) -> &P {
        &self.payload
    }

    fn into_payload(self) -> P {
        self.payload
    }
}

/// Stored as `{"payload": ..., "derived": ... | null}`.
///
/// `derived` is reserved for a value computed from the payload. Nothing in
/// the cache fills it in; a plain write leaves it `null` and a record
/// without the field reads back as `None`.
///
/// `null` on the wire always reads back as `None`, so with
/// `D = serde_json::Value` a stored `Some(Value::Null)` comes back as `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DerivedEnvelope<P, D> {
    pub payload: P,
    pub derived: Option<D>,
}

impl<P, D> DerivedEnvelope<P, D> {
    pub fn new(payload: P, derived: Option<D>) -> Self {
        Self { payload, derived }
    }
}

impl<P, D> CacheRecord for DerivedEnvelope<P, D>
where
    P: Serialize + DeserializeOwned,
    D: Serialize + DeserializeOwned,
{
    type Payload = P;

    fn from_payload(payload: P) -> Self {
        Self {
            payload,
            derived: None,
        }
    }

    fn payload(&self) -> &P {
        &self.payload
    }

    fn into_payload(self) -> P {
        self.payload
    }
}

/// A successfully read entry
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry<R> {
    pub namespace: Namespace,
    pub key: String,
    pub storage_key: StorageKey,
    pub record: R,
}

impl<R: CacheRecord> CacheEntry<R> {
    pub fn payload(&self) -> &R::Payload {
        self.record.payload()
    }

    pub fn into_payload(self) -> R::Payload {
        self.record.into_payload()
    }
}

/// Result of a write. A dropped write has already been logged.
#[derive(Debug)]
pub enum WriteOutcome {
    Stored,
    Dropped(Error),
}

impl WriteOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, WriteOutcome::Stored)
    }
}

/// Result of a read. `Unreadable` covers corrupt text and store failures;
/// callers that only care about hit/miss should use `into_entry`.
#[derive(Debug)]
pub enum Lookup<R> {
    Hit(CacheEntry<R>),
    Miss,
    Unreadable(Error),
}

impl<R> Lookup<R> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        !self.is_hit()
    }

    pub fn into_entry(self) -> Option<CacheEntry<R>> {
        match self {
            Lookup::Hit(entry) => Some(entry),
            Lookup::Miss | Lookup::Unreadable(_) => None,
        }
    }
}
