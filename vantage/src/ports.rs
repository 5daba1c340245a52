#![deny(clippy::all)]

use shared::Result;

// Ports are the pluggable extension points for underlying key/value stores

/// Port for a process-wide textual key/value store (the browser's local
/// storage, or anything standing in for it).
///
/// Implementations must make `set` all-or-nothing: a rejected write leaves
/// the previous value for that key in place.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Short backend name for diagnostics
    fn name(&self) -> &'static str;

    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}
