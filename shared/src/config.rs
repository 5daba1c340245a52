use std::path::PathBuf;
use tracing::warn;

/// Which key/value store backs the dashboard caches
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Memory(Option<usize>), // quota in bytes, None = unbounded
    Sled(PathBuf),         // database directory
}

pub struct Config {
    pub store: StoreBackend,
    pub data_dir: String,
    pub quota_bytes: Option<usize>, // memory store limit, None = unbounded
}

impl Config {
    const DEFAULT_DATA_DIR: &str = "./data";
    const DEFAULT_STORE: &str = "sled";
    const SLED_DB_NAME: &str = "local_store.sled";

    /// Roughly what a browser grants one origin for local storage
    pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir =
            lookup("VANTAGE_DATA_DIR").unwrap_or_else(|| Self::DEFAULT_DATA_DIR.to_string());

        let quota = match lookup("VANTAGE_STORE_QUOTA_BYTES") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => None,
                Ok(bytes) => Some(bytes),
                Err(_) => {
                    warn!(
                        "VANTAGE_STORE_QUOTA_BYTES='{}' is not a number, using {} bytes",
                        raw,
                        Self::DEFAULT_QUOTA_BYTES
                    );
                    Some(Self::DEFAULT_QUOTA_BYTES)
                }
            },
            None => Some(Self::DEFAULT_QUOTA_BYTES),
        };

        let kind = lookup("VANTAGE_STORE").unwrap_or_else(|| Self::DEFAULT_STORE.to_string());
        let store = match kind.trim().to_ascii_lowercase().as_str() {
            "memory" => StoreBackend::Memory(quota),
            "sled" => StoreBackend::Sled(PathBuf::from(&data_dir).join(Self::SLED_DB_NAME)),
            other => {
                warn!("Unknown VANTAGE_STORE '{}', falling back to sled", other);
                StoreBackend::Sled(PathBuf::from(&data_dir).join(Self::SLED_DB_NAME))
            }
        };

        Self {
            store,
            data_dir,
            quota_bytes: quota,
        }
    }

    /// In-memory backend used when the configured store cannot be opened
    pub fn fallback_store(&self) -> StoreBackend {
        StoreBackend::Memory(self.quota_bytes)
    }
}

impl StoreBackend {
    pub fn name(&self) -> &str {
        match self {
            StoreBackend::Memory(..) => "memory",
            StoreBackend::Sled(..) => "sled",
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, StoreBackend::Sled(..))
    }
}
