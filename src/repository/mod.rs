//! Repository layer: persistence of the catalog, the loan ledger and the
//! sequence counter on a key-value medium.
//!
//! Every snapshot is the full collection serialized as pretty-printed JSON,
//! so a write never leaves a partial delta behind.

pub mod file;
pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{StorageBackend, StorageConfig},
    error::AppResult,
    models::{Book, Loan},
};

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

const BOOKS_KEY: &str = "books";
const LOANS_KEY: &str = "loans";
const COUNTER_KEY: &str = "counter";

/// Raw string storage addressed by key
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn save(&self, key: &str, value: &str) -> AppResult<()>;
    async fn load(&self, key: &str) -> AppResult<Option<String>>;
}

/// State recovered at startup. Missing or unreadable keys come back empty.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub books: Vec<Book>,
    pub loans: Vec<Loan>,
    pub counter: Option<u64>,
}

/// Typed access to the three persisted keys under a namespace prefix
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl Repository {
    pub fn new(store: Arc<dyn KeyValueStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Build the backend selected in configuration
    pub async fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let store: Arc<dyn KeyValueStore> = match config.backend {
            StorageBackend::File => Arc::new(FileStore::open(&config.path).await?),
            StorageBackend::Redis => Arc::new(RedisStore::new(&config.redis_url).await?),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(Self::new(store, config.key_prefix.clone()))
    }

    fn key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// Write all three keys
    pub async fn save_all(&self, books: &[Book], loans: &[Loan], counter: u64) -> AppResult<()> {
        let books = serde_json::to_string_pretty(books)?;
        let loans = serde_json::to_string_pretty(loans)?;
        self.store.save(&self.key(BOOKS_KEY), &books).await?;
        self.store.save(&self.key(LOANS_KEY), &loans).await?;
        self.store
            .save(&self.key(COUNTER_KEY), &counter.to_string())
            .await
    }

    /// Read back whatever state is present.
    ///
    /// Absent, unreadable or malformed values are logged and treated as no
    /// prior state for that key.
    pub async fn load_all(&self) -> Snapshot {
        let books = self.load_json::<Vec<Book>>(BOOKS_KEY).await.unwrap_or_default();
        let loans = self.load_json::<Vec<Loan>>(LOANS_KEY).await.unwrap_or_default();
        let counter = match self.load_raw(COUNTER_KEY).await {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(n) => Some(n),
                Err(e) => {
                    tracing::warn!("Ignoring malformed sequence counter {:?}: {}", raw, e);
                    None
                }
            },
            None => None,
        };
        Snapshot {
            books,
            loans,
            counter,
        }
    }

    async fn load_raw(&self, name: &str) -> Option<String> {
        let key = self.key(name);
        match self.store.load(&key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    async fn load_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Option<T> {
        let raw = self.load_raw(name).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed {}{}: {}", self.prefix, name, e);
                None
            }
        }
    }
}
