//! Application state wiring the controller to its concrete adapters.
//!
//! `ChatController` is generic over the key-value store; AppState pins it to
//! [`AppKvStore`], which is SQLite on disk or an in-memory map for
//! `--ephemeral` runs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use albayan_core::storage::kv_store::KvStore;
use albayan_core::storage::memory::MemoryKvStore;
use albayan_core::storage::persistence::SessionPersistence;
use albayan_core::turn::controller::{ChatController, TurnSettings};
use albayan_infra::config::load_global_config;
use albayan_infra::filesystem::{database_url, ensure_data_dir, resolve_data_dir};
use albayan_infra::llm::create_provider;
use albayan_infra::secret::resolve_api_key;
use albayan_infra::sqlite::kv::SqliteKvStore;
use albayan_infra::sqlite::pool::DatabasePool;
use albayan_types::config::GlobalConfig;
use albayan_types::error::RepositoryError;

/// Storage backend chosen at startup.
pub enum AppKvStore {
    Sqlite(SqliteKvStore),
    Memory(MemoryKvStore),
}

impl KvStore for AppKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, RepositoryError> {
        match self {
            AppKvStore::Sqlite(store) => store.get(key).await,
            AppKvStore::Memory(store) => store.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), RepositoryError> {
        match self {
            AppKvStore::Sqlite(store) => store.set(key, value).await,
            AppKvStore::Memory(store) => store.set(key, value).await,
        }
    }
}

/// Controller pinned to the concrete store.
pub type AppController = ChatController<AppKvStore>;

/// Shared application state.
pub struct AppState {
    pub controller: Arc<AppController>,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: config, storage, provider, history.
    pub async fn init(ephemeral: bool) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        ensure_data_dir(&data_dir)
            .await
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let config = load_global_config(&data_dir).await;

        let store = if ephemeral {
            tracing::info!("Ephemeral mode: history is kept in memory only");
            AppKvStore::Memory(MemoryKvStore::new())
        } else {
            let pool = DatabasePool::new(&database_url(&data_dir))
                .await
                .context("failed to open the history database")?;
            AppKvStore::Sqlite(SqliteKvStore::new(pool))
        };

        let provider = create_provider(&config, resolve_api_key())?;
        let persistence = SessionPersistence::new(store, config.storage_key.clone());
        let settings = TurnSettings {
            history_window: config.history_window,
        };
        let controller = ChatController::open(persistence, provider, settings).await;

        Ok(Self {
            controller: Arc::new(controller),
            config,
            data_dir,
        })
    }
}
