//! Storefront Configuration

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::{
    catalog::FixtureCatalog,
    storage::{FileStorage, MemoryStorage, PersistenceError, SessionStorage},
    store::CartStore,
};

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Catalog source settings.
#[derive(Debug, Clone, Args)]
pub struct CatalogConfig {
    /// Directory holding `<slug>.yml` catalog fixtures
    #[arg(long, env = "CARDAPIO_FIXTURES", default_value = "./fixtures")]
    pub fixtures: PathBuf,

    /// Business slug to open
    #[arg(long, env = "CARDAPIO_BUSINESS", default_value = "confeitaria-doce-mel")]
    pub business: String,
}

/// Cart persistence settings.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Directory for the stored cart session; memory only when unset
    #[arg(long, env = "CARDAPIO_STORAGE_DIR")]
    pub storage_dir: Option<PathBuf>,
}

/// Cardápio storefront configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "cardapio", about = "Digital menu checkout", long_about = None)]
pub struct StorefrontConfig {
    /// Catalog source settings.
    #[command(flatten)]
    pub catalog: CatalogConfig,

    /// Cart persistence settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl StorefrontConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Fixture catalog rooted at the configured directory.
    pub fn fixture_catalog(&self) -> FixtureCatalog {
        FixtureCatalog::with_base_path(&self.catalog.fixtures)
    }

    /// Storage selected by the configuration.
    pub fn session_storage(&self) -> ConfiguredStorage {
        match &self.storage.storage_dir {
            Some(dir) => ConfiguredStorage::File(FileStorage::new(dir)),
            None => ConfiguredStorage::Memory(MemoryStorage::new()),
        }
    }

    /// Cart store rehydrated from the configured storage.
    pub fn open_store(&self) -> CartStore<ConfiguredStorage> {
        CartStore::open(self.session_storage())
    }
}

/// Either storage backend, chosen at runtime.
#[derive(Debug, Clone)]
pub enum ConfiguredStorage {
    /// Process memory
    Memory(MemoryStorage),

    /// Files on disk
    File(FileStorage),
}

impl SessionStorage for ConfiguredStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match self {
            ConfiguredStorage::Memory(storage) => storage.read(key),
            ConfiguredStorage::File(storage) => storage.read(key),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        match self {
            ConfiguredStorage::Memory(storage) => storage.write(key, value),
            ConfiguredStorage::File(storage) => storage.write(key, value),
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match self {
            ConfiguredStorage::Memory(storage) => storage.remove(key),
            ConfiguredStorage::File(storage) => storage.remove(key),
        }
    }
}
