//! Configuration for the multisig engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Approval engine configuration
    pub approval: ApprovalConfig,

    /// Wallet creation policy
    pub wallet: WalletPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "multisig-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageConfig::default(),
            approval: ApprovalConfig::default(),
            wallet: WalletPolicy::default(),
        }
    }
}

/// Storage backend selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local maps
    Memory,
    /// RocksDB column families (requires the `rocksdb` feature)
    Rocksdb,
}

impl StorageBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Some(StorageBackend::Memory),
            "rocksdb" => Some(StorageBackend::Rocksdb),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend
    pub backend: StorageBackend,

    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data/multisig"),
            rocksdb: RocksDBConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 2,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Scope of the approval critical section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockGranularity {
    /// One lock per transaction
    Transaction,
    /// One lock per wallet (serializes all transactions of a wallet)
    Wallet,
}

impl LockGranularity {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "transaction" => Some(LockGranularity::Transaction),
            "wallet" => Some(LockGranularity::Wallet),
            _ => None,
        }
    }
}

/// Approval engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Lock granularity
    pub lock_granularity: LockGranularity,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            lock_granularity: LockGranularity::Transaction,
        }
    }
}

/// Wallet creation policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletPolicy {
    /// Reject zero thresholds, empty owner lists and repeated addresses
    pub strict_validation: bool,
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse from a TOML document
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("MULTISIG_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(backend) = std::env::var("MULTISIG_STORAGE_BACKEND") {
            config.storage.backend = StorageBackend::parse(&backend).ok_or_else(|| {
                crate::Error::Config(format!("Unknown storage backend: {}", backend))
            })?;
        }

        if let Ok(granularity) = std::env::var("MULTISIG_LOCK_GRANULARITY") {
            config.approval.lock_granularity =
                LockGranularity::parse(&granularity).ok_or_else(|| {
                    crate::Error::Config(format!("Unknown lock granularity: {}", granularity))
                })?;
        }

        if let Ok(strict) = std::env::var("MULTISIG_STRICT_WALLETS") {
            config.wallet.strict_validation = matches!(strict.as_str(), "1" | "true" | "yes");
        }

        Ok(config)
    }
}
