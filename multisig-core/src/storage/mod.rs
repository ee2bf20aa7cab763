//! Persistence collaborator
//!
//! The engine depends only on the [`Store`] contract:
//!
//! - Atomic creates (a wallet together with its owners, a transaction)
//! - Preloaded reads: a wallet with its owners, a transaction with its approvals
//! - Read-your-writes consistency
//! - One atomic commit for an approval and the status it produces
//!
//! Exclusive access per transaction (or wallet) is layered on top by the
//! engine's keyed locks; the store itself still refuses a second approval
//! for the same (transaction, owner) pair.

mod memory;
#[cfg(feature = "rocksdb")]
mod rocks;

pub use memory::MemoryStore;
#[cfg(feature = "rocksdb")]
pub use rocks::RocksStore;

use crate::{
    config::{StorageBackend, StorageConfig},
    types::{Approval, Transaction, TransactionStatus, Wallet},
    Result,
};
use std::sync::Arc;
use uuid::Uuid;

/// Persistence contract required by the engine
pub trait Store: Send + Sync + std::fmt::Debug {
    /// Persist a new wallet and all of its owners in one write
    fn insert_wallet(&self, wallet: &Wallet) -> Result<()>;

    /// Load a wallet with its owners, in creation order
    fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet>;

    /// Persist a new transaction (its `approvals` field is ignored)
    ///
    /// Fails with `WalletNotFound` when the owning wallet does not exist.
    fn insert_transaction(&self, transaction: &Transaction) -> Result<()>;

    /// Load a transaction with its approvals, oldest first
    fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction>;

    /// All transactions of a wallet, oldest first
    fn wallet_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>>;

    /// Record `approval` and set the transaction's status in one atomic write
    ///
    /// Fails with `TransactionNotFound`, `NotPending` or `DuplicateApproval`
    /// without writing anything.
    fn commit_approval(&self, approval: &Approval, status: TransactionStatus) -> Result<()>;

    /// Row counts
    fn stats(&self) -> Result<StorageStats>;
}

/// Storage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Wallets stored
    pub total_wallets: u64,
    /// Owners stored
    pub total_owners: u64,
    /// Transactions stored
    pub total_transactions: u64,
    /// Approvals stored
    pub total_approvals: u64,
}

/// Open the backend selected by `config`
pub fn open(config: &StorageConfig) -> Result<Arc<dyn Store>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => Ok(Arc::new(RocksStore::open(config)?)),
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => Err(crate::Error::Config(
            "rocksdb backend requires the `rocksdb` feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_memory_backend() {
        let store = open(&StorageConfig::default()).unwrap();
        assert_eq!(store.stats().unwrap(), StorageStats::default());
    }

    #[cfg(not(feature = "rocksdb"))]
    #[test]
    fn test_open_rocksdb_without_feature() {
        let config = StorageConfig {
            backend: StorageBackend::Rocksdb,
            ..StorageConfig::default()
        };
        assert!(matches!(open(&config), Err(crate::Error::Config(_))));
    }
}
