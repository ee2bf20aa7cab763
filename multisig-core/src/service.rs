//! Service facade
//!
//! Wires the wallet registry, transaction ledger and approval engine to one
//! injected store and one shared lock table.
//!
//! # Example
//!
//! ```no_run
//! use multisig_core::{Config, MultisigService};
//!
//! #[tokio::main]
//! async fn main() -> multisig_core::Result<()> {
//!     let service = MultisigService::open(Config::default())?;
//!
//!     let wallet = service.create_wallet("Treasury", &["0xA", "0xB", "0xC"], 2)?;
//!     let tx = service
//!         .submit_transaction(wallet.wallet_id, "0xA", "0xRecipient", 100)
//!         .await?;
//!     let tx = service.approve_transaction(tx.transaction_id, "0xB").await?;
//!     assert!(!tx.is_pending());
//!
//!     Ok(())
//! }
//! ```

use crate::{
    approval::ApprovalEngine,
    ledger::TransactionLedger,
    locks::KeyedLocks,
    metrics::Metrics,
    registry::WalletRegistry,
    storage::{self, StorageStats, Store},
    types::{Transaction, Wallet},
    Config, Result,
};
use std::sync::Arc;
use uuid::Uuid;

/// Multisig engine entry point
#[derive(Debug)]
pub struct MultisigService {
    registry: WalletRegistry,
    ledger: TransactionLedger,
    engine: ApprovalEngine,
    store: Arc<dyn Store>,
    metrics: Metrics,
    config: Config,
}

impl MultisigService {
    /// Open the configured store and build the service over it
    pub fn open(config: Config) -> Result<Self> {
        let store = storage::open(&config.storage)?;
        Self::with_store(store, config)
    }

    /// Build the service over an existing store
    pub fn with_store(store: Arc<dyn Store>, config: Config) -> Result<Self> {
        let metrics = Metrics::new()?;
        let locks = Arc::new(KeyedLocks::new());
        let granularity = config.approval.lock_granularity;

        let registry =
            WalletRegistry::new(Arc::clone(&store), config.wallet.clone(), metrics.clone());
        let ledger = TransactionLedger::new(
            Arc::clone(&store),
            Arc::clone(&locks),
            granularity,
            metrics.clone(),
        );
        let engine = ApprovalEngine::new(Arc::clone(&store), locks, granularity, metrics.clone());

        tracing::info!(
            service = %config.service_name,
            version = %config.service_version,
            backend = ?config.storage.backend,
            lock_granularity = ?granularity,
            strict_wallets = config.wallet.strict_validation,
            "Multisig service ready"
        );

        Ok(Self {
            registry,
            ledger,
            engine,
            store,
            metrics,
            config,
        })
    }

    /// See [`WalletRegistry::create_wallet`]
    pub fn create_wallet<S: AsRef<str>>(
        &self,
        name: &str,
        owners: &[S],
        threshold: u32,
    ) -> Result<Wallet> {
        self.registry.create_wallet(name, owners, threshold)
    }

    /// See [`TransactionLedger::submit_transaction`]
    pub async fn submit_transaction(
        &self,
        wallet_id: Uuid,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<Transaction> {
        self.ledger
            .submit_transaction(wallet_id, from, to, amount)
            .await
    }

    /// See [`ApprovalEngine::approve_transaction`]
    pub async fn approve_transaction(
        &self,
        transaction_id: Uuid,
        owner_address: &str,
    ) -> Result<Transaction> {
        self.engine
            .approve_transaction(transaction_id, owner_address)
            .await
    }

    /// Load a wallet with its owners
    pub fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
        self.registry.get_wallet(wallet_id)
    }

    /// Load a transaction with its approvals
    pub fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.ledger.get_transaction(transaction_id)
    }

    /// All transactions of a wallet, oldest first
    pub fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
        self.ledger.list_transactions(wallet_id)
    }

    /// Store statistics
    pub fn stats(&self) -> Result<StorageStats> {
        self.store.stats()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
