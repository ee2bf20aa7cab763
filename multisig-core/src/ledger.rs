//! Transaction ledger
//!
//! Opens transfer requests against a wallet. Submitting is itself the first
//! approval: the proposer's consent is recorded right after the transaction.

use crate::{
    config::LockGranularity,
    locks::KeyedLocks,
    metrics::Metrics,
    storage::Store,
    types::{Address, Approval, Transaction, TransactionStatus},
    Error, Result,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Submits and loads transactions
#[derive(Debug)]
pub struct TransactionLedger {
    store: Arc<dyn Store>,
    locks: Arc<KeyedLocks>,
    granularity: LockGranularity,
    metrics: Metrics,
}

impl TransactionLedger {
    /// Create ledger over `store`, sharing `locks` with the approval engine
    pub fn new(
        store: Arc<dyn Store>,
        locks: Arc<KeyedLocks>,
        granularity: LockGranularity,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            locks,
            granularity,
            metrics,
        }
    }

    /// Submit a transfer of `amount` to `to`, proposed by owner `from`
    ///
    /// The returned transaction already carries the proposer's approval. With
    /// a threshold of one (or zero) it is `ReadyToExecute` straight away.
    pub async fn submit_transaction(
        &self,
        wallet_id: Uuid,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<Transaction> {
        match self.try_submit(wallet_id, from, to, amount).await {
            Ok(transaction) => {
                self.metrics.record_transaction_submitted();
                self.metrics
                    .record_approval(transaction.status == TransactionStatus::ReadyToExecute);
                tracing::info!(
                    transaction_id = %transaction.transaction_id,
                    wallet_id = %wallet_id,
                    to = %transaction.to,
                    amount,
                    status = %transaction.status,
                    "Transaction submitted"
                );
                Ok(transaction)
            }
            Err(err) => {
                self.metrics.record_rejection(err.kind());
                tracing::warn!(
                    wallet_id = %wallet_id,
                    from,
                    kind = err.kind(),
                    "Transaction submission rejected: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Load a transaction with its approvals
    pub fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.store.get_transaction(transaction_id)
    }

    /// All transactions of a wallet, oldest first
    pub fn list_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
        self.store.wallet_transactions(wallet_id)
    }

    async fn try_submit(
        &self,
        wallet_id: Uuid,
        from: &str,
        to: &str,
        amount: u64,
    ) -> Result<Transaction> {
        let transaction_id = Uuid::now_v7();

        // Same key the approval engine will use for this transaction
        let _guard = match self.granularity {
            LockGranularity::Transaction => self.locks.lock(transaction_id).await,
            LockGranularity::Wallet => self.locks.lock(wallet_id).await,
        };

        let wallet = self.store.get_wallet(wallet_id)?;
        let proposer = wallet.owner_by_address(from).ok_or_else(|| Error::NotOwner {
            wallet_id,
            address: from.to_string(),
        })?;

        let now = Utc::now();
        let transaction = Transaction {
            transaction_id,
            wallet_id,
            to: Address::new(to),
            amount,
            status: TransactionStatus::Pending,
            approvals: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.store.insert_transaction(&transaction)?;

        // No rollback of the transaction row if this write fails
        let approval = Approval::new(transaction_id, proposer.owner_id);
        self.store
            .commit_approval(&approval, wallet.status_for(1))
            .map_err(|err| Error::ApprovalPersistFailed {
                transaction_id,
                reason: err.to_string(),
            })?;

        self.store.get_transaction(transaction_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WalletPolicy;
    use crate::registry::WalletRegistry;
    use crate::storage::{MemoryStore, StorageStats};
    use crate::types::Wallet;

    /// Store whose approval writes always fail
    #[derive(Debug, Default)]
    struct FailingApprovals {
        inner: MemoryStore,
    }

    impl Store for FailingApprovals {
        fn insert_wallet(&self, wallet: &Wallet) -> Result<()> {
            self.inner.insert_wallet(wallet)
        }
        fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
            self.inner.get_wallet(wallet_id)
        }
        fn insert_transaction(&self, transaction: &Transaction) -> Result<()> {
            self.inner.insert_transaction(transaction)
        }
        fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
            self.inner.get_transaction(transaction_id)
        }
        fn wallet_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
            self.inner.wallet_transactions(wallet_id)
        }
        fn commit_approval(&self, _: &Approval, _: TransactionStatus) -> Result<()> {
            Err(Error::Storage("approvals table unavailable".to_string()))
        }
        fn stats(&self) -> Result<StorageStats> {
            self.inner.stats()
        }
    }

    fn setup(store: Arc<dyn Store>) -> (WalletRegistry, TransactionLedger) {
        let metrics = Metrics::new().unwrap();
        let registry =
            WalletRegistry::new(Arc::clone(&store), WalletPolicy::default(), metrics.clone());
        let ledger = TransactionLedger::new(
            store,
            Arc::new(KeyedLocks::new()),
            LockGranularity::Transaction,
            metrics,
        );
        (registry, ledger)
    }

    #[tokio::test]
    async fn test_submit_records_proposer_approval() {
        let (registry, ledger) = setup(Arc::new(MemoryStore::new()));
        let wallet = registry
            .create_wallet("Test Wallet", &["0xOwner1", "0xOwner2", "0xOwner3"], 2)
            .unwrap();

        let tx = ledger
            .submit_transaction(wallet.wallet_id, "0xOwner1", "0xRecipient", 100)
            .await
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(tx.amount, 100);
        assert_eq!(tx.to.as_str(), "0xRecipient");
        assert_eq!(tx.approvals.len(), 1);
        assert_eq!(tx.approvals[0].owner_id, wallet.owners[0].owner_id);
        assert!(!tx.is_approved_by(wallet.owners[1].owner_id));
        assert!(!tx.is_approved_by(wallet.owners[2].owner_id));
    }

    #[tokio::test]
    async fn test_submit_threshold_one_is_ready() {
        let (registry, ledger) = setup(Arc::new(MemoryStore::new()));
        let wallet = registry.create_wallet("Solo", &["0xA", "0xB"], 1).unwrap();

        let tx = ledger
            .submit_transaction(wallet.wallet_id, "0xB", "0xRecipient", 5)
            .await
            .unwrap();

        assert_eq!(tx.status, TransactionStatus::ReadyToExecute);
        assert_eq!(tx.approvals.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_unknown_wallet() {
        let (_, ledger) = setup(Arc::new(MemoryStore::new()));
        let result = ledger
            .submit_transaction(Uuid::now_v7(), "0xA", "0xRecipient", 1)
            .await;
        assert!(matches!(result, Err(Error::WalletNotFound(_))));
    }

    #[tokio::test]
    async fn test_submit_by_non_owner() {
        let (registry, ledger) = setup(Arc::new(MemoryStore::new()));
        let wallet = registry.create_wallet("Ops", &["0xA", "0xB"], 2).unwrap();

        let result = ledger
            .submit_transaction(wallet.wallet_id, "0xMallory", "0xRecipient", 1)
            .await;
        assert!(matches!(result, Err(Error::NotOwner { .. })));
        assert!(ledger.list_transactions(wallet.wallet_id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_auto_approval_leaves_pending_transaction() {
        let store: Arc<dyn Store> = Arc::new(FailingApprovals::default());
        let (registry, ledger) = setup(Arc::clone(&store));
        let wallet = registry.create_wallet("Ops", &["0xA", "0xB"], 2).unwrap();

        let err = ledger
            .submit_transaction(wallet.wallet_id, "0xA", "0xRecipient", 10)
            .await
            .unwrap_err();

        let transaction_id = match err {
            Error::ApprovalPersistFailed { transaction_id, .. } => transaction_id,
            other => panic!("unexpected error: {other}"),
        };

        let orphan = ledger.get_transaction(transaction_id).unwrap();
        assert_eq!(orphan.status, TransactionStatus::Pending);
        assert!(orphan.approvals.is_empty());
    }

    #[tokio::test]
    async fn test_list_transactions_in_submission_order() {
        let (registry, ledger) = setup(Arc::new(MemoryStore::new()));
        let wallet = registry.create_wallet("Ops", &["0xA", "0xB"], 2).unwrap();

        let mut submitted = Vec::new();
        for amount in [10, 20, 30] {
            let tx = ledger
                .submit_transaction(wallet.wallet_id, "0xA", "0xRecipient", amount)
                .await
                .unwrap();
            submitted.push(tx.transaction_id);
        }

        let listed: Vec<Uuid> = ledger
            .list_transactions(wallet.wallet_id)
            .unwrap()
            .iter()
            .map(|t| t.transaction_id)
            .collect();
        assert_eq!(listed, submitted);
    }
}
