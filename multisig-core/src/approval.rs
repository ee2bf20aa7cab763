//! Approval engine
//!
//! Records owner approvals and moves a transaction to `ReadyToExecute` once
//! its approval count reaches the wallet threshold.
//!
//! # Critical section
//!
//! The whole read-check-insert-recount sequence of [`ApprovalEngine::approve_transaction`]
//! runs while holding the transaction's key in [`KeyedLocks`] (or the wallet's,
//! with `LockGranularity::Wallet`). Two owners approving at the same moment are
//! therefore applied one after the other: the second always sees the first
//! approval when it counts, so the quorum transition can neither be skipped
//! nor fired twice.
//!
//! The approval row and the resulting status are committed in one store
//! write, so a failure leaves neither behind.

use crate::{
    config::LockGranularity,
    locks::{KeyGuard, KeyedLocks},
    metrics::Metrics,
    storage::Store,
    types::{Approval, Transaction, TransactionStatus},
    Error, Result,
};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Applies owner approvals to pending transactions
#[derive(Debug)]
pub struct ApprovalEngine {
    store: Arc<dyn Store>,
    locks: Arc<KeyedLocks>,
    granularity: LockGranularity,
    metrics: Metrics,
}

impl ApprovalEngine {
    /// Create engine over `store`, sharing `locks` with the transaction ledger
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

    /// Record `owner_address`'s approval of a transaction
    ///
    /// Returns the transaction with its full approval set and current status.
    /// Rejections (`TransactionNotFound`, `NotPending`, `WalletNotFound`,
    /// `NotOwner`, `DuplicateApproval`) leave the transaction untouched.
    pub async fn approve_transaction(
        &self,
        transaction_id: Uuid,
        owner_address: &str,
    ) -> Result<Transaction> {
        let started = Instant::now();
        let result = self.try_approve(transaction_id, owner_address).await;
        self.metrics
            .record_approval_duration(started.elapsed().as_secs_f64());

        match result {
            Ok((transaction, reached_quorum)) => {
                self.metrics.record_approval(reached_quorum);
                tracing::info!(
                    transaction_id = %transaction_id,
                    owner = owner_address,
                    approvals = transaction.approval_count(),
                    status = %transaction.status,
                    "Approval recorded"
                );
                if reached_quorum {
                    tracing::info!(
                        transaction_id = %transaction_id,
                        wallet_id = %transaction.wallet_id,
                        "Quorum reached, transaction ready to execute"
                    );
                }
                Ok(transaction)
            }
            Err(err) => {
                self.metrics.record_rejection(err.kind());
                tracing::warn!(
                    transaction_id = %transaction_id,
                    owner = owner_address,
                    kind = err.kind(),
                    "Approval rejected: {}",
                    err
                );
                Err(err)
            }
        }
    }

    async fn acquire(&self, transaction_id: Uuid) -> Result<KeyGuard> {
        match self.granularity {
            LockGranularity::Transaction => Ok(self.locks.lock(transaction_id).await),
            LockGranularity::Wallet => {
                // wallet_id never changes, so reading it unlocked is safe
                let wallet_id = self.store.get_transaction(transaction_id)?.wallet_id;
                Ok(self.locks.lock(wallet_id).await)
            }
        }
    }

    async fn try_approve(
        &self,
        transaction_id: Uuid,
        owner_address: &str,
    ) -> Result<(Transaction, bool)> {
        let _guard = self.acquire(transaction_id).await?;

        let transaction = self.store.get_transaction(transaction_id)?;

        if !transaction.is_pending() {
            return Err(Error::NotPending {
                transaction_id,
                status: transaction.status,
            });
        }

        let wallet = self.store.get_wallet(transaction.wallet_id)?;

        let owner = wallet
            .owner_by_address(owner_address)
            .ok_or_else(|| Error::NotOwner {
                wallet_id: wallet.wallet_id,
                address: owner_address.to_string(),
            })?;

        if transaction.is_approved_by(owner.owner_id) {
            return Err(Error::DuplicateApproval {
                transaction_id,
                owner_id: owner.owner_id,
            });
        }

        // Count includes the approval being inserted; the lock keeps it exact
        let approval = Approval::new(transaction_id, owner.owner_id);
        let status = wallet.status_for(transaction.approval_count() + 1);
        self.store.commit_approval(&approval, status)?;

        let updated = self.store.get_transaction(transaction_id)?;
        let reached_quorum = status == TransactionStatus::ReadyToExecute;

        Ok((updated, reached_quorum))
    }
}
