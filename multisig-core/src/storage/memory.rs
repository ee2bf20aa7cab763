//! In-process store
//!
//! Every write runs under one `RwLock` write guard, so each `Store` call is
//! atomic and later reads observe it.

use super::{StorageStats, Store};
use crate::{
    types::{Approval, Transaction, TransactionStatus, Wallet},
    Error, Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    wallets: HashMap<Uuid, Wallet>,
    transactions: HashMap<Uuid, Transaction>,
    wallet_transactions: HashMap<Uuid, Vec<Uuid>>,
}

/// Store backed by process-local hash maps
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn insert_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut state = self.state.write();
        if state.wallets.contains_key(&wallet.wallet_id) {
            return Err(Error::Storage(format!(
                "Wallet {} already exists",
                wallet.wallet_id
            )));
        }

        state.wallets.insert(wallet.wallet_id, wallet.clone());
        state.wallet_transactions.entry(wallet.wallet_id).or_default();

        tracing::debug!(
            wallet_id = %wallet.wallet_id,
            owners = wallet.owners.len(),
            "Wallet stored"
        );
        Ok(())
    }

    fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
        self.state
            .read()
            .wallets
            .get(&wallet_id)
            .cloned()
            .ok_or(Error::WalletNotFound(wallet_id))
    }

    fn insert_transaction(&self, transaction: &Transaction) -> Result<()> {
        let mut state = self.state.write();
        if !state.wallets.contains_key(&transaction.wallet_id) {
            return Err(Error::WalletNotFound(transaction.wallet_id));
        }
        if state.transactions.contains_key(&transaction.transaction_id) {
            return Err(Error::Storage(format!(
                "Transaction {} already exists",
                transaction.transaction_id
            )));
        }

        let mut row = transaction.clone();
        row.approvals.clear();
        state.transactions.insert(row.transaction_id, row);
        state
            .wallet_transactions
            .entry(transaction.wallet_id)
            .or_default()
            .push(transaction.transaction_id);

        tracing::debug!(
            transaction_id = %transaction.transaction_id,
            wallet_id = %transaction.wallet_id,
            "Transaction stored"
        );
        Ok(())
    }

    fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        self.state
            .read()
            .transactions
            .get(&transaction_id)
            .cloned()
            .ok_or(Error::TransactionNotFound(transaction_id))
    }

    fn wallet_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
        let state = self.state.read();
        let ids = state
            .wallet_transactions
            .get(&wallet_id)
            .ok_or(Error::WalletNotFound(wallet_id))?;

        Ok(ids
            .iter()
            .filter_map(|id| state.transactions.get(id).cloned())
            .collect())
    }

    fn commit_approval(&self, approval: &Approval, status: TransactionStatus) -> Result<()> {
        let mut state = self.state.write();
        let transaction = state
            .transactions
            .get_mut(&approval.transaction_id)
            .ok_or(Error::TransactionNotFound(approval.transaction_id))?;

        if !transaction.is_pending() {
            return Err(Error::NotPending {
                transaction_id: transaction.transaction_id,
                status: transaction.status,
            });
        }
        if transaction.is_approved_by(approval.owner_id) {
            return Err(Error::DuplicateApproval {
                transaction_id: transaction.transaction_id,
                owner_id: approval.owner_id,
            });
        }

        transaction.approvals.push(approval.clone());
        transaction.status = status;
        transaction.updated_at = approval.created_at;

        tracing::debug!(
            transaction_id = %approval.transaction_id,
            approval_id = %approval.approval_id,
            status = %status,
            "Approval committed"
        );
        Ok(())
    }

    fn stats(&self) -> Result<StorageStats> {
        let state = self.state.read();
        Ok(StorageStats {
            total_wallets: state.wallets.len() as u64,
            total_owners: state.wallets.values().map(|w| w.owners.len() as u64).sum(),
            total_transactions: state.transactions.len() as u64,
            total_approvals: state
                .transactions
                .values()
                .map(|t| t.approvals.len() as u64)
                .sum(),
        })
    }
}
