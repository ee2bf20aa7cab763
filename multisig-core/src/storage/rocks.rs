//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `wallets` - Wallet rows without owners (key: wallet_id)
//! - `owners` - Owner rows (key: wallet_id || position)
//! - `transactions` - Transaction rows without approvals (key: transaction_id)
//! - `approvals` - Approval rows (key: transaction_id || created_at || approval_id)
//! - `indices` - Secondary indices (wallet -> transactions by creation time,
//!   approval uniqueness)
//!
//! Every read that assembles an entity from several column families goes
//! through one snapshot, so a concurrent `commit_approval` batch is seen
//! either entirely or not at all.

use super::{StorageStats, Store};
use crate::{
    config::StorageConfig,
    error::{Error, Result},
    types::{Approval, Owner, Transaction, TransactionStatus, Wallet},
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, Snapshot, WriteBatch,
    DB,
};
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Column family names
const CF_WALLETS: &str = "wallets";
const CF_OWNERS: &str = "owners";
const CF_TRANSACTIONS: &str = "transactions";
const CF_APPROVALS: &str = "approvals";
const CF_INDICES: &str = "indices";

/// Index tags
const IDX_WALLET_TRANSACTION: u8 = b'w';
const IDX_APPROVAL_OWNER: u8 = b'o';

/// Store backed by RocksDB
pub struct RocksStore {
    db: DB,
    path: PathBuf,
    /// Serializes check-then-write sequences
    write_lock: Mutex<()>,
}

impl fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RocksStore").field("path", &self.path).finish()
    }
}

impl RocksStore {
    /// Open or create database
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_WALLETS, Self::cf_options_rows()),
            ColumnFamilyDescriptor::new(CF_OWNERS, Self::cf_options_rows()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_rows()),
            ColumnFamilyDescriptor::new(CF_APPROVALS, Self::cf_options_rows()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB multisig store");

        Ok(Self {
            db,
            path: path.clone(),
            write_lock: Mutex::new(()),
        })
    }

    // Column family options

    fn cf_options_rows() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Values of every key starting with `prefix`, in key order
    fn scan_prefix(
        snapshot: &Snapshot<'_>,
        cf: &ColumnFamily,
        prefix: &[u8],
    ) -> Result<Vec<Box<[u8]>>> {
        let mut values = Vec::new();
        for item in snapshot.iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(value);
        }
        Ok(values)
    }

    fn count_keys(snapshot: &Snapshot<'_>, cf: &ColumnFamily) -> Result<u64> {
        let mut count = 0u64;
        for item in snapshot.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn load_transaction_row(
        &self,
        snapshot: &Snapshot<'_>,
        transaction_id: Uuid,
    ) -> Result<Transaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let value = snapshot
            .get_cf(cf, transaction_id.as_bytes())?
            .ok_or(Error::TransactionNotFound(transaction_id))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Transaction row and its approvals, both read from `snapshot`
    fn load_transaction(
        &self,
        snapshot: &Snapshot<'_>,
        transaction_id: Uuid,
    ) -> Result<Transaction> {
        let mut transaction = self.load_transaction_row(snapshot, transaction_id)?;
        let cf = self.cf_handle(CF_APPROVALS)?;
        transaction.approvals = Self::scan_prefix(snapshot, cf, transaction_id.as_bytes())?
            .iter()
            .map(|value| bincode::deserialize(value).map_err(Error::from))
            .collect::<Result<_>>()?;
        Ok(transaction)
    }

    // Key helpers

    fn owner_key(wallet_id: Uuid, position: u32) -> Vec<u8> {
        let mut key = wallet_id.as_bytes().to_vec();
        key.extend_from_slice(&position.to_be_bytes());
        key
    }

    /// Big-endian nanoseconds, so keys sort oldest first
    fn time_key(at: DateTime<Utc>) -> [u8; 8] {
        (at.timestamp_nanos_opt().unwrap_or(i64::MAX) as u64).to_be_bytes()
    }

    fn approval_key(approval: &Approval) -> Vec<u8> {
        let mut key = approval.transaction_id.as_bytes().to_vec();
        key.extend_from_slice(&Self::time_key(approval.created_at));
        key.extend_from_slice(approval.approval_id.as_bytes());
        key
    }

    fn index_key_wallet(wallet_id: Uuid) -> Vec<u8> {
        let mut key = vec![IDX_WALLET_TRANSACTION];
        key.extend_from_slice(wallet_id.as_bytes());
        key
    }

    fn index_key_wallet_transaction(transaction: &Transaction) -> Vec<u8> {
        let mut key = Self::index_key_wallet(transaction.wallet_id);
        key.extend_from_slice(&Self::time_key(transaction.created_at));
        key.extend_from_slice(transaction.transaction_id.as_bytes());
        key
    }

    fn index_key_approval_owner(transaction_id: Uuid, owner_id: Uuid) -> Vec<u8> {
        let mut key = vec![IDX_APPROVAL_OWNER];
        key.extend_from_slice(transaction_id.as_bytes());
        key.extend_from_slice(owner_id.as_bytes());
        key
    }
}

impl Store for RocksStore {
    fn insert_wallet(&self, wallet: &Wallet) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_wallets = self.cf_handle(CF_WALLETS)?;
        let cf_owners = self.cf_handle(CF_OWNERS)?;

        if self.db.get_cf(cf_wallets, wallet.wallet_id.as_bytes())?.is_some() {
            return Err(Error::Storage(format!(
                "Wallet {} already exists",
                wallet.wallet_id
            )));
        }

        let mut batch = WriteBatch::default();

        let mut row = wallet.clone();
        row.owners.clear();
        batch.put_cf(cf_wallets, wallet.wallet_id.as_bytes(), bincode::serialize(&row)?);

        for (position, owner) in wallet.owners.iter().enumerate() {
            let key = Self::owner_key(wallet.wallet_id, position as u32);
            batch.put_cf(cf_owners, &key, bincode::serialize(owner)?);
        }

        self.db.write(batch)?;

        tracing::debug!(
            wallet_id = %wallet.wallet_id,
            owners = wallet.owners.len(),
            "Wallet stored"
        );
        Ok(())
    }

    fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
        let snapshot = self.db.snapshot();
        let cf_wallets = self.cf_handle(CF_WALLETS)?;
        let value = snapshot
            .get_cf(cf_wallets, wallet_id.as_bytes())?
            .ok_or(Error::WalletNotFound(wallet_id))?;
        let mut wallet: Wallet = bincode::deserialize(&value)?;

        let cf_owners = self.cf_handle(CF_OWNERS)?;
        wallet.owners = Self::scan_prefix(&snapshot, cf_owners, wallet_id.as_bytes())?
            .iter()
            .map(|value| bincode::deserialize::<Owner>(value).map_err(Error::from))
            .collect::<Result<_>>()?;

        Ok(wallet)
    }

    fn insert_transaction(&self, transaction: &Transaction) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_wallets = self.cf_handle(CF_WALLETS)?;
        let cf_transactions = self.cf_handle(CF_TRANSACTIONS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        if self
            .db
            .get_cf(cf_wallets, transaction.wallet_id.as_bytes())?
            .is_none()
        {
            return Err(Error::WalletNotFound(transaction.wallet_id));
        }
        if self
            .db
            .get_cf(cf_transactions, transaction.transaction_id.as_bytes())?
            .is_some()
        {
            return Err(Error::Storage(format!(
                "Transaction {} already exists",
                transaction.transaction_id
            )));
        }

        let mut row = transaction.clone();
        row.approvals.clear();

        let mut batch = WriteBatch::default();
        batch.put_cf(
            cf_transactions,
            transaction.transaction_id.as_bytes(),
            bincode::serialize(&row)?,
        );
        let idx = Self::index_key_wallet_transaction(transaction);
        batch.put_cf(cf_indices, &idx, b"");

        self.db.write(batch)?;

        tracing::debug!(
            transaction_id = %transaction.transaction_id,
            wallet_id = %transaction.wallet_id,
            "Transaction stored"
        );
        Ok(())
    }

    fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        // Row and approvals must come from the same point in time
        let snapshot = self.db.snapshot();
        self.load_transaction(&snapshot, transaction_id)
    }

    fn wallet_transactions(&self, wallet_id: Uuid) -> Result<Vec<Transaction>> {
        let snapshot = self.db.snapshot();
        let cf_wallets = self.cf_handle(CF_WALLETS)?;
        if snapshot.get_cf(cf_wallets, wallet_id.as_bytes())?.is_none() {
            return Err(Error::WalletNotFound(wallet_id));
        }

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let prefix = Self::index_key_wallet(wallet_id);

        let mut transactions = Vec::new();
        let mode = IteratorMode::From(&prefix, Direction::Forward);
        for item in snapshot.iterator_cf(cf_indices, mode) {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            // Transaction id is the key's trailing 16 bytes
            let id_bytes: [u8; 16] = key[key.len().saturating_sub(16)..]
                .try_into()
                .map_err(|_| Error::Storage("Malformed wallet index key".to_string()))?;
            transactions.push(self.load_transaction(&snapshot, Uuid::from_bytes(id_bytes))?);
        }

        Ok(transactions)
    }

    fn commit_approval(&self, approval: &Approval, status: TransactionStatus) -> Result<()> {
        let _guard = self.write_lock.lock();
        let cf_transactions = self.cf_handle(CF_TRANSACTIONS)?;
        let cf_approvals = self.cf_handle(CF_APPROVALS)?;
        let cf_indices = self.cf_handle(CF_INDICES)?;

        let snapshot = self.db.snapshot();
        let mut row = self.load_transaction_row(&snapshot, approval.transaction_id)?;
        if !row.is_pending() {
            return Err(Error::NotPending {
                transaction_id: row.transaction_id,
                status: row.status,
            });
        }

        let unique_key = Self::index_key_approval_owner(approval.transaction_id, approval.owner_id);
        if snapshot.get_cf(cf_indices, &unique_key)?.is_some() {
            return Err(Error::DuplicateApproval {
                transaction_id: approval.transaction_id,
                owner_id: approval.owner_id,
            });
        }

        row.status = status;
        row.updated_at = approval.created_at;

        // Approval, uniqueness index and status land together or not at all
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_approvals, Self::approval_key(approval), bincode::serialize(approval)?);
        batch.put_cf(cf_indices, &unique_key, b"");
        batch.put_cf(
            cf_transactions,
            row.transaction_id.as_bytes(),
            bincode::serialize(&row)?,
        );
        self.db.write(batch)?;

        tracing::debug!(
            transaction_id = %approval.transaction_id,
            approval_id = %approval.approval_id,
            status = %status,
            "Approval committed"
        );
        Ok(())
    }

    fn stats(&self) -> Result<StorageStats> {
        let snapshot = self.db.snapshot();
        Ok(StorageStats {
            total_wallets: Self::count_keys(&snapshot, self.cf_handle(CF_WALLETS)?)?,
            total_owners: Self::count_keys(&snapshot, self.cf_handle(CF_OWNERS)?)?,
            total_transactions: Self::count_keys(&snapshot, self.cf_handle(CF_TRANSACTIONS)?)?,
            total_approvals: Self::count_keys(&snapshot, self.cf_handle(CF_APPROVALS)?)?,
        })
    }
}
