//! Multisig approval engine
//!
//! Threshold approval of value transfers: a wallet names its owners and how
//! many of them must approve before a transfer is ready to execute.
//!
//! # Architecture
//!
//! - **WalletRegistry**: creates wallets with a fixed owner set and threshold
//! - **TransactionLedger**: opens transfer requests; the proposer's approval is implicit
//! - **ApprovalEngine**: records approvals and fires the quorum transition
//! - **Store**: persistence collaborator, injected (memory or RocksDB)
//!
//! # Invariants
//!
//! - `threshold <= owners` for every created wallet
//! - At most one approval per (transaction, owner)
//! - `ReadyToExecute` iff approvals >= threshold; never reverts to `Pending`
//! - Approvals of one transaction are linearizable

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod storage;
pub mod locks;
pub mod registry;
pub mod ledger;
pub mod approval;
pub mod service;
pub mod error;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{Address, Approval, Owner, Transaction, TransactionStatus, Wallet};
pub use storage::{MemoryStore, StorageStats, Store};
pub use registry::WalletRegistry;
pub use ledger::TransactionLedger;
pub use approval::ApprovalEngine;
pub use service::MultisigService;
pub use config::{Config, LockGranularity};
