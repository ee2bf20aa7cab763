//! Error types for the multisig engine

use crate::types::TransactionStatus;
use thiserror::Error;
use uuid::Uuid;

/// Result type for multisig operations
pub type Result<T> = std::result::Result<T, Error>;

/// Multisig errors
#[derive(Error, Debug)]
pub enum Error {
    /// Threshold cannot be satisfied by the owner set
    #[error("Invalid threshold: {threshold} with {owners} owner(s)")]
    InvalidThreshold {
        /// Requested threshold
        threshold: u32,
        /// Number of owners supplied
        owners: usize,
    },

    /// Owner address repeated within one wallet (strict policy only)
    #[error("Duplicate owner address: {0}")]
    DuplicateOwner(String),

    /// Wallet not found
    #[error("Wallet not found: {0}")]
    WalletNotFound(Uuid),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(Uuid),

    /// Address is not an owner of the wallet
    #[error("Only wallet owners can act on wallet {wallet_id}: {address}")]
    NotOwner {
        /// Wallet checked
        wallet_id: Uuid,
        /// Rejected address
        address: String,
    },

    /// Transaction no longer accepts approvals
    #[error("Transaction {transaction_id} is not pending (status: {status})")]
    NotPending {
        /// Transaction ID
        transaction_id: Uuid,
        /// Status found
        status: TransactionStatus,
    },

    /// Owner already approved the transaction
    #[error("Transaction {transaction_id} already approved by owner {owner_id}")]
    DuplicateApproval {
        /// Transaction ID
        transaction_id: Uuid,
        /// Owner ID
        owner_id: Uuid,
    },

    /// Submitter's approval could not be written after the transaction was
    #[error("Failed to auto-approve transaction {transaction_id}: {reason}")]
    ApprovalPersistFailed {
        /// Transaction that was created without its approval
        transaction_id: Uuid,
        /// Underlying store failure
        reason: String,
    },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidThreshold { .. } => "invalid_threshold",
            Error::DuplicateOwner(_) => "duplicate_owner",
            Error::WalletNotFound(_) => "wallet_not_found",
            Error::TransactionNotFound(_) => "transaction_not_found",
            Error::NotOwner { .. } => "not_owner",
            Error::NotPending { .. } => "not_pending",
            Error::DuplicateApproval { .. } => "duplicate_approval",
            Error::ApprovalPersistFailed { .. } => "approval_persist_failed",
            Error::Storage(_) | Error::Serialization(_) | Error::Io(_) => "persistence_failure",
            Error::Config(_) => "config",
            Error::Metrics(_) => "metrics",
        }
    }

    /// Whether the error came from the persistence collaborator
    ///
    /// State may have been partially written; callers inspect and retry.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Error::Storage(_)
                | Error::Serialization(_)
                | Error::Io(_)
                | Error::ApprovalPersistFailed { .. }
        )
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        let err = Error::NotPending {
            transaction_id: Uuid::nil(),
            status: TransactionStatus::ReadyToExecute,
        };
        assert_eq!(err.kind(), "not_pending");
        assert!(!err.is_persistence_failure());
        assert!(err.to_string().contains("ready_to_execute"));

        let err = Error::Storage("disk full".to_string());
        assert_eq!(err.kind(), "persistence_failure");
        assert!(err.is_persistence_failure());
    }

    #[test]
    fn test_approval_persist_failed_is_persistence_failure() {
        let err = Error::ApprovalPersistFailed {
            transaction_id: Uuid::nil(),
            reason: "write stalled".to_string(),
        };
        assert!(err.is_persistence_failure());
        assert!(err.to_string().contains("auto-approve"));
    }
}
