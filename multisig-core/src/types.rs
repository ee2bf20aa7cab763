//! Core entities of the multisig engine
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Explicit ownership: children carry their parent's identity
//! - Time-ordered identities (UUIDv7)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Owner address (opaque identity token, compared for equality)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create new address
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Multisig wallet with its owner set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet ID
    pub wallet_id: Uuid,

    /// Display name
    pub name: String,

    /// Owners, in the order they were supplied at creation
    pub owners: Vec<Owner>,

    /// Approvals required before a transaction is ready to execute
    pub threshold: u32,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// Find the owner holding `address`
    pub fn owner_by_address(&self, address: &str) -> Option<&Owner> {
        self.owners.iter().find(|owner| owner.address.as_str() == address)
    }

    /// Status a transaction of this wallet must have with `approval_count` approvals
    pub fn status_for(&self, approval_count: usize) -> TransactionStatus {
        if approval_count as u64 >= u64::from(self.threshold) {
            TransactionStatus::ReadyToExecute
        } else {
            TransactionStatus::Pending
        }
    }
}

/// Wallet owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Owner ID
    pub owner_id: Uuid,

    /// Wallet this owner belongs to
    pub wallet_id: Uuid,

    /// Owner address
    pub address: Address,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

/// Transfer request awaiting owner approvals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID
    pub transaction_id: Uuid,

    /// Wallet the transfer is drawn from
    pub wallet_id: Uuid,

    /// Destination address
    pub to: Address,

    /// Amount in the smallest unit
    pub amount: u64,

    /// Current status
    pub status: TransactionStatus,

    /// Approvals recorded so far, oldest first
    pub approvals: Vec<Approval>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Last updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Number of recorded approvals
    pub fn approval_count(&self) -> usize {
        self.approvals.len()
    }

    /// Whether `owner_id` has already approved
    pub fn is_approved_by(&self, owner_id: Uuid) -> bool {
        self.approvals.iter().any(|approval| approval.owner_id == owner_id)
    }

    /// Whether the transaction still accepts approvals
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }
}

/// Transaction status
///
/// ```text
/// Pending --(approvals reach threshold)--> ReadyToExecute
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum TransactionStatus {
    /// Collecting approvals
    Pending = 1,
    /// Quorum reached (terminal within this engine)
    ReadyToExecute = 2,
}

impl TransactionStatus {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::ReadyToExecute => "ready_to_execute",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single owner's consent to one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    /// Approval ID
    pub approval_id: Uuid,

    /// Approved transaction
    pub transaction_id: Uuid,

    /// Approving owner
    pub owner_id: Uuid,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl Approval {
    /// New approval stamped with the current time
    pub fn new(transaction_id: Uuid, owner_id: Uuid) -> Self {
        Self {
            approval_id: Uuid::now_v7(),
            transaction_id,
            owner_id,
            created_at: Utc::now(),
        }
    }
}
