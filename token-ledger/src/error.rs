//! Error types for the token ledger

use thiserror::Error;

/// Token ledger error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Debit larger than the account balance
    #[error("Insufficient balance for {address}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Debited account
        address: String,
        /// Balance before the transfer
        available: u64,
        /// Requested amount
        requested: u64,
    },

    /// Mint would overflow the total supply
    #[error("Minting {amount} would overflow total supply {total_supply}")]
    SupplyOverflow {
        /// Supply before the mint
        total_supply: u64,
        /// Requested amount
        amount: u64,
    },
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
