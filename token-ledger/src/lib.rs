//! Token ledger
//!
//! Fungible balances with mint and transfer. Every operation runs under one
//! ledger-wide lock, so the sum of all balances always equals the total supply
//! and concurrent transfers can never overdraw an account.

#![forbid(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod error;
pub mod token;

pub use error::{Error, Result};
pub use token::{Token, TokenInfo};
