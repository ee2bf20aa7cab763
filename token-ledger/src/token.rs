//! Token balances with mint and transfer

use crate::{Error, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Display name
    pub name: String,

    /// Ticker symbol
    pub symbol: String,

    /// Decimal places of the smallest unit
    pub decimals: u8,
}

#[derive(Debug, Default)]
struct Ledger {
    total_supply: u64,
    balances: HashMap<String, u64>,
}

impl Ledger {
    // Cannot overflow: every balance is bounded by total_supply
    fn credit(&mut self, address: &str, amount: u64) {
        *self.balances.entry(address.to_string()).or_insert(0) += amount;
    }
}

/// Fungible token
///
/// All balance changes happen under a single lock. Per-account locks would
/// allow more parallel transfers but need ordered acquisition of both sides.
#[derive(Debug)]
pub struct Token {
    info: TokenInfo,
    ledger: Mutex<Ledger>,
}

impl Token {
    /// Create a token whose initial supply is held by `treasury`
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        initial_supply: u64,
        treasury: &str,
    ) -> Self {
        let info = TokenInfo {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        };

        let mut ledger = Ledger {
            total_supply: initial_supply,
            balances: HashMap::new(),
        };
        if initial_supply > 0 {
            ledger.credit(treasury, initial_supply);
        }

        tracing::info!(
            symbol = %info.symbol,
            initial_supply,
            treasury,
            "Token created"
        );

        Self {
            info,
            ledger: Mutex::new(ledger),
        }
    }

    /// Token metadata
    pub fn info(&self) -> &TokenInfo {
        &self.info
    }

    /// Create `amount` new units on `to`
    pub fn mint(&self, to: &str, amount: u64) -> Result<()> {
        let mut ledger = self.ledger.lock();

        let total_supply = ledger
            .total_supply
            .checked_add(amount)
            .ok_or(Error::SupplyOverflow {
                total_supply: ledger.total_supply,
                amount,
            })?;

        ledger.total_supply = total_supply;
        ledger.credit(to, amount);

        tracing::debug!(symbol = %self.info.symbol, to, amount, total_supply, "Minted");
        Ok(())
    }

    /// Move `amount` from `from` to `to`
    ///
    /// Fails with `InsufficientBalance` and changes nothing when `from` holds
    /// less than `amount`. A transfer to self is a balance-checked no-op.
    pub fn transfer(&self, from: &str, to: &str, amount: u64) -> Result<()> {
        let mut ledger = self.ledger.lock();

        let available = ledger.balances.get(from).copied().unwrap_or(0);
        if available < amount {
            tracing::warn!(
                symbol = %self.info.symbol,
                from,
                available,
                requested = amount,
                "Transfer rejected: insufficient balance"
            );
            return Err(Error::InsufficientBalance {
                address: from.to_string(),
                available,
                requested: amount,
            });
        }

        ledger.balances.insert(from.to_string(), available - amount);
        ledger.credit(to, amount);

        tracing::debug!(symbol = %self.info.symbol, from, to, amount, "Transferred");
        Ok(())
    }

    /// Balance of `address`; unknown addresses hold zero
    pub fn balance_of(&self, address: &str) -> u64 {
        self.ledger.lock().balances.get(address).copied().unwrap_or(0)
    }

    /// Units in existence
    pub fn total_supply(&self) -> u64 {
        self.ledger.lock().total_supply
    }

    /// Sum of all balances
    pub fn circulating(&self) -> u64 {
        self.ledger.lock().balances.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::new("BlackHole", "BHT", 18, 1_000_000, "treasury")
    }

    #[test]
    fn test_initial_supply_held_by_treasury() {
        let token = token();
        assert_eq!(token.total_supply(), 1_000_000);
        assert_eq!(token.balance_of("treasury"), 1_000_000);
        assert_eq!(token.info().symbol, "BHT");
        assert_eq!(token.info().decimals, 18);
    }

    #[test]
    fn test_mint_and_transfer() {
        let token = token();

        token.mint("alice", 500).unwrap();
        assert_eq!(token.balance_of("alice"), 500);
        assert_eq!(token.total_supply(), 1_000_500);

        token.transfer("alice", "bob", 200).unwrap();
        assert_eq!(token.balance_of("alice"), 300);
        assert_eq!(token.balance_of("bob"), 200);
        assert_eq!(token.circulating(), token.total_supply());
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let token = token();
        token.mint("alice", 100).unwrap();

        let err = token.transfer("alice", "bob", 101).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientBalance {
                address: "alice".to_string(),
                available: 100,
                requested: 101,
            }
        );
        assert_eq!(token.balance_of("alice"), 100);
        assert_eq!(token.balance_of("bob"), 0);
    }

    #[test]
    fn test_transfer_from_unknown_account() {
        let token = token();
        assert!(token.transfer("nobody", "bob", 1).is_err());
        assert!(token.transfer("nobody", "bob", 0).is_ok());
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let token = token();
        token.transfer("treasury", "treasury", 10).unwrap();
        assert_eq!(token.balance_of("treasury"), 1_000_000);
    }

    #[test]
    fn test_mint_overflow_rejected() {
        let token = Token::new("Max", "MAX", 0, u64::MAX - 1, "treasury");

        let err = token.mint("alice", 2).unwrap_err();
        assert!(matches!(err, Error::SupplyOverflow { .. }));
        assert_eq!(token.total_supply(), u64::MAX - 1);
        assert_eq!(token.balance_of("alice"), 0);

        token.mint("alice", 1).unwrap();
        assert_eq!(token.total_supply(), u64::MAX);
    }
}
