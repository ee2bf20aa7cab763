//! Property-based tests for token ledger invariants
//!
//! - Conservation: sum of balances equals total supply after any operations
//! - No overdraft: concurrent transfers never take an account below zero

use proptest::prelude::*;
use std::sync::Arc;
use std::thread;
use token_ledger::{Error, Token};

const ACCOUNTS: [&str; 4] = ["alice", "bob", "carol", "dave"];

#[derive(Debug, Clone)]
enum Op {
    Mint { to: usize, amount: u64 },
    Transfer { from: usize, to: usize, amount: u64 },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ACCOUNTS.len(), 0u64..10_000).prop_map(|(to, amount)| Op::Mint { to, amount }),
        (0..ACCOUNTS.len(), 0..ACCOUNTS.len(), 0u64..10_000)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
    ]
}

proptest! {
    /// Property: balances always sum to total supply
    #[test]
    fn prop_supply_conserved(
        initial in 0u64..100_000,
        ops in prop::collection::vec(op_strategy(), 0..50),
    ) {
        let token = Token::new("Test", "TST", 6, initial, ACCOUNTS[0]);
        let mut minted = 0u64;

        for op in ops {
            match op {
                Op::Mint { to, amount } => {
                    token.mint(ACCOUNTS[to], amount).unwrap();
                    minted += amount;
                }
                Op::Transfer { from, to, amount } => {
                    let before = token.balance_of(ACCOUNTS[from]);
                    match token.transfer(ACCOUNTS[from], ACCOUNTS[to], amount) {
                        Ok(()) => prop_assert!(before >= amount),
                        Err(Error::InsufficientBalance { available, .. }) => {
                            prop_assert!(before < amount);
                            prop_assert_eq!(available, before);
                            prop_assert_eq!(token.balance_of(ACCOUNTS[from]), before);
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {}", other),
                    }
                }
            }

            prop_assert_eq!(token.circulating(), token.total_supply());
        }

        prop_assert_eq!(token.total_supply(), initial + minted);
    }
}

#[test]
fn test_concurrent_transfers_never_overdraw() {
    let token = Arc::new(Token::new("Test", "TST", 6, 1_000, "alice"));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let token = Arc::clone(&token);
            thread::spawn(move || {
                let (from, to) = if i % 2 == 0 {
                    ("alice", "bob")
                } else {
                    ("bob", "alice")
                };
                for _ in 0..50 {
                    let _ = token.transfer(from, to, 7);
                    assert!(token.balance_of(from) <= 1_000);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(token.total_supply(), 1_000);
    assert_eq!(token.balance_of("alice") + token.balance_of("bob"), 1_000);
}

#[test]
fn test_concurrent_drain_stops_at_zero() {
    let token = Arc::new(Token::new("Test", "TST", 6, 100, "alice"));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let token = Arc::clone(&token);
            thread::spawn(move || {
                let to = format!("sink{i}");
                (0..10)
                    .filter(|_| token.transfer("alice", &to, 3).is_ok())
                    .count() as u64
            })
        })
        .collect();

    let accepted: u64 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    // 33 transfers of 3 fit into 100
    assert_eq!(accepted, 33);
    assert_eq!(token.balance_of("alice"), 1);
    assert_eq!(token.circulating(), 100);
}
