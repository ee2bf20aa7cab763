//! Wallet registry
//!
//! Creates wallets together with their owner set and threshold. Owners are
//! fixed for the lifetime of the wallet.

use crate::{
    config::WalletPolicy,
    metrics::Metrics,
    storage::Store,
    types::{Address, Owner, Wallet},
    Error, Result,
};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Creates and loads wallets
#[derive(Debug)]
pub struct WalletRegistry {
    store: Arc<dyn Store>,
    policy: WalletPolicy,
    metrics: Metrics,
}

impl WalletRegistry {
    /// Create registry over `store`
    pub fn new(store: Arc<dyn Store>, policy: WalletPolicy, metrics: Metrics) -> Self {
        Self {
            store,
            policy,
            metrics,
        }
    }

    /// Create a wallet owned by `owners` requiring `threshold` approvals
    ///
    /// Owners are returned in the order supplied. Fails with
    /// `InvalidThreshold` when `threshold` exceeds the owner count; nothing is
    /// persisted in that case.
    pub fn create_wallet<S: AsRef<str>>(
        &self,
        name: &str,
        owners: &[S],
        threshold: u32,
    ) -> Result<Wallet> {
        match self.try_create_wallet(name, owners, threshold) {
            Ok(wallet) => {
                self.metrics.record_wallet_created();
                tracing::info!(
                    wallet_id = %wallet.wallet_id,
                    name = %wallet.name,
                    owners = wallet.owners.len(),
                    threshold = wallet.threshold,
                    "Wallet created"
                );
                Ok(wallet)
            }
            Err(err) => {
                self.metrics.record_rejection(err.kind());
                tracing::warn!(
                    name,
                    threshold,
                    kind = err.kind(),
                    "Wallet creation rejected: {}",
                    err
                );
                Err(err)
            }
        }
    }

    /// Load a wallet with its owners
    pub fn get_wallet(&self, wallet_id: Uuid) -> Result<Wallet> {
        self.store.get_wallet(wallet_id)
    }

    fn try_create_wallet<S: AsRef<str>>(
        &self,
        name: &str,
        owners: &[S],
        threshold: u32,
    ) -> Result<Wallet> {
        self.validate(owners, threshold)?;

        let wallet_id = Uuid::now_v7();
        let now = Utc::now();

        let wallet = Wallet {
            wallet_id,
            name: name.to_string(),
            owners: owners
                .iter()
                .map(|address| Owner {
                    owner_id: Uuid::now_v7(),
                    wallet_id,
                    address: Address::new(address.as_ref()),
                    created_at: now,
                })
                .collect(),
            threshold,
            created_at: now,
            updated_at: now,
        };

        self.store.insert_wallet(&wallet)?;

        // Read back through the store so callers see what was persisted
        self.store.get_wallet(wallet_id)
    }

    fn validate<S: AsRef<str>>(&self, owners: &[S], threshold: u32) -> Result<()> {
        if threshold as usize > owners.len() {
            return Err(Error::InvalidThreshold {
                threshold,
                owners: owners.len(),
            });
        }

        if self.policy.strict_validation {
            if threshold == 0 || owners.is_empty() {
                return Err(Error::InvalidThreshold {
                    threshold,
                    owners: owners.len(),
                });
            }

            let mut seen = HashSet::with_capacity(owners.len());
            for address in owners {
                if !seen.insert(address.as_ref()) {
                    return Err(Error::DuplicateOwner(address.as_ref().to_string()));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn registry(strict: bool) -> (WalletRegistry, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let registry = WalletRegistry::new(
            Arc::clone(&store),
            WalletPolicy {
                strict_validation: strict,
            },
            Metrics::new().unwrap(),
        );
        (registry, store)
    }

    #[test]
    fn test_create_wallet() {
        let (registry, _) = registry(false);
        let wallet = registry
            .create_wallet("Test Wallet", &["0xOwner1", "0xOwner2", "0xOwner3"], 2)
            .unwrap();

        assert_eq!(wallet.name, "Test Wallet");
        assert_eq!(wallet.threshold, 2);
        assert_eq!(wallet.owners.len(), 3);
        assert_eq!(wallet.owners[0].address.as_str(), "0xOwner1");
        assert!(wallet.owners.iter().all(|o| o.wallet_id == wallet.wallet_id));

        let ids: HashSet<Uuid> = wallet.owners.iter().map(|o| o.owner_id).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_threshold_above_owner_count_persists_nothing() {
        let (registry, store) = registry(false);
        let result = registry.create_wallet("Test Wallet Invalid", &["0xOwner1", "0xOwner2"], 3);

        assert!(matches!(
            result,
            Err(Error::InvalidThreshold {
                threshold: 3,
                owners: 2
            })
        ));
        assert_eq!(store.stats().unwrap().total_wallets, 0);
    }

    #[test]
    fn test_lenient_policy_accepts_degenerate_wallets() {
        let (registry, _) = registry(false);
        let empty: [&str; 0] = [];

        assert!(registry.create_wallet("Empty", &empty, 0).is_ok());
        assert!(registry.create_wallet("Zero", &["0xA"], 0).is_ok());

        let wallet = registry.create_wallet("Dup", &["0xA", "0xA"], 2).unwrap();
        assert_eq!(wallet.owners.len(), 2);
    }

    #[test]
    fn test_strict_policy_rejects_degenerate_wallets() {
        let (registry, store) = registry(true);
        let empty: [&str; 0] = [];

        assert!(matches!(
            registry.create_wallet("Empty", &empty, 0),
            Err(Error::InvalidThreshold { .. })
        ));
        assert!(matches!(
            registry.create_wallet("Zero", &["0xA"], 0),
            Err(Error::InvalidThreshold { .. })
        ));
        assert!(matches!(
            registry.create_wallet("Dup", &["0xA", "0xB", "0xA"], 2),
            Err(Error::DuplicateOwner(address)) if address == "0xA"
        ));
        assert_eq!(store.stats().unwrap().total_wallets, 0);
    }

    #[test]
    fn test_rejections_are_counted() {
        let (registry, _) = registry(false);
        let _ = registry.create_wallet("Bad", &["0xA"], 2);
        assert_eq!(
            registry
                .metrics
                .rejections
                .with_label_values(&["invalid_threshold"])
                .get(),
            1
        );
    }
}
