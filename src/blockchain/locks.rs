//! Per-account send serialization.
//!
//! Two sends from the same account must not both read the same frontier.
//! The pipeline holds the account's guard from `account_info` until `process`
//! returns, so at most one chain extension per account is in flight.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::blockchain::address::NanoAddress;

#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<DashMap<NanoAddress, Arc<Mutex<()>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `account`.
    pub async fn acquire(&self, account: &NanoAddress) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the map shard is not held across the await.
        let lock = self
            .inner
            .entry(*account)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }

    /// Number of accounts that have ever been locked.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for AccountLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountLocks").field("accounts", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::address::PublicKey;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_account_is_exclusive() {
        let locks = AccountLocks::new();
        let account = NanoAddress::from_public_key(PublicKey([1; 32]));

        let guard = locks.acquire(&account).await;
        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(&account)).await;
        assert!(second.is_err(), "second acquire should wait");

        drop(guard);
        let second = tokio::time::timeout(Duration::from_millis(500), locks.acquire(&account)).await;
        assert!(second.is_ok());
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_different_accounts_do_not_block() {
        let locks = AccountLocks::new();
        let a = NanoAddress::from_public_key(PublicKey([1; 32]));
        let b = NanoAddress::from_public_key(PublicKey([2; 32]));

        let _guard = locks.acquire(&a).await;
        let other = tokio::time::timeout(Duration::from_millis(500), locks.acquire(&b)).await;
        assert!(other.is_ok());
        assert_eq!(locks.len(), 2);
    }
}
