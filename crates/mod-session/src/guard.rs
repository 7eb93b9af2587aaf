use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Held for the duration of one command; dropping it releases the user.
pub type UserGuard = OwnedMutexGuard<()>;

/// Per-user mutual exclusion.
///
/// Commands for the same user run one at a time in acquire order; different
/// users never contend beyond the brief table lookup. Entries are created on
/// first use and never pruned, so the table grows with the number of distinct
/// users seen by the process.
#[derive(Default)]
pub struct UserLocks {
    table: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: &str) -> UserGuard {
        let lock = {
            let mut table = self.table.lock().await;
            table.entry(user_id.to_string()).or_default().clone()
        };
        trace!(user = user_id, "waiting for user lock");
        lock.lock_owned().await
    }

    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_user_serializes() {
        let locks = Arc::new(UserLocks::new());
        let first = locks.acquire("alice").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("alice").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(first);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_users_do_not_block() {
        let locks = UserLocks::new();
        let _alice = locks.acquire("alice").await;
        let bob = tokio::time::timeout(Duration::from_millis(100), locks.acquire("bob")).await;
        assert!(bob.is_ok());
    }

    #[tokio::test]
    async fn concurrent_first_use_shares_one_lock() {
        let locks = Arc::new(UserLocks::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                tokio::spawn(async move {
                    drop(locks.acquire("carol").await);
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(locks.len().await, 1);
    }

    #[tokio::test]
    async fn table_is_never_pruned() {
        let locks = UserLocks::new();
        assert!(locks.is_empty().await);
        drop(locks.acquire("a").await);
        drop(locks.acquire("b").await);
        assert_eq!(locks.len().await, 2);
    }
}
