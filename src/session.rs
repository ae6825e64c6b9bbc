use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-user conversation state. Exactly one multi-step dialog can be in
/// progress; any terminal action returns the user to `Idle`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Session {
    #[default]
    Idle,
    /// Awaiting a voucher code to validate and echo back.
    AwaitingVoucher,
    /// Awaiting the delivery target for an already-picked product.
    AwaitingTarget { product_code: String },
}

/// Single-writer-per-user serialization point.
///
/// A whole chat turn runs under the owning user's lock, so rapid duplicate
/// inputs (double-tapped buttons, re-sent text) are processed one at a time
/// and each turn observes the session state left by the previous one.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(user_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn turns_for_one_user_serialize() {
        let locks = Arc::new(UserLocks::new());
        let counter = Arc::new(Mutex::new(0i64));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let locks = locks.clone();
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(7).await;
                let mut n = counter.lock().await;
                *n += 1;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*counter.lock().await, 16);
    }

    #[tokio::test]
    async fn distinct_users_do_not_block_each_other() {
        let locks = UserLocks::new();
        let _a = locks.acquire(1).await;
        // Would deadlock if user 2 shared user 1's lock.
        let _b = locks.acquire(2).await;
    }
}
