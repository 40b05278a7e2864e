//! Per-account critical sections. Admission and settings writes are
//! read-modify-write sequences; serializing them per account keeps the
//! concurrency cap and the settings bound exact while letting unrelated
//! accounts proceed fully in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct AccountLocks {
    inner: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for one account. The registry mutex is held only for
    /// the map lookup, never across the guarded section.
    pub async fn acquire(&self, account_id: i64) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inner.lock().await;
            // A strong count of 1 means only the map holds the slot: no
            // guard is live and no other acquire is in flight (cloning
            // requires the registry mutex we hold). Reclaim those.
            map.retain(|_, slot| Arc::strong_count(slot) > 1);
            map.entry(account_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }
}
