//! The bounded per-account settings map: at most [`MAX_SETTINGS`] opaque
//! JSON values, keyed by a small non-negative integer index.

use serde_json::Value;

use crate::db::models::SettingEntry;
use crate::db::store::AccountStore;
use crate::error::GateError;
use crate::service::locks::AccountLocks;

pub const MAX_SETTINGS: i64 = 5;

#[derive(Clone)]
pub struct SettingsManager {
    accounts: AccountStore,
    locks: AccountLocks,
}

impl SettingsManager {
    pub fn new(accounts: AccountStore, locks: AccountLocks) -> Self {
        Self { accounts, locks }
    }

    pub async fn get(&self, account_id: i64) -> Result<Vec<SettingEntry>, GateError> {
        self.accounts.settings_for(account_id).await
    }

    /// Overwrite if the index exists (count unchanged); otherwise insert,
    /// failing with `SettingsFull` at the cap. The exists/count/write
    /// sequence runs under the account's lock.
    pub async fn set(&self, account_id: i64, idx: i64, value: Value) -> Result<(), GateError> {
        if idx < 0 {
            return Err(GateError::Validation(
                "setting index must be non-negative".to_string(),
            ));
        }
        let _guard = self.locks.acquire(account_id).await;

        if !self.accounts.setting_exists(account_id, idx).await?
            && self.accounts.setting_count(account_id).await? >= MAX_SETTINGS
        {
            return Err(GateError::SettingsFull);
        }
        self.accounts.upsert_setting(account_id, idx, &value).await
    }

    /// Idempotent: deleting an absent index succeeds quietly.
    pub async fn delete(&self, account_id: i64, idx: i64) -> Result<(), GateError> {
        self.accounts.delete_setting(account_id, idx).await?;
        Ok(())
    }
}
