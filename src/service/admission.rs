//! Session admission: the at-most-N-concurrent-sessions policy, enforced
//! against live session rows rather than a stored counter.

use chrono::{Duration, Utc};
use tracing::debug;

use crate::db::models::Account;
use crate::db::store::SessionStore;
use crate::error::GateError;
use crate::service::locks::AccountLocks;
use crate::token::TokenService;

#[derive(Clone)]
pub struct SessionAdmission {
    sessions: SessionStore,
    tokens: TokenService,
    locks: AccountLocks,
    ttl: Duration,
}

impl SessionAdmission {
    pub fn new(
        sessions: SessionStore,
        tokens: TokenService,
        locks: AccountLocks,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            tokens,
            locks,
            ttl,
        }
    }

    /// Admit one new session for the account, evicting the oldest live
    /// sessions (ties broken by lowest id) while the account is at or over
    /// its cap. Returns the fresh token.
    ///
    /// The whole count-evict-insert sequence runs under the account's lock,
    /// so concurrent logins for the same account cannot over-admit.
    pub async fn admit(&self, account: &Account) -> Result<String, GateError> {
        let _guard = self.locks.acquire(account.id).await;

        let now = Utc::now();
        let live = self.sessions.live_for_account(account.id, now - self.ttl).await?;

        // A cap of 0 behaves as 1: a successful login always leaves the
        // caller with a usable session.
        let cap = account.max_connections.max(1) as usize;
        if live.len() + 1 > cap {
            let excess = live.len() + 1 - cap;
            for stale in live.iter().take(excess) {
                debug!(
                    account_id = account.id,
                    session_id = stale.id,
                    "evicting oldest session to stay under the connection cap"
                );
                self.sessions.delete_by_id(stale.id).await?;
            }
        }

        let token = self.tokens.issue(account.id)?;
        self.sessions.insert(account.id, &token, now).await?;
        Ok(token)
    }
}
