//! Account orchestration: registration, login, logout, profile access and
//! password changes. Field checks live here; credential hashing is bcrypt,
//! run on the blocking pool so request tasks are never stalled on it.

use chrono::{DateTime, Utc};
use tokio::task;
use tracing::info;

use crate::db::models::{NewAccount, Profile};
use crate::db::store::{AccountStore, SessionStore};
use crate::error::GateError;
use crate::service::admission::SessionAdmission;

pub const DEFAULT_MAX_CONNECTIONS: i64 = 20;

#[derive(Debug, Clone)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subscribed_until: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct AccountsService {
    accounts: AccountStore,
    sessions: SessionStore,
    admission: SessionAdmission,
    bcrypt_cost: u32,
}

impl AccountsService {
    pub fn new(
        accounts: AccountStore,
        sessions: SessionStore,
        admission: SessionAdmission,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            accounts,
            sessions,
            admission,
            bcrypt_cost,
        }
    }

    /// Create the account and admit its first session, so the returned token
    /// passes the auth guard immediately.
    pub async fn register(&self, reg: Registration) -> Result<(Profile, String), GateError> {
        validate_email(&reg.email)?;
        validate_password(&reg.password)?;
        if reg.full_name.trim().is_empty() {
            return Err(GateError::Validation("full name must not be empty".into()));
        }

        let hash = self.hash_password(reg.password).await?;
        let account = self
            .accounts
            .create(NewAccount {
                email: reg.email.trim().to_string(),
                password_hash: hash,
                full_name: reg.full_name.trim().to_string(),
                avatar_url: reg.avatar_url,
                subscribed_until: reg.subscribed_until,
                max_connections: DEFAULT_MAX_CONNECTIONS,
            })
            .await?;
        info!(account_id = account.id, "account registered");

        let token = self.admission.admit(&account).await?;
        Ok((account.into(), token))
    }

    /// Unknown email and wrong password produce the same error, so the login
    /// endpoint cannot be used to enumerate accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, GateError> {
        let Some(account) = self.accounts.find_by_email(email.trim()).await? else {
            return Err(GateError::InvalidCredentials);
        };
        if !self
            .verify_password(password.to_string(), account.password_hash.clone())
            .await?
        {
            return Err(GateError::InvalidCredentials);
        }
        if account.subscription_lapsed(Utc::now()) {
            return Err(GateError::SubscriptionExpired);
        }
        let token = self.admission.admit(&account).await?;
        info!(account_id = account.id, "login admitted");
        Ok(token)
    }

    /// Delete the session bound to this token. A miss is reportable, not
    /// fatal: the session may already have been evicted or reaped.
    pub async fn logout(&self, token: &str) -> Result<(), GateError> {
        if self.sessions.delete_by_token(token).await? == 0 {
            return Err(GateError::SessionNotFound);
        }
        Ok(())
    }

    /// Profile for an authenticated account. Re-checks subscription expiry:
    /// a session can outlive the subscription it was admitted under.
    pub async fn me(&self, account_id: i64) -> Result<Profile, GateError> {
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(GateError::AccountVanished(account_id))?;
        if account.subscription_lapsed(Utc::now()) {
            return Err(GateError::SubscriptionExpired);
        }
        Ok(account.into())
    }

    pub async fn change_password(
        &self,
        account_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), GateError> {
        validate_password(new_password)?;
        let account = self
            .accounts
            .find_by_id(account_id)
            .await?
            .ok_or(GateError::AccountVanished(account_id))?;
        if !self
            .verify_password(old_password.to_string(), account.password_hash)
            .await?
        {
            return Err(GateError::InvalidCredentials);
        }
        let hash = self.hash_password(new_password.to_string()).await?;
        self.accounts.set_password_hash(account_id, &hash).await?;
        info!(account_id, "password changed");
        Ok(())
    }

    async fn hash_password(&self, password: String) -> Result<String, GateError> {
        let cost = self.bcrypt_cost;
        Ok(task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, GateError> {
        Ok(task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
    }
}

fn validate_email(email: &str) -> Result<(), GateError> {
    let email = email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(GateError::Validation("email is malformed".into()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), GateError> {
    if password.len() < 5 {
        return Err(GateError::Validation(
            "password must be at least 5 characters".into(),
        ));
    }
    Ok(())
}
