use crate::db::models::{Account, LoginSummary, NewAccount, Session, SettingEntry, fmt_ts};
use crate::error::GateError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite};

pub type SqlitePool = Pool<Sqlite>;

const ACCOUNT_COLS: &str = "id, email, password_hash, full_name, avatar_url, subscribed_until, \
     max_connections, external_id, created_at, updated_at";

/// Durable account records. Exclusively owns the `accounts` and `settings`
/// tables; all mutation goes through these methods.
#[derive(Clone)]
pub struct AccountStore {
    pool: SqlitePool,
}

impl AccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new: NewAccount) -> Result<Account, GateError> {
        let now = fmt_ts(Utc::now());
        let res = sqlx::query(
            r#"INSERT INTO accounts (
                email, password_hash, full_name, avatar_url, subscribed_until,
                max_connections, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(&new.avatar_url)
        .bind(new.subscribed_until.map(fmt_ts))
        .bind(new.max_connections.max(1))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                GateError::EmailTaken
            } else {
                e.into()
            }
        })?;

        match self.find_by_id(res.last_insert_rowid()).await? {
            Some(account) => Ok(account),
            None => Err(GateError::AccountVanished(res.last_insert_rowid())),
        }
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, GateError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_account).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, GateError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_account).transpose()
    }

    pub async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Account>, GateError> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLS} FROM accounts WHERE external_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_account).transpose()
    }

    pub async fn set_password_hash(&self, id: i64, hash: &str) -> Result<(), GateError> {
        let res = sqlx::query("UPDATE accounts SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(hash)
            .bind(fmt_ts(Utc::now()))
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(GateError::AccountVanished(id));
        }
        Ok(())
    }

    /// Administrative: update the subscription expiry for the account with
    /// this email. `false` if no such account exists.
    pub async fn set_subscription(
        &self,
        email: &str,
        until: Option<DateTime<Utc>>,
    ) -> Result<bool, GateError> {
        let res =
            sqlx::query("UPDATE accounts SET subscribed_until = ?, updated_at = ? WHERE email = ?")
                .bind(until.map(fmt_ts))
                .bind(fmt_ts(Utc::now()))
                .bind(email)
                .execute(&self.pool)
                .await?;
        Ok(res.rows_affected() > 0)
    }

    /// Adjust the concurrency cap. Clamped to at least 1: a login must
    /// always be able to leave the caller with one usable session.
    pub async fn set_max_connections(&self, id: i64, max: i64) -> Result<(), GateError> {
        let res =
            sqlx::query("UPDATE accounts SET max_connections = ?, updated_at = ? WHERE id = ?")
                .bind(max.max(1))
                .bind(fmt_ts(Utc::now()))
                .bind(id)
                .execute(&self.pool)
                .await?;
        if res.rows_affected() == 0 {
            return Err(GateError::AccountVanished(id));
        }
        Ok(())
    }

    /// Administrative: bind a sparse external identity to the account with
    /// this email. `false` if no such account exists.
    pub async fn set_external_id(&self, email: &str, external_id: &str) -> Result<bool, GateError> {
        let res =
            sqlx::query("UPDATE accounts SET external_id = ?, updated_at = ? WHERE email = ?")
                .bind(external_id)
                .bind(fmt_ts(Utc::now()))
                .bind(email)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    if matches!(&e, sqlx::Error::Database(db) if db.is_unique_violation()) {
                        GateError::ExternalIdTaken
                    } else {
                        e.into()
                    }
                })?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn list_logins(&self) -> Result<Vec<LoginSummary>, GateError> {
        let rows = sqlx::query("SELECT email, subscribed_until FROM accounts ORDER BY email")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(LoginSummary {
                    email: row.try_get("email").map_err(GateError::from)?,
                    subscribed_until: parse_opt_ts(row.try_get("subscribed_until")?)?,
                })
            })
            .collect()
    }

    // -- settings map -------------------------------------------------------

    pub async fn settings_for(&self, account_id: i64) -> Result<Vec<SettingEntry>, GateError> {
        let rows =
            sqlx::query("SELECT idx, value FROM settings WHERE account_id = ? ORDER BY idx")
                .bind(account_id)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|row| {
                let idx: i64 = row.try_get("idx")?;
                let raw: String = row.try_get("value")?;
                let value: Value = serde_json::from_str(&raw)
                    .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
                Ok(SettingEntry { idx, value })
            })
            .collect()
    }

    pub async fn setting_count(&self, account_id: i64) -> Result<i64, GateError> {
        let rec: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings WHERE account_id = ?")
            .bind(account_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(rec.0)
    }

    pub async fn setting_exists(&self, account_id: i64, idx: i64) -> Result<bool, GateError> {
        let rec: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM settings WHERE account_id = ? AND idx = ?")
                .bind(account_id)
                .bind(idx)
                .fetch_one(&self.pool)
                .await?;
        Ok(rec.0 > 0)
    }

    pub async fn upsert_setting(
        &self,
        account_id: i64,
        idx: i64,
        value: &Value,
    ) -> Result<(), GateError> {
        let raw = serde_json::to_string(value).map_err(|e| {
            GateError::Validation(format!("setting value is not serializable: {e}"))
        })?;
        sqlx::query(
            r#"INSERT INTO settings (account_id, idx, value, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(account_id, idx) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at"#,
        )
        .bind(account_id)
        .bind(idx)
        .bind(raw)
        .bind(fmt_ts(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove one entry. Idempotent: deleting an absent index is not an error.
    pub async fn delete_setting(&self, account_id: i64, idx: i64) -> Result<u64, GateError> {
        let res = sqlx::query("DELETE FROM settings WHERE account_id = ? AND idx = ?")
            .bind(account_id)
            .bind(idx)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    fn row_to_account(row: SqliteRow) -> Result<Account, GateError> {
        Ok(Account {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            full_name: row.try_get("full_name")?,
            avatar_url: row.try_get("avatar_url")?,
            subscribed_until: parse_opt_ts(row.try_get("subscribed_until")?)?,
            max_connections: row.try_get("max_connections")?,
            external_id: row.try_get("external_id")?,
            created_at: parse_ts(row.try_get("created_at")?)?,
            updated_at: parse_ts(row.try_get("updated_at")?)?,
        })
    }
}

/// Durable session records. Exclusively owns the `sessions` table. Reads
/// take a `cutoff` (now - TTL) and treat anything created before it as
/// absent, regardless of whether the reaper has purged the row yet.
#[derive(Clone)]
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        account_id: i64,
        token: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Session, GateError> {
        let res =
            sqlx::query("INSERT INTO sessions (account_id, token, created_at) VALUES (?, ?, ?)")
                .bind(account_id)
                .bind(token)
                .bind(fmt_ts(created_at))
                .execute(&self.pool)
                .await?;
        Ok(Session {
            id: res.last_insert_rowid(),
            account_id,
            token: token.to_string(),
            created_at,
        })
    }

    pub async fn find_live_by_token(
        &self,
        token: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Session>, GateError> {
        let row = sqlx::query(
            "SELECT id, account_id, token, created_at FROM sessions \
             WHERE token = ? AND created_at > ?",
        )
        .bind(token)
        .bind(fmt_ts(cutoff))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_session).transpose()
    }

    /// Live sessions for one account, oldest first, ties broken by lowest id
    /// so eviction is deterministic.
    pub async fn live_for_account(
        &self,
        account_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Session>, GateError> {
        let rows = sqlx::query(
            "SELECT id, account_id, token, created_at FROM sessions \
             WHERE account_id = ? AND created_at > ? ORDER BY created_at ASC, id ASC",
        )
        .bind(account_id)
        .bind(fmt_ts(cutoff))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_session).collect()
    }

    pub async fn count_live(
        &self,
        account_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<i64, GateError> {
        let rec: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sessions WHERE account_id = ? AND created_at > ?",
        )
        .bind(account_id)
        .bind(fmt_ts(cutoff))
        .fetch_one(&self.pool)
        .await?;
        Ok(rec.0)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), GateError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_by_token(&self, token: &str) -> Result<u64, GateError> {
        let res = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_for_account(&self, account_id: i64) -> Result<u64, GateError> {
        let res = sqlx::query("DELETE FROM sessions WHERE account_id = ?")
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_all(&self) -> Result<u64, GateError> {
        let res = sqlx::query("DELETE FROM sessions").execute(&self.pool).await?;
        Ok(res.rows_affected())
    }

    /// Drop rows past the TTL. Reads already ignore them; this just keeps
    /// the table from growing without bound.
    pub async fn purge_expired(&self, cutoff: DateTime<Utc>) -> Result<u64, GateError> {
        let res = sqlx::query("DELETE FROM sessions WHERE created_at <= ?")
            .bind(fmt_ts(cutoff))
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    fn row_to_session(row: SqliteRow) -> Result<Session, GateError> {
        Ok(Session {
            id: row.try_get("id")?,
            account_id: row.try_get("account_id")?,
            token: row.try_get("token")?,
            created_at: parse_ts(row.try_get("created_at")?)?,
        })
    }
}

fn parse_ts(raw: String) -> Result<DateTime<Utc>, GateError> {
    let parsed = DateTime::parse_from_rfc3339(&raw)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(parsed.with_timezone(&Utc))
}

fn parse_opt_ts(raw: Option<String>) -> Result<Option<DateTime<Utc>>, GateError> {
    raw.map(parse_ts).transpose()
}
