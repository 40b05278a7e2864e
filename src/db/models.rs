use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Render a timestamp for storage. Fixed microsecond width keeps TEXT
/// comparisons in SQL consistent with chronological order.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    /// `None` means the account is not subscription-gated.
    pub subscribed_until: Option<DateTime<Utc>>,
    pub max_connections: i64,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn subscription_lapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.subscribed_until, Some(until) if until < now)
    }
}

/// Everything needed to create an account row. The hash is produced by the
/// accounts service; the store never sees a plaintext password.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subscribed_until: Option<DateTime<Utc>>,
    pub max_connections: i64,
}

/// Caller-facing view of an account. Deliberately has no hash field, so a
/// credential can never leak through response serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub subscribed_until: Option<DateTime<Utc>>,
    pub max_connections: i64,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for Profile {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            full_name: a.full_name,
            avatar_url: a.avatar_url,
            subscribed_until: a.subscribed_until,
            max_connections: a.max_connections,
            external_id: a.external_id,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: i64,
    pub account_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of an account's bounded settings map. The value is an opaque
/// JSON blob; the service never interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingEntry {
    pub idx: i64,
    pub value: Value,
}

/// Email plus subscription expiry, for the administrative listing.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSummary {
    pub email: String,
    pub subscribed_until: Option<DateTime<Utc>>,
}
