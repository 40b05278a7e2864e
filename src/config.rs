//! Process configuration, loaded once at startup from the environment.
//!
//! Secrets (`jwt_secret`, `admin_key`) have no defaults on purpose: the
//! process refuses to start without them. The loaded `Config` is handed to
//! each component at construction time and never mutated afterwards.

use figment::{Figment, providers::Env};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// SQLite connection string, e.g. `sqlite:gatehouse.db`.
    pub database_url: String,
    /// Symmetric secret for signing bearer tokens.
    pub jwt_secret: String,
    /// Shared key for the administrative endpoints.
    pub admin_key: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    /// Sessions (and the tokens bound to them) live this many days.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_session_ttl_days() -> i64 {
    30
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Config {
    /// Extract configuration from `GATEHOUSE_`-prefixed environment variables.
    pub fn from_env() -> Result<Self, figment::Error> {
        Figment::new().merge(Env::prefixed("GATEHOUSE_")).extract()
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }

    /// Cadence for the session reaper: a fraction of the TTL, clamped so
    /// short TTLs still get swept and long ones don't go a day unswept.
    pub fn reaper_interval(&self) -> std::time::Duration {
        let ttl_secs = self.session_ttl_days.max(1) as u64 * 86_400;
        std::time::Duration::from_secs((ttl_secs / 24).clamp(60, 21_600))
    }
}

impl Default for Config {
    /// Test-friendly baseline; callers fill in the secrets they need.
    fn default() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: String::new(),
            admin_key: String::new(),
            bind_addr: default_bind_addr(),
            loglevel: default_loglevel(),
            session_ttl_days: default_session_ttl_days(),
            // Minimum cost keeps the hashing step fast in tests.
            bcrypt_cost: 4,
        }
    }
}
