//! Database module: models, schema and store types for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `store.rs`: the account and session stores over a shared pool

pub mod models;
pub mod schema;
pub mod store;

pub use models::{Account, LoginSummary, NewAccount, Profile, Session, SettingEntry};
pub use schema::SQLITE_INIT;
pub use store::{AccountStore, SessionStore, SqlitePool};

use crate::error::GateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

/// Open the pool and run the bundled DDL. Timeouts are bounded so a wedged
/// store surfaces as `StoreUnavailable` instead of hanging requests.
pub async fn connect(database_url: &str) -> Result<SqlitePool, GateError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(connect_opts)
        .await?;
    init_schema(&pool).await?;
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
async fn init_schema(pool: &SqlitePool) -> Result<(), GateError> {
    // execute multiple statements safely (SQLite supports multi-commands but sqlx::query doesn't)
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
