//! SQL DDL for initializing the account, session and settings storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `accounts.email` UNIQUE and `accounts.external_id` UNIQUE (sparse: NULL
///   rows do not collide)
/// - no stored connection counter: live `sessions` rows are the single
///   source of truth for an account's concurrency
/// - `settings` keyed by `(account_id, idx)`; the 5-entry cap is enforced by
///   the settings service, not by DDL
/// - timestamps stored as RFC3339 TEXT with fixed fractional width so
///   lexicographic ordering matches chronological ordering
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    full_name TEXT NOT NULL,
    avatar_url TEXT NULL,
    subscribed_until TEXT NULL,
    max_connections INTEGER NOT NULL DEFAULT 20,
    external_id TEXT NULL UNIQUE,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    token TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_account_id ON sessions(account_id);

CREATE TABLE IF NOT EXISTS settings (
    account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    idx INTEGER NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (account_id, idx)
);
"#;
