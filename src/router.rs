use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::Config;
use crate::db::SqlitePool;
use crate::db::store::{AccountStore, SessionStore};
use crate::handlers::{admin, auth, settings};
use crate::service::{AccountLocks, AccountsService, SessionAdmission, SettingsManager};
use crate::token::TokenService;

/// Everything the handlers need, built once at startup from the injected
/// [`Config`]. Cloning is cheap: stores share the pool, the rest is `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub account_store: AccountStore,
    pub sessions: SessionStore,
    pub tokens: TokenService,
    pub accounts_svc: AccountsService,
    pub settings: SettingsManager,
    pub admin_key: Arc<str>,
    pub session_ttl: chrono::Duration,
}

impl AppState {
    pub fn new(pool: SqlitePool, cfg: &Config) -> Self {
        let ttl = cfg.session_ttl();
        let account_store = AccountStore::new(pool.clone());
        let sessions = SessionStore::new(pool);
        let tokens = TokenService::new(&cfg.jwt_secret, ttl);
        let locks = AccountLocks::new();
        let admission =
            SessionAdmission::new(sessions.clone(), tokens.clone(), locks.clone(), ttl);
        let accounts_svc = AccountsService::new(
            account_store.clone(),
            sessions.clone(),
            admission,
            cfg.bcrypt_cost,
        );
        let settings = SettingsManager::new(account_store.clone(), locks);
        Self {
            account_store,
            sessions,
            tokens,
            accounts_svc,
            settings,
            admin_key: Arc::from(cfg.admin_key.as_str()),
            session_ttl: ttl,
        }
    }
}

pub fn gatehouse_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/save-settings", post(settings::save_setting))
        .route("/get-settings", post(settings::get_settings))
        .route("/delete-settings", post(settings::delete_setting))
        .route("/admin/sessions/purge", post(admin::purge_sessions))
        .route(
            "/admin/sessions/purge-account",
            post(admin::purge_account_sessions),
        )
        .route("/admin/logins", get(admin::list_logins))
        .route("/admin/subscription", post(admin::set_subscription))
        .route("/admin/max-connections", post(admin::set_max_connections))
        .route("/admin/external-id", post(admin::link_external_id))
        .route("/admin/external-id/lookup", post(admin::lookup_external_id))
        .with_state(state)
}
