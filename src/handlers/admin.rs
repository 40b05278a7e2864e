//! Administrative surface. Every handler takes [`RequireAdminKey`]; none of
//! these operations are reachable with a bearer token alone.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::models::{LoginSummary, Profile};
use crate::error::GateError;
use crate::middleware::RequireAdminKey;
use crate::router::AppState;

#[derive(Debug, Serialize)]
pub struct PurgeResponse {
    pub deleted: u64,
}

/// Drop every session globally. All outstanding tokens stop passing the
/// guard immediately.
pub async fn purge_sessions(
    State(state): State<AppState>,
    RequireAdminKey: RequireAdminKey,
) -> Result<Json<PurgeResponse>, GateError> {
    let deleted = state.sessions.delete_all().await?;
    info!(deleted, "purged all sessions");
    Ok(Json(PurgeResponse { deleted }))
}

#[derive(Debug, Deserialize)]
pub struct AccountByEmail {
    pub email: String,
}

pub async fn purge_account_sessions(
    State(state): State<AppState>,
    RequireAdminKey: RequireAdminKey,
    Json(req): Json<AccountByEmail>,
) -> Result<Json<PurgeResponse>, GateError> {
    let account = state
        .account_store
        .find_by_email(&req.email)
        .await?
        .ok_or(GateError::AccountNotFound)?;
    let deleted = state.sessions.delete_for_account(account.id).await?;
    info!(account_id = account.id, deleted, "purged account sessions");
    Ok(Json(PurgeResponse { deleted }))
}

#[derive(Debug, Serialize)]
pub struct LoginsResponse {
    pub logins: Vec<LoginSummary>,
}

pub async fn list_logins(
    State(state): State<AppState>,
    RequireAdminKey: RequireAdminKey,
) -> Result<Json<LoginsResponse>, GateError> {
    let logins = state.account_store.list_logins().await?;
    Ok(Json(LoginsResponse { logins }))
}

#[derive(Debug, Deserialize)]
pub struct SetSubscriptionRequest {
    pub email: String,
    /// `null` clears the gate: the account is no longer subscription-limited.
    pub subscribed_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

pub async fn set_subscription(
    State(state): State<AppState>,
    RequireAdminKey: RequireAdminKey,
    Json(req): Json<SetSubscriptionRequest>,
) -> Result<Json<OkResponse>, GateError> {
    if !state
        .account_store
        .set_subscription(&req.email, req.subscribed_until)
        .await?
    {
        return Err(GateError::AccountNotFound);
    }
    Ok(Json(OkResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct SetMaxConnectionsRequest {
    pub email: String,
    pub max_connections: i64,
}

pub async fn set_max_connections(
    State(state): State<AppState>,
    RequireAdminKey: RequireAdminKey,
    Json(req): Json<SetMaxConnectionsRequest>,
) -> Result<Json<OkResponse>, GateError> {
    if req.max_connections < 1 {
        return Err(GateError::Validation(
            "max_connections must be at least 1".into(),
        ));
    }
    let account = state
        .account_store
        .find_by_email(&req.email)
        .await?
        .ok_or(GateError::AccountNotFound)?;
    state
        .account_store
        .set_max_connections(account.id, req.max_connections)
        .await?;
    Ok(Json(OkResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct LinkExternalIdRequest {
    pub email: String,
    pub external_id: String,
}

pub async fn link_external_id(
    State(state): State<AppState>,
    RequireAdminKey: RequireAdminKey,
    Json(req): Json<LinkExternalIdRequest>,
) -> Result<Json<OkResponse>, GateError> {
    if req.external_id.trim().is_empty() {
        return Err(GateError::Validation("external_id must not be empty".into()));
    }
    if !state
        .account_store
        .set_external_id(&req.email, req.external_id.trim())
        .await?
    {
        return Err(GateError::AccountNotFound);
    }
    Ok(Json(OkResponse { success: true }))
}

#[derive(Debug, Deserialize)]
pub struct ExternalIdLookupRequest {
    pub external_id: String,
}

pub async fn lookup_external_id(
    State(state): State<AppState>,
    RequireAdminKey: RequireAdminKey,
    Json(req): Json<ExternalIdLookupRequest>,
) -> Result<Json<Profile>, GateError> {
    let account = state
        .account_store
        .find_by_external_id(&req.external_id)
        .await?
        .ok_or(GateError::AccountNotFound)?;
    Ok(Json(account.into()))
}
