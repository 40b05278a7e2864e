use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::models::SettingEntry;
use crate::error::GateError;
use crate::middleware::AuthSession;
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveSettingRequest {
    pub index: i64,
    pub value: Value,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSettingRequest {
    pub index: i64,
}

/// Settings are returned as an object keyed by the stringified index, the
/// shape clients already store them in.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub account_id: i64,
    pub settings: Map<String, Value>,
}

fn settings_object(entries: Vec<SettingEntry>) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|e| (e.idx.to_string(), e.value))
        .collect()
}

pub async fn save_setting(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(req): Json<SaveSettingRequest>,
) -> Result<Json<SettingsResponse>, GateError> {
    state.settings.set(auth.account_id, req.index, req.value).await?;
    let entries = state.settings.get(auth.account_id).await?;
    Ok(Json(SettingsResponse {
        account_id: auth.account_id,
        settings: settings_object(entries),
    }))
}

pub async fn get_settings(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<SettingsResponse>, GateError> {
    let entries = state.settings.get(auth.account_id).await?;
    Ok(Json(SettingsResponse {
        account_id: auth.account_id,
        settings: settings_object(entries),
    }))
}

pub async fn delete_setting(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(req): Json<DeleteSettingRequest>,
) -> Result<Json<SettingsResponse>, GateError> {
    state.settings.delete(auth.account_id, req.index).await?;
    let entries = state.settings.get(auth.account_id).await?;
    Ok(Json(SettingsResponse {
        account_id: auth.account_id,
        settings: settings_object(entries),
    }))
}
