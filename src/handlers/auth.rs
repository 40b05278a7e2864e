use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::Profile;
use crate::error::GateError;
use crate::middleware::AuthSession;
use crate::router::AppState;
use crate::service::Registration;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub subscribed_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub profile: Profile,
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, GateError> {
    let (profile, token) = state
        .accounts_svc
        .register(Registration {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            avatar_url: req.avatar_url,
            subscribed_until: req.subscribed_until,
        })
        .await?;
    Ok(Json(RegisterResponse { profile, token }))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, GateError> {
    let token = state.accounts_svc.login(&req.email, &req.password).await?;
    Ok(Json(LoginResponse { token }))
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub message: String,
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<LogoutResponse>, GateError> {
    state.accounts_svc.logout(&auth.token).await?;
    Ok(Json(LogoutResponse {
        success: true,
        message: "You have been logged out.".to_string(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<Profile>, GateError> {
    let profile = state.accounts_svc.me(auth.account_id).await?;
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub success: bool,
}

pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthSession,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ChangePasswordResponse>, GateError> {
    state
        .accounts_svc
        .change_password(auth.account_id, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(ChangePasswordResponse { success: true }))
}
