use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum GateError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("email is already registered")]
    EmailTaken,

    #[error("external id is already linked to another account")]
    ExternalIdTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("subscription has expired")]
    SubscriptionExpired,

    #[error("missing or unusable authorization credential")]
    Unauthenticated,

    #[error("token has expired")]
    TokenExpired,

    #[error("token signature is invalid")]
    TokenInvalid,

    #[error("token is malformed")]
    TokenMalformed,

    #[error("session not found")]
    SessionNotFound,

    #[error("settings map is full")]
    SettingsFull,

    #[error("account not found")]
    AccountNotFound,

    /// An authenticated flow referenced an account that no longer exists.
    /// This indicates a consistency bug, not a caller mistake.
    #[error("account {0} vanished mid-flight")]
    AccountVanished(i64),

    #[error("durable store is unavailable")]
    StoreUnavailable,

    #[error("database error: {0}")]
    Database(SqlxError),

    #[error("token encoding error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<SqlxError> for GateError {
    fn from(e: SqlxError) -> Self {
        // Connectivity failures are retryable by the caller; everything else
        // is an internal fault.
        match e {
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                GateError::StoreUnavailable
            }
            other => GateError::Database(other),
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            GateError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg.clone()),
            GateError::EmailTaken => (
                StatusCode::CONFLICT,
                "EMAIL_TAKEN",
                "This email is already registered.".to_string(),
            ),
            GateError::ExternalIdTaken => (
                StatusCode::CONFLICT,
                "EXTERNAL_ID_TAKEN",
                "This external id is already linked to another account.".to_string(),
            ),
            // Identical body for unknown email and wrong password, so callers
            // cannot enumerate accounts.
            GateError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "INVALID_CREDENTIALS",
                "Invalid email or password.".to_string(),
            ),
            GateError::SubscriptionExpired => (
                StatusCode::FORBIDDEN,
                "SUBSCRIPTION_EXPIRED",
                "Your subscription has expired.".to_string(),
            ),
            GateError::Unauthenticated => (
                StatusCode::FORBIDDEN,
                "UNAUTHENTICATED",
                "No usable authorization credential was provided.".to_string(),
            ),
            GateError::TokenExpired => (
                StatusCode::FORBIDDEN,
                "TOKEN_EXPIRED",
                "The token has expired. Please log in again.".to_string(),
            ),
            GateError::TokenInvalid => (
                StatusCode::FORBIDDEN,
                "TOKEN_INVALID",
                "The token is not valid.".to_string(),
            ),
            GateError::TokenMalformed => (
                StatusCode::FORBIDDEN,
                "TOKEN_MALFORMED",
                "The token is not valid.".to_string(),
            ),
            GateError::SessionNotFound => (
                StatusCode::FORBIDDEN,
                "SESSION_NOT_FOUND",
                "Session not found or expired. Please log in again.".to_string(),
            ),
            GateError::SettingsFull => (
                StatusCode::BAD_REQUEST,
                "SETTINGS_FULL",
                "No more settings can be added. The maximum is 5.".to_string(),
            ),
            GateError::AccountNotFound => (
                StatusCode::NOT_FOUND,
                "ACCOUNT_NOT_FOUND",
                "Account not found.".to_string(),
            ),
            GateError::StoreUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
                "The data store is temporarily unavailable. Please retry.".to_string(),
            ),
            GateError::AccountVanished(_)
            | GateError::Database(_)
            | GateError::Jwt(_)
            | GateError::Hash(_)
            | GateError::Join(_) => {
                error!(error = %self, "internal error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
