//! Request guards.
//!
//! [`AuthSession`] validates an `Authorization: Bearer` token on every
//! guarded call: signature and expiry first, then the live-session lookup.
//! The lookup is never cached, because logout or eviction can invalidate a
//! still-unexpired token at any moment.

use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use chrono::Utc;
use subtle::ConstantTimeEq;

use crate::error::GateError;
use crate::router::AppState;

/// A validated bearer credential: the token and the account it resolves to.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub account_id: i64,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| GateError::Unauthenticated)?;
        let token = bearer.token().to_string();

        let account_id = state.tokens.verify(&token)?;

        let cutoff = Utc::now() - state.session_ttl;
        match state.sessions.find_live_by_token(&token, cutoff).await? {
            Some(session) if session.account_id == account_id => Ok(Self { account_id, token }),
            _ => Err(GateError::SessionNotFound),
        }
    }
}

/// Guard for the administrative surface: the `x-admin-key` header must match
/// the configured key. Compared in constant time.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdminKey;

impl FromRequestParts<AppState> for RequireAdminKey {
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(GateError::Unauthenticated)?;
        if !bool::from(presented.as_bytes().ct_eq(state.admin_key.as_bytes())) {
            return Err(GateError::Unauthenticated);
        }
        Ok(Self)
    }
}
