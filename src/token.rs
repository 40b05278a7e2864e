//! Signed bearer tokens: HS256 claims carrying the account id and an
//! expiry. Issuing and verifying are pure with respect to the stores; the
//! auth guard separately checks that a live session still backs the token.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::GateError;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: i64,
    iat: i64,
    exp: i64,
    /// Uniquifier so two logins in the same second never collide on the
    /// session store's unique token column.
    jti: String,
}

#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

static JTI_SEQ: AtomicU64 = AtomicU64::new(0);

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Sign a fresh token for `account_id`, expiring after the configured TTL.
    pub fn issue(&self, account_id: i64) -> Result<String, GateError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: format!(
                "{:x}-{:x}",
                now.timestamp_micros(),
                JTI_SEQ.fetch_add(1, Ordering::Relaxed)
            ),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(GateError::Jwt)
    }

    /// Check signature and expiry, returning the embedded account id.
    pub fn verify(&self, token: &str) -> Result<i64, GateError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims.sub),
            Err(e) => Err(match e.kind() {
                ErrorKind::ExpiredSignature => GateError::TokenExpired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => GateError::TokenMalformed,
                _ => GateError::TokenInvalid,
            }),
        }
    }
}
