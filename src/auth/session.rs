//! Session tokens issued by the identity provider.
//!
//! Tokens are HS256 JWTs. They arrive either as a bearer token or in the
//! `__session` cookie.

use axum::http::{header, HeaderMap};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Cookie the identity provider stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Identity-provider user id.
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
    /// Identity-provider session id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// A verified session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub session_id: Option<String>,
}

/// Verifies session tokens with the shared secret.
pub struct SessionKeys {
    secret: Option<String>,
    validation: Validation,
}

impl SessionKeys {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(str::to_string),
            validation: Validation::default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verify a token's signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Session, AppError> {
        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| AppError::Auth("Session verification is not configured".to_string()))?;

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &self.validation,
        )?;

        Ok(Session {
            user_id: data.claims.sub,
            session_id: data.claims.sid,
        })
    }

    /// Resolve the session of a request, if it carries a valid token.
    pub fn session_from_headers(&self, headers: &HeaderMap) -> Option<Session> {
        let token = bearer_token(headers).or_else(|| cookie_token(headers))?;
        match self.verify(&token) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!("Ignoring session token: {}", e);
                None
            }
        }
    }

    /// Sign a token the way the identity provider does.
    #[cfg(test)]
    pub fn issue(&self, user_id: &str, ttl_secs: i64) -> Result<String, AppError> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let secret = self
            .secret
            .as_ref()
            .ok_or_else(|| AppError::Internal("No session secret".to_string()))?;
        let now = chrono::Utc::now().timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp: now + ttl_secs,
            iat: now,
            sid: Some(format!("sess_{}", user_id)),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(e.to_string()))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}
