use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::session::Principal;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Allow-listed email the session was issued to.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub email: String,
}

/// Issue a session for an email that already passed the allow-list check.
pub fn create_session_token(email: &str, config: &Config) -> AppResult<SessionToken> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: email.to_string(),
        exp: (now + Duration::seconds(config.session_ttl_secs)).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4(),
    };

    let access_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create session token: {}", e)))?;

    Ok(SessionToken {
        access_token,
        token_type: "Bearer",
        expires_in: config.session_ttl_secs,
        email: email.to_string(),
    })
}

pub fn verify_session_token(token: &str, config: &Config) -> AppResult<SessionClaims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.session_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

impl SessionClaims {
    pub fn principal(&self) -> Principal {
        Principal {
            email: self.sub.clone(),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
