//! Session tokens for registered users
//!
//! Login hands back a signed HS256 access token instead of the browser-side
//! "current user" marker. The dashboard presents it as
//! `Authorization: Bearer <token>`.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::store::UserRecord;
use crate::config::RegistrationConfig;

/// Minimum accepted secret length
pub const MIN_SECRET_LEN: usize = 32;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// Subject (email)
    pub sub: String,
    /// Group the user was assigned to
    pub group_id: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &UserRecord, ttl_seconds: i64) -> Result<Self, SessionError> {
        let now = chrono::Utc::now().timestamp();
        let exp = now
            .checked_add(ttl_seconds)
            .ok_or_else(|| SessionError::Token(format!("lifetime of {}s overflows", ttl_seconds)))?;
        Ok(Self {
            sub: user.email.clone(),
            group_id: user.group_id.clone(),
            iat: now,
            exp,
        })
    }

    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() > self.exp
    }
}

/// Token handed out on login
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Session errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Token has expired")]
    Expired,

    #[error("Missing authentication token")]
    MissingToken,
}

/// Issues and validates access tokens
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    /// Access token TTL in seconds
    pub access_token_ttl: i64,
}

impl SessionIssuer {
    pub fn new(secret: &str, access_token_ttl: i64) -> Result<Self, SessionError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(SessionError::InvalidSecret(format!(
                "must be at least {} characters",
                MIN_SECRET_LEN
            )));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_ttl,
        })
    }

    /// Build from configuration, generating an ephemeral secret when none is set
    pub fn from_config(config: &RegistrationConfig) -> Result<Self, SessionError> {
        match config.jwt_secret.as_deref() {
            Some(secret) => Self::new(secret, config.token_ttl_secs),
            None => {
                warn!("RELAY_JWT_SECRET not set, sessions will not survive a restart");
                Self::new(&generate_secret(), config.token_ttl_secs)
            }
        }
    }

    pub fn issue(&self, user: &UserRecord) -> Result<SessionToken, SessionError> {
        let claims = Claims::new(user, self.access_token_ttl)?;
        let access_token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Token(e.to_string()))?;

        Ok(SessionToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl,
        })
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, SessionError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Token(e.to_string()),
            })?;

        if data.claims.is_expired() {
            return Err(SessionError::Expired);
        }
        Ok(data.claims)
    }

    /// Validate an Authorization header value: `Bearer <token>` or a bare token
    pub fn validate_authorization(&self, header: &str) -> Result<Claims, SessionError> {
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(SessionError::MissingToken);
        }
        self.validate_token(token)
    }
}

/// 256-bit hex secret from the OS random source
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
