use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::DatabaseError;

pub mod password;
pub mod permissions;
pub mod session;

pub use password::{hash_password, validate_password_strength, verify_password};
pub use permissions::{has_permission, Permission};

/// Audience carried by single-sign-on tickets; access tokens carry none
pub const SSO_AUDIENCE: &str = "sso";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    InactiveAccount,

    #[error("Missing authentication token")]
    MissingToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("Unknown permissions: {}", .0.join(", "))]
    UnknownPermission(Vec<String>),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Access token claims. Permissions are embedded so request guards never hit the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: String,
    pub perms: Vec<String>,
    pub employee: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, role: String, perms: Vec<String>, employee: Option<Uuid>) -> Self {
        let now = Utc::now();
        let minutes = config::config().security.access_token_minutes;
        Self {
            sub: user_id,
            username,
            role,
            perms,
            employee,
            exp: (now + Duration::minutes(minutes)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Short-lived one-time ticket handed to SSO relying parties
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketClaims {
    pub sub: Uuid,
    pub aud: String,
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl TicketClaims {
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        let ttl = config::config().sso.ticket_ttl_secs;
        Self {
            sub: user_id,
            aud: SSO_AUDIENCE.to_string(),
            jti: Uuid::new_v4(),
            exp: (now + Duration::seconds(ttl)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

fn secret() -> Result<&'static [u8], AuthError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }
    Ok(secret.as_bytes())
}

fn sign<T: Serialize>(claims: &T) -> Result<String, AuthError> {
    encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret()?))
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

fn verify<T: for<'de> Deserialize<'de>>(token: &str, audience: Option<&str>) -> Result<T, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    decode::<T>(token, &DecodingKey::from_secret(secret()?), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
}

pub fn generate_access_token(claims: &Claims) -> Result<String, AuthError> {
    sign(claims)
}

pub fn validate_access_token(token: &str) -> Result<Claims, AuthError> {
    // SSO tickets carry an audience; access tokens never do
    let value: serde_json::Value = verify(token, None)?;
    if value.get("aud").is_some() {
        return Err(AuthError::InvalidToken("token audience not accepted here".to_string()));
    }
    serde_json::from_value(value).map_err(|e| AuthError::InvalidToken(e.to_string()))
}

pub fn generate_ticket(user_id: Uuid) -> Result<String, AuthError> {
    sign(&TicketClaims::new(user_id))
}

pub fn validate_ticket(token: &str) -> Result<TicketClaims, AuthError> {
    verify(token, Some(SSO_AUDIENCE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "alice".to_string(),
            "manager".to_string(),
            vec!["order:view".to_string()],
            None,
        )
    }

    #[test]
    fn access_token_round_trip() {
        let original = claims();
        let token = generate_access_token(&original).unwrap();
        let decoded = validate_access_token(&token).unwrap();
        assert_eq!(decoded.sub, original.sub);
        assert_eq!(decoded.perms, vec!["order:view"]);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut expired = claims();
        expired.exp = Utc::now().timestamp() - 120;
        let token = generate_access_token(&expired).unwrap();
        assert!(matches!(validate_access_token(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(validate_access_token("not.a.jwt"), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn tickets_and_access_tokens_do_not_mix() {
        let user_id = Uuid::new_v4();
        let ticket = generate_ticket(user_id).unwrap();
        assert_eq!(validate_ticket(&ticket).unwrap().sub, user_id);
        assert!(validate_access_token(&ticket).is_err());

        let access = generate_access_token(&claims()).unwrap();
        assert!(validate_ticket(&access).is_err());
    }
}
