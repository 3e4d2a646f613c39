use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::config;
use crate::database::DatabaseError;

const REFRESH_TOKEN_LEN: usize = 48;

/// Opaque refresh token handed to the browser; only its hash is stored
pub fn generate_refresh_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REFRESH_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

pub fn refresh_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::days(config::config().security.refresh_token_days)
}

/// Store a new session and return the plaintext refresh token
pub async fn create<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid) -> Result<String, DatabaseError> {
    let token = generate_refresh_token();
    sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(refresh_expiry())
        .execute(executor)
        .await?;
    Ok(token)
}

/// Remove the session for `token`, returning its user when it was still valid.
///
/// Consuming the row is what makes refresh tokens single-use.
pub async fn take<'e, E: PgExecutor<'e>>(executor: E, token: &str) -> Result<Option<Uuid>, DatabaseError> {
    let row: Option<(Uuid, DateTime<Utc>)> =
        sqlx::query_as("DELETE FROM sessions WHERE token_hash = $1 RETURNING user_id, expires_at")
            .bind(hash_token(token))
            .fetch_optional(executor)
            .await?;
    Ok(row.and_then(|(user_id, expires_at)| (expires_at > Utc::now()).then_some(user_id)))
}

pub async fn revoke_all<'e, E: PgExecutor<'e>>(executor: E, user_id: Uuid) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub async fn purge_expired<'e, E: PgExecutor<'e>>(executor: E) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Mark an SSO ticket as used. False when it was already redeemed.
pub async fn redeem_ticket<'e, E: PgExecutor<'e>>(executor: E, jti: Uuid, expires_at: i64) -> Result<bool, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO sso_redemptions (jti, expires_at) VALUES ($1, to_timestamp($2)) ON CONFLICT (jti) DO NOTHING",
    )
    .bind(jti)
    .bind(expires_at as f64)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn purge_redemptions<'e, E: PgExecutor<'e>>(executor: E) -> Result<u64, DatabaseError> {
    let result = sqlx::query("DELETE FROM sso_redemptions WHERE expires_at <= now()")
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_tokens_are_random_alphanumeric() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_eq!(a.len(), REFRESH_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash, "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
        assert_eq!(hash, hash_token("abc"));
    }
}
