use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{self, session, AuthError, Claims};
use crate::config;
use crate::database::models::UserProfile;
use crate::database::DatabaseError;

/// Tokens handed out on login, refresh and SSO exchange
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub access_token: String,
    #[serde(skip_serializing)]
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserProfile,
}

pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn profile_by_id(&self, user_id: Uuid) -> Result<Option<UserProfile>, DatabaseError> {
        let sql = format!("{} AND u.id = $1", UserProfile::SELECT);
        Ok(sqlx::query_as(&sql).bind(user_id).fetch_optional(&self.pool).await?)
    }

    pub async fn profile_by_username(&self, username: &str) -> Result<Option<UserProfile>, DatabaseError> {
        let sql = format!("{} AND lower(u.username) = lower($1)", UserProfile::SELECT);
        Ok(sqlx::query_as(&sql).bind(username.trim()).fetch_optional(&self.pool).await?)
    }

    /// Verify credentials and open a session
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession, AuthError> {
        let profile = match self.profile_by_username(username).await? {
            Some(profile) => profile,
            None => {
                warn!("Login failed for unknown user '{}'", username);
                return Err(AuthError::InvalidCredentials);
            }
        };
        if !auth::verify_password(password, &profile.password_hash)? {
            warn!("Login failed for '{}': bad password", profile.username);
            return Err(AuthError::InvalidCredentials);
        }
        self.issue(profile).await
    }

    /// Open a session for a user already authenticated some other way (SSO ticket)
    pub async fn login_by_id(&self, user_id: Uuid) -> Result<IssuedSession, AuthError> {
        let profile = self
            .profile_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("user no longer exists".to_string()))?;
        self.issue(profile).await
    }

    /// Redeem a one-time SSO ticket for a full session
    pub async fn exchange_ticket(&self, ticket: &str) -> Result<IssuedSession, AuthError> {
        let claims = auth::validate_ticket(ticket)?;
        if !session::redeem_ticket(&self.pool, claims.jti, claims.exp).await? {
            warn!("SSO ticket {} presented twice", claims.jti);
            return Err(AuthError::InvalidToken("ticket already used".to_string()));
        }
        self.login_by_id(claims.sub).await
    }

    /// Trade a refresh token for a new pair; the old token stops working
    pub async fn refresh(&self, refresh_token: &str) -> Result<IssuedSession, AuthError> {
        let user_id = session::take(&self.pool, refresh_token)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("refresh token expired or unknown".to_string()))?;
        self.login_by_id(user_id).await
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        session::take(&self.pool, refresh_token).await?;
        Ok(())
    }

    /// Change the password and revoke every existing session
    pub async fn change_password(&self, user_id: Uuid, current: &str, new: &str) -> Result<(), AuthError> {
        let profile = self
            .profile_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("user no longer exists".to_string()))?;
        if !auth::verify_password(current, &profile.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        auth::validate_password_strength(new)?;
        let hash = auth::hash_password(new)?;

        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(user_id)
            .bind(hash)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
        let revoked = session::revoke_all(&mut *tx, user_id).await?;
        tx.commit().await.map_err(DatabaseError::from)?;

        info!("Password changed for {}, {} sessions revoked", profile.username, revoked);
        Ok(())
    }

    async fn issue(&self, profile: UserProfile) -> Result<IssuedSession, AuthError> {
        if !profile.is_active {
            return Err(AuthError::InactiveAccount);
        }
        let claims = Claims::new(
            profile.id,
            profile.username.clone(),
            profile.role.clone(),
            profile.permissions.clone(),
            profile.employee_id,
        );
        let access_token = auth::generate_access_token(&claims)?;
        let refresh_token = session::create(&self.pool, profile.id).await?;

        sqlx::query("UPDATE users SET last_login_at = now() WHERE id = $1")
            .bind(profile.id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;

        info!("Session opened for {}", profile.username);
        Ok(IssuedSession {
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: config::config().security.access_token_minutes * 60,
            user: profile,
        })
    }
}
