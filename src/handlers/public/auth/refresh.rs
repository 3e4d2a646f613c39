// handlers/public/auth/refresh.rs - POST /auth/refresh handler

use axum::extract::State;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::auth::AuthError;
use crate::middleware::cookies::{refresh_token, set_session_cookies};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{AccountService, IssuedSession};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Token from the body when given, else from the refresh cookie
pub(crate) fn presented_token(cookies: &Cookies, body: Option<ApiJson<RefreshRequest>>) -> Option<String> {
    body.and_then(|ApiJson(b)| b.refresh_token)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| refresh_token(cookies))
}

/// POST /auth/refresh - Rotate the session
///
/// The presented refresh token is consumed; a new access/refresh pair is
/// issued. Unknown or expired tokens get 401.
pub async fn post(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Option<ApiJson<RefreshRequest>>,
) -> ApiResult<IssuedSession> {
    let token = presented_token(&cookies, body).ok_or(AuthError::MissingToken)?;
    let session = AccountService::new(state.db).refresh(&token).await?;
    set_session_cookies(&cookies, &session);
    Ok(ApiResponse::success(session))
}
