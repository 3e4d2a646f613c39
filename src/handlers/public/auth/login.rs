// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::State;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::middleware::cookies::set_session_cookies;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{AccountService, IssuedSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /auth/login - Authenticate with username and password
///
/// ```json
/// { "username": "alice", "password": "…" }
/// ```
///
/// Responds with `{access_token, token_type, expires_in, user}`; the refresh
/// token only travels in its cookie.
pub async fn post(
    State(state): State<AppState>,
    cookies: Cookies,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<IssuedSession> {
    let session = AccountService::new(state.db).login(&body.username, &body.password).await?;
    set_session_cookies(&cookies, &session);
    Ok(ApiResponse::success(session))
}
