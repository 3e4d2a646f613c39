// handlers/protected/auth.rs - /api/auth/* for the signed-in user

use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use crate::middleware::cookies::clear_session_cookies;
use crate::middleware::{ApiJson, ApiResponse, ApiResult, AuthUser};
use crate::services::AccountService;
use crate::state::AppState;

/// GET /api/auth/whoami - identity and permissions straight from the token
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(user))
}

#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub current: String,
    pub new: String,
}

/// PUT /api/auth/password - every session ends, including this one
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    cookies: Cookies,
    ApiJson(body): ApiJson<ChangePassword>,
) -> ApiResult<Value> {
    AccountService::new(state.db)
        .change_password(user.user_id, &body.current, &body.new)
        .await?;
    clear_session_cookies(&cookies);
    Ok(ApiResponse::success(json!({ "password_changed": true, "sessions_revoked": true })))
}
