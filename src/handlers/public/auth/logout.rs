// handlers/public/auth/logout.rs - POST /auth/logout handler

use axum::extract::State;
use serde_json::{json, Value};
use tower_cookies::Cookies;

use super::refresh::{presented_token, RefreshRequest};
use crate::middleware::cookies::clear_session_cookies;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::AccountService;
use crate::state::AppState;

/// POST /auth/logout - Drop the refresh session and clear cookies
///
/// Idempotent: logging out without a session still succeeds.
pub async fn post(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Option<ApiJson<RefreshRequest>>,
) -> ApiResult<Value> {
    if let Some(token) = presented_token(&cookies, body) {
        AccountService::new(state.db).logout(&token).await?;
    }
    clear_session_cookies(&cookies);
    Ok(ApiResponse::success(json!({ "logged_out": true })))
}
