// handlers/public/sso/login.rs - POST /sso/login handler

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use super::{allowed_redirect, with_ticket};
use crate::auth;
use crate::middleware::cookies::set_session_cookies;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::AccountService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SsoLoginRequest {
    pub username: String,
    pub password: String,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct SsoRedirect {
    pub redirect_url: String,
}

/// POST /sso/login - Authenticate and hand back the relying app's redirect URL
///
/// The redirect is checked before credentials so a bad target never costs a
/// password verification.
pub async fn post(
    State(state): State<AppState>,
    cookies: Cookies,
    ApiJson(body): ApiJson<SsoLoginRequest>,
) -> ApiResult<SsoRedirect> {
    let target = allowed_redirect(&body.redirect)?;
    let session = AccountService::new(state.db).login(&body.username, &body.password).await?;
    set_session_cookies(&cookies, &session);

    let ticket = auth::generate_ticket(session.user.id)?;
    Ok(ApiResponse::success(SsoRedirect { redirect_url: with_ticket(target, &ticket) }))
}
