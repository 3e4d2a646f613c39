// handlers/public/sso/exchange.rs - POST /sso/exchange handler

use axum::extract::State;
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::middleware::cookies::set_session_cookies;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::{AccountService, IssuedSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExchangeRequest {
    pub ticket: String,
}

/// POST /sso/exchange - Redeem a one-time ticket for a portal session
///
/// Tickets are rejected when expired, minted for another audience, or
/// already redeemed.
pub async fn post(
    State(state): State<AppState>,
    cookies: Cookies,
    ApiJson(body): ApiJson<ExchangeRequest>,
) -> ApiResult<IssuedSession> {
    let session = AccountService::new(state.db).exchange_ticket(body.ticket.trim()).await?;
    set_session_cookies(&cookies, &session);
    Ok(ApiResponse::success(session))
}
