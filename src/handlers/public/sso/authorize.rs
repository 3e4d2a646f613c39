// handlers/public/sso/authorize.rs - GET /sso/authorize handler
//
// Mounted behind the JWT middleware: the browser's access_token cookie is
// what proves the session.

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;

use super::{allowed_redirect, with_ticket};
use crate::auth;
use crate::error::ApiError;
use crate::middleware::{ApiQuery, AuthUser};

#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    pub redirect: String,
}

/// GET /sso/authorize?redirect=… - 302 to `redirect?ticket=…`
pub async fn get(
    Extension(user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<AuthorizeQuery>,
) -> Result<Response, ApiError> {
    let target = allowed_redirect(&query.redirect)?;
    let ticket = auth::generate_ticket(user.user_id)?;
    tracing::info!("Issued SSO ticket for {} to {}", user.username, target.origin().ascii_serialization());
    Ok((StatusCode::FOUND, [(LOCATION, with_ticket(target, &ticket))]).into_response())
}
