use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use super::cookies::ACCESS_COOKIE;
use crate::auth::{self, has_permission, AuthError, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub employee_id: Option<Uuid>,
    pub expires_at: i64,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
            permissions: claims.perms,
            employee_id: claims.employee,
            expires_at: claims.exp,
        }
    }
}

impl AuthUser {
    pub fn can(&self, permission: &str) -> bool {
        has_permission(&self.permissions, permission)
    }

    /// 403 unless the role grants `permission`
    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::debug!("{} denied: missing {}", self.username, permission);
            Err(ApiError::forbidden(format!("Missing permission '{}'", permission)))
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context.
///
/// The token comes from `Authorization: Bearer …`, falling back to the
/// `access_token` cookie set at login.
pub async fn jwt_auth_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let cookies = request.extensions().get::<Cookies>().cloned();
    let token = extract_token(request.headers(), cookies.as_ref())?;
    let claims = auth::validate_access_token(&token)?;

    request.extensions_mut().insert(AuthUser::from(claims));
    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap, cookies: Option<&Cookies>) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid Authorization header format".to_string()))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| AuthError::InvalidToken("Authorization header must use Bearer token format".to_string()))?
            .trim();
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }
        return Ok(token.to_string());
    }

    cookies
        .and_then(|c| c.get(ACCESS_COOKIE))
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingToken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_is_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers, None).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn wrong_scheme_and_missing_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert!(matches!(extract_token(&headers, None), Err(AuthError::InvalidToken(_))));
        assert!(matches!(extract_token(&HeaderMap::new(), None), Err(AuthError::MissingToken)));
    }

    #[test]
    fn require_checks_membership() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            username: "alice".into(),
            role: "marketing".into(),
            permissions: vec!["report:view".into()],
            employee_id: None,
            expires_at: 0,
        };
        assert!(user.require("report:view").is_ok());
        assert_eq!(user.require("report:delete").unwrap_err().status(), axum::http::StatusCode::FORBIDDEN);
    }
}
