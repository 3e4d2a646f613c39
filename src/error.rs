// HTTP API errors. Every failure leaves the server as
// `{"error": true, "message": …, "code": …}` plus optional `field_errors`.
use std::collections::HashMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::database::models::ValidationError;
use crate::database::DatabaseError;
use crate::filter::FilterError;
use crate::ftp::FtpError;
use crate::services::{ApprovalError, InvoiceError, PayrollError};

pub type FieldErrors = HashMap<String, String>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation { message: String, field_errors: FieldErrors },

    #[error("{0}")]
    InvalidJson(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Well-formed input that refers to something that does not exist
    #[error("{message}")]
    Unprocessable { message: String, field_errors: FieldErrors },

    #[error("{0}")]
    Internal(String),

    /// The FTP server misbehaved
    #[error("{0}")]
    BadGateway(String),

    #[error("{0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } | ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unprocessable { .. } => "UNPROCESSABLE_ENTITY",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>, field: impl Into<String>, detail: impl Into<String>) -> Self {
        ApiError::Validation { message: message.into(), field_errors: HashMap::from([(field.into(), detail.into())]) }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        ApiError::Unprocessable { message: message.into(), field_errors }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": true,
            "message": self.to_string(),
            "code": self.code(),
        });
        if let ApiError::Validation { field_errors, .. } | ApiError::Unprocessable { field_errors, .. } = &self {
            body["field_errors"] = json!(field_errors);
        }
        (self.status(), Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            DatabaseError::InvalidReference(msg) => ApiError::unprocessable(msg, HashMap::new()),
            DatabaseError::Filter(e) => e.into(),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal("An error occurred while processing your request")
            }
            DatabaseError::MigrationError(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::Sqlx(sqlx_err) => sqlx_err.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ApiError::not_found("Record not found"),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                tracing::error!("Database unavailable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::conflict("Record already exists"),
                Some("23503") => ApiError::unprocessable("Referenced record does not exist", HashMap::new()),
                Some("23514") => ApiError::bad_request("Value violates a table constraint"),
                _ => {
                    tracing::error!("SQLx error: {}", err);
                    ApiError::internal("Database error occurred")
                }
            },
            _ => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", err);
                ApiError::internal("Database error occurred")
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidValue { field, message } => {
                ApiError::validation("Invalid filter value", field, message)
            }
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation { message: "Invalid field value".to_string(), field_errors: err.field_errors() }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::InvalidToken(_) => ApiError::unauthorized(err.to_string()),
            AuthError::InactiveAccount => ApiError::forbidden(err.to_string()),
            AuthError::WeakPassword(_) => ApiError::validation("Password too weak", "password", err.to_string()),
            AuthError::UnknownPermission(_) => ApiError::unprocessable(
                "Unknown permissions",
                HashMap::from([("permissions".to_string(), err.to_string())]),
            ),
            AuthError::MissingSecret | AuthError::Hash(_) => {
                tracing::error!("Authentication backend error: {}", err);
                ApiError::internal("Authentication is unavailable")
            }
            AuthError::Database(e) => e.into(),
        }
    }
}

impl From<FtpError> for ApiError {
    fn from(err: FtpError) -> Self {
        match &err {
            FtpError::InvalidPath(_) => ApiError::bad_request(err.to_string()),
            _ if err.is_not_found() => ApiError::not_found("File not found"),
            FtpError::Timeout(_) | FtpError::PoolClosed => {
                tracing::warn!("File storage busy: {}", err);
                ApiError::service_unavailable("File storage is busy, please retry")
            }
            FtpError::Connect(_) | FtpError::Rejected { .. } | FtpError::Io(_) => {
                tracing::error!("File storage error: {}", err);
                ApiError::BadGateway("File storage error".to_string())
            }
        }
    }
}

impl From<PayrollError> for ApiError {
    fn from(err: PayrollError) -> Self {
        match err {
            PayrollError::NegativeGross => ApiError::bad_request(err.to_string()),
            PayrollError::InvalidStructure(_) | PayrollError::InvalidRate(_) => {
                tracing::error!("Payroll configuration error: {}", err);
                ApiError::internal("Payroll is misconfigured")
            }
        }
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        match err {
            InvoiceError::MissingOrder(_) | InvoiceError::ForeignOrder(_) | InvoiceError::AlreadyInvoiced(_) => {
                ApiError::conflict(err.to_string())
            }
            InvoiceError::NoOrders | InvoiceError::DuplicateOrder(_) => ApiError::validation(err.to_string(), "order_ids", err.to_string()),
            InvoiceError::NegativeDiscount | InvoiceError::DiscountTooLarge { .. } => ApiError::validation(err.to_string(), "discount", err.to_string()),
            InvoiceError::ClientNotFound => ApiError::not_found(err.to_string()),
            InvoiceError::Validation(e) => e.into(),
            InvoiceError::Database(e) => e.into(),
        }
    }
}

impl From<ApprovalError> for ApiError {
    fn from(err: ApprovalError) -> Self {
        match err {
            ApprovalError::AlreadyReviewed(_)
            | ApprovalError::InvalidTransition { .. }
            | ApprovalError::AlreadyDeleted { .. }
            | ApprovalError::NotDeleted { .. } => ApiError::conflict(err.to_string()),
            ApprovalError::SelfReview => ApiError::forbidden(err.to_string()),
            ApprovalError::TargetNotFound { .. } => ApiError::not_found(err.to_string()),
            ApprovalError::Invoice(e) => e.into(),
            ApprovalError::Database(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidJson(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_and_missing_rows_map_to_http() {
        assert_eq!(ApiError::from(sqlx::Error::RowNotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(sqlx::Error::PoolTimedOut).status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn auth_failures_are_401_and_inactive_is_403() {
        assert_eq!(ApiError::from(AuthError::TokenExpired).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::InactiveAccount).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::from(AuthError::MissingSecret).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn validation_carries_field_errors() {
        let err = ApiError::from(ValidationError::new("name", "is required"));
        assert_eq!(err.code(), "VALIDATION_ERROR");
        match err {
            ApiError::Validation { field_errors, .. } => assert_eq!(field_errors["name"], "is required"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
