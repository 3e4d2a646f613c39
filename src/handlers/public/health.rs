// handlers/public/health.rs - GET / and GET /health

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET / - Service descriptor
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Portal API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Business portal backend: orders, employees, clients, invoicing, CRM reports",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/login, /auth/refresh, /auth/logout (public - token acquisition)",
                "sso": "/sso/login, /sso/exchange (public), /sso/authorize (session)",
                "account": "/api/auth/whoami, /api/auth/password (protected)",
                "resources": "/api/{clients,employees,users,roles,orders,invoices,notices,schedules,reports}[/:id] (protected)",
                "approvals": "/api/approvals[/:id/approve|reject] (protected)",
                "files": "/api/files/:folder[/:name] (protected)",
            }
        }
    }))
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health(State(state): State<AppState>) -> Response {
    let now = chrono::Utc::now();
    let ftp = state.files.pool().status();

    match DatabaseManager::health_check(&state.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "ftp_pool": ftp,
                }
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string(),
                        "ftp_pool": ftp,
                    }
                })),
            )
                .into_response()
        }
    }
}
