#![allow(dead_code)]

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use portal_api::api;
use portal_api::auth::{generate_access_token, Claims};
use portal_api::config::{config, DatabaseConfig};
use portal_api::database::DatabaseManager;
use portal_api::state::AppState;

/// Router over a pool that points at a closed port; any handler that reaches
/// the database fails fast, everything before it runs for real.
pub fn app() -> Router {
    let database = DatabaseManager::connect_lazy(&DatabaseConfig {
        url: "postgres://nobody@127.0.0.1:1/portal".to_string(),
        max_connections: 1,
        connection_timeout: 1,
        run_migrations: false,
    })
    .expect("lazy pool");
    app_with(database.pool().clone())
}

/// Router over a live pool
pub fn app_with(pool: PgPool) -> Router {
    api::router(AppState::from_config(pool, config()))
}

/// Signed access token carrying exactly `perms`
pub fn token(perms: &[&str]) -> String {
    token_for(Uuid::new_v4(), perms)
}

/// Same as `token`, for a user that exists in the database
pub fn token_for(user_id: Uuid, perms: &[&str]) -> String {
    let claims = Claims::new(
        user_id,
        "tester".to_string(),
        "Tester".to_string(),
        perms.iter().map(|p| p.to_string()).collect(),
        None,
    );
    generate_access_token(&claims).expect("token")
}

pub fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_json(uri: &str, bearer: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn delete(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).expect("request")
}

/// Send one request through a fresh router and decode the JSON body
pub async fn send(request: Request<Body>) -> Result<(StatusCode, Value)> {
    send_to(app(), request).await
}

pub async fn send_to(router: Router, request: Request<Body>) -> Result<(StatusCode, Value)> {
    let response = router.oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok((status, body))
}
