mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn unknown_sort_column_is_400() -> Result<()> {
    let token = common::token(&["client:view"]);
    let (status, body) =
        common::send(common::get("/api/clients?sort=password_hash", Some(&token))).await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    Ok(())
}

#[tokio::test]
async fn malformed_id_is_400() -> Result<()> {
    let token = common::token(&["order:view"]);
    let (status, _) = common::send(common::get("/api/orders/not-a-uuid", Some(&token))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_json_body_is_400() -> Result<()> {
    let token = common::token(&["client:create"]);
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/clients")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", token))
        .body(axum::body::Body::from("{ not json"))?;

    let (status, _) = common::send(request).await?;
    assert!(status.is_client_error(), "got {}", status);
    Ok(())
}

#[tokio::test]
async fn health_reports_degraded_without_database() -> Result<()> {
    let (status, body) = common::send(common::get("/health", None)).await?;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn root_describes_the_service() -> Result<()> {
    let (status, body) = common::send(common::get("/", None)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn sso_login_rejects_foreign_redirect() -> Result<()> {
    let request = common::post_json(
        "/sso/login",
        None,
        json!({ "username": "alice", "password": "whatever-123", "redirect": "https://evil.example/cb" }),
    );

    let (status, _) = common::send(request).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}
